use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;

use fruit_dataset::logging;
use fruit_dataset::scan_dataset;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Dataset root holding one Country_Fruit directory per class
    #[arg(short, long, default_value = "fruits_data")]
    root: std::path::PathBuf,
    /// Print the counts and statistics as JSON
    #[arg(long)]
    json: bool,
    /// verbose
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let summary = scan_dataset(&args.root)
        .with_context(|| format!("count samples in {}", args.root.display()))?;
    let by_class = summary.samples_by_class();
    let stats = summary.statistics();

    if args.json {
        let out = json!({
            "classes": by_class,
            "statistics": stats,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for (class, n) in &by_class {
        println!("{}: {} samples", class, n);
    }

    let Some(stats) = stats else {
        println!("\nNo class directories found in {}", args.root.display());
        return Ok(());
    };
    println!("\nDataset Statistics:");
    println!("{}", "-".repeat(50));
    println!("Total number of samples: {}", stats.total);
    println!("Average samples per class: {:.1}", stats.mean);
    println!("Min samples in a class: {}", stats.min);
    println!("Max samples in a class: {}", stats.max);
    println!("{}", "-".repeat(50));

    Ok(())
}
