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
    /// Print the tables as JSON
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
        .with_context(|| format!("analyze {}", args.root.display()))?;
    let directories = summary.directories_by_country();
    let samples = summary.samples_by_country();

    if args.json {
        let out = json!({
            "directories": directories,
            "samples": samples,
            "skipped": summary.skipped,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let fruits = summary.fruits();
    let width = fruits.iter().map(|f| f.len()).max().unwrap_or(0).max(5);
    for (country, by_fruit) in &directories {
        println!("{}", country);
        for fruit in &fruits {
            let Some(dirs) = by_fruit.get(fruit) else {
                continue;
            };
            let n = samples[country][fruit];
            println!(
                "  {:<width$}  {} dir(s), {} samples",
                fruit,
                dirs,
                n,
                width = width
            );
        }
    }
    if !summary.skipped.is_empty() {
        println!(
            "\nSkipped {} directories: {}",
            summary.skipped.len(),
            summary.skipped.join(", ")
        );
    }

    Ok(())
}
