use std::collections::BTreeMap;

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use fruit_dataset::augment::DEFAULT_TARGET_SAMPLES;
use fruit_dataset::logging;
use fruit_dataset::{augment_dataset, count_class_dirs, AugmentationPipeline};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Dataset root holding one directory per class
    #[arg(short, long, default_value = "fruits_data")]
    root: std::path::PathBuf,
    /// Classes below this many images are augmented up to it
    #[arg(short, long, default_value_t = DEFAULT_TARGET_SAMPLES)]
    target: usize,
    /// Seed for source selection and transform parameters
    #[arg(long)]
    seed: Option<u64>,
    /// verbose
    #[arg(short, long)]
    verbose: bool,
}

fn print_distribution(counts: &BTreeMap<String, usize>) {
    for (class, n) in counts {
        println!("{}: {} samples", class, n);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    println!("Analyzing dataset...");
    let initial = count_class_dirs(&args.root)
        .with_context(|| format!("count samples in {}", args.root.display()))?;
    println!("\nInitial class distribution:");
    print_distribution(&initial);

    let seed = args.seed.unwrap_or_else(rand::random);
    info!("augmentation seed {}", seed);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    println!("\nStarting augmentation...");
    let pipeline = AugmentationPipeline::default();
    let report = augment_dataset(&args.root, args.target, &pipeline, &mut rng)
        .with_context(|| format!("augment {}", args.root.display()))?;
    println!("\nTotal augmented images created: {}", report.total_added());

    println!("\nFinal class distribution:");
    print_distribution(&count_class_dirs(&args.root)?);

    Ok(())
}
