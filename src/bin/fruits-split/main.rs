use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use fruit_dataset::fruits::{Fruits, DEFAULT_TRAIN_SPLIT};
use fruit_dataset::logging;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Image-folder root, one subdirectory per class
    #[arg(short, long, default_value = "fruits_data")]
    root: std::path::PathBuf,
    /// ratio
    #[arg(long, default_value_t = DEFAULT_TRAIN_SPLIT)]
    train_split: f64,
    /// Seed for the split permutation
    #[arg(long)]
    seed: Option<u64>,
    /// The output file path for writing the training list
    #[arg(long)]
    dst_train_file: Option<std::path::PathBuf>,
    /// The output file path for writing the test list
    #[arg(long)]
    dst_test_file: Option<std::path::PathBuf>,
    /// verbose
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let seed = args.seed.unwrap_or_else(rand::random);
    info!("split seed {}", seed);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let fruits = Fruits::load(&args.root, args.train_split, &mut rng)
        .with_context(|| format!("load {}", args.root.display()))?;
    for (idx, class) in fruits.class_names().iter().enumerate() {
        println!("{:>3} {}", idx, class);
    }
    let empty = fruits.empty_classes();
    if !empty.is_empty() {
        println!("\nClasses without images: {}", empty.join(", "));
    }

    if let Some(path) = &args.dst_train_file {
        fruits
            .train
            .write_list(path)
            .with_context(|| format!("write {}", path.display()))?;
    }
    if let Some(path) = &args.dst_test_file {
        fruits
            .test
            .write_list(path)
            .with_context(|| format!("write {}", path.display()))?;
    }

    Ok(())
}
