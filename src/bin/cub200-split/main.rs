use anyhow::{Context, Result};
use clap::Parser;

use fruit_dataset::cub200::Cub200;
use fruit_dataset::logging;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory containing CUB_200_2011/
    #[arg(short, long)]
    root: std::path::PathBuf,
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

    let cub = Cub200::load(&args.root)
        .with_context(|| format!("load CUB-200 from {}", args.root.display()))?;
    println!(
        "{} classes, {} training, {} testing",
        cub.class_names().len(),
        cub.train.len(),
        cub.test.len()
    );

    if let Some(path) = &args.dst_train_file {
        cub.train
            .write_list(path)
            .with_context(|| format!("write {}", path.display()))?;
    }
    if let Some(path) = &args.dst_test_file {
        cub.test
            .write_list(path)
            .with_context(|| format!("write {}", path.display()))?;
    }

    Ok(())
}
