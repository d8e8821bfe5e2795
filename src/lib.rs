//! Tooling for a country/fruit labelled image dataset: class directory
//! parsing, sample counting, augmentation of under-represented classes and
//! train/test split loaders for the fruits folder tree and CUB-200-2011.

use std::fs;
use std::io;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use image::{ImageReader, RgbImage};

pub mod augment;
pub mod cub200;
pub mod error;
pub mod fruits;
pub mod label;
pub mod logging;
pub mod split;
pub mod stats;

pub use augment::{
    augment_class, augment_dataset, AugmentReport, AugmentationPipeline, ImageTransform,
};
pub use error::{Error, Result};
pub use label::{parse_label, ClassLabel};
pub use split::Split;
pub use stats::{count_class_dirs, count_images, scan_dataset, DatasetSummary};

/// Extensions (lower-case) that count as samples.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

// The output is wrapped in a Result to allow matching on errors
// Returns an Iterator to the Reader of the lines of the file.
pub fn read_lines<P>(filename: P) -> io::Result<io::Lines<io::BufReader<fs::File>>>
where
    P: AsRef<Path>,
{
    let file = fs::File::open(filename)?;
    Ok(io::BufReader::new(file).lines())
}

/// True when the path's extension is one of [`IMAGE_EXTENSIONS`], ignoring case.
pub fn has_image_extension<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}

/// Decodes an image as 8-bit RGB, picking the decoder from the file content.
///
/// A PNG saved with a `.jpg` name still decodes.
pub fn open_rgb<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    Ok(image.to_rgb8())
}

/// Image files directly inside `dir`, sorted by file name.
pub fn list_images<P: AsRef<Path>>(dir: P) -> io::Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && has_image_extension(&path) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

/// Subdirectories directly inside `root` as (name, path), sorted by name.
///
/// Names that are not valid UTF-8 are skipped with a warning.
pub fn list_subdirs<P: AsRef<Path>>(root: P) -> io::Result<Vec<(String, PathBuf)>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => dirs.push((name, entry.path())),
            Err(name) => tracing::warn!("skipping non UTF-8 directory name {:?}", name),
        }
    }
    dirs.sort();
    Ok(dirs)
}
