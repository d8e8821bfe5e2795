//! Growing under-represented class directories up to a target sample count.
//!
//! Augmented copies are written next to the originals as
//! `aug_{index}_{original name}`. Originals are never modified or removed and
//! existing files are never overwritten.

use std::path::Path;

use image::RgbImage;
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::stats::count_class_dirs;
use crate::{list_images, open_rgb};

mod pipeline;

pub use pipeline::AugmentationPipeline;

pub const DEFAULT_TARGET_SAMPLES: usize = 200;

/// A randomized image-to-image transform.
pub trait ImageTransform {
    fn apply<R: Rng + ?Sized>(&self, image: &RgbImage, rng: &mut R) -> RgbImage;
}

/// How many images a class holding `current` samples is missing.
///
/// Zero once the class is at or above `target`; augmentation only adds files.
pub fn shortfall(current: usize, target: usize) -> usize {
    target.saturating_sub(current)
}

pub fn augmented_name(index: usize, original: &str) -> String {
    format!("aug_{index}_{original}")
}

/// Adds augmented copies to `class_dir` until it holds `target` images.
///
/// Sources are drawn uniformly with replacement from the images present when
/// the call starts. A source that fails to decode is logged and dropped from
/// the pool. Returns the number of files written.
pub fn augment_class<T, R>(
    class_dir: &Path,
    target: usize,
    transform: &T,
    rng: &mut R,
) -> Result<usize>
where
    T: ImageTransform,
    R: Rng + ?Sized,
{
    let mut sources = list_images(class_dir)?;
    let needed = shortfall(sources.len(), target);
    if needed == 0 {
        return Ok(0);
    }

    let class_name = class_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| class_dir.display().to_string());
    if sources.is_empty() {
        warn!("'{}' has no images to augment from", class_name);
        return Ok(0);
    }

    let pb = ProgressBar::new(needed as u64);
    if let Ok(style) = ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos}/{len}") {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.set_message(format!("Augmenting {}", class_name));

    let mut written = 0;
    let mut index = 0;
    while written < needed {
        if sources.is_empty() {
            warn!("'{}': no decodable images left, stopping", class_name);
            break;
        }
        let pick = rng.random_range(0..sources.len());
        let original = match open_rgb(&sources[pick]) {
            Ok(image) => image,
            Err(e) => {
                warn!("skipping {}: {}", sources[pick].display(), e);
                sources.swap_remove(pick);
                continue;
            }
        };
        let source = &sources[pick];
        let source_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let augmented = transform.apply(&original, rng);

        let destination = loop {
            let candidate = class_dir.join(augmented_name(index, &source_name));
            index += 1;
            if !candidate.exists() {
                break candidate;
            }
        };
        augmented.save(&destination)?;
        debug!("{} -> {}", source.display(), destination.display());

        written += 1;
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(written)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassAugmentation {
    pub class: String,
    pub before: usize,
    pub added: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AugmentReport {
    pub classes: Vec<ClassAugmentation>,
}

impl AugmentReport {
    pub fn total_added(&self) -> usize {
        self.classes.iter().map(|c| c.added).sum()
    }
}

/// Runs [`augment_class`] over every class directory of `root`, in name order.
pub fn augment_dataset<T, R>(
    root: &Path,
    target: usize,
    transform: &T,
    rng: &mut R,
) -> Result<AugmentReport>
where
    T: ImageTransform,
    R: Rng + ?Sized,
{
    let mut report = AugmentReport::default();
    for (class, before) in count_class_dirs(root)? {
        let added = if before < target {
            let added = augment_class(&root.join(&class), target, transform, rng)?;
            info!("Added {} augmented images to {}", added, class);
            added
        } else {
            0
        };
        report.classes.push(ClassAugmentation {
            class,
            before,
            added,
        });
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::fs;

    use image::Rgb;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    /// Counts invocations and returns the input unchanged.
    #[derive(Default)]
    struct Counting {
        calls: Cell<usize>,
    }

    impl ImageTransform for Counting {
        fn apply<R: Rng + ?Sized>(&self, image: &RgbImage, _rng: &mut R) -> RgbImage {
            self.calls.set(self.calls.get() + 1);
            image.clone()
        }
    }

    fn write_images(dir: &Path, names: &[&str]) {
        fs::create_dir_all(dir).unwrap();
        for name in names {
            RgbImage::from_pixel(4, 4, Rgb([200, 30, 30]))
                .save(dir.join(name))
                .unwrap();
        }
    }

    #[test]
    fn shortfall_never_removes_samples() {
        for current in 0..=400 {
            let missing = shortfall(current, DEFAULT_TARGET_SAMPLES);
            assert!(current + missing >= current);
            if current >= DEFAULT_TARGET_SAMPLES {
                assert_eq!(missing, 0);
            } else {
                assert_eq!(current + missing, DEFAULT_TARGET_SAMPLES);
            }
        }
    }

    #[test]
    fn augmented_names_keep_the_original_name() {
        assert_eq!(augmented_name(0, "a.jpg"), "aug_0_a.jpg");
        assert_eq!(augmented_name(12, "aug_3_b.png"), "aug_12_aug_3_b.png");
    }

    #[test]
    fn every_write_goes_through_the_transform() {
        let root = tempfile::tempdir().unwrap();
        let class_dir = root.path().join("China_Apple");
        write_images(&class_dir, &["a.png", "b.png"]);

        let transform = Counting::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let added = augment_class(&class_dir, 10, &transform, &mut rng).unwrap();

        assert_eq!(added, 8);
        assert_eq!(transform.calls.get(), 8);
        assert_eq!(list_images(&class_dir).unwrap().len(), 10);
    }

    #[test]
    fn class_at_target_gets_no_writes() {
        let root = tempfile::tempdir().unwrap();
        let class_dir = root.path().join("Vietnam_Mango");
        write_images(&class_dir, &["a.png", "b.png", "c.png"]);

        let transform = Counting::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(
            augment_class(&class_dir, 3, &transform, &mut rng).unwrap(),
            0
        );
        assert_eq!(
            augment_class(&class_dir, 2, &transform, &mut rng).unwrap(),
            0
        );
        assert_eq!(transform.calls.get(), 0);
    }

    #[test]
    fn empty_class_is_left_alone() {
        let root = tempfile::tempdir().unwrap();
        let class_dir = root.path().join("China_Lychee");
        fs::create_dir_all(&class_dir).unwrap();

        let transform = Counting::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(
            augment_class(&class_dir, 5, &transform, &mut rng).unwrap(),
            0
        );
        assert!(list_images(&class_dir).unwrap().is_empty());
    }

    #[test]
    fn existing_augmented_names_are_not_overwritten() {
        let root = tempfile::tempdir().unwrap();
        let class_dir = root.path().join("China_Apple");
        write_images(&class_dir, &["a.png", "aug_0_a.png"]);

        let transform = Counting::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let added = augment_class(&class_dir, 6, &transform, &mut rng).unwrap();

        assert_eq!(added, 4);
        assert_eq!(list_images(&class_dir).unwrap().len(), 6);
    }

    #[test]
    fn dataset_report_lists_every_class() {
        let root = tempfile::tempdir().unwrap();
        write_images(&root.path().join("China_Apple"), &["a.png"]);
        write_images(
            &root.path().join("Vietnam_Mango"),
            &["a.png", "b.png", "c.png"],
        );
        write_images(&root.path().join("misc"), &["x.png"]);

        let transform = Counting::default();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let report = augment_dataset(root.path(), 3, &transform, &mut rng).unwrap();

        assert_eq!(
            report.classes,
            vec![
                ClassAugmentation {
                    class: "China_Apple".into(),
                    before: 1,
                    added: 2,
                },
                ClassAugmentation {
                    class: "Vietnam_Mango".into(),
                    before: 3,
                    added: 0,
                },
                ClassAugmentation {
                    class: "misc".into(),
                    before: 1,
                    added: 2,
                },
            ]
        );
        assert_eq!(report.total_added(), 4);
    }

    #[test]
    fn mislabelled_extension_is_decoded_by_content() {
        let root = tempfile::tempdir().unwrap();
        let class_dir = root.path().join("China_Apple");
        write_images(&class_dir, &["photo.png"]);
        fs::rename(class_dir.join("photo.png"), class_dir.join("photo.jpg")).unwrap();

        let transform = Counting::default();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let added = augment_class(&class_dir, 5, &transform, &mut rng).unwrap();

        assert_eq!(added, 4);
        assert_eq!(transform.calls.get(), 4);
        assert_eq!(list_images(&class_dir).unwrap().len(), 5);
    }

    #[test]
    fn undecodable_sources_are_dropped_from_the_pool() {
        let root = tempfile::tempdir().unwrap();
        let class_dir = root.path().join("Vietnam_Mango");
        write_images(&class_dir, &["good.png"]);
        fs::write(class_dir.join("broken.jpg"), b"truncated download").unwrap();

        let transform = Counting::default();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let added = augment_class(&class_dir, 6, &transform, &mut rng).unwrap();

        assert_eq!(added, 4);
        assert!(fs::read(class_dir.join("broken.jpg")).is_ok());
        assert_eq!(list_images(&class_dir).unwrap().len(), 6);
    }

    #[test]
    fn class_without_decodable_images_stops_early() {
        let root = tempfile::tempdir().unwrap();
        write_images(&root.path().join("China_Apple"), &["a.png"]);
        let broken = root.path().join("China_Pear");
        fs::create_dir_all(&broken).unwrap();
        fs::write(broken.join("x.png"), b"not a png").unwrap();

        let transform = Counting::default();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let report = augment_dataset(root.path(), 3, &transform, &mut rng).unwrap();

        assert_eq!(report.classes[0].added, 2);
        assert_eq!(report.classes[1].added, 0);
        assert_eq!(list_images(&broken).unwrap().len(), 1);
    }
}
