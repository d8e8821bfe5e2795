//! Image-folder view of the fruits dataset with a random proportional split.
//!
//! Every subdirectory of the root is a class; classes are indexed in sorted
//! name order and samples are the image files directly inside each class.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::label::{parse_label, ClassLabel};
use crate::split::Split;
use crate::{list_images, list_subdirs, open_rgb};

pub const DEFAULT_TRAIN_SPLIT: f64 = 0.8;
/// Input side length expected by the downstream CLIP backbone.
pub const IMAGE_SIZE: u32 = 224;
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

#[derive(Debug, Clone)]
pub struct Fruits {
    pub root: PathBuf,
    pub classes: Vec<String>,
    pub class_to_idx: BTreeMap<String, usize>,
    pub train: Split,
    pub test: Split,
}

impl Fruits {
    /// Loads the tree under `root` and splits it `train_split` / `1 - train_split`.
    pub fn load<P, R>(root: P, train_split: f64, rng: &mut R) -> Result<Self>
    where
        P: AsRef<Path>,
        R: Rng + ?Sized,
    {
        if !(0.0..=1.0).contains(&train_split) {
            return Err(Error::InvalidArgument(format!(
                "train split must be within [0, 1], got {}",
                train_split
            )));
        }
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(Error::MissingRoot(root));
        }

        let mut classes = Vec::new();
        let mut class_to_idx = BTreeMap::new();
        let mut samples: Vec<(PathBuf, usize)> = Vec::new();
        for (idx, (name, path)) in list_subdirs(&root)?.into_iter().enumerate() {
            let images = list_images(&path)?;
            if images.is_empty() {
                warn!("class '{}' has no images, it keeps index {}", name, idx);
            }
            samples.extend(images.into_iter().map(|image| (image, idx)));
            class_to_idx.insert(name.clone(), idx);
            classes.push(name);
        }

        let total = samples.len();
        let train_size = (train_split * total as f64) as usize;
        samples.shuffle(rng);
        let test_samples = samples.split_off(train_size);

        let train = into_split(samples);
        let test = into_split(test_samples);
        info!(
            "Dataset loaded: {} training, {} testing",
            train.len(),
            test.len()
        );
        info!("Number of classes: {}", classes.len());

        Ok(Self {
            root,
            classes,
            class_to_idx,
            train,
            test,
        })
    }

    pub fn class_names(&self) -> &[String] {
        &self.classes
    }

    /// Class names parsed as country/fruit labels, `None` where a name does not parse.
    pub fn class_labels(&self) -> Vec<Option<ClassLabel>> {
        self.classes.iter().map(|c| parse_label(c)).collect()
    }

    /// Classes without a single sample in either split, in index order.
    pub fn empty_classes(&self) -> Vec<&str> {
        let mut counts = vec![0usize; self.classes.len()];
        for &target in self.train.targets.iter().chain(&self.test.targets) {
            counts[target] += 1;
        }
        self.classes
            .iter()
            .zip(counts)
            .filter(|(_, n)| *n == 0)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn train_data(&self) -> (&[PathBuf], &[usize]) {
        (&self.train.data, &self.train.targets)
    }

    pub fn test_data(&self) -> (&[PathBuf], &[usize]) {
        (&self.test.data, &self.test.targets)
    }

    /// Training sample `index` as an [`IMAGE_SIZE`] tensor, with its target.
    pub fn train_sample(&self, index: usize) -> Result<(Vec<f32>, usize)> {
        load_sample(&self.train, index)
    }

    pub fn test_sample(&self, index: usize) -> Result<(Vec<f32>, usize)> {
        load_sample(&self.test, index)
    }
}

fn load_sample(split: &Split, index: usize) -> Result<(Vec<f32>, usize)> {
    let (Some(path), Some(&target)) = (split.data.get(index), split.targets.get(index)) else {
        return Err(Error::InvalidArgument(format!(
            "sample {} out of range, the split holds {}",
            index,
            split.len()
        )));
    };
    Ok((load_normalized(path, IMAGE_SIZE)?, target))
}

fn into_split(samples: Vec<(PathBuf, usize)>) -> Split {
    let (data, targets) = samples.into_iter().unzip();
    Split { data, targets }
}

/// Loads an image as a `3 x size x size` CHW tensor, normalized with the
/// ImageNet mean and standard deviation.
pub fn load_normalized<P: AsRef<Path>>(path: P, size: u32) -> Result<Vec<f32>> {
    let image = imageops::resize(&open_rgb(path)?, size, size, FilterType::Triangle);

    let plane = (size * size) as usize;
    let mut tensor = vec![0.0; 3 * plane];
    for (x, y, pixel) in image.enumerate_pixels() {
        let offset = (y * size + x) as usize;
        for c in 0..3 {
            let value = pixel.0[c] as f32 / 255.0;
            tensor[c * plane + offset] = (value - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
        }
    }
    Ok(tensor)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::fs;

    use image::{Rgb, RgbImage};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn build_tree(root: &Path, classes: &[(&str, usize)]) {
        for (class, n) in classes {
            let dir = root.join(class);
            fs::create_dir_all(&dir).unwrap();
            for i in 0..*n {
                RgbImage::from_pixel(2, 2, Rgb([i as u8, 0, 0]))
                    .save(dir.join(format!("{i}.png")))
                    .unwrap();
            }
        }
    }

    #[test]
    fn split_sizes_follow_the_ratio() {
        let root = tempfile::tempdir().unwrap();
        build_tree(
            root.path(),
            &[
                ("Vietnam_Mango", 7),
                ("China_Apple", 5),
                ("Thailand-Durian", 3),
            ],
        );

        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let fruits = Fruits::load(root.path(), 0.8, &mut rng).unwrap();

        assert_eq!(fruits.train.len(), 12);
        assert_eq!(fruits.test.len(), 3);
        assert_eq!(
            fruits.classes,
            vec!["China_Apple", "Thailand-Durian", "Vietnam_Mango"]
        );
        assert_eq!(fruits.class_to_idx["Vietnam_Mango"], 2);

        let all: HashSet<_> = fruits.train.data.iter().chain(&fruits.test.data).collect();
        assert_eq!(all.len(), 15);
    }

    #[test]
    fn targets_match_the_class_directory() {
        let root = tempfile::tempdir().unwrap();
        build_tree(root.path(), &[("China_Apple", 4), ("Vietnam_Mango", 4)]);

        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let fruits = Fruits::load(root.path(), 0.5, &mut rng).unwrap();
        for (path, target) in fruits.train.data.iter().zip(&fruits.train.targets) {
            let class = path.parent().unwrap().file_name().unwrap();
            let class = class.to_str().unwrap();
            assert_eq!(fruits.class_to_idx[class], *target);
        }
    }

    #[test]
    fn same_seed_same_split() {
        let root = tempfile::tempdir().unwrap();
        build_tree(root.path(), &[("China_Apple", 6), ("Vietnam_Mango", 6)]);

        let a = Fruits::load(root.path(), 0.8, &mut ChaCha8Rng::seed_from_u64(3)).unwrap();
        let b = Fruits::load(root.path(), 0.8, &mut ChaCha8Rng::seed_from_u64(3)).unwrap();
        assert_eq!(a.train, b.train);
        assert_eq!(a.test, b.test);
    }

    #[test]
    fn class_labels_use_the_shared_parser() {
        let root = tempfile::tempdir().unwrap();
        build_tree(root.path(), &[("chinese-apple", 1), ("misc", 1)]);

        let fruits = Fruits::load(root.path(), 1.0, &mut ChaCha8Rng::seed_from_u64(0)).unwrap();
        assert_eq!(
            fruits.class_labels(),
            vec![Some(ClassLabel::new("China", "Apple")), None]
        );
        assert!(fruits.test.is_empty());
    }

    #[test]
    fn out_of_range_split_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(matches!(
            Fruits::load(root.path(), 1.5, &mut rng),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn empty_class_keeps_its_index_and_is_reported() {
        let root = tempfile::tempdir().unwrap();
        build_tree(
            root.path(),
            &[
                ("China_Apple", 3),
                ("China_Lychee", 0),
                ("Vietnam_Mango", 2),
            ],
        );

        let fruits = Fruits::load(root.path(), 0.6, &mut ChaCha8Rng::seed_from_u64(1)).unwrap();
        assert_eq!(fruits.classes.len(), 3);
        assert_eq!(fruits.class_to_idx["China_Lychee"], 1);
        assert_eq!(fruits.class_to_idx["Vietnam_Mango"], 2);
        assert_eq!(fruits.empty_classes(), vec!["China_Lychee"]);
        assert_eq!(fruits.train.len() + fruits.test.len(), 5);
        assert!(!fruits.train.targets.contains(&1));
        assert!(!fruits.test.targets.contains(&1));
    }

    #[test]
    fn samples_decode_at_the_default_size() {
        let root = tempfile::tempdir().unwrap();
        build_tree(root.path(), &[("China_Apple", 2)]);
        // PNG content behind a .jpg name still loads.
        let dir = root.path().join("China_Apple");
        fs::rename(dir.join("1.png"), dir.join("1.jpg")).unwrap();

        let fruits = Fruits::load(root.path(), 0.5, &mut ChaCha8Rng::seed_from_u64(0)).unwrap();
        let (tensor, target) = fruits.train_sample(0).unwrap();
        assert_eq!(tensor.len(), 3 * IMAGE_SIZE as usize * IMAGE_SIZE as usize);
        assert_eq!(target, 0);
        assert_eq!(fruits.test_sample(0).unwrap().0.len(), tensor.len());
        assert!(matches!(
            fruits.test_sample(1),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn normalized_tensor_is_chw() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("white.png");
        RgbImage::from_pixel(5, 3, Rgb([255, 255, 255]))
            .save(&path)
            .unwrap();

        let tensor = load_normalized(&path, 4).unwrap();
        assert_eq!(tensor.len(), 3 * 4 * 4);
        let red = (1.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
        let blue = (1.0 - IMAGENET_MEAN[2]) / IMAGENET_STD[2];
        assert!((tensor[0] - red).abs() < 1e-5);
        assert!((tensor[2 * 16 + 15] - blue).abs() < 1e-5);
    }
}
