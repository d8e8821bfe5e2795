//! Sample counts per class directory and the aggregated views built from them.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::label::{parse_label, ClassLabel};
use crate::{list_images, list_subdirs};

/// Number of image files directly inside `dir`.
pub fn count_images<P: AsRef<Path>>(dir: P) -> Result<usize> {
    Ok(list_images(dir)?.len())
}

/// {directory name: image count, ...} for every subdirectory of `root`,
/// whether or not its name parses as a label.
pub fn count_class_dirs<P: AsRef<Path>>(root: P) -> Result<BTreeMap<String, usize>> {
    let root = root.as_ref();
    ensure_root(root)?;

    let mut counts = BTreeMap::new();
    for (name, path) in list_subdirs(root)? {
        counts.insert(name, count_images(&path)?);
    }
    Ok(counts)
}

/// One parsed class directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassCount {
    pub dir_name: String,
    pub label: ClassLabel,
    pub samples: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DatasetSummary {
    pub classes: Vec<ClassCount>,
    /// Directory names that did not parse as `Country_Fruit` / `Country-Fruit`.
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleStatistics {
    pub total: usize,
    pub mean: f64,
    pub min: usize,
    pub max: usize,
}

/// Scans `root` and counts the samples of every class directory.
pub fn scan_dataset<P: AsRef<Path>>(root: P) -> Result<DatasetSummary> {
    let root = root.as_ref();
    ensure_root(root)?;

    let mut summary = DatasetSummary::default();
    for (name, path) in list_subdirs(root)? {
        let Some(label) = parse_label(&name) else {
            warn!(
                "skipping '{}': not a Country_Fruit or Country-Fruit name",
                name
            );
            summary.skipped.push(name);
            continue;
        };
        let samples = count_images(&path)?;
        debug!("{} -> {} ({} samples)", name, label, samples);
        summary.classes.push(ClassCount {
            dir_name: name,
            label,
            samples,
        });
    }
    Ok(summary)
}

impl DatasetSummary {
    pub fn from_classes(classes: Vec<ClassCount>) -> Self {
        Self {
            classes,
            skipped: Vec::new(),
        }
    }

    /// {country: {fruit: samples, ...}, ...}
    ///
    /// Directories that normalize to the same label are summed.
    pub fn samples_by_country(&self) -> BTreeMap<String, BTreeMap<String, usize>> {
        self.by_country(|class| class.samples)
    }

    /// {country: {fruit: number of class directories, ...}, ...}
    pub fn directories_by_country(&self) -> BTreeMap<String, BTreeMap<String, usize>> {
        self.by_country(|_| 1)
    }

    /// {"Country-Fruit": samples, ...}
    pub fn samples_by_class(&self) -> BTreeMap<String, usize> {
        let mut out = BTreeMap::new();
        for class in &self.classes {
            *out.entry(class.label.to_string()).or_insert(0) += class.samples;
        }
        out
    }

    /// Total, mean, min and max over [`Self::samples_by_class`]; `None` without classes.
    pub fn statistics(&self) -> Option<SampleStatistics> {
        let counts = self.samples_by_class();
        let min = *counts.values().min()?;
        let max = *counts.values().max()?;
        let total: usize = counts.values().sum();
        Some(SampleStatistics {
            total,
            mean: total as f64 / counts.len() as f64,
            min,
            max,
        })
    }

    /// Every fruit seen under any country, sorted.
    pub fn fruits(&self) -> Vec<String> {
        let mut fruits: Vec<String> = self.classes.iter().map(|c| c.label.fruit.clone()).collect();
        fruits.sort();
        fruits.dedup();
        fruits
    }

    fn by_country<F>(&self, weight: F) -> BTreeMap<String, BTreeMap<String, usize>>
    where
        F: Fn(&ClassCount) -> usize,
    {
        let mut out: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
        for class in &self.classes {
            *out.entry(class.label.country.clone())
                .or_default()
                .entry(class.label.fruit.clone())
                .or_insert(0) += weight(class);
        }
        out
    }
}

fn ensure_root(root: &Path) -> Result<()> {
    if root.is_dir() {
        Ok(())
    } else {
        Err(Error::MissingRoot(root.to_path_buf()))
    }
}
