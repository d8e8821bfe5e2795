//! CUB-200-2011 train/test lists built from the dataset's metadata files.
//!
//! ```text
//! root/CUB_200_2011/images.txt               <id> <relative image path>
//! root/CUB_200_2011/train_test_split.txt     <id> <1 = train, otherwise test>
//! root/CUB_200_2011/image_class_labels.txt   <id> <1-based class id>
//! ```

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Error, Result};
use crate::read_lines;
use crate::split::Split;

mod classes;

pub use classes::CLASSES;

pub const DATASET_DIR: &str = "CUB_200_2011";
pub const IMAGES_FILE: &str = "images.txt";
pub const SPLIT_FILE: &str = "train_test_split.txt";
pub const LABELS_FILE: &str = "image_class_labels.txt";

#[derive(Debug, Clone)]
pub struct Cub200 {
    pub root: PathBuf,
    pub train: Split,
    pub test: Split,
}

impl Cub200 {
    pub fn load<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let base = root.join(DATASET_DIR);
        let images_file = base.join(IMAGES_FILE);
        let labels_file = base.join(LABELS_FILE);

        let id2image = read_id_map(&images_file)?;
        let id2train = read_id_map(base.join(SPLIT_FILE))?;
        let id2class = read_id_map(&labels_file)?;

        let images_dir = base.join("images");
        let mut train = Split::default();
        let mut test = Split::default();

        // BTreeMap iteration gives ascending IDs.
        for (id, flag) in &id2train {
            let image = id2image.get(id).ok_or_else(|| Error::MissingId {
                file: images_file.clone(),
                id: *id,
            })?;
            let class = id2class.get(id).ok_or_else(|| Error::MissingId {
                file: labels_file.clone(),
                id: *id,
            })?;
            let target = parse_target(class, *id, &labels_file)?;

            let split = if flag == "1" { &mut train } else { &mut test };
            split.push(images_dir.join(image), target);
        }

        info!(
            "CUB-200 loaded: {} training, {} testing",
            train.len(),
            test.len()
        );
        Ok(Self { root, train, test })
    }

    pub fn class_names(&self) -> &'static [&'static str] {
        &CLASSES
    }

    pub fn train_data(&self) -> (&[PathBuf], &[usize]) {
        (&self.train.data, &self.train.targets)
    }

    pub fn test_data(&self) -> (&[PathBuf], &[usize]) {
        (&self.test.data, &self.test.targets)
    }
}

/// 1-based class label to 0-based target.
fn parse_target(class: &str, id: u32, file: &Path) -> Result<usize> {
    match class.parse::<usize>() {
        Ok(class_id) if (1..=CLASSES.len()).contains(&class_id) => Ok(class_id - 1),
        _ => Err(Error::InvalidClass {
            file: file.to_path_buf(),
            id,
            class: class.to_string(),
        }),
    }
}

/// {id: value, ...} from a `<id> <value>` file.
pub fn read_id_map<P: AsRef<Path>>(path: P) -> Result<BTreeMap<u32, String>> {
    let path = path.as_ref();
    parse_id_map(read_lines(path)?, path)
}

/// Parses `<id> <value>` lines. Blank lines are skipped; a repeated ID is fatal.
///
/// `file` is only used for error messages.
pub fn parse_id_map<I>(lines: I, file: &Path) -> Result<BTreeMap<u32, String>>
where
    I: IntoIterator<Item = io::Result<String>>,
{
    let mut map = BTreeMap::new();
    for (i, line) in lines.into_iter().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let malformed = || Error::MalformedLine {
            file: file.to_path_buf(),
            line: i + 1,
            content: line.clone(),
        };
        let (id, value) = trimmed
            .split_once(char::is_whitespace)
            .ok_or_else(malformed)?;
        let id: u32 = id.parse().map_err(|_| malformed())?;
        let value = value.trim();
        if value.is_empty() {
            return Err(malformed());
        }

        if map.insert(id, value.to_string()).is_some() {
            return Err(Error::DuplicateId {
                file: file.to_path_buf(),
                line: i + 1,
                id,
            });
        }
    }
    Ok(map)
}
