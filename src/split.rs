use std::fs;
use std::io;
use std::io::prelude::*;
use std::path::{Path, PathBuf};

/// Image paths and their 0-based class targets, index-aligned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Split {
    pub data: Vec<PathBuf>,
    pub targets: Vec<usize>,
}

impl Split {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Writes one `<path> <target>` line per sample.
    pub fn write_list<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut buffer = io::BufWriter::new(fs::File::create(path)?);
        for (image, target) in self.data.iter().zip(&self.targets) {
            writeln!(buffer, "{} {}", image.display(), target)?;
        }
        buffer.flush()
    }

    pub(crate) fn push(&mut self, path: PathBuf, target: usize) {
        self.data.push(path);
        self.targets.push(target);
    }
}
