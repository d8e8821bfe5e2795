//! Error type shared by the library.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// The dataset root does not exist or is not a directory.
    #[error("Directory '{}' not found", .0.display())]
    MissingRoot(PathBuf),

    /// An integer ID appeared twice in a metadata file.
    #[error("{}:{line}: the same ID can only appear once (ID {id})", .file.display())]
    DuplicateId { file: PathBuf, line: usize, id: u32 },

    #[error("{}:{line}: malformed entry {content:?}", .file.display())]
    MalformedLine {
        file: PathBuf,
        line: usize,
        content: String,
    },

    /// A class label outside `1..=200`, or not a number at all.
    #[error("{}: image {id} has class {class:?}, expected 1 to 200", .file.display())]
    InvalidClass {
        file: PathBuf,
        id: u32,
        class: String,
    },

    /// An ID listed in the split file has no counterpart in another file.
    #[error("ID {id} has no entry in {}", .file.display())]
    MissingId { file: PathBuf, id: u32 },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, Error>;
