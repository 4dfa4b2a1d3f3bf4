//! Error types for selectzip

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for selectzip operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Invalid root directory: {}", .0.display())]
    InvalidRoot(PathBuf),

    #[error("Failed to open output file {}: {source}", path.display())]
    ArchiveOpen {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("Failed to create source for {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid compression level {0} (expected 1-9)")]
    InvalidCompressionLevel(u32),

    #[error("Entry already exists: {0}")]
    EntryExists(String),

    #[error("Invalid entry index: {0}")]
    InvalidIndex(usize),

    #[error("Filesystem error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Failed to write zip file {}: {source}", path.display())]
    Finalize {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

/// Result type alias for selectzip operations
pub type Result<T> = std::result::Result<T, Error>;
