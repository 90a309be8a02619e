use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Source path not found: {path}\nMake sure the path exists and you have read permissions.")]
    SourceNotFound { path: PathBuf },

    #[error("Destination path not found: {path}\nCreate the directory before syncing.")]
    DestinationNotFound { path: PathBuf },

    #[error("Not a directory: {path}\nBoth sync roots must be directories.")]
    NotADirectory { path: PathBuf },

    #[error("Mirroring requires a reference side (--reference source|destination)")]
    MirrorWithoutReference,

    #[error("Failed to read directory entry {path}: {source}")]
    WalkError {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("Failed to read metadata for {path}: {source}")]
    MetadataError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid path: {path}\nPath is not located under the sync root.")]
    InvalidPath { path: PathBuf },

    #[error("Ignored extension must not be empty")]
    EmptyIgnorePattern,
}

impl SyncError {
    /// Path the error refers to, if any
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::SourceNotFound { path }
            | Self::DestinationNotFound { path }
            | Self::NotADirectory { path }
            | Self::WalkError { path, .. }
            | Self::MetadataError { path, .. }
            | Self::InvalidPath { path } => Some(path),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
