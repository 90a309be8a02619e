use crate::error::{Result, SyncError};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::{DirEntry, WalkDir};

/// One entry below a sync root, read fresh from disk
///
/// Metadata is taken without following symlinks, so a link shows up as
/// `is_symlink` with the link's own mtime.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub path: PathBuf,
    pub relative_path: PathBuf,
    pub modified: SystemTime,
    pub is_dir: bool,
    pub is_symlink: bool,
}

/// Walks a directory tree and yields every entry below the root
///
/// Shared by the differ (parents first) and the mirror pruner (children
/// first). The walk is lazy and keeps going after a bad entry: failures
/// come out as `Err` items in place of that entry.
pub struct Scanner {
    root: PathBuf,
    contents_first: bool,
}

impl Scanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            contents_first: false,
        }
    }

    /// Yield a directory's children before the directory itself
    pub fn contents_first(mut self, yes: bool) -> Self {
        self.contents_first = yes;
        self
    }

    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry>> + '_ {
        WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(false)
            .contents_first(self.contents_first)
            .into_iter()
            .map(move |result| self.to_entry(result))
    }

    /// Collect the whole tree, failing on the first bad entry
    #[allow(dead_code)] // Used by tests
    pub fn scan(&self) -> Result<Vec<FileEntry>> {
        self.walk().collect()
    }

    fn to_entry(&self, result: walkdir::Result<DirEntry>) -> Result<FileEntry> {
        let entry = result.map_err(|e| SyncError::WalkError {
            path: e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.root.clone()),
            source: e,
        })?;

        let path = entry.path().to_path_buf();
        let metadata = entry.metadata().map_err(|e| SyncError::MetadataError {
            path: path.clone(),
            source: e.into(),
        })?;

        let relative_path = path
            .strip_prefix(&self.root)
            .map_err(|_| SyncError::InvalidPath { path: path.clone() })?
            .to_path_buf();

        Ok(FileEntry {
            modified: metadata.modified().map_err(|e| SyncError::MetadataError {
                path: path.clone(),
                source: e,
            })?,
            is_dir: metadata.is_dir(),
            is_symlink: entry.path_is_symlink(),
            path,
            relative_path,
        })
    }
}
