use super::scanner::FileEntry;
use crate::error::{Result, SyncError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// Skip - destination is not older than source
    Skip,
    /// Create - destination file is missing
    Create,
    /// Update - destination file is strictly older
    Update,
}

#[derive(Debug)]
pub struct SyncTask {
    pub source_path: PathBuf,
    pub dest_path: PathBuf,
    pub action: SyncAction,
}

impl SyncTask {
    pub fn needs_transfer(&self) -> bool {
        self.action != SyncAction::Skip
    }
}

/// Decides per file whether the destination copy is out of date
///
/// Only modification times are compared. Equal mtimes count as in sync, so
/// a file copied with its mtime preserved is never copied back.
#[derive(Debug, Default)]
pub struct StrategyPlanner;

impl StrategyPlanner {
    pub fn new() -> Self {
        Self
    }

    /// Plan one source entry against `dest_root`
    ///
    /// Returns `None` for directories and for symlinks that resolve to a
    /// directory; those are never copied on their own.
    pub fn plan_file(&self, source: &FileEntry, dest_root: &Path) -> Result<Option<SyncTask>> {
        if source.is_dir {
            return Ok(None);
        }

        let source_mtime = if source.is_symlink {
            // Compare what the link points at, like the copy will
            let target = std::fs::metadata(&source.path).map_err(|e| SyncError::MetadataError {
                path: source.path.clone(),
                source: e,
            })?;
            if target.is_dir() {
                return Ok(None);
            }
            target.modified().map_err(|e| SyncError::MetadataError {
                path: source.path.clone(),
                source: e,
            })?
        } else {
            source.modified
        };

        let dest_path = dest_root.join(&source.relative_path);

        let action = match std::fs::metadata(&dest_path) {
            Ok(dest_meta) => {
                let dest_mtime = dest_meta.modified().map_err(|e| SyncError::MetadataError {
                    path: dest_path.clone(),
                    source: e,
                })?;
                if Self::needs_update(source_mtime, dest_mtime) {
                    SyncAction::Update
                } else {
                    SyncAction::Skip
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => SyncAction::Create,
            Err(e) => {
                return Err(SyncError::MetadataError {
                    path: dest_path,
                    source: e,
                })
            }
        };

        Ok(Some(SyncTask {
            source_path: source.path.clone(),
            dest_path,
            action,
        }))
    }

    /// Strictly newer source wins; ties are already in sync
    fn needs_update(source_mtime: SystemTime, dest_mtime: SystemTime) -> bool {
        source_mtime > dest_mtime
    }
}
