use super::output::{Reporter, SyncEvent};
use super::RunConfig;
use crate::filter::IgnoreFilter;
use filetime::FileTime;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// Suffix of the in-flight copy; it ends in `.tmp`, so the default filter skips strays
const TEMP_SUFFIX: &str = ".mtsync.tmp";

/// Result of one file transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Source matched an ignored extension, nothing touched
    Skipped,
    /// Dry run, nothing touched
    WouldCopy,
    Copied,
    Denied(String),
    Failed(String),
}

/// Result of one removal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    WouldDelete,
    Failed(String),
}

/// Performs (or, in a dry run, announces) single-file copies and removals
///
/// Failures are turned into outcomes and reported; nothing here returns an
/// error, so one bad file never stops the batch.
pub struct Transferrer<'a> {
    ignore: &'a IgnoreFilter,
    dry_run: bool,
    reporter: &'a dyn Reporter,
}

impl<'a> Transferrer<'a> {
    pub fn new(config: &'a RunConfig, reporter: &'a dyn Reporter) -> Self {
        Self {
            ignore: &config.ignore,
            dry_run: config.dry_run,
            reporter,
        }
    }

    /// Copy `source` to `dest`, creating parent directories and preserving mtime
    pub fn transfer(&self, source: &Path, dest: &Path) -> TransferOutcome {
        let outcome = if self.ignore.is_ignored_path(source) {
            TransferOutcome::Skipped
        } else if self.dry_run {
            TransferOutcome::WouldCopy
        } else {
            match copy_file(source, dest) {
                Ok(()) => TransferOutcome::Copied,
                Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                    TransferOutcome::Denied(e.to_string())
                }
                Err(e) => TransferOutcome::Failed(e.to_string()),
            }
        };

        let source = source.to_path_buf();
        let destination = dest.to_path_buf();
        let event = match &outcome {
            TransferOutcome::Skipped => SyncEvent::Skipped {
                source,
                destination,
            },
            TransferOutcome::WouldCopy => SyncEvent::WouldCopy {
                source,
                destination,
            },
            TransferOutcome::Copied => SyncEvent::Copied {
                source,
                destination,
            },
            TransferOutcome::Denied(error) => SyncEvent::Denied {
                source,
                destination,
                error: error.clone(),
            },
            TransferOutcome::Failed(error) => SyncEvent::CopyFailed {
                source,
                destination,
                error: error.clone(),
            },
        };
        self.reporter.report(&event);

        outcome
    }

    /// Delete a file, or a directory with everything below it
    pub fn delete(&self, path: &Path, is_dir: bool) -> DeleteOutcome {
        let outcome = if self.dry_run {
            DeleteOutcome::WouldDelete
        } else {
            let result = if is_dir {
                fs::remove_dir_all(path)
            } else {
                fs::remove_file(path)
            };
            match result {
                Ok(()) => DeleteOutcome::Deleted,
                Err(e) => DeleteOutcome::Failed(e.to_string()),
            }
        };

        let path = path.to_path_buf();
        let event = match &outcome {
            DeleteOutcome::Deleted => SyncEvent::Deleted { path, is_dir },
            DeleteOutcome::WouldDelete => SyncEvent::WouldDelete { path, is_dir },
            DeleteOutcome::Failed(error) => SyncEvent::DeleteFailed {
                path,
                is_dir,
                error: error.clone(),
            },
        };
        self.reporter.report(&event);

        outcome
    }
}

/// Sibling that receives the data before it is renamed over `dest`
fn temp_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{}{}", name, TEMP_SUFFIX))
}

/// Copy into a temp sibling, stamp its times, then rename it over `dest`
///
/// `dest` is either left as it was or fully replaced; a failed copy never
/// leaves a truncated file carrying a fresh mtime.
fn copy_file(source: &Path, dest: &Path) -> io::Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let source_meta = fs::metadata(source)?;
    let temp = temp_path(dest);

    let result = fs::copy(source, &temp)
        .and_then(|_| {
            // Preserve access and modification times
            let mtime = FileTime::from_last_modification_time(&source_meta);
            let atime = FileTime::from_last_access_time(&source_meta);
            filetime::set_file_times(&temp, atime, mtime)
        })
        .and_then(|_| fs::rename(&temp, dest));

    if result.is_err() {
        let _ = fs::remove_file(&temp);
    }
    result
}
