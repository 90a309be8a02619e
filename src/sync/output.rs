use super::SyncMode;
use serde::Serialize;
use std::path::PathBuf;

/// Everything a sync run reports, one value per significant event
///
/// Serializes to NDJSON for `--json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    RunStart {
        source: PathBuf,
        destination: PathBuf,
        mode: SyncMode,
        mirror: bool,
        dry_run: bool,
        started_at: String,
    },
    /// One directional copy pass begins
    Pass {
        from: PathBuf,
        to: PathBuf,
    },
    /// Mirror pruning begins
    Prune {
        reference: PathBuf,
        target: PathBuf,
    },
    Copied {
        source: PathBuf,
        destination: PathBuf,
    },
    WouldCopy {
        source: PathBuf,
        destination: PathBuf,
    },
    /// Source matched an ignored extension
    Skipped {
        source: PathBuf,
        destination: PathBuf,
    },
    Denied {
        source: PathBuf,
        destination: PathBuf,
        error: String,
    },
    CopyFailed {
        source: PathBuf,
        destination: PathBuf,
        error: String,
    },
    /// An entry could not be enumerated or compared
    ScanError {
        path: PathBuf,
        error: String,
    },
    Deleted {
        path: PathBuf,
        is_dir: bool,
    },
    WouldDelete {
        path: PathBuf,
        is_dir: bool,
    },
    DeleteFailed {
        path: PathBuf,
        is_dir: bool,
        error: String,
    },
    /// Extra directory left in place because it holds ignored files
    DirectoryKept {
        path: PathBuf,
    },
    Summary {
        files_scanned: usize,
        files_copied: usize,
        files_would_copy: usize,
        files_up_to_date: usize,
        files_ignored: usize,
        files_denied: usize,
        copy_failures: usize,
        scan_errors: usize,
        files_deleted: usize,
        dirs_deleted: usize,
        would_delete: usize,
        delete_failures: usize,
        dirs_kept: usize,
        duration_secs: f64,
    },
}

impl SyncEvent {
    /// Emit this event as JSON to stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    /// True for the per-item failures that make a run "completed with errors"
    #[allow(dead_code)] // Used by tests
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::Denied { .. }
                | Self::CopyFailed { .. }
                | Self::ScanError { .. }
                | Self::DeleteFailed { .. }
        )
    }
}

/// Sink for sync events
///
/// Components never log on their own; they hand every event to the
/// reporter they were given.
pub trait Reporter {
    fn report(&self, event: &SyncEvent);
}

/// Reporter backed by `tracing`, optionally echoing NDJSON to stdout
pub struct LogReporter {
    json: bool,
}

impl LogReporter {
    pub fn new(json: bool) -> Self {
        Self { json }
    }
}

impl Reporter for LogReporter {
    fn report(&self, event: &SyncEvent) {
        match event {
            SyncEvent::RunStart {
                source,
                destination,
                mode,
                mirror,
                dry_run,
                started_at,
            } => {
                tracing::info!("=== Sync started at {} ===", started_at);
                tracing::info!(
                    src = %source.display(),
                    dst = %destination.display(),
                    mirror,
                    dry_run,
                    "Mode: {}",
                    mode.description()
                );
                if *mirror {
                    tracing::info!("Mirror mode: extra files in the target will be deleted");
                }
            }
            SyncEvent::Pass { from, to } => {
                tracing::info!("Syncing from {} to {}", from.display(), to.display());
            }
            SyncEvent::Prune { reference, target } => {
                tracing::info!(
                    "Pruning {} against reference {}",
                    target.display(),
                    reference.display()
                );
            }
            SyncEvent::Copied {
                source,
                destination,
            } => {
                tracing::info!(src = %source.display(), dst = %destination.display(), "Copied");
            }
            SyncEvent::WouldCopy {
                source,
                destination,
            } => {
                tracing::info!(
                    src = %source.display(),
                    dst = %destination.display(),
                    "[Dry-run] Would copy"
                );
            }
            SyncEvent::Skipped {
                source,
                destination,
            } => {
                tracing::info!(
                    src = %source.display(),
                    dst = %destination.display(),
                    "Skipped ignored file"
                );
            }
            SyncEvent::Denied {
                source,
                destination,
                error,
            } => {
                tracing::warn!(
                    src = %source.display(),
                    dst = %destination.display(),
                    "Permission denied: {}",
                    error
                );
            }
            SyncEvent::CopyFailed {
                source,
                destination,
                error,
            } => {
                tracing::error!(
                    src = %source.display(),
                    dst = %destination.display(),
                    "Failed to copy: {}",
                    error
                );
            }
            SyncEvent::ScanError { path, error } => {
                tracing::error!(path = %path.display(), "Error comparing entry: {}", error);
            }
            SyncEvent::Deleted { path, is_dir } => {
                if *is_dir {
                    tracing::info!(path = %path.display(), "Deleted extra directory");
                } else {
                    tracing::info!(path = %path.display(), "Deleted extra file");
                }
            }
            SyncEvent::WouldDelete { path, is_dir } => {
                if *is_dir {
                    tracing::info!(path = %path.display(), "[Dry-run] Would delete directory");
                } else {
                    tracing::info!(path = %path.display(), "[Dry-run] Would delete file");
                }
            }
            SyncEvent::DeleteFailed {
                path,
                is_dir,
                error,
            } => {
                let kind = if *is_dir { "directory" } else { "file" };
                tracing::error!(path = %path.display(), "Failed to delete {}: {}", kind, error);
            }
            SyncEvent::DirectoryKept { path } => {
                tracing::info!(
                    path = %path.display(),
                    "Kept extra directory containing ignored files"
                );
            }
            SyncEvent::Summary {
                files_copied,
                files_would_copy,
                files_deleted,
                dirs_deleted,
                would_delete,
                duration_secs,
                ..
            } => {
                tracing::info!(
                    files_copied,
                    files_would_copy,
                    files_deleted,
                    dirs_deleted,
                    would_delete,
                    errors = event_errors(event),
                    "Sync complete. Duration: {:.3}s",
                    duration_secs
                );
            }
        }

        if self.json {
            event.emit();
        }
    }
}

fn event_errors(event: &SyncEvent) -> usize {
    match event {
        SyncEvent::Summary {
            files_denied,
            copy_failures,
            scan_errors,
            delete_failures,
            ..
        } => files_denied + copy_failures + scan_errors + delete_failures,
        _ => 0,
    }
}

/// Reporter that keeps every event in memory
#[cfg(test)]
#[derive(Default)]
pub struct CollectingReporter {
    events: std::cell::RefCell<Vec<SyncEvent>>,
}

#[cfg(test)]
impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&SyncEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| pred(e)).count()
    }
}

#[cfg(test)]
impl Reporter for CollectingReporter {
    fn report(&self, event: &SyncEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
