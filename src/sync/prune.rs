use super::output::{Reporter, SyncEvent};
use super::scanner::Scanner;
use super::transfer::Transferrer;
use super::SyncStats;
use crate::filter::IgnoreFilter;
use std::fs;
use std::path::Path;

/// Removes entries from a target tree that have no counterpart in a reference tree
///
/// The target is walked children-first so a directory is judged only after
/// everything inside it has been handled. An extra directory is removed
/// with all of its contents, unless it still holds ignored files, which are
/// never deleted.
pub struct Pruner<'a> {
    ignore: &'a IgnoreFilter,
    transferrer: &'a Transferrer<'a>,
    reporter: &'a dyn Reporter,
}

impl<'a> Pruner<'a> {
    pub fn new(
        ignore: &'a IgnoreFilter,
        transferrer: &'a Transferrer<'a>,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            ignore,
            transferrer,
            reporter,
        }
    }

    pub fn prune(&self, reference_root: &Path, target_root: &Path, stats: &mut SyncStats) {
        for entry in Scanner::new(target_root).contents_first(true).walk() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    stats.record_scan_error(self.reporter, target_root, &e);
                    continue;
                }
            };

            // Dangling links in the reference still count as present
            if fs::symlink_metadata(reference_root.join(&entry.relative_path)).is_ok() {
                continue;
            }

            if entry.is_dir {
                if self.holds_ignored_files(&entry.path, stats) {
                    self.reporter.report(&SyncEvent::DirectoryKept {
                        path: entry.path.clone(),
                    });
                    stats.dirs_kept += 1;
                    continue;
                }
                let outcome = self.transferrer.delete(&entry.path, true);
                stats.record_delete(&outcome, true);
            } else if !self.ignore.is_ignored_path(&entry.path) {
                let outcome = self.transferrer.delete(&entry.path, false);
                stats.record_delete(&outcome, false);
            }
        }
    }

    /// True if anything below `dir` is ignored, or if part of it cannot be read
    fn holds_ignored_files(&self, dir: &Path, stats: &mut SyncStats) -> bool {
        let mut holds = false;
        for entry in Scanner::new(dir).walk() {
            match entry {
                Ok(entry) => {
                    if !entry.is_dir && self.ignore.is_ignored_path(&entry.path) {
                        return true;
                    }
                }
                Err(e) => {
                    // Unknown contents, so never removed wholesale
                    stats.record_scan_error(self.reporter, dir, &e);
                    holds = true;
                }
            }
        }
        holds
    }
}
