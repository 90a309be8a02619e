pub mod output;
pub mod prune;
pub mod scanner;
pub mod strategy;
pub mod transfer;

use crate::cli::Reference;
use crate::error::{Result, SyncError};
use crate::filter::IgnoreFilter;
use output::{Reporter, SyncEvent};
use prune::Pruner;
use scanner::Scanner;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use strategy::StrategyPlanner;
use transfer::{DeleteOutcome, TransferOutcome, Transferrer};

/// Direction of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Source to destination, then destination to source
    Bidirectional,
    /// Source is authoritative
    ReferenceSource,
    /// Destination is authoritative
    ReferenceDestination,
}

impl SyncMode {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Bidirectional => "bi-directional sync",
            Self::ReferenceSource => "reference = source, syncing source -> destination only",
            Self::ReferenceDestination => {
                "reference = destination, syncing destination -> source only"
            }
        }
    }

    /// Copy passes as (from, to), in execution order
    pub fn passes<'p>(&self, source: &'p Path, destination: &'p Path) -> Vec<(&'p Path, &'p Path)> {
        match self {
            Self::Bidirectional => vec![(source, destination), (destination, source)],
            Self::ReferenceSource => vec![(source, destination)],
            Self::ReferenceDestination => vec![(destination, source)],
        }
    }

    /// (reference, target) for mirror pruning; `None` when both sides are authoritative
    pub fn mirror_pair<'p>(
        &self,
        source: &'p Path,
        destination: &'p Path,
    ) -> Option<(&'p Path, &'p Path)> {
        match self {
            Self::Bidirectional => None,
            Self::ReferenceSource => Some((source, destination)),
            Self::ReferenceDestination => Some((destination, source)),
        }
    }
}

impl From<Option<Reference>> for SyncMode {
    fn from(reference: Option<Reference>) -> Self {
        match reference {
            None => Self::Bidirectional,
            Some(Reference::Source) => Self::ReferenceSource,
            Some(Reference::Destination) => Self::ReferenceDestination,
        }
    }
}

/// Settings for one run, fixed once built
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub mode: SyncMode,
    pub mirror: bool,
    pub dry_run: bool,
    pub ignore: IgnoreFilter,
}

impl RunConfig {
    pub fn new(
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        mode: SyncMode,
        mirror: bool,
        dry_run: bool,
        ignore: IgnoreFilter,
    ) -> Result<Self> {
        if mirror && mode == SyncMode::Bidirectional {
            return Err(SyncError::MirrorWithoutReference);
        }
        Ok(Self {
            source: source.into(),
            destination: destination.into(),
            mode,
            mirror,
            dry_run,
            ignore,
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SyncStats {
    pub files_scanned: usize,
    pub files_copied: usize,
    pub files_would_copy: usize,
    pub files_up_to_date: usize,
    pub files_ignored: usize,
    pub files_denied: usize,
    pub copy_failures: usize,
    pub scan_errors: usize,
    pub files_deleted: usize,
    pub dirs_deleted: usize,
    pub would_delete: usize,
    pub delete_failures: usize,
    pub dirs_kept: usize,
    pub duration: Duration,
}

impl SyncStats {
    pub fn record_transfer(&mut self, outcome: &TransferOutcome) {
        match outcome {
            TransferOutcome::Skipped => self.files_ignored += 1,
            TransferOutcome::WouldCopy => self.files_would_copy += 1,
            TransferOutcome::Copied => self.files_copied += 1,
            TransferOutcome::Denied(_) => self.files_denied += 1,
            TransferOutcome::Failed(_) => self.copy_failures += 1,
        }
    }

    pub fn record_delete(&mut self, outcome: &DeleteOutcome, is_dir: bool) {
        match outcome {
            DeleteOutcome::Deleted if is_dir => self.dirs_deleted += 1,
            DeleteOutcome::Deleted => self.files_deleted += 1,
            DeleteOutcome::WouldDelete => self.would_delete += 1,
            DeleteOutcome::Failed(_) => self.delete_failures += 1,
        }
    }

    /// Report an entry that could not be read and count it
    pub fn record_scan_error(&mut self, reporter: &dyn Reporter, root: &Path, error: &SyncError) {
        reporter.report(&SyncEvent::ScanError {
            path: error.path().unwrap_or(root).to_path_buf(),
            error: error.to_string(),
        });
        self.scan_errors += 1;
    }

    /// Per-item failures; zero means a clean run
    pub fn error_count(&self) -> usize {
        self.files_denied + self.copy_failures + self.scan_errors + self.delete_failures
    }

    pub fn summary_event(&self) -> SyncEvent {
        SyncEvent::Summary {
            files_scanned: self.files_scanned,
            files_copied: self.files_copied,
            files_would_copy: self.files_would_copy,
            files_up_to_date: self.files_up_to_date,
            files_ignored: self.files_ignored,
            files_denied: self.files_denied,
            copy_failures: self.copy_failures,
            scan_errors: self.scan_errors,
            files_deleted: self.files_deleted,
            dirs_deleted: self.dirs_deleted,
            would_delete: self.would_delete,
            delete_failures: self.delete_failures,
            dirs_kept: self.dirs_kept,
            duration_secs: self.duration.as_secs_f64(),
        }
    }
}

/// Runs one complete sync as described by a [`RunConfig`]
pub struct SyncEngine<'a> {
    config: &'a RunConfig,
    reporter: &'a dyn Reporter,
}

impl<'a> SyncEngine<'a> {
    pub fn new(config: &'a RunConfig, reporter: &'a dyn Reporter) -> Self {
        Self { config, reporter }
    }

    /// Check roots, copy in the configured direction(s), then prune if mirroring
    ///
    /// Only a precondition failure returns `Err`, and it does so before
    /// anything is written. Per-file problems end up in the stats.
    pub fn run(&self) -> Result<SyncStats> {
        let start = Instant::now();
        let config = self.config;

        check_root(&config.source, true)?;
        check_root(&config.destination, false)?;

        self.reporter.report(&SyncEvent::RunStart {
            source: config.source.clone(),
            destination: config.destination.clone(),
            mode: config.mode,
            mirror: config.mirror,
            dry_run: config.dry_run,
            started_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        });

        let transferrer = Transferrer::new(config, self.reporter);
        let mut stats = SyncStats::default();

        // Passes run strictly one after the other
        for (from, to) in config.mode.passes(&config.source, &config.destination) {
            self.reporter.report(&SyncEvent::Pass {
                from: from.to_path_buf(),
                to: to.to_path_buf(),
            });
            self.sync_tree(from, to, &transferrer, &mut stats);
        }

        if config.mirror {
            if let Some((reference, target)) =
                config.mode.mirror_pair(&config.source, &config.destination)
            {
                self.reporter.report(&SyncEvent::Prune {
                    reference: reference.to_path_buf(),
                    target: target.to_path_buf(),
                });
                Pruner::new(&config.ignore, &transferrer, self.reporter).prune(
                    reference,
                    target,
                    &mut stats,
                );
            }
        }

        stats.duration = start.elapsed();
        self.reporter.report(&stats.summary_event());

        Ok(stats)
    }

    /// Copy every file under `from` that is missing or strictly newer than its twin under `to`
    fn sync_tree(&self, from: &Path, to: &Path, transferrer: &Transferrer, stats: &mut SyncStats) {
        let planner = StrategyPlanner::new();

        for entry in Scanner::new(from).walk() {
            let planned = entry.and_then(|entry| planner.plan_file(&entry, to));
            match planned {
                Ok(Some(task)) => {
                    stats.files_scanned += 1;
                    if task.needs_transfer() {
                        let outcome = transferrer.transfer(&task.source_path, &task.dest_path);
                        stats.record_transfer(&outcome);
                    } else {
                        stats.files_up_to_date += 1;
                    }
                }
                Ok(None) => {}
                Err(e) => stats.record_scan_error(self.reporter, from, &e),
            }
        }
    }
}

fn check_root(path: &Path, is_source: bool) -> Result<()> {
    if !path.exists() {
        let path = path.to_path_buf();
        return Err(if is_source {
            SyncError::SourceNotFound { path }
        } else {
            SyncError::DestinationNotFound { path }
        });
    }
    if !path.is_dir() {
        return Err(SyncError::NotADirectory {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{set_file_mtime, FileTime};
    use output::CollectingReporter;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    fn config(src: &Path, dst: &Path, mode: SyncMode, mirror: bool, dry_run: bool) -> RunConfig {
        RunConfig::new(src, dst, mode, mirror, dry_run, IgnoreFilter::default()).unwrap()
    }

    fn run(config: &RunConfig) -> (SyncStats, CollectingReporter) {
        let reporter = CollectingReporter::new();
        let stats = SyncEngine::new(config, &reporter).run().unwrap();
        (stats, reporter)
    }

    fn mtime(path: &Path) -> FileTime {
        FileTime::from_last_modification_time(&fs::metadata(path).unwrap())
    }

    /// Every entry below `root` with file contents and mtime; `None` for directories
    fn snapshot(root: &Path) -> BTreeMap<PathBuf, Option<(Vec<u8>, FileTime)>> {
        walkdir::WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .map(|e| {
                let e = e.unwrap();
                let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
                let state = if e.file_type().is_dir() {
                    None
                } else {
                    Some((fs::read(e.path()).unwrap(), mtime(e.path())))
                };
                (rel, state)
            })
            .collect()
    }

    /// Dry-run first, check nothing moved, then a real run on the same trees
    fn assert_dry_run_matches_real_run(cfg: &RunConfig) {
        let before = (snapshot(&cfg.source), snapshot(&cfg.destination));

        let dry = RunConfig {
            dry_run: true,
            ..cfg.clone()
        };
        let (_, dry_events) = run(&dry);

        assert_eq!(snapshot(&cfg.source), before.0);
        assert_eq!(snapshot(&cfg.destination), before.1);

        let wet = RunConfig {
            dry_run: false,
            ..cfg.clone()
        };
        let (stats, wet_events) = run(&wet);

        assert_eq!(stats.error_count(), 0);
        assert_eq!(
            dry_events.count(|e| matches!(e, SyncEvent::WouldCopy { .. })),
            wet_events.count(|e| matches!(e, SyncEvent::Copied { .. }))
        );
        assert_eq!(
            dry_events.count(|e| matches!(e, SyncEvent::WouldDelete { .. })),
            wet_events.count(|e| matches!(e, SyncEvent::Deleted { .. }))
        );
        assert_eq!(dry_events.count(|e| matches!(e, SyncEvent::Copied { .. })), 0);
        assert_eq!(dry_events.count(|e| matches!(e, SyncEvent::Deleted { .. })), 0);
    }

    #[test]
    fn test_mirror_requires_reference() {
        let err = RunConfig::new(
            "/a",
            "/b",
            SyncMode::Bidirectional,
            true,
            false,
            IgnoreFilter::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::MirrorWithoutReference));
    }

    #[test]
    fn test_mode_from_reference() {
        assert_eq!(SyncMode::from(None), SyncMode::Bidirectional);
        assert_eq!(
            SyncMode::from(Some(Reference::Source)),
            SyncMode::ReferenceSource
        );
        assert_eq!(
            SyncMode::from(Some(Reference::Destination)),
            SyncMode::ReferenceDestination
        );
    }

    #[test]
    fn test_mirror_pair_follows_reference() {
        let (s, d) = (Path::new("/s"), Path::new("/d"));
        assert_eq!(SyncMode::ReferenceSource.mirror_pair(s, d), Some((s, d)));
        assert_eq!(SyncMode::ReferenceDestination.mirror_pair(s, d), Some((d, s)));
        assert_eq!(SyncMode::Bidirectional.mirror_pair(s, d), None);
        assert_eq!(SyncMode::Bidirectional.passes(s, d), vec![(s, d), (d, s)]);
    }

    #[test]
    fn test_missing_source_aborts_before_any_write() {
        let dst = TempDir::new().unwrap();
        let missing = dst.path().join("no_such_source");
        let cfg = config(&missing, dst.path(), SyncMode::Bidirectional, false, false);
        let reporter = CollectingReporter::new();

        let err = SyncEngine::new(&cfg, &reporter).run().unwrap_err();

        assert!(matches!(err, SyncError::SourceNotFound { .. }));
        assert!(reporter.events().is_empty());
        assert_eq!(fs::read_dir(dst.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_destination_aborts() {
        let src = TempDir::new().unwrap();
        fs::write(src.path().join("a.txt"), "a").unwrap();
        let missing = src.path().join("no_such_dest");
        let cfg = config(src.path(), &missing, SyncMode::ReferenceSource, false, false);

        let err = SyncEngine::new(&cfg, &CollectingReporter::new()).run().unwrap_err();

        assert!(matches!(err, SyncError::DestinationNotFound { .. }));
        assert!(!missing.exists());
    }

    #[test]
    fn test_file_root_is_not_a_directory() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let file = src.path().join("plain.txt");
        fs::write(&file, "x").unwrap();
        let cfg = config(&file, dst.path(), SyncMode::ReferenceSource, false, false);

        let err = SyncEngine::new(&cfg, &CollectingReporter::new()).run().unwrap_err();
        assert!(matches!(err, SyncError::NotADirectory { .. }));
    }

    #[test]
    fn test_reference_source_copies_missing_and_stale() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::create_dir_all(src.path().join("a")).unwrap();
        fs::create_dir_all(dst.path().join("a")).unwrap();
        fs::write(src.path().join("a/b.txt"), "new").unwrap();
        fs::write(dst.path().join("a/b.txt"), "old").unwrap();
        fs::write(src.path().join("fresh.txt"), "fresh").unwrap();
        set_file_mtime(src.path().join("a/b.txt"), FileTime::from_unix_time(2_000_000, 0)).unwrap();
        set_file_mtime(dst.path().join("a/b.txt"), FileTime::from_unix_time(1_000_000, 0)).unwrap();

        let cfg = config(src.path(), dst.path(), SyncMode::ReferenceSource, false, false);
        let (stats, _) = run(&cfg);

        assert_eq!(stats.files_copied, 2);
        assert_eq!(fs::read_to_string(dst.path().join("a/b.txt")).unwrap(), "new");
        assert_eq!(
            mtime(&dst.path().join("a/b.txt")),
            FileTime::from_unix_time(2_000_000, 0)
        );
        assert_eq!(fs::read_to_string(dst.path().join("fresh.txt")).unwrap(), "fresh");
    }

    #[test]
    fn test_reference_source_never_writes_source() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::write(dst.path().join("only_dst.txt"), "d").unwrap();

        let cfg = config(src.path(), dst.path(), SyncMode::ReferenceSource, false, false);
        run(&cfg);

        assert!(!src.path().join("only_dst.txt").exists());
        assert!(dst.path().join("only_dst.txt").exists());
    }

    #[test]
    fn test_newer_destination_is_left_alone() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::write(src.path().join("f.txt"), "older").unwrap();
        fs::write(dst.path().join("f.txt"), "newer").unwrap();
        set_file_mtime(src.path().join("f.txt"), FileTime::from_unix_time(1_000_000, 0)).unwrap();
        set_file_mtime(dst.path().join("f.txt"), FileTime::from_unix_time(2_000_000, 0)).unwrap();

        let cfg = config(src.path(), dst.path(), SyncMode::ReferenceSource, false, false);
        let (stats, reporter) = run(&cfg);

        assert_eq!(fs::read_to_string(dst.path().join("f.txt")).unwrap(), "newer");
        assert_eq!(stats.files_up_to_date, 1);
        // Up-to-date files produce no per-file events
        assert_eq!(reporter.count(|e| matches!(e, SyncEvent::Copied { .. })), 0);
    }

    #[test]
    fn test_reference_destination_copies_back() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::write(dst.path().join("from_dst.txt"), "d").unwrap();
        fs::write(src.path().join("from_src.txt"), "s").unwrap();

        let cfg = config(src.path(), dst.path(), SyncMode::ReferenceDestination, false, false);
        run(&cfg);

        assert!(src.path().join("from_dst.txt").exists());
        assert!(!dst.path().join("from_src.txt").exists());
    }

    #[test]
    fn test_reference_destination_mirror_prunes_source() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::write(dst.path().join("keep.txt"), "k").unwrap();
        fs::write(src.path().join("extra.txt"), "e").unwrap();

        let cfg = config(src.path(), dst.path(), SyncMode::ReferenceDestination, true, false);
        let (stats, _) = run(&cfg);

        assert!(src.path().join("keep.txt").exists());
        assert!(!src.path().join("extra.txt").exists());
        assert!(dst.path().join("keep.txt").exists());
        assert_eq!(stats.files_deleted, 1);
    }

    #[test]
    fn test_bidirectional_exchanges_files() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::write(src.path().join("only_src.txt"), "s").unwrap();
        fs::write(dst.path().join("only_dst.txt"), "d").unwrap();

        let cfg = config(src.path(), dst.path(), SyncMode::Bidirectional, false, false);
        let (stats, reporter) = run(&cfg);

        for root in [src.path(), dst.path()] {
            assert_eq!(fs::read_to_string(root.join("only_src.txt")).unwrap(), "s");
            assert_eq!(fs::read_to_string(root.join("only_dst.txt")).unwrap(), "d");
        }
        // Second pass sees the first pass's copy as in sync, no round-trip
        assert_eq!(stats.files_copied, 2);
        assert_eq!(reporter.count(|e| matches!(e, SyncEvent::Pass { .. })), 2);
    }

    #[test]
    fn test_bidirectional_newer_side_wins() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::write(src.path().join("f.txt"), "src old").unwrap();
        fs::write(dst.path().join("f.txt"), "dst new").unwrap();
        set_file_mtime(src.path().join("f.txt"), FileTime::from_unix_time(1_000_000, 0)).unwrap();
        set_file_mtime(dst.path().join("f.txt"), FileTime::from_unix_time(3_000_000, 0)).unwrap();

        let cfg = config(src.path(), dst.path(), SyncMode::Bidirectional, false, false);
        run(&cfg);

        assert_eq!(fs::read_to_string(src.path().join("f.txt")).unwrap(), "dst new");
        assert_eq!(
            mtime(&src.path().join("f.txt")),
            FileTime::from_unix_time(3_000_000, 0)
        );
    }

    #[test]
    fn test_equal_mtimes_touch_nothing() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::write(src.path().join("f.txt"), "one").unwrap();
        fs::write(dst.path().join("f.txt"), "two").unwrap();
        let t = FileTime::from_unix_time(1_700_000_000, 0);
        set_file_mtime(src.path().join("f.txt"), t).unwrap();
        set_file_mtime(dst.path().join("f.txt"), t).unwrap();

        let cfg = config(src.path(), dst.path(), SyncMode::Bidirectional, false, false);
        let (stats, _) = run(&cfg);

        assert_eq!(stats.files_copied, 0);
        assert_eq!(fs::read_to_string(src.path().join("f.txt")).unwrap(), "one");
        assert_eq!(fs::read_to_string(dst.path().join("f.txt")).unwrap(), "two");
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::create_dir_all(src.path().join("nested/deep")).unwrap();
        fs::write(src.path().join("nested/deep/a.txt"), "a").unwrap();
        fs::write(dst.path().join("b.txt"), "b").unwrap();

        let cfg = config(src.path(), dst.path(), SyncMode::Bidirectional, false, false);
        let (first, _) = run(&cfg);
        let (second, reporter) = run(&cfg);

        assert_eq!(first.files_copied, 2);
        assert_eq!(second.files_copied, 0);
        assert_eq!(reporter.count(|e| matches!(e, SyncEvent::Copied { .. })), 0);
    }

    #[test]
    fn test_ignored_extension_never_copied() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::write(src.path().join("x.tmp"), "scratch").unwrap();
        fs::write(src.path().join("keep.txt"), "k").unwrap();

        let cfg = config(src.path(), dst.path(), SyncMode::ReferenceSource, true, false);
        let (stats, _) = run(&cfg);

        assert!(!dst.path().join("x.tmp").exists());
        assert!(dst.path().join("keep.txt").exists());
        assert_eq!(stats.files_ignored, 1);
    }

    #[test]
    fn test_stale_ignored_file_is_not_overwritten() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::write(src.path().join("x.tmp"), "newer").unwrap();
        fs::write(dst.path().join("x.tmp"), "older").unwrap();
        set_file_mtime(src.path().join("x.tmp"), FileTime::from_unix_time(2_000_000, 0)).unwrap();
        set_file_mtime(dst.path().join("x.tmp"), FileTime::from_unix_time(1_000_000, 0)).unwrap();

        let cfg = config(src.path(), dst.path(), SyncMode::ReferenceSource, false, false);
        let (stats, reporter) = run(&cfg);

        assert_eq!(fs::read_to_string(dst.path().join("x.tmp")).unwrap(), "older");
        assert_eq!(
            mtime(&dst.path().join("x.tmp")),
            FileTime::from_unix_time(1_000_000, 0)
        );
        assert_eq!(stats.files_ignored, 1);
        assert_eq!(stats.files_copied, 0);
        assert_eq!(reporter.count(|e| matches!(e, SyncEvent::Skipped { .. })), 1);
    }

    #[test]
    fn test_empty_source_directories_are_not_replicated() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::create_dir_all(src.path().join("empty/inner")).unwrap();

        let cfg = config(src.path(), dst.path(), SyncMode::ReferenceSource, false, false);
        run(&cfg);

        assert!(!dst.path().join("empty").exists());
    }

    #[test]
    fn test_mirror_removes_extra_directory() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::write(src.path().join("a.txt"), "a").unwrap();
        fs::create_dir_all(dst.path().join("old")).unwrap();
        fs::write(dst.path().join("old/report.txt"), "r").unwrap();

        let cfg = config(src.path(), dst.path(), SyncMode::ReferenceSource, true, false);
        let (stats, reporter) = run(&cfg);

        assert!(!dst.path().join("old").exists());
        assert!(dst.path().join("a.txt").exists());
        assert_eq!(stats.error_count(), 0);
        assert_eq!(reporter.count(|e| matches!(e, SyncEvent::Prune { .. })), 1);
    }

    #[test]
    fn test_dry_run_mutates_nothing() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::write(src.path().join("new.txt"), "n").unwrap();
        fs::create_dir_all(dst.path().join("old")).unwrap();
        fs::write(dst.path().join("old/report.txt"), "r").unwrap();

        let cfg = config(src.path(), dst.path(), SyncMode::ReferenceSource, true, true);
        let (stats, reporter) = run(&cfg);

        assert!(!dst.path().join("new.txt").exists());
        assert!(dst.path().join("old/report.txt").exists());
        assert_eq!(stats.files_would_copy, 1);
        assert_eq!(stats.would_delete, 2);
        assert_eq!(reporter.count(|e| matches!(e, SyncEvent::WouldCopy { .. })), 1);
        assert_eq!(reporter.count(|e| matches!(e, SyncEvent::WouldDelete { .. })), 2);
    }

    #[test]
    fn test_bidirectional_dry_run_mutates_nothing() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::write(src.path().join("only_src.txt"), "s").unwrap();
        fs::create_dir_all(dst.path().join("d")).unwrap();
        fs::write(dst.path().join("d/only_dst.txt"), "d").unwrap();
        fs::write(src.path().join("shared.txt"), "src newer").unwrap();
        fs::write(dst.path().join("shared.txt"), "dst older").unwrap();
        set_file_mtime(src.path().join("shared.txt"), FileTime::from_unix_time(2_000_000, 0)).unwrap();
        set_file_mtime(dst.path().join("shared.txt"), FileTime::from_unix_time(1_000_000, 0)).unwrap();
        fs::write(dst.path().join("back.txt"), "dst newer").unwrap();
        fs::write(src.path().join("back.txt"), "src older").unwrap();
        set_file_mtime(dst.path().join("back.txt"), FileTime::from_unix_time(4_000_000, 0)).unwrap();
        set_file_mtime(src.path().join("back.txt"), FileTime::from_unix_time(3_000_000, 0)).unwrap();

        let cfg = config(src.path(), dst.path(), SyncMode::Bidirectional, false, true);
        let (stats, reporter) = run(&cfg);
        // only_src + shared one way, only_dst + back the other
        assert_eq!(stats.files_would_copy, 4);
        assert_eq!(reporter.count(|e| matches!(e, SyncEvent::WouldCopy { .. })), 4);

        assert_dry_run_matches_real_run(&cfg);
    }

    #[test]
    fn test_reference_destination_mirror_dry_run_mutates_nothing() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::write(dst.path().join("keep.txt"), "k").unwrap();
        fs::write(dst.path().join("newer.txt"), "dst newer").unwrap();
        fs::write(src.path().join("newer.txt"), "src older").unwrap();
        set_file_mtime(dst.path().join("newer.txt"), FileTime::from_unix_time(2_000_000, 0)).unwrap();
        set_file_mtime(src.path().join("newer.txt"), FileTime::from_unix_time(1_000_000, 0)).unwrap();
        fs::write(src.path().join("extra.txt"), "e").unwrap();
        fs::create_dir_all(src.path().join("old")).unwrap();
        fs::write(src.path().join("old/report.txt"), "r").unwrap();

        let cfg = config(src.path(), dst.path(), SyncMode::ReferenceDestination, true, true);
        let (stats, reporter) = run(&cfg);
        assert_eq!(stats.files_would_copy, 2);
        // extra.txt, old/report.txt, old/
        assert_eq!(stats.would_delete, 3);
        assert_eq!(reporter.count(|e| matches!(e, SyncEvent::WouldDelete { .. })), 3);

        assert_dry_run_matches_real_run(&cfg);
        assert!(!src.path().join("old").exists());
        assert_eq!(fs::read_to_string(src.path().join("newer.txt")).unwrap(), "dst newer");
    }

    #[test]
    fn test_events_bracketed_by_start_and_summary() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::write(src.path().join("a.txt"), "a").unwrap();

        let cfg = config(src.path(), dst.path(), SyncMode::ReferenceSource, false, false);
        let (_, reporter) = run(&cfg);
        let events = reporter.events();

        assert!(matches!(events.first(), Some(SyncEvent::RunStart { .. })));
        assert!(matches!(
            events.last(),
            Some(SyncEvent::Summary { files_copied: 1, .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_symlink_does_not_stop_the_walk() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        std::os::unix::fs::symlink(src.path().join("gone"), src.path().join("dangling")).unwrap();
        fs::write(src.path().join("good.txt"), "g").unwrap();

        let cfg = config(src.path(), dst.path(), SyncMode::ReferenceSource, false, false);
        let (stats, reporter) = run(&cfg);

        assert!(dst.path().join("good.txt").exists());
        assert_eq!(stats.scan_errors, 1);
        assert_eq!(stats.error_count(), 1);
        assert_eq!(reporter.count(|e| matches!(e, SyncEvent::ScanError { .. })), 1);
    }
}
