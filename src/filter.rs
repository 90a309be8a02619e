use crate::error::{Result, SyncError};
use std::path::Path;

/// Suffixes skipped when no configuration overrides them.
///
/// These files are usually held open by another program or are scratch
/// state that should never travel between trees.
pub const DEFAULT_IGNORED_EXTENSIONS: &[&str] = &[".Rhistory", ".tmp", ".lock"];

/// Classifies file names by ignored suffix
///
/// Matching is a case-sensitive `ends_with` on the file name only, so
/// `.tmp` matches `notes.tmp` and `.tmp` but not `notes.TMP` or `tmp/notes`.
/// Ignored files are never copied and never deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreFilter {
    suffixes: Vec<String>,
}

impl IgnoreFilter {
    /// Build a filter from a list of suffixes
    ///
    /// Duplicates are dropped, order of first appearance is kept.
    pub fn new<I, S>(suffixes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut filter = Self { suffixes: Vec::new() };
        for suffix in suffixes {
            filter.add(suffix)?;
        }
        Ok(filter)
    }

    /// Filter that ignores nothing
    #[allow(dead_code)] // Used by tests
    pub fn empty() -> Self {
        Self { suffixes: Vec::new() }
    }

    /// Add one suffix
    pub fn add(&mut self, suffix: impl Into<String>) -> Result<()> {
        let suffix = suffix.into();
        if suffix.is_empty() {
            // An empty suffix would match every file
            return Err(SyncError::EmptyIgnorePattern);
        }
        if !self.suffixes.contains(&suffix) {
            self.suffixes.push(suffix);
        }
        Ok(())
    }

    /// True if `name` ends with any ignored suffix
    pub fn is_ignored(&self, name: &str) -> bool {
        self.suffixes.iter().any(|suffix| name.ends_with(suffix.as_str()))
    }

    /// Same as [`IgnoreFilter::is_ignored`], applied to the final component of `path`
    pub fn is_ignored_path(&self, path: &Path) -> bool {
        match path.file_name() {
            Some(name) => self.is_ignored(&name.to_string_lossy()),
            None => false,
        }
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }
}

impl Default for IgnoreFilter {
    fn default() -> Self {
        Self {
            suffixes: DEFAULT_IGNORED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}
