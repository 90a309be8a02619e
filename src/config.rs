use crate::cli::{Cli, Reference};
use crate::filter::IgnoreFilter;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File name of the run log written when nothing else is configured
pub const DEFAULT_LOG_FILE: &str = "sync_log.txt";

/// Contents of `config.toml`
///
/// ```toml
/// ignored_extensions = [".Rhistory", ".tmp", ".lock", ".swp"]
/// log_file = "/var/log/mtsync.txt"
///
/// [profiles.laptop]
/// source = "/home/me/projects"
/// destination = "/mnt/backup/projects"
/// reference = "source"
/// mirror = true
/// ```
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Replaces the built-in ignored suffixes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignored_extensions: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

/// Named set of run options
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
    /// Replaces the top-level list for this profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignored_extensions: Option<Vec<String>>,
}

impl Config {
    /// Default location: `<config dir>/mtsync/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().context("Cannot determine config directory")?;
        Ok(dir.join("mtsync").join("config.toml"))
    }

    /// Load from `path`, or from the default location
    ///
    /// A missing file at the default location yields the defaults; a missing
    /// file that was asked for explicitly is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::config_path() {
                Ok(p) => (p, false),
                Err(_) => return Ok(Self::default()),
            },
        };

        if !explicit && !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn list_profiles(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    pub fn get_profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    /// Profile rendered back as TOML
    pub fn show_profile(&self, name: &str) -> Option<String> {
        let profile = self.get_profile(name)?;
        let body = toml::to_string_pretty(profile).ok()?;
        Some(format!("[profiles.{}]\n{}", name, body))
    }

    /// Fill in `cli` from the named profile; values given on the command line win
    pub fn apply_profile(&self, name: &str, cli: &mut Cli) -> Result<()> {
        let profile = self
            .get_profile(name)
            .ok_or_else(|| anyhow::anyhow!("Profile '{}' not found", name))?;

        if cli.source_path().is_none() {
            cli.source = profile.source.clone();
        }
        if cli.destination_path().is_none() {
            cli.destination = profile.destination.clone();
        }
        if cli.reference.is_none() {
            cli.reference = profile.reference;
        }
        if !cli.mirror {
            cli.mirror = profile.mirror.unwrap_or(false);
        }
        if !cli.dry_run {
            cli.dry_run = profile.dry_run.unwrap_or(false);
        }

        Ok(())
    }

    /// Ignored suffixes for this run
    ///
    /// Profile list, else top-level list, else built-in defaults; then every
    /// `--ignore-ext` is appended.
    pub fn ignore_filter(&self, cli: &Cli) -> Result<IgnoreFilter> {
        let configured = cli
            .profile
            .as_deref()
            .and_then(|name| self.get_profile(name))
            .and_then(|p| p.ignored_extensions.as_ref())
            .or(self.ignored_extensions.as_ref());

        let mut filter = match configured {
            Some(list) => IgnoreFilter::new(list.iter().cloned())
                .context("Invalid ignored_extensions in config")?,
            None => IgnoreFilter::default(),
        };
        for ext in &cli.ignore_ext {
            filter
                .add(ext.as_str())
                .with_context(|| format!("Invalid --ignore-ext '{}'", ext))?;
        }
        Ok(filter)
    }

    /// Default run log: `<data dir>/mtsync/sync_log.txt`
    ///
    /// Kept out of the working directory, which is often one of the sync roots.
    pub fn default_log_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("mtsync")
            .join(DEFAULT_LOG_FILE)
    }

    /// Run log path, `None` when disabled
    pub fn log_file(&self, cli: &Cli) -> Option<PathBuf> {
        if cli.no_log_file {
            return None;
        }
        Some(
            cli.log_file
                .clone()
                .or_else(|| self.log_file.clone())
                .unwrap_or_else(Self::default_log_path),
        )
    }
}
