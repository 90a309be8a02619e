use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Side treated as authoritative in one-way mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reference {
    /// Copy source -> destination only
    Source,

    /// Copy destination -> source only
    Destination,
}

#[derive(Parser, Debug, Default)]
#[command(name = "mtsync")]
#[command(about = "Mtime-based directory synchronization", long_about = None)]
#[command(version)]
#[command(after_help = "EXAMPLES:
    # Two-way sync (newer file wins on each side)
    mtsync /source /destination

    # One-way sync, source is authoritative
    mtsync /source /destination --reference source

    # Mirror: also delete files in destination that are not in source
    mtsync /source /destination -r source --mirror

    # Preview changes without applying
    mtsync --src /source --dst /destination -r source --mirror --dry-run

    # Use a named profile from the config file
    mtsync --profile laptop")]
pub struct Cli {
    /// Source directory
    /// Optional when using --src or --profile
    pub source: Option<PathBuf>,

    /// Destination directory
    /// Optional when using --dst or --profile
    pub destination: Option<PathBuf>,

    /// Source directory (named form of SOURCE)
    #[arg(long = "src", conflicts_with = "source")]
    pub src: Option<PathBuf>,

    /// Destination directory (named form of DESTINATION)
    #[arg(long = "dst", conflicts_with = "destination")]
    pub dst: Option<PathBuf>,

    /// Only sync from this side to the other (default: both directions)
    #[arg(short, long, value_enum)]
    pub reference: Option<Reference>,

    /// Make the non-reference side an exact mirror: deletes files!
    /// Requires --reference
    #[arg(long)]
    pub mirror: bool,

    /// Show changes without applying them (dry-run)
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (only show errors)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output JSON (newline-delimited JSON for scripting)
    #[arg(long)]
    pub json: bool,

    /// Run log file, overwritten on every run (default: <data dir>/mtsync/sync_log.txt)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Do not write a run log file
    #[arg(long, conflicts_with = "log_file")]
    pub no_log_file: bool,

    /// Additional file suffix to ignore (can be repeated)
    /// Examples: ".bak", "~", ".swp"
    #[arg(long = "ignore-ext")]
    pub ignore_ext: Vec<String>,

    /// Config file (default: <config dir>/mtsync/config.toml)
    #[arg(long, env = "MTSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Use named profile from config file
    #[arg(long)]
    pub profile: Option<String>,

    /// List all available profiles
    #[arg(long)]
    pub list_profiles: bool,

    /// Show details of a specific profile
    #[arg(long)]
    pub show_profile: Option<String>,
}

impl Cli {
    pub fn validate(&self) -> anyhow::Result<()> {
        // --list-profiles and --show-profile don't need source/destination
        if self.list_profiles || self.show_profile.is_some() {
            return Ok(());
        }

        if self.source_path().is_none() || self.destination_path().is_none() {
            anyhow::bail!("Source and destination are required (or use --profile)");
        }

        if self.mirror && self.reference.is_none() {
            anyhow::bail!(
                "--mirror requires --reference (source or destination); \
                 mirroring is not available in bi-directional mode"
            );
        }

        if self.ignore_ext.iter().any(|ext| ext.is_empty()) {
            anyhow::bail!("--ignore-ext must not be empty");
        }

        Ok(())
    }

    /// Source from either the positional argument or --src
    pub fn source_path(&self) -> Option<&PathBuf> {
        self.source.as_ref().or(self.src.as_ref())
    }

    /// Destination from either the positional argument or --dst
    pub fn destination_path(&self) -> Option<&PathBuf> {
        self.destination.as_ref().or(self.dst.as_ref())
    }

    pub fn log_level(&self) -> tracing::Level {
        if self.quiet || self.json {
            return tracing::Level::ERROR;
        }

        match self.verbose {
            0 => tracing::Level::INFO,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
