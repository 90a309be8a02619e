mod cli;
mod config;
mod error;
mod filter;
mod sync;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use colored::Colorize;
use config::Config;
use std::fs::{self, File};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;
use sync::output::LogReporter;
use sync::{RunConfig, SyncEngine, SyncMode, SyncStats};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Run completed, but some files could not be copied, compared or deleted
const EXIT_PARTIAL: u8 = 2;

fn main() -> Result<ExitCode> {
    // Parse CLI arguments
    let mut cli = Cli::parse();

    // Load config file
    let config = Config::load(cli.config.as_deref())?;

    // Handle profile-only flags (print and exit)
    if cli.list_profiles {
        let profiles = config.list_profiles();
        if profiles.is_empty() {
            println!("No profiles configured");
            println!("\nCreate profiles in: {}", Config::config_path()?.display());
        } else {
            println!("Available profiles:");
            for name in profiles {
                println!("  {}", name);
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(ref profile_name) = cli.show_profile {
        match config.show_profile(profile_name) {
            Some(output) => {
                println!("{}", output);
                return Ok(ExitCode::SUCCESS);
            }
            None => {
                anyhow::bail!("Profile '{}' not found", profile_name);
            }
        }
    }

    // Merge profile with CLI args if --profile is set
    if let Some(profile_name) = cli.profile.clone() {
        config.apply_profile(&profile_name, &mut cli)?;
    }

    // Validate arguments
    cli.validate()?;

    let ignore = config.ignore_filter(&cli)?;
    let log_file = config.log_file(&cli);

    // Setup logging
    init_logging(&cli, log_file.as_deref())?;

    // After validation, source and destination must be present
    let (Some(source), Some(destination)) = (cli.source_path(), cli.destination_path()) else {
        anyhow::bail!("Source and destination are required (or use --profile)");
    };

    let run_config = RunConfig::new(
        source,
        destination,
        SyncMode::from(cli.reference),
        cli.mirror,
        cli.dry_run,
        ignore,
    )?;

    // Print header (skip if JSON mode)
    let show_output = !cli.quiet && !cli.json;
    if show_output {
        println!("mtsync v{}", env!("CARGO_PKG_VERSION"));
        let arrow = match run_config.mode {
            SyncMode::Bidirectional => "⇄",
            SyncMode::ReferenceSource => "→",
            SyncMode::ReferenceDestination => "←",
        };
        println!("Syncing {} {} {}", source.display(), arrow, destination.display());
        println!("Mode: {}", run_config.mode.description());
        if cli.dry_run {
            println!("Dry-run: no changes will be made");
        }
        println!();
    }

    tracing::debug!("Ignored extensions: {:?}", run_config.ignore.suffixes());

    let reporter = LogReporter::new(cli.json);
    let stats = match SyncEngine::new(&run_config, &reporter).run() {
        Ok(stats) => stats,
        Err(e) => {
            // Precondition failure, nothing was touched
            tracing::error!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    if show_output {
        print_summary(&stats, &run_config);
    }

    if stats.error_count() > 0 {
        Ok(ExitCode::from(EXIT_PARTIAL))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Console on stderr at the CLI level, plus the run log file (truncated) at INFO
fn init_logging(cli: &Cli, log_file: Option<&Path>) -> Result<()> {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().as_str()));

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .with_filter(console_filter);

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create log directory: {}", parent.display())
                })?;
            }
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false)
                    .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S,%3f".to_string()))
                    .with_filter(LevelFilter::INFO),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .init();

    Ok(())
}

fn print_summary(stats: &SyncStats, config: &RunConfig) {
    if config.dry_run {
        println!("\n{}\n", "✓ Dry-run complete (no changes made)".green().bold());
    } else if stats.error_count() > 0 {
        println!("\n{}\n", "⚠ Sync complete with errors".yellow().bold());
    } else {
        println!("\n{}\n", "✓ Sync complete".green().bold());
    }

    println!("  Files scanned:     {}", stats.files_scanned.to_string().blue());
    if config.dry_run {
        println!("  Would copy:        {}", stats.files_would_copy.to_string().yellow());
        if config.mirror {
            println!("  Would delete:      {}", stats.would_delete.to_string().red());
        }
    } else {
        if stats.files_copied > 0 {
            println!("  Files copied:      {}", stats.files_copied.to_string().green());
        } else {
            println!("  Files copied:      {}", stats.files_copied.to_string().bright_black());
        }
        if config.mirror {
            let deleted = stats.files_deleted + stats.dirs_deleted;
            if deleted > 0 {
                println!(
                    "  Deleted:           {} files, {} directories",
                    stats.files_deleted.to_string().red(),
                    stats.dirs_deleted.to_string().red()
                );
            } else {
                println!("  Deleted:           {}", "0".bright_black());
            }
        }
    }
    println!("  Up to date:        {}", stats.files_up_to_date.to_string().bright_black());
    println!("  Ignored:           {}", stats.files_ignored.to_string().bright_black());
    if stats.dirs_kept > 0 {
        println!("  Dirs kept:         {}", stats.dirs_kept.to_string().bright_black());
    }

    if stats.error_count() > 0 {
        println!();
        println!("  Permission denied: {}", stats.files_denied.to_string().red());
        println!("  Copy failures:     {}", stats.copy_failures.to_string().red());
        println!("  Scan errors:       {}", stats.scan_errors.to_string().red());
        if config.mirror {
            println!("  Delete failures:   {}", stats.delete_failures.to_string().red());
        }
    }

    println!();
    println!("  Duration:          {}", format_duration(stats.duration).cyan());
}

fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs >= 60 {
        let mins = secs / 60;
        let secs = secs % 60;
        if mins >= 60 {
            let hours = mins / 60;
            let mins = mins % 60;
            format!("{}h {}m {}s", hours, mins, secs)
        } else {
            format!("{}m {}s", mins, secs)
        }
    } else if secs > 0 {
        format!("{}.{:03}s", secs, millis)
    } else {
        format!("{}ms", millis)
    }
}
