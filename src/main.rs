mod commands;
mod logging;

use std::process;

use anyhow::{Context, Result};
use archive_janitor_core::config::{load_configuration, AppConfig};
use archive_janitor_core::storage::Database;
use archive_janitor_core::{CleanupEngine, CleanupReport, TracingNotifier};
use clap::Parser;
use colored::*;
use commands::Cli;
use dotenv::dotenv;
use tracing::{error, info};

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let args = Cli::parse();

    let mut config = match load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };
    if let Some(archive_base) = &args.archive_base {
        config.archive_base = archive_base.clone();
    }
    if let Some(database) = &args.database {
        config.database_path = database.clone();
    }

    if args.run_cleanup {
        // Only a failed cleanup run exits non-zero.
        if let Err(err) = run_cleanup(&config, args.dry_run_override()) {
            error!("Cleanup failed: {:#}", err);
            process::exit(1);
        }
    } else if let Err(err) = print_report(&config, args.json) {
        error!("Error generating cleanup report: {:#}", err);
    }
}

fn open_database(config: &AppConfig) -> Result<Database> {
    Database::open(&config.database_path)
        .with_context(|| format!("opening database {}", config.database_path))
}

fn run_cleanup(config: &AppConfig, dry_run_override: Option<bool>) -> Result<()> {
    let db = open_database(config)?;
    let notifier = TracingNotifier;
    let engine = CleanupEngine::new(&db, &config.archive_base)
        .with_trigger("manual")
        .with_notifier(&notifier);
    info!(
        "Running cleanup on {}",
        engine.archive_base().display().to_string().cyan()
    );

    match engine.run(dry_run_override)? {
        Some(run) => {
            let mode = if run.summary.dry_run {
                "DRY RUN".yellow()
            } else {
                "LIVE".green()
            };
            info!(
                "Cleanup ({}) finished: {} orphaned, {} old logs, {} temp, {} reclaimed",
                mode,
                format!("{}", run.summary.orphans.count).red(),
                format!("{}", run.summary.logs.count).red(),
                format!("{}", run.summary.temp.count).red(),
                archive_janitor_core::utils::format_bytes(run.summary.total_reclaimed).cyan(),
            );
        }
        None => info!("Cleanup is disabled in settings; nothing was done"),
    }
    Ok(())
}

fn print_report(config: &AppConfig, json: bool) -> Result<()> {
    let db = open_database(config)?;
    let engine = CleanupEngine::new(&db, &config.archive_base);
    info!("Building cleanup report for {}", engine.archive_base().display());
    let report = engine.report()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report_text(&report);
    }
    Ok(())
}

fn print_report_text(report: &CleanupReport) {
    println!("Orphaned archive directories:");
    if report.orphaned.is_empty() {
        println!("  None");
    } else {
        for orphan in &report.orphaned {
            println!("  - {} ({} bytes)", orphan.name, orphan.size);
        }
    }

    println!(
        "\nOld job logs older than retention: {}",
        report.old_logs_count
    );

    println!("\nEmpty/Temp stack directories (would be deleted if no DB refs):");
    if report.temp_items.is_empty() {
        println!("  None");
    } else {
        for item in &report.temp_items {
            let flag = if item.has_active_db_ref {
                "KEEP (has DB refs)".green()
            } else {
                "DELETE".red()
            };
            println!(
                "  - {} -> {} [{}] {}",
                item.display_path, item.path, flag, item.reference_info
            );
        }
    }
}
