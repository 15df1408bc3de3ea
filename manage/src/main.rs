//! wagtail-manage: management commands for a file-backed Wagtail site.
//!
//! Usage:
//!   wagtail-manage convert-revisions-to-log-entries
//!   wagtail-manage --settings site/wagtail.toml convert-revisions-to-log-entries
//!
//! Set RUST_LOG=debug for per-entry output.

mod database;
mod settings;

use std::{path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use wagtail_audit::LogEntryManager;
use wagtail_backfill::{convert_revisions_to_log_entries, BackfillReport};
use wagtail_contracts::error::WagtailResult;

use crate::{
    database::Database,
    settings::{Settings, DEFAULT_SETTINGS},
};

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "wagtail-manage", about = "Wagtail site management commands")]
struct Cli {
    /// Settings file.
    #[arg(long, global = true, env = "WAGTAIL_SETTINGS", default_value = DEFAULT_SETTINGS)]
    settings: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create audit log entries for page revisions saved before the audit
    /// log existed.
    ConvertRevisionsToLogEntries,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    let settings = match Settings::from_file(&cli.settings) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        )
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Command::ConvertRevisionsToLogEntries => convert_revisions(&settings),
    };

    match result {
        Ok(report) => print_report(&report),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn convert_revisions(settings: &Settings) -> WagtailResult<BackfillReport> {
    let db = Database::open(&settings.database.dir)?;
    let pages = db.pages()?;
    let revisions = db.revisions()?;
    let store = db.log_entries()?;

    info!(revisions = revisions.len(), dir = %settings.database.dir.display(), "converting revisions");
    let manager = LogEntryManager::new(Arc::new(store.clone()));
    let report = convert_revisions_to_log_entries(&revisions, &pages, &manager)?;

    if report.entries_created > 0 || report.published_corrected > 0 {
        db.save_log_entries(&store)?;
    }
    Ok(report)
}

fn print_report(report: &BackfillReport) {
    println!("Scanned {} revisions.", report.revisions_scanned);
    println!("  {} log entries created", report.entries_created);
    println!("  {} revisions already logged", report.skipped_existing);
    println!("  {} revisions unchanged", report.unchanged);
    println!("  {} entries marked as published", report.published_corrected);
}
