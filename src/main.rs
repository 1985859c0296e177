//! # News Archive
//!
//! Fetches a news listing, drops entries that are near-duplicates of
//! anything already archived this month, and appends the rest to a
//! date-partitioned Markdown archive.
//!
//! ## Usage
//!
//! ```sh
//! news_archive -a ./news_archive
//! ```
//!
//! ## Architecture
//!
//! One run is a straight pipeline:
//! 1. **Acquisition**: scrape the listing page (or read a JSON batch)
//! 2. **Normalization**: validate each record and parse its timestamp
//! 3. **Deduplication**: compare its Markdown line with the month's lines
//! 4. **Output**: append new lines to the month file and the entry's day file

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod archive;
mod cli;
mod config;
mod error;
mod ingest;
mod models;
mod normalize;
mod similarity;
mod sources;

use archive::ArchiveWriter;
use cli::Cli;
use config::{
    ArchiveConfig, SourceConfig, parse_utc_offset, validate_day_header_format, validate_threshold,
};
use error::{ConfigError, IngestError, StorageError};
use ingest::{Ingestor, run_once};
use models::RunReport;
use sources::{HtmlListSource, JsonFileSource};

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = Instant::now();
    info!("news_archive starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let outcome = run(&args).await;
    report_outcome(&outcome, start_time.elapsed())
}

/// Print the run summary and map the outcome to the process exit code.
fn report_outcome(outcome: &Result<RunReport, Box<dyn Error>>, elapsed: Duration) -> ExitCode {
    match outcome {
        Ok(report) => {
            if report.written > 0 {
                println!("Saved {} new entries.", report.written);
            } else {
                println!("No new entries to save.");
            }
            println!(
                "Fetched {}, duplicates {}, skipped {}. Finished in {:.2}s.",
                report.fetched,
                report.duplicates,
                report.skipped,
                elapsed.as_secs_f64()
            );
            info!(
                ?elapsed,
                written = report.written,
                duplicates = report.duplicates,
                skipped = report.skipped,
                "Execution complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, kind = failure_kind(&**e), ?elapsed, "Run failed");
            eprintln!("news_archive: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Label a run failure for the log.
fn failure_kind(e: &(dyn Error + 'static)) -> &'static str {
    if let Some(ingest) = e.downcast_ref::<IngestError>() {
        ingest.kind()
    } else if e.is::<StorageError>() {
        "storage"
    } else if e.is::<ConfigError>() {
        "config"
    } else {
        "acquisition"
    }
}

/// Validate configuration, then acquire and ingest one batch.
async fn run(args: &Cli) -> Result<RunReport, Box<dyn Error>> {
    let archive_config = ArchiveConfig {
        threshold: validate_threshold(args.threshold)?,
        utc_offset: parse_utc_offset(&args.utc_offset)?,
        day_header_format: validate_day_header_format(&args.day_header_format)?,
    };

    // Captured once; every month-level decision in this run uses it.
    let run_time = Utc::now().with_timezone(&archive_config.utc_offset);
    println!("Current time: {}", run_time.format("%Y-%m-%d %H:%M:%S %:z"));

    let writer = ArchiveWriter::new(&args.archive_dir);
    writer.ensure_writable().await?;

    let ingestor = Ingestor::new(writer, archive_config);
    if args.touch_today {
        ingestor.touch_today(run_time).await?;
    }

    let report = match args.input {
        Some(ref path) => {
            info!(path = %path.display(), "Reading records from file");
            run_once(&JsonFileSource::new(path), &ingestor, run_time).await?
        }
        None => {
            let source_config = match args.config {
                Some(ref path) => SourceConfig::load(path)?,
                None => SourceConfig::default(),
            };
            let timeout = Duration::from_secs(args.timeout_secs);
            let source = HtmlListSource::new(source_config, timeout)?;
            run_once(&source, &ingestor, run_time).await?
        }
    };

    info!(
        archive = %ingestor.writer().root().display(),
        written = report.written,
        "Ingestion finished"
    );
    Ok(report)
}
