//! The ingestion driver: one deduplicating pass over a batch of records.
//!
//! A run captures its timestamp once. That timestamp picks the month
//! partition every accepted line goes to, while each entry's day partition
//! follows the entry's own timestamp. Records are handled strictly in the
//! order received so later records are checked against earlier accepted
//! ones from the same batch.

use crate::archive::ArchiveWriter;
use crate::config::ArchiveConfig;
use crate::error::{IngestError, StorageError};
use crate::models::{RawRecord, RunReport};
use crate::normalize::normalize;
use crate::similarity::SimilarityIndex;
use crate::sources::Acquire;
use chrono::{DateTime, FixedOffset, NaiveDate};
use tracing::{debug, info, instrument, warn};

pub struct Ingestor {
    writer: ArchiveWriter,
    config: ArchiveConfig,
}

impl Ingestor {
    pub fn new(writer: ArchiveWriter, config: ArchiveConfig) -> Self {
        Self { writer, config }
    }

    pub fn writer(&self) -> &ArchiveWriter {
        &self.writer
    }

    fn header_date(&self, date: NaiveDate) -> String {
        date.format(&self.config.day_header_format).to_string()
    }

    /// Ensure the day partition for `date` exists (directory and file).
    async fn ensure_day(&self, date: NaiveDate) -> Result<std::path::PathBuf, StorageError> {
        self.writer.ensure_partition(&self.writer.month_dir(date)).await?;
        let path = self.writer.day_file(date);
        self.writer.ensure_day_file(&path, &self.header_date(date)).await?;
        Ok(path)
    }

    /// Create the run date's day file even if no entry lands in it.
    pub async fn touch_today(&self, run_time: DateTime<FixedOffset>) -> Result<(), StorageError> {
        self.ensure_day(run_time.date_naive()).await.map(|_| ())
    }

    /// Deduplicate `records` against the run month and append the new ones.
    ///
    /// Records that fail normalization are skipped and counted. A storage
    /// failure stops the run; lines already appended stay appended.
    #[instrument(
        level = "info",
        skip_all,
        fields(run_date = %run_time.date_naive(), records = records.len())
    )]
    pub async fn ingest(
        &self,
        run_time: DateTime<FixedOffset>,
        records: &[RawRecord],
    ) -> Result<RunReport, StorageError> {
        let run_date = run_time.date_naive();
        let month_dir = self.writer.month_dir(run_date);
        let month_file = self.writer.month_file(run_date);

        self.writer.ensure_partition(&month_dir).await?;
        let existing = self.writer.ensure_month_file(&month_file).await?;
        let mut index = SimilarityIndex::from_partition(&existing, self.config.threshold);
        info!(
            path = %month_file.display(),
            known = index.len(),
            threshold = index.threshold(),
            "Loaded month partition"
        );

        let mut report = RunReport {
            fetched: records.len(),
            ..RunReport::default()
        };

        for (position, raw) in records.iter().enumerate() {
            let entry = match normalize(raw) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(position, title = %raw.title, error = %e, "Skipping malformed record");
                    report.skipped += 1;
                    continue;
                }
            };

            let line = entry.markdown_line();
            let day_file = self.ensure_day(entry.timestamp.date()).await?;

            if let Some(hit) = index.find_near_duplicate(&line) {
                debug!(
                    position,
                    candidate = %line,
                    existing = hit.existing,
                    ratio = hit.ratio,
                    "Rejected near-duplicate"
                );
                report.duplicates += 1;
                continue;
            }

            self.writer.append(&month_file, &line).await?;
            self.writer.append(&day_file, &line).await?;
            index.insert(&line);
            report.written += 1;
            debug!(
                position,
                line = %line,
                category = entry.category.as_deref(),
                day_file = %day_file.display(),
                "Archived entry"
            );
        }

        if report.written > 0 {
            info!(
                written = report.written,
                duplicates = report.duplicates,
                skipped = report.skipped,
                "Saved new entries"
            );
        } else {
            info!(
                duplicates = report.duplicates,
                skipped = report.skipped,
                "No new entries to save"
            );
        }
        Ok(report)
    }
}

/// Acquire one batch from `source` and ingest it.
///
/// Acquisition happens before any write, so an acquisition failure leaves
/// the archive untouched.
#[instrument(level = "info", skip_all, fields(source = source.name()))]
pub async fn run_once<S: Acquire>(
    source: &S,
    ingestor: &Ingestor,
    run_time: DateTime<FixedOffset>,
) -> Result<RunReport, IngestError> {
    let records = source
        .acquire()
        .await
        .map_err(|error| IngestError::Acquisition {
            source_name: source.name().to_string(),
            error,
        })?;
    info!(count = records.len(), "Acquired records");

    Ok(ingestor.ingest(run_time, &records).await?)
}
