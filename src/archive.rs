//! Date-partitioned Markdown archive on disk.
//!
//! # Layout
//!
//! ```text
//! archive_root/
//! └── 2024-05/
//!     ├── 00.md   # month partition: "# This Month's News" + every accepted line
//!     ├── 01.md   # day partition:   "# Daily News - 2024-05-01" + that day's lines
//!     └── 02.md
//! ```
//!
//! Every resource is created lazily and only ever appended to. Nothing here
//! deduplicates; that is the ingestion driver's job.

use crate::error::StorageError;
use chrono::{Datelike, NaiveDate};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

/// Header line of a month partition.
pub const MONTH_HEADER: &str = "# This Month's News";

/// File name of the month partition inside a `YYYY-MM` directory.
pub const MONTH_FILE_NAME: &str = "00.md";

/// Owns every write to the archive root.
#[derive(Debug, Clone)]
pub struct ArchiveWriter {
    root: PathBuf,
}

impl ArchiveWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `root/YYYY-MM`
    pub fn month_dir(&self, date: NaiveDate) -> PathBuf {
        self.root.join(format!("{:04}-{:02}", date.year(), date.month()))
    }

    /// `root/YYYY-MM/00.md`
    pub fn month_file(&self, date: NaiveDate) -> PathBuf {
        self.month_dir(date).join(MONTH_FILE_NAME)
    }

    /// `root/YYYY-MM/DD.md`
    pub fn day_file(&self, date: NaiveDate) -> PathBuf {
        self.month_dir(date).join(format!("{:02}.md", date.day()))
    }

    /// Create a partition directory and its parents. Idempotent.
    #[instrument(level = "debug", skip_all, fields(path = %dir.display()))]
    pub async fn ensure_partition(&self, dir: &Path) -> Result<(), StorageError> {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| StorageError::new("create_dir_all", dir, e))
    }

    /// Create a day file with its header unless it already exists.
    ///
    /// Returns `true` when the file was created by this call.
    #[instrument(level = "debug", skip_all, fields(path = %path.display()))]
    pub async fn ensure_day_file(
        &self,
        path: &Path,
        header_date: &str,
    ) -> Result<bool, StorageError> {
        let header = format!("# Daily News - {header_date}\n");
        let created = create_with_header(path, &header).await?;
        if created {
            info!(path = %path.display(), "Created day partition");
        }
        Ok(created)
    }

    /// Create the month file with its header unless it already exists, and
    /// return its full content.
    #[instrument(level = "debug", skip_all, fields(path = %path.display()))]
    pub async fn ensure_month_file(&self, path: &Path) -> Result<String, StorageError> {
        let header = format!("{MONTH_HEADER}\n");
        if create_with_header(path, &header).await? {
            info!(path = %path.display(), "Created month partition");
            return Ok(header);
        }
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| StorageError::new("read", path, e))?;
        debug!(path = %path.display(), bytes = content.len(), "Read month partition");
        Ok(content)
    }

    /// Append one Markdown line (plus newline) to a partition file.
    pub async fn append(&self, path: &Path, line: &str) -> Result<(), StorageError> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| StorageError::new("open", path, e))?;
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        file.write_all(buf.as_bytes())
            .await
            .map_err(|e| StorageError::new("append", path, e))?;
        file.flush()
            .await
            .map_err(|e| StorageError::new("flush", path, e))?;
        debug!(path = %path.display(), line, "Appended entry");
        Ok(())
    }

    /// Ensure the archive root exists and is writable.
    ///
    /// Creates the directory if needed, then creates and removes a scratch file.
    #[instrument(level = "info", skip_all, fields(path = %self.root.display()))]
    pub async fn ensure_writable(&self) -> Result<(), StorageError> {
        self.ensure_partition(&self.root).await?;
        let scratch = self.root.join(".__write_check__");
        fs::File::create(&scratch)
            .await
            .map_err(|e| StorageError::new("write check", &scratch, e))?;
        let _ = fs::remove_file(&scratch).await;
        info!("Archive directory is writable");
        Ok(())
    }
}

/// Create `path` containing `header`, failing over to a no-op if it exists.
///
/// `create_new` makes the existence check and the creation one step, so an
/// existing file is never truncated.
async fn create_with_header(path: &Path, header: &str) -> Result<bool, StorageError> {
    match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
    {
        Ok(mut file) => {
            file.write_all(header.as_bytes())
                .await
                .map_err(|e| StorageError::new("write header", path, e))?;
            file.flush()
                .await
                .map_err(|e| StorageError::new("flush", path, e))?;
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(StorageError::new("create", path, e)),
    }
}
