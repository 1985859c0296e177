//! Data models for fetched records and archived entries.
//!
//! - [`RawRecord`]: one listing item exactly as the acquisition layer saw it
//! - [`Entry`]: a validated record with a parsed timestamp
//! - [`RunReport`]: counts produced by one ingestion run

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A raw news item as scraped from a listing page.
///
/// Nothing here is validated; see [`crate::normalize::normalize`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawRecord {
    /// Section label shown next to the headline, if the source has one.
    #[serde(default)]
    pub category: Option<String>,
    /// The headline text.
    pub title: String,
    /// Absolute URL of the story.
    pub link: String,
    /// Publication time as text, expected as `YYYY-MM-DD HH:MM:SS`.
    pub time: String,
}

/// A canonical news entry ready to be archived.
///
/// The timestamp is naive: it is taken to already be in the archive's
/// configured timezone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub category: Option<String>,
    pub title: String,
    pub link: String,
    pub timestamp: NaiveDateTime,
}

impl Entry {
    /// Serialized form used for both storage and similarity comparison.
    ///
    /// The trailing newline is added by the writer, not here.
    pub fn markdown_line(&self) -> String {
        format!("- [{}]({})", self.title, self.link)
    }
}

/// Counts collected over one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Records handed over by the acquisition layer.
    pub fetched: usize,
    /// Entries appended to the archive.
    pub written: usize,
    /// Entries rejected as near-duplicates.
    pub duplicates: usize,
    /// Records dropped because they failed normalization.
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_markdown_line() {
        let entry = Entry {
            category: Some("Tech".to_string()),
            title: "Rust 1.80 released".to_string(),
            link: "https://example.com/rust".to_string(),
            timestamp: NaiveDate::from_ymd_opt(2024, 7, 25)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        };
        assert_eq!(
            entry.markdown_line(),
            "- [Rust 1.80 released](https://example.com/rust)"
        );
    }

    #[test]
    fn test_raw_record_deserialization_without_category() {
        let json = r#"{
            "title": "A",
            "link": "http://x/1",
            "time": "2024-05-01 08:00:00"
        }"#;

        let record: RawRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.category, None);
        assert_eq!(record.title, "A");
        assert_eq!(record.time, "2024-05-01 08:00:00");
    }
}
