//! Turns raw listing records into canonical [`Entry`] values.

use crate::error::ParseError;
use crate::models::{Entry, RawRecord};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

/// Fixed format of the listing's time column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Validate a raw record and parse its timestamp.
///
/// Title, link and category are trimmed and runs of whitespace inside the
/// title collapse to one space, so that markup line breaks in the listing do
/// not leak into the archive. An empty category becomes `None`.
pub fn normalize(raw: &RawRecord) -> Result<Entry, ParseError> {
    let title = WHITESPACE.replace_all(raw.title.trim(), " ").into_owned();
    if title.is_empty() {
        return Err(ParseError::MissingTitle);
    }

    let link = raw.link.trim();
    if link.is_empty() {
        return Err(ParseError::MissingLink);
    }

    let time = raw.time.trim();
    let timestamp = NaiveDateTime::parse_from_str(time, TIMESTAMP_FORMAT).map_err(|source| {
        ParseError::Timestamp {
            raw: time.to_string(),
            format: TIMESTAMP_FORMAT,
            source,
        }
    })?;

    let category = raw
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    Ok(Entry {
        category,
        title,
        link: link.to_string(),
        timestamp,
    })
}
