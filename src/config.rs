//! Runtime configuration: the listing source description and archive settings.
//!
//! The listing source is described by an optional YAML file; when none is
//! given the defaults point at the IT Home rolling news list.
//!
//! ```yaml
//! url: https://www.ithome.com/list/
//! item_selector: ul.datel li
//! category_selector: a.c
//! title_selector: a.t
//! time_selector: i
//! ```

use crate::error::ConfigError;
use crate::similarity::DEFAULT_THRESHOLD;
use chrono::FixedOffset;
use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, instrument};

/// CSS-selector description of a single listing page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Listing page to fetch.
    pub url: String,
    /// One match per news item.
    pub item_selector: String,
    /// Category label, relative to the item.
    pub category_selector: String,
    /// Anchor carrying the headline text and `href`, relative to the item.
    pub title_selector: String,
    /// Element whose text is the `YYYY-MM-DD HH:MM:SS` timestamp.
    pub time_selector: String,
    /// Optional `User-Agent` header.
    pub user_agent: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: "https://www.ithome.com/list/".to_string(),
            item_selector: "ul.datel li".to_string(),
            category_selector: "a.c".to_string(),
            title_selector: "a.t".to_string(),
            time_selector: "i".to_string(),
            user_agent: None,
        }
    }
}

impl SourceConfig {
    /// Load a source description from a YAML file.
    ///
    /// Keys missing from the file keep their default value.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&raw).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        info!(url = %config.url, "Loaded source config");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }
}

/// Parse a fixed UTC offset written as `+HH:MM`, `-HH:MM` or `Z`.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset, ConfigError> {
    let invalid = || ConfigError::UtcOffset(raw.to_string());
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }
    trimmed.parse::<FixedOffset>().map_err(|_| invalid())
}

/// Reject thresholds outside `[0, 1]` (and NaN).
pub fn validate_threshold(threshold: f64) -> Result<f64, ConfigError> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(ConfigError::Threshold(threshold))
    }
}

/// Reject chrono format strings that would fail when rendered.
pub fn validate_day_header_format(format: &str) -> Result<String, ConfigError> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        Err(ConfigError::DateFormat(format.to_string()))
    } else {
        Ok(format.to_string())
    }
}

/// Settings of the archive side of a run.
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub threshold: f64,
    pub utc_offset: FixedOffset,
    /// chrono format used for the date in day-file headers.
    pub day_header_format: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            utc_offset: FixedOffset::east_opt(8 * 3600).expect("+08:00 is valid"),
            day_header_format: "%Y-%m-%d".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_config_defaults() {
        let config = SourceConfig::default();
        assert_eq!(config.url, "https://www.ithome.com/list/");
        assert_eq!(config.item_selector, "ul.datel li");
    }

    #[test]
    fn test_source_config_partial_yaml() {
        let yaml = "url: https://example.com/news\ntime_selector: span.time\n";
        let config = SourceConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.url, "https://example.com/news");
        assert_eq!(config.time_selector, "span.time");
        assert_eq!(config.title_selector, "a.t");
        assert_eq!(config.user_agent, None);
    }

    #[test]
    fn test_source_config_load_missing_file() {
        let err = SourceConfig::load(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(parse_utc_offset("+08:00").unwrap().local_minus_utc(), 8 * 3600);
        assert_eq!(
            parse_utc_offset("-05:30").unwrap().local_minus_utc(),
            -(5 * 3600 + 1800)
        );
        assert_eq!(parse_utc_offset("Z").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_utc_offset(" utc ").unwrap().local_minus_utc(), 0);
        for bad in ["08:00", "+8:00", "+08:60", "+30:00", "", "+ab:cd", "+-1:00", "-+1:00"] {
            assert!(parse_utc_offset(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_validate_day_header_format() {
        assert_eq!(validate_day_header_format("%Y-%m-%d").unwrap(), "%Y-%m-%d");
        assert!(validate_day_header_format("%Y年%m月%d日").is_ok());
        assert!(validate_day_header_format("%Q").is_err());
    }

    #[test]
    fn test_validate_threshold() {
        assert_eq!(validate_threshold(0.9).unwrap(), 0.9);
        assert!(validate_threshold(0.0).is_ok());
        assert!(validate_threshold(1.0).is_ok());
        assert!(validate_threshold(1.5).is_err());
        assert!(validate_threshold(-0.1).is_err());
        assert!(validate_threshold(f64::NAN).is_err());
    }
}
