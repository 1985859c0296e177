//! Acquisition collaborators that produce [`RawRecord`]s.
//!
//! The ingestion core only sees the [`Acquire`] trait. Two implementations
//! ship with the binary:
//!
//! | Source | Input | Notes |
//! |--------|-------|-------|
//! | [`HtmlListSource`] | one listing page over HTTP | CSS selectors from [`SourceConfig`] |
//! | [`JsonFileSource`] | a JSON array on disk | offline runs and replays |
//!
//! Neither retries. A failed request fails the whole acquisition.

use crate::config::SourceConfig;
use crate::error::AcquisitionError;
use crate::models::RawRecord;
use itertools::Itertools;
use scraper::{ElementRef, Html, Selector};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Something that yields the current batch of raw listing records.
pub trait Acquire {
    /// Human-readable name used in logs and errors.
    fn name(&self) -> &str;

    /// Produce every record currently available, in source order.
    async fn acquire(&self) -> Result<Vec<RawRecord>, AcquisitionError>;
}

/// Scrapes a single HTML listing page.
pub struct HtmlListSource {
    config: SourceConfig,
    client: reqwest::Client,
}

impl HtmlListSource {
    pub fn new(config: SourceConfig, timeout: Duration) -> Result<Self, AcquisitionError> {
        let mut builder = reqwest::Client::builder().timeout(timeout);
        if let Some(ref agent) = config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        Ok(Self {
            config,
            client: builder.build()?,
        })
    }
}

impl Acquire for HtmlListSource {
    fn name(&self) -> &str {
        &self.config.url
    }

    #[instrument(level = "info", skip_all, fields(url = %self.config.url))]
    async fn acquire(&self) -> Result<Vec<RawRecord>, AcquisitionError> {
        let response = self.client.get(&self.config.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AcquisitionError::Status {
                url: self.config.url.clone(),
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        debug!(bytes = body.len(), "Fetched listing page");

        let records = parse_listing(&body, &self.config)?;
        info!(count = records.len(), "Scraped listing records");
        Ok(records)
    }
}

fn selector(raw: &str) -> Result<Selector, AcquisitionError> {
    Selector::parse(raw).map_err(|e| AcquisitionError::Selector {
        selector: raw.to_string(),
        message: e.to_string(),
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().join("").trim().to_string()
}

/// Extract records from a listing page.
///
/// Items without a title anchor are skipped. Relative links are resolved
/// against the listing URL; missing category or time cells yield empty
/// strings and are left for normalization to judge.
pub fn parse_listing(
    html: &str,
    config: &SourceConfig,
) -> Result<Vec<RawRecord>, AcquisitionError> {
    let base = Url::parse(&config.url).map_err(|source| AcquisitionError::InvalidUrl {
        url: config.url.clone(),
        source,
    })?;
    let item_selector = selector(&config.item_selector)?;
    let category_selector = selector(&config.category_selector)?;
    let title_selector = selector(&config.title_selector)?;
    let time_selector = selector(&config.time_selector)?;

    let document = Html::parse_document(html);
    let mut records = Vec::new();

    for (position, item) in document.select(&item_selector).enumerate() {
        let Some(anchor) = item.select(&title_selector).next() else {
            warn!(position, "Listing item has no title anchor; skipping");
            continue;
        };

        let link = anchor
            .value()
            .attr("href")
            .and_then(|href| base.join(href.trim()).ok())
            .map(|url| url.to_string())
            .unwrap_or_default();

        records.push(RawRecord {
            category: item.select(&category_selector).next().map(element_text),
            title: element_text(anchor),
            link,
            time: item
                .select(&time_selector)
                .next()
                .map(element_text)
                .unwrap_or_default(),
        });
    }

    Ok(records)
}

/// Reads a JSON array of records from disk.
pub struct JsonFileSource {
    path: PathBuf,
    name: String,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }
}

impl Acquire for JsonFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(level = "info", skip_all, fields(path = %self.name))]
    async fn acquire(&self) -> Result<Vec<RawRecord>, AcquisitionError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| AcquisitionError::Io {
                path: self.path.clone(),
                source,
            })?;
        let records: Vec<RawRecord> = serde_json::from_str(&raw)?;
        info!(count = records.len(), "Loaded records from file");
        Ok(records)
    }
}
