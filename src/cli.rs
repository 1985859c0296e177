//! Command-line interface definitions for the news archiver.
//!
//! Every option can also be supplied through an environment variable, which
//! keeps cron entries short.

use crate::similarity::DEFAULT_THRESHOLD;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for one ingestion run.
///
/// # Examples
///
/// ```sh
/// # Scrape the default listing into ./news_archive
/// news_archive
///
/// # Custom source description and archive location
/// news_archive -a /srv/news -c source.yaml
///
/// # Replay a saved batch of records instead of scraping
/// news_archive -i records.json --threshold 0.85
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Root directory of the Markdown archive
    #[arg(short, long, env = "NEWS_ARCHIVE_DIR", default_value = "news_archive")]
    pub archive_dir: PathBuf,

    /// Optional YAML file describing the listing page and its selectors
    #[arg(short, long, env = "NEWS_ARCHIVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Read records from a JSON file instead of scraping the listing page
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Similarity above which a new line counts as a duplicate
    #[arg(long, env = "NEWS_ARCHIVE_THRESHOLD", default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    /// Fixed UTC offset of the archive's timezone
    #[arg(
        long,
        env = "NEWS_ARCHIVE_UTC_OFFSET",
        default_value = "+08:00",
        allow_hyphen_values = true
    )]
    pub utc_offset: String,

    /// chrono format of the date shown in day-file headers
    #[arg(long, default_value = "%Y-%m-%d")]
    pub day_header_format: String,

    /// Request timeout for the listing page, in seconds
    #[arg(long, default_value_t = 20)]
    pub timeout_secs: u64,

    /// Also create today's day file when nothing new lands in it
    #[arg(long)]
    pub touch_today: bool,
}
