use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

use crate::format::DateLabeler;
use crate::search::{SearchOptions, DEFAULT_THRESHOLD};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_IDENTITY_PATH: &str = "rest/identitypicker/api/identity";

#[derive(Parser, Debug)]
#[command(
    name = "identity-timeline",
    about = "Unified, searchable change timeline for an identity"
)]
pub struct Cli {
    /// Customer ID whose history to load
    pub customer_id: String,

    /// Filter the timeline with a free-text query
    #[arg(long, short)]
    pub query: Option<String>,

    /// Base URL of the identity service
    #[arg(long, env = "IDENTITY_TIMELINE_BASE_URL")]
    pub base_url: Option<String>,

    /// Path of the identity resource under the base URL
    #[arg(long, env = "IDENTITY_TIMELINE_IDENTITY_PATH")]
    pub identity_path: Option<String>,

    /// Language resource (JSON) used to resolve labels
    #[arg(long, env = "IDENTITY_TIMELINE_LABELS")]
    pub labels: Option<PathBuf>,

    /// Attribute referential (JSON) used to resolve attribute labels
    #[arg(long, env = "IDENTITY_TIMELINE_REFERENTIAL")]
    pub referential: Option<PathBuf>,

    /// Offset from UTC, in minutes, for date labels
    #[arg(long, env = "IDENTITY_TIMELINE_UTC_OFFSET_MINUTES", allow_hyphen_values = true)]
    pub utc_offset_minutes: Option<i32>,

    /// Fuzzy match threshold (0 = exact, 1 = anything)
    #[arg(long, env = "IDENTITY_TIMELINE_THRESHOLD")]
    pub threshold: Option<f64>,

    /// Request timeout in seconds
    #[arg(long, env = "IDENTITY_TIMELINE_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Log file path
    #[arg(long, env = "IDENTITY_TIMELINE_LOG_FILE")]
    pub log_file: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub base_url: Option<String>,
    pub identity_path: Option<String>,
    pub labels: Option<PathBuf>,
    pub referential: Option<PathBuf>,
    pub utc_offset_minutes: Option<i32>,
    pub threshold: Option<f64>,
    pub timeout: Option<u64>,
}

impl ConfigFile {
    pub fn load() -> Option<Self> {
        let config_dir = dirs::config_dir()?;
        let config_path = config_dir.join("identity-timeline").join("config.toml");
        let content = std::fs::read_to_string(config_path).ok()?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Option<Self> {
        match toml::from_str(content) {
            Ok(file) => Some(file),
            Err(e) => {
                tracing::warn!("ignoring invalid config file: {}", e);
                None
            }
        }
    }
}

/// Library-level knobs shared by normalization, search and grouping.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimelineConfig {
    pub search: SearchOptions,
    pub labeler: DateLabeler,
}

/// Effective settings: CLI flags over the config file over defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub customer_id: String,
    pub query: Option<String>,
    pub base_url: String,
    pub identity_path: String,
    pub labels: Option<PathBuf>,
    pub referential: Option<PathBuf>,
    pub timeout: Duration,
    pub timeline: TimelineConfig,
}

impl Settings {
    pub fn resolve(cli: Cli, file: ConfigFile) -> Self {
        let threshold = cli
            .threshold
            .or(file.threshold)
            .unwrap_or(DEFAULT_THRESHOLD)
            .clamp(0.0, 1.0);
        let offset = cli.utc_offset_minutes.or(file.utc_offset_minutes).unwrap_or(0);

        Self {
            customer_id: cli.customer_id,
            query: cli.query,
            base_url: cli
                .base_url
                .or(file.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            identity_path: cli
                .identity_path
                .or(file.identity_path)
                .unwrap_or_else(|| DEFAULT_IDENTITY_PATH.to_string()),
            labels: cli.labels.or(file.labels),
            referential: cli.referential.or(file.referential),
            timeout: Duration::from_secs(cli.timeout.or(file.timeout).unwrap_or(10)),
            timeline: TimelineConfig {
                search: SearchOptions { threshold },
                labeler: DateLabeler::from_offset_minutes(offset),
            },
        }
    }
}
