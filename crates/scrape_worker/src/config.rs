//! Worker configuration.
//!
//! Every setting can be given as a flag or through the environment. The parsed
//! [`Cli`] is validated once into a [`WorkerConfig`] that the rest of the
//! process borrows.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use log::LevelFilter;
use scrape_core::{QualityThresholds, DEFAULT_HIGH_QUALITY_WORDS, DEFAULT_MIN_WORDS};
use scrape_engine::{default_consent_matchers, ConsentMatcher, QueueSettings};

#[derive(Debug, Clone, Parser)]
#[command(name = "scrape-worker")]
#[command(about = "Polls the job queue, extracts page or PDF text and reports back")]
#[command(version)]
pub struct Cli {
    /// Base URL of the queue project
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// Service credential, sent as a bearer token
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    pub service_role_key: Option<String>,

    /// Public API key, sent as the `apikey` header
    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true, default_value = "")]
    pub anon_key: String,

    /// Identity reported to the queue (default: rs-worker-<pid>)
    #[arg(long, env = "WORKER_ID")]
    pub worker_id: Option<String>,

    /// Base poll interval in seconds
    #[arg(long, env = "POLL_INTERVAL", default_value_t = 5)]
    pub poll_interval: u64,

    /// Extractions with fewer words fail the job
    #[arg(long, env = "MIN_WORDS", default_value_t = DEFAULT_MIN_WORDS)]
    pub min_words: usize,

    /// Extractions with more words are reported as high quality
    #[arg(long, env = "HIGH_QUALITY_WORDS", default_value_t = DEFAULT_HIGH_QUALITY_WORDS)]
    pub high_quality_words: usize,

    /// Ordered cookie-banner matchers: `text:<tag>:<label>` or `css:<selector>`
    #[arg(long = "consent-matcher", env = "CONSENT_MATCHERS", value_delimiter = ',')]
    pub consent_matchers: Vec<ConsentMatcher>,

    /// Chromium binary to launch (auto-detected when absent)
    #[arg(long, env = "CHROME_EXECUTABLE")]
    pub chrome_executable: Option<PathBuf>,

    /// Process at most one job and exit
    #[arg(long)]
    pub once: bool,

    /// Log level: error, warn, info, debug or trace
    #[arg(long, env = "LOG_LEVEL", default_value = "info", value_parser = parse_level)]
    pub log_level: LevelFilter,

    /// Also append logs to this file
    #[arg(long, env = "LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}; set SUPABASE_URL, SUPABASE_ANON_KEY and SUPABASE_SERVICE_ROLE_KEY")]
    Missing(&'static str),
    #[error("POLL_INTERVAL must be at least 1 second")]
    ZeroPollInterval,
    #[error("HIGH_QUALITY_WORDS ({high}) must not be below MIN_WORDS ({min})")]
    InvertedThresholds { min: usize, high: usize },
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub supabase_url: String,
    pub service_role_key: String,
    pub anon_key: String,
    pub worker_id: String,
    pub poll_interval: Duration,
    pub thresholds: QualityThresholds,
    pub consent_matchers: Vec<ConsentMatcher>,
    pub chrome_executable: Option<PathBuf>,
    pub once: bool,
}

impl WorkerConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let supabase_url = required(cli.supabase_url, "SUPABASE_URL")?;
        let service_role_key = required(cli.service_role_key, "SUPABASE_SERVICE_ROLE_KEY")?;

        if cli.poll_interval == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if cli.high_quality_words < cli.min_words {
            return Err(ConfigError::InvertedThresholds {
                min: cli.min_words,
                high: cli.high_quality_words,
            });
        }

        let worker_id = cli
            .worker_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(default_worker_id);
        let consent_matchers = if cli.consent_matchers.is_empty() {
            default_consent_matchers()
        } else {
            cli.consent_matchers
        };

        Ok(Self {
            supabase_url,
            service_role_key,
            anon_key: cli.anon_key.trim().to_string(),
            worker_id,
            poll_interval: Duration::from_secs(cli.poll_interval),
            thresholds: QualityThresholds {
                min_words: cli.min_words,
                high_words: cli.high_quality_words,
            },
            consent_matchers,
            chrome_executable: cli.chrome_executable,
            once: cli.once,
        })
    }

    pub fn queue_settings(&self) -> QueueSettings {
        QueueSettings::new(
            &self.supabase_url,
            self.service_role_key.clone(),
            self.anon_key.clone(),
        )
    }
}

pub fn default_worker_id() -> String {
    format!("rs-worker-{}", std::process::id())
}

fn parse_level(raw: &str) -> Result<LevelFilter, String> {
    raw.parse()
        .map_err(|_| format!("unknown log level {raw:?}"))
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}
