//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::gesture::{Thresholds, DEFAULT_DISTANCE_THRESHOLD, DEFAULT_VELOCITY_THRESHOLD};

#[derive(Debug, Parser)]
#[command(name = "swipefeed", version)]
#[command(about = "Swipe through news articles in the terminal")]
pub struct Cli {
    /// Base URL of the feed backend
    #[arg(long, env = "SWIPEFEED_API_URL", default_value = "http://localhost:4000")]
    pub api_url: String,

    /// Bearer token for the backend session
    #[arg(long, env = "SWIPEFEED_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Drag distance (units) past which a release commits a swipe
    #[arg(long, default_value_t = DEFAULT_DISTANCE_THRESHOLD)]
    pub distance_threshold: f32,

    /// Release velocity (units/second) that commits a swipe regardless of distance
    #[arg(long, default_value_t = DEFAULT_VELOCITY_THRESHOLD)]
    pub velocity_threshold: f32,

    /// Delay before an empty stack is refilled, in milliseconds
    #[arg(long, default_value_t = 100)]
    pub refill_debounce_ms: u64,

    /// Drag units per terminal column moved with the mouse
    #[arg(long, default_value_t = 12.0)]
    pub units_per_column: f32,

    /// Where to write logs (stdout belongs to the UI)
    #[arg(long, env = "SWIPEFEED_LOG_FILE", default_value = "swipefeed.log")]
    pub log_file: PathBuf,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("no session token; pass --token or set SWIPEFEED_TOKEN")]
    MissingToken,

    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },

    #[error("api url must start with http:// or https://, got {0}")]
    BadUrl(String),
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub token: String,
    pub thresholds: Thresholds,
    pub refill_debounce: Duration,
    pub units_per_column: f32,
    pub log_file: PathBuf,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let token = cli
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?;

        if !(cli.api_url.starts_with("http://") || cli.api_url.starts_with("https://")) {
            return Err(ConfigError::BadUrl(cli.api_url));
        }

        for (name, value) in [
            ("distance threshold", cli.distance_threshold),
            ("velocity threshold", cli.velocity_threshold),
            ("units per column", cli.units_per_column),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NotPositive { name, value });
            }
        }

        Ok(Self {
            api_url: cli.api_url,
            token,
            thresholds: Thresholds {
                distance: cli.distance_threshold,
                velocity: cli.velocity_threshold,
            },
            refill_debounce: Duration::from_millis(cli.refill_debounce_ms),
            units_per_column: cli.units_per_column,
            log_file: cli.log_file,
        })
    }
}
