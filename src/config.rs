//! # Configuration Module
//!
//! This module defines the immutable bot configuration, built once at startup
//! from the process environment and shared with every handler.

use std::path::PathBuf;
use std::time::Duration;

use crate::errors::ConfigError;

// Required environment variables
pub const BOT_TOKEN_VAR: &str = "TELEGRAM_APITOKEN2";
pub const COMPLETION_API_KEY_VAR: &str = "YANDEX_API_KEY";
pub const CATALOG_ID_VAR: &str = "YANDEX_CATALOG_ID";
pub const IMAGE_API_KEY_VAR: &str = "YANDEX_API_ART_KEY";

// Defaults for optional settings
pub const DEFAULT_BROADCAST_CHANNEL: &str = "@offthepages";
pub const DEFAULT_CHANNEL_URL: &str = "https://t.me/offthepages";
pub const DEFAULT_INTERACTION_LOG_PATH: &str = "promtreq.json";
pub const DEFAULT_IMAGE_DIR: &str = ".";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 30; // 5 minutes at the default interval

/// Polling policy for asynchronous image jobs
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Delay before each status request
    pub interval: Duration,
    /// Number of status requests before giving up on a job
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
        }
    }
}

/// Bot configuration
#[derive(Clone)]
pub struct Config {
    /// Telegram bot token
    pub bot_token: String,
    /// API key for the completion endpoint
    pub completion_api_key: String,
    /// Catalog (folder) identifier used in model URIs
    pub catalog_id: String,
    /// API key for the image generation endpoint
    pub image_api_key: String,
    /// Channel that receives cards on "send to channel", `@username` or numeric id
    pub broadcast_channel: String,
    /// Link appended to every caption
    pub channel_url: String,
    /// Interaction log file
    pub interaction_log_path: PathBuf,
    /// Directory for generated images
    pub image_dir: PathBuf,
    /// Image job polling policy
    pub poll: PollPolicy,
    /// Send a generic apology to the user when the pipeline fails
    pub apologize_on_error: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("catalog_id", &self.catalog_id)
            .field("broadcast_channel", &self.broadcast_channel)
            .field("channel_url", &self.channel_url)
            .field("interaction_log_path", &self.interaction_log_path)
            .field("image_dir", &self.image_dir)
            .field("poll", &self.poll)
            .field("apologize_on_error", &self.apologize_on_error)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Build the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    ///
    /// Empty values are treated as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let require = |key: &str| get(key).ok_or_else(|| ConfigError::Missing(key.to_string()));

        let poll = PollPolicy {
            interval: Duration::from_secs(parse_or(
                get("POLL_INTERVAL_SECS"),
                "POLL_INTERVAL_SECS",
                DEFAULT_POLL_INTERVAL_SECS,
            )?),
            max_attempts: parse_or(
                get("POLL_MAX_ATTEMPTS"),
                "POLL_MAX_ATTEMPTS",
                DEFAULT_POLL_MAX_ATTEMPTS,
            )?,
        };
        if poll.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "POLL_MAX_ATTEMPTS".to_string(),
                value: "0".to_string(),
            });
        }

        Ok(Self {
            bot_token: require(BOT_TOKEN_VAR)?,
            completion_api_key: require(COMPLETION_API_KEY_VAR)?,
            catalog_id: require(CATALOG_ID_VAR)?,
            image_api_key: require(IMAGE_API_KEY_VAR)?,
            broadcast_channel: get("BROADCAST_CHANNEL")
                .unwrap_or_else(|| DEFAULT_BROADCAST_CHANNEL.to_string()),
            channel_url: get("CHANNEL_URL").unwrap_or_else(|| DEFAULT_CHANNEL_URL.to_string()),
            interaction_log_path: get("INTERACTION_LOG_PATH")
                .unwrap_or_else(|| DEFAULT_INTERACTION_LOG_PATH.to_string())
                .into(),
            image_dir: get("IMAGE_DIR")
                .unwrap_or_else(|| DEFAULT_IMAGE_DIR.to_string())
                .into(),
            poll,
            apologize_on_error: parse_bool(get("APOLOGIZE_ON_ERROR"), "APOLOGIZE_ON_ERROR")?,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}

fn parse_bool(value: Option<String>, key: &str) -> Result<bool, ConfigError> {
    match value.as_deref().map(|v| v.trim().to_lowercase()) {
        None => Ok(false),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(_) => Err(ConfigError::Invalid {
            key: key.to_string(),
            value: value.unwrap_or_default(),
        }),
    }
}
