//! Environment configuration for Tech Compass.
//!
//! The API key is the only required value; everything else has a default.

use std::env;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_TIMEOUT_MS: u64 = 45_000;
pub const DEFAULT_CAPTURE_MAX_WIDTH: u32 = 1280;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API_KEY environment variable not set")]
    MissingApiKey,

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub request_timeout: Duration,
    pub capture_max_width: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("request_timeout", &self.request_timeout)
            .field("capture_max_width", &self.capture_max_width)
            .finish()
    }
}

impl AppConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            capture_max_width: DEFAULT_CAPTURE_MAX_WIDTH,
        }
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_key = get("API_KEY")
            .or_else(|| get("GEMINI_API_KEY"))
            .ok_or(ConfigError::MissingApiKey)?;

        let mut config = Self::new(api_key);
        if let Some(model) = get("TECH_COMPASS_MODEL") {
            config.model = model;
        }
        if let Some(endpoint) = get("TECH_COMPASS_ENDPOINT") {
            config.endpoint = endpoint.trim_end_matches('/').to_string();
        }
        if let Some(raw) = get("TECH_COMPASS_TIMEOUT_MS") {
            let millis = parse_positive("TECH_COMPASS_TIMEOUT_MS", &raw)?;
            config.request_timeout = Duration::from_millis(millis);
        }
        if let Some(raw) = get("TECH_COMPASS_CAPTURE_MAX_WIDTH") {
            let width = parse_positive("TECH_COMPASS_CAPTURE_MAX_WIDTH", &raw)?;
            config.capture_max_width =
                u32::try_from(width).map_err(|_| ConfigError::InvalidValue {
                    key: "TECH_COMPASS_CAPTURE_MAX_WIDTH",
                    value: raw.clone(),
                })?;
        }

        Ok(config)
    }
}

fn parse_positive(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}
