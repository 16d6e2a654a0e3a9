//! Configuration module for loading environment variables and settings.

use crate::auth::ApiKey;
use crate::error::ConfigError;

/// Default kie.ai API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.kie.ai";

/// Environment variable holding the kie.ai bearer token.
pub const API_KEY_VAR: &str = "KIEAI_API_KEY";

/// Environment variable overriding the kie.ai API base URL.
pub const BASE_URL_VAR: &str = "KIEAI_BASE_URL";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// kie.ai API key. When absent every generation returns an empty result.
    pub api_key: Option<ApiKey>,
    /// kie.ai API base URL, without a trailing slash
    pub base_url: String,
}

impl Config {
    /// Create a configuration with the default base URL.
    pub fn new(api_key: Option<ApiKey>) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Load configuration from environment variables and .env file.
    ///
    /// A missing `KIEAI_API_KEY` is not an error; the server still starts and
    /// answers every tool call with an empty result.
    ///
    /// The listener port is not part of this struct; it comes from
    /// `TransportArgs`, which reads `PORT` itself.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` if KIEAI_BASE_URL is set but is not an http(s) URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_key = std::env::var(API_KEY_VAR).ok().and_then(ApiKey::parse);

        let base_url = match std::env::var(BASE_URL_VAR) {
            Ok(raw) if !raw.trim().is_empty() => parse_base_url(&raw)?,
            _ => DEFAULT_BASE_URL.to_string(),
        };

        Ok(Self { api_key, base_url })
    }

    /// Override the API base URL (used to point the client at a mock server).
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Self {
        self.base_url = normalize_base_url(base_url.as_ref());
        self
    }

    /// Whether an API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Endpoint for submitting a generation task.
    pub fn create_task_endpoint(&self) -> String {
        format!("{}/api/v1/jobs/createTask", self.base_url)
    }

    /// Endpoint for querying a task's status.
    pub fn record_info_endpoint(&self) -> String {
        format!("{}/api/v1/jobs/recordInfo", self.base_url)
    }
}

/// Validate and normalize an API base URL.
pub fn parse_base_url(raw: &str) -> Result<String, ConfigError> {
    let url = normalize_base_url(raw);
    let has_host = url
        .split_once("://")
        .is_some_and(|(scheme, rest)| matches!(scheme, "http" | "https") && !rest.is_empty());

    if has_host {
        Ok(url)
    } else {
        Err(ConfigError::invalid_value(
            BASE_URL_VAR,
            format!("'{}' is not an http(s) URL", raw),
        ))
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
