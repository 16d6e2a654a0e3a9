//! Error types for the common library.
//!
//! This module provides a unified error hierarchy using `thiserror` for the
//! kie.ai MCP servers.
//!
//! # Error Categories
//!
//! - `ConfigError`: Missing or invalid configuration
//! - `Error::MissingApiKey`: No credential configured, no request attempted
//! - `Error::Api`: HTTP-level failures (includes endpoint and status)
//! - `Error::Vendor`: kie.ai envelope reported a non-200 `code`
//! - `Error::TaskFailed`: the generation task reached a terminal failure state
//! - `Error::MalformedResult`: the result payload had an unexpected shape
//! - `Error::RetriesExhausted`: the task did not finish within the poll budget
//! - `Error::Validation`: Input validation failures

use thiserror::Error;

/// Unified error type for the common library.
#[derive(Debug, Error)]
pub enum Error {
    /// No API key is configured
    #[error("kie.ai API key is not configured (set KIEAI_API_KEY)")]
    MissingApiKey,

    /// HTTP errors with endpoint and status context
    ///
    /// A `status_code` of 0 means the request never produced a response.
    #[error("API error for {endpoint} (HTTP {status_code}): {message}")]
    Api {
        /// The API endpoint that was called
        endpoint: String,
        /// HTTP status code returned by the API
        status_code: u16,
        /// Error message from the API or describing the failure
        message: String,
    },

    /// The vendor response envelope carried a non-success code
    #[error("kie.ai returned code {code}: {message}")]
    Vendor {
        /// Envelope `code` field
        code: i64,
        /// Envelope `message` field
        message: String,
    },

    /// The generation task finished unsuccessfully
    #[error("Task {task_id} failed: {message}")]
    TaskFailed {
        /// Vendor task identifier
        task_id: String,
        /// Failure reason reported by the vendor
        message: String,
    },

    /// The result payload could not be interpreted
    #[error("Malformed result payload: {0}")]
    MalformedResult(String),

    /// The task did not complete within the poll budget
    #[error("Task did not complete after {attempts} poll attempts")]
    RetriesExhausted {
        /// Number of poll attempts made
        attempts: u32,
    },

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    /// Create a new API error with endpoint, status code, and message.
    ///
    /// # Example
    ///
    /// ```
    /// use kieai_mcp_common::error::Error;
    ///
    /// let err = Error::api(
    ///     "https://api.kie.ai/api/v1/jobs/createTask",
    ///     500,
    ///     "Internal server error"
    /// );
    /// assert!(err.to_string().contains("api.kie.ai"));
    /// assert!(err.to_string().contains("500"));
    /// ```
    pub fn api(endpoint: impl Into<String>, status_code: u16, message: impl Into<String>) -> Self {
        Error::Api {
            endpoint: endpoint.into(),
            status_code,
            message: message.into(),
        }
    }

    /// Create a new vendor envelope error.
    ///
    /// # Example
    ///
    /// ```
    /// use kieai_mcp_common::error::Error;
    ///
    /// let err = Error::vendor(401, "You do not have access permissions");
    /// assert!(err.to_string().contains("401"));
    /// ```
    pub fn vendor(code: i64, message: impl Into<String>) -> Self {
        Error::Vendor {
            code,
            message: message.into(),
        }
    }

    /// Create a new task failure error.
    pub fn task_failed(task_id: impl Into<String>, message: impl Into<String>) -> Self {
        Error::TaskFailed {
            task_id: task_id.into(),
            message: message.into(),
        }
    }

    /// Create a new malformed result error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedResult(message.into())
    }

    /// Create a new validation error.
    ///
    /// # Example
    ///
    /// ```
    /// use kieai_mcp_common::error::Error;
    ///
    /// let err = Error::validation("prompt too short");
    /// assert!(err.to_string().contains("prompt too short"));
    /// ```
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Short machine-friendly label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::MissingApiKey => "missing_api_key",
            Error::Api { .. } => "api",
            Error::Vendor { .. } => "vendor",
            Error::TaskFailed { .. } => "task_failed",
            Error::MalformedResult(_) => "malformed_result",
            Error::RetriesExhausted { .. } => "retries_exhausted",
            Error::Validation(_) => "validation",
        }
    }
}

/// Configuration errors.
///
/// These errors occur when loading or validating configuration from
/// environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl ConfigError {
    /// Create a new invalid value error.
    pub fn invalid_value(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue(name.into(), reason.into())
    }
}

/// Result type alias using the unified Error type.
///
/// Used by the generation handlers for every vendor-facing operation.
pub type Result<T> = std::result::Result<T, Error>;
