//! FLUX 2 Pro generation handler for the kie.ai MCP server.
//!
//! This module provides the `FluxHandler` struct and parameter types for
//! text-to-image generation through kie.ai's asynchronous job API: a task is
//! submitted with `createTask`, then `recordInfo` is polled until the task
//! succeeds, fails, or the poll budget runs out.

use kieai_mcp_common::auth::ApiKey;
use kieai_mcp_common::config::Config;
use kieai_mcp_common::error::{Error, Result};
use reqwest::header::AUTHORIZATION;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// kie.ai model identifier for FLUX 2 Pro text-to-image.
pub const MODEL_ID: &str = "flux-2/pro-text-to-image";

/// Minimum prompt length in characters.
pub const MIN_PROMPT_CHARS: usize = 3;

/// Maximum prompt length in characters.
pub const MAX_PROMPT_CHARS: usize = 5000;

/// Valid aspect ratios for image generation.
pub const VALID_ASPECT_RATIOS: &[&str] = &["1:1", "4:3", "3:4", "16:9", "9:16", "3:2", "2:3", "auto"];

/// Default aspect ratio.
pub const DEFAULT_ASPECT_RATIO: &str = "1:1";

/// Valid output resolutions.
pub const VALID_RESOLUTIONS: &[&str] = &["1K", "2K"];

/// Default output resolution.
pub const DEFAULT_RESOLUTION: &str = "1K";

/// Envelope `code` signalling success.
pub const SUCCESS_CODE: i64 = 200;

/// Task polling configuration
pub const POLL_MAX_ATTEMPTS: u32 = 6;
pub const POLL_INITIAL_DELAY_MS: u64 = 5000;
pub const POLL_MAX_DELAY_MS: u64 = 10000;
pub const POLL_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Aspect ratio of the generated image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "3:4")]
    Portrait3x4,
    #[serde(rename = "16:9")]
    Widescreen,
    #[serde(rename = "9:16")]
    Vertical,
    #[serde(rename = "3:2")]
    Landscape3x2,
    #[serde(rename = "2:3")]
    Portrait2x3,
    #[serde(rename = "auto")]
    Auto,
}

impl AspectRatio {
    /// Every supported aspect ratio, in the order the API documents them.
    pub const ALL: [AspectRatio; 8] = [
        AspectRatio::Square,
        AspectRatio::Landscape4x3,
        AspectRatio::Portrait3x4,
        AspectRatio::Widescreen,
        AspectRatio::Vertical,
        AspectRatio::Landscape3x2,
        AspectRatio::Portrait2x3,
        AspectRatio::Auto,
    ];

    /// Wire value sent to kie.ai.
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape4x3 => "4:3",
            AspectRatio::Portrait3x4 => "3:4",
            AspectRatio::Widescreen => "16:9",
            AspectRatio::Vertical => "9:16",
            AspectRatio::Landscape3x2 => "3:2",
            AspectRatio::Portrait2x3 => "2:3",
            AspectRatio::Auto => "auto",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output resolution of the generated image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
pub enum Resolution {
    #[default]
    #[serde(rename = "1K")]
    OneK,
    #[serde(rename = "2K")]
    TwoK,
}

impl Resolution {
    /// Every supported resolution.
    pub const ALL: [Resolution; 2] = [Resolution::OneK, Resolution::TwoK];

    /// Wire value sent to kie.ai.
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::OneK => "1K",
            Resolution::TwoK => "2K",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text-to-image generation parameters.
///
/// This is also the input schema of the `text_to_image_flux_2_pro` tool.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct FluxGenerateParams {
    /// Text prompt describing the image to generate (3-5000 characters).
    #[schemars(length(min = 3, max = 5000))]
    pub prompt: String,

    /// Aspect ratio of the generated image.
    #[serde(default)]
    pub aspect_ratio: AspectRatio,

    /// Output resolution.
    #[serde(default)]
    pub resolution: Resolution,
}

impl FluxGenerateParams {
    /// Create parameters with the default aspect ratio and resolution.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            aspect_ratio: AspectRatio::default(),
            resolution: Resolution::default(),
        }
    }

    /// Validate the parameters.
    ///
    /// Enum fields are already constrained by deserialization, so only the
    /// prompt length (counted in characters, not bytes) is checked here.
    ///
    /// # Returns
    /// - `Ok(())` if all parameters are valid
    /// - `Err(Vec<ValidationError>)` with all validation errors
    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let prompt_chars = self.prompt.chars().count();
        if prompt_chars < MIN_PROMPT_CHARS {
            errors.push(ValidationError {
                field: "prompt".to_string(),
                message: format!(
                    "Prompt must be at least {} characters, got {}",
                    MIN_PROMPT_CHARS, prompt_chars
                ),
            });
        } else if prompt_chars > MAX_PROMPT_CHARS {
            errors.push(ValidationError {
                field: "prompt".to_string(),
                message: format!(
                    "Prompt must be at most {} characters, got {}",
                    MAX_PROMPT_CHARS, prompt_chars
                ),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Validation error details for generation parameters.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Bounded retry schedule for task polling.
///
/// The delay after the n-th unfinished attempt is
/// `initial_delay * multiplier^(n-1)`, capped at `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    /// Total number of status requests before giving up.
    pub max_attempts: u32,
    /// Delay after the first unfinished attempt.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Growth factor between consecutive delays.
    pub multiplier: f64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: POLL_MAX_ATTEMPTS,
            initial_delay: Duration::from_millis(POLL_INITIAL_DELAY_MS),
            max_delay: Duration::from_millis(POLL_MAX_DELAY_MS),
            multiplier: POLL_BACKOFF_MULTIPLIER,
        }
    }
}

impl PollPolicy {
    /// A policy with a constant delay between attempts.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay: delay,
            max_delay: delay,
            multiplier: 1.0,
        }
    }

    /// Delay to wait after the given (1-based) attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt <= 1 || self.multiplier <= 1.0 {
            return self.initial_delay.min(self.max_delay);
        }
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let scaled = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = scaled.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped.max(0.0))
    }

    /// Worst-case time spent sleeping before the budget is exhausted.
    pub fn total_delay(&self) -> Duration {
        (1..self.max_attempts.max(1)).map(|attempt| self.delay_for(attempt)).sum()
    }
}

/// Outcome of a generation as seen by the tool caller.
///
/// Every failure collapses into `Empty`; the detail is only logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// URL of the generated image.
    Success(String),
    /// Generation did not produce an image.
    Empty,
}

impl GenerationOutcome {
    /// Whether the outcome carries no URL.
    pub fn is_empty(&self) -> bool {
        matches!(self, GenerationOutcome::Empty)
    }

    /// Text payload returned to the caller: the URL or an empty string.
    pub fn into_text(self) -> String {
        match self {
            GenerationOutcome::Success(url) => url,
            GenerationOutcome::Empty => String::new(),
        }
    }
}

/// Result of a successful generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FluxGenerateResult {
    /// kie.ai task identifier.
    pub task_id: String,
    /// URL of the generated image (the first one when several are returned).
    pub url: String,
}

/// Generation handler.
///
/// Handles text-to-image requests against the kie.ai jobs API.
pub struct FluxHandler {
    /// Application configuration.
    pub config: Config,
    /// HTTP client for API requests.
    pub http: reqwest::Client,
    /// Poll schedule for task status.
    pub policy: PollPolicy,
}

impl FluxHandler {
    /// Create a new FluxHandler with the given configuration.
    pub fn new(config: Config) -> Self {
        Self::with_deps(config, reqwest::Client::new(), PollPolicy::default())
    }

    /// Create a new FluxHandler with provided dependencies.
    pub fn with_deps(config: Config, http: reqwest::Client, policy: PollPolicy) -> Self {
        Self {
            config,
            http,
            policy,
        }
    }

    /// Generate an image and collapse any failure into an empty outcome.
    ///
    /// This is the boundary the tool server calls: errors are logged here and
    /// never returned.
    pub async fn run(&self, params: FluxGenerateParams) -> GenerationOutcome {
        match self.generate_image(params).await {
            Ok(result) => GenerationOutcome::Success(result.url),
            Err(Error::MissingApiKey) => {
                warn!("KIEAI_API_KEY is not set; returning empty result");
                GenerationOutcome::Empty
            }
            Err(e) => {
                error!(error = %e, kind = e.kind(), "FLUX image generation failed");
                GenerationOutcome::Empty
            }
        }
    }

    /// Generate an image from a text prompt.
    ///
    /// # Returns
    /// * `Ok(FluxGenerateResult)` - Task id and image URL
    /// * `Err(Error)` - If no key is configured, validation fails, the task
    ///   is rejected or fails, or it does not finish within the poll budget
    #[instrument(level = "info", name = "generate_image", skip(self, params), fields(aspect_ratio = %params.aspect_ratio, resolution = %params.resolution))]
    pub async fn generate_image(&self, params: FluxGenerateParams) -> Result<FluxGenerateResult> {
        // No key means no request at all
        let api_key = self.config.api_key.as_ref().ok_or(Error::MissingApiKey)?;

        params.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            Error::validation(messages.join("; "))
        })?;

        let task_id = self.create_task(&params, api_key).await?;
        info!(task_id = %task_id, "Created FLUX generation task");

        let url = self.poll_task(&task_id, api_key).await?;
        info!(task_id = %task_id, url = %url, "FLUX generation completed");

        Ok(FluxGenerateResult { task_id, url })
    }

    /// Submit a generation task and return its id.
    pub async fn create_task(&self, params: &FluxGenerateParams, api_key: &ApiKey) -> Result<String> {
        let endpoint = self.config.create_task_endpoint();
        let request = CreateTaskRequest {
            model: MODEL_ID,
            input: CreateTaskInput {
                prompt: &params.prompt,
                aspect_ratio: params.aspect_ratio,
                resolution: params.resolution,
            },
        };

        debug!(endpoint = %endpoint, model = MODEL_ID, "Calling createTask");

        let response = self
            .http
            .post(&endpoint)
            .header(AUTHORIZATION, api_key.bearer_header())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::api(&endpoint, 0, format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::api(&endpoint, status.as_u16(), format!("Failed to read response: {}", e)))?;

        let envelope: ApiEnvelope<CreateTaskData> = parse_envelope(&endpoint, status, &body)?;
        envelope.check()?;

        let data = envelope
            .data
            .ok_or_else(|| Error::malformed("createTask response has no data"))?;
        if data.task_id.trim().is_empty() {
            return Err(Error::malformed("createTask response has an empty taskId"));
        }

        Ok(data.task_id)
    }

    /// Poll a task until it completes.
    ///
    /// Makes at most `policy.max_attempts` status requests, sleeping
    /// `policy.delay_for(n)` between them. A vendor error code, a failed task
    /// or an unreadable 4xx answer ends polling immediately; network errors,
    /// 5xx and 429 answers and unreadable 2xx bodies count as unfinished
    /// attempts.
    pub async fn poll_task(&self, task_id: &str, api_key: &ApiKey) -> Result<String> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.poll_once(task_id, api_key).await? {
                PollStep::Done(url) => {
                    info!(task_id = %task_id, attempts = attempt, "Task completed successfully");
                    return Ok(url);
                }
                PollStep::Pending(state) => {
                    debug!(task_id = %task_id, attempt, state = %state, "Task still in progress");
                }
                PollStep::Retry(e) => {
                    warn!(task_id = %task_id, attempt, error = %e, "Poll attempt failed, will retry");
                }
            }

            if attempt >= max_attempts {
                return Err(Error::RetriesExhausted { attempts: attempt });
            }

            let delay = self.policy.delay_for(attempt);
            debug!(task_id = %task_id, next_delay_ms = delay.as_millis() as u64, "Waiting before next poll");
            tokio::time::sleep(delay).await;
        }
    }

    /// Issue a single status request and classify the answer.
    async fn poll_once(&self, task_id: &str, api_key: &ApiKey) -> Result<PollStep> {
        let endpoint = self.config.record_info_endpoint();

        let response = match self
            .http
            .get(&endpoint)
            .query(&[("taskId", task_id)])
            .header(AUTHORIZATION, api_key.bearer_header())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return Ok(PollStep::Retry(Error::api(
                    &endpoint,
                    0,
                    format!("Poll request failed: {}", e),
                )));
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Ok(PollStep::Retry(Error::api(
                    &endpoint,
                    status.as_u16(),
                    format!("Failed to read poll response: {}", e),
                )));
            }
        };

        let envelope: ApiEnvelope<RecordInfoData> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => {
                return Ok(PollStep::Retry(Error::api(
                    &endpoint,
                    status.as_u16(),
                    format!("Failed to parse poll response: {}", e),
                )));
            }
            Err(_) if is_transient_status(status) => {
                return Ok(PollStep::Retry(Error::api(&endpoint, status.as_u16(), body.clone())));
            }
            Err(_) => return Err(Error::api(&endpoint, status.as_u16(), body.clone())),
        };
        envelope.check()?;

        let data = envelope
            .data
            .ok_or_else(|| Error::malformed("recordInfo response has no data"))?;

        match TaskState::from(data.state.as_deref().unwrap_or_default()) {
            TaskState::Success => {
                let result_json = data
                    .result_json
                    .as_deref()
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| Error::malformed("successful task has no resultJson"))?;
                let url = extract_result_url(result_json)?;
                Ok(PollStep::Done(url))
            }
            TaskState::Fail => Err(Error::task_failed(task_id, data.failure_message())),
            state => Ok(PollStep::Pending(state)),
        }
    }
}

/// Classification of a single poll attempt that did not end polling.
#[derive(Debug)]
enum PollStep {
    /// Task succeeded with this URL.
    Done(String),
    /// Task has not finished yet.
    Pending(TaskState),
    /// The attempt itself failed in a way worth retrying.
    Retry(Error),
}

/// Task state reported by `recordInfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Waiting,
    Queuing,
    Generating,
    Success,
    Fail,
    /// A state this client does not know; treated as unfinished.
    Other(String),
}

impl From<&str> for TaskState {
    fn from(state: &str) -> Self {
        match state {
            "waiting" => TaskState::Waiting,
            "queuing" => TaskState::Queuing,
            "generating" => TaskState::Generating,
            "success" => TaskState::Success,
            "fail" => TaskState::Fail,
            other => TaskState::Other(other.to_string()),
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Waiting => f.write_str("waiting"),
            TaskState::Queuing => f.write_str("queuing"),
            TaskState::Generating => f.write_str("generating"),
            TaskState::Success => f.write_str("success"),
            TaskState::Fail => f.write_str("fail"),
            TaskState::Other(s) if s.is_empty() => f.write_str("unknown"),
            TaskState::Other(s) => f.write_str(s),
        }
    }
}

/// Extract the first result URL from a `resultJson` payload.
///
/// `resultUrls` may be a list or a single string. When several URLs are
/// present only the first is returned; the rest are logged at debug level.
pub fn extract_result_url(result_json: &str) -> Result<String> {
    let payload: ResultPayload = serde_json::from_str(result_json)
        .map_err(|e| Error::malformed(format!("resultJson is not valid JSON: {}", e)))?;

    let urls = match payload.result_urls {
        Some(ResultUrls::Many(urls)) => urls,
        Some(ResultUrls::One(url)) => vec![url],
        None => return Err(Error::malformed("resultJson has no resultUrls")),
    };

    if urls.len() > 1 {
        debug!(count = urls.len(), urls = ?urls, "Task returned several URLs, using the first");
    }

    let first = urls
        .into_iter()
        .map(|url| url.trim().to_string())
        .find(|url| !url.is_empty())
        .ok_or_else(|| Error::malformed("resultUrls is empty"))?;

    reqwest::Url::parse(&first)
        .map_err(|e| Error::malformed(format!("result URL '{}' is invalid: {}", first, e)))?;

    Ok(first)
}

/// Gateway errors and rate limiting say nothing about the task itself.
fn is_transient_status(status: reqwest::StatusCode) -> bool {
    status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS
}

fn parse_envelope<T: DeserializeOwned>(
    endpoint: &str,
    status: reqwest::StatusCode,
    body: &str,
) -> Result<ApiEnvelope<T>> {
    serde_json::from_str(body).map_err(|e| {
        if status.is_success() {
            Error::api(endpoint, status.as_u16(), format!("Failed to parse response: {}", e))
        } else {
            Error::api(endpoint, status.as_u16(), body.to_string())
        }
    })
}

// =============================================================================
// API Types
// =============================================================================

/// kie.ai `createTask` request body.
#[derive(Debug, Serialize)]
pub struct CreateTaskRequest<'a> {
    /// Model identifier
    pub model: &'a str,
    /// Model input
    pub input: CreateTaskInput<'a>,
}

/// FLUX 2 Pro model input.
#[derive(Debug, Serialize)]
pub struct CreateTaskInput<'a> {
    pub prompt: &'a str,
    pub aspect_ratio: AspectRatio,
    pub resolution: Resolution,
}

/// Response envelope shared by every kie.ai endpoint.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    /// 200 on success
    pub code: i64,
    /// Human-readable status message
    #[serde(default, alias = "msg")]
    pub message: Option<String>,
    /// Endpoint-specific payload
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Turn a non-success code into a vendor error.
    fn check(&self) -> Result<()> {
        if self.code == SUCCESS_CODE {
            Ok(())
        } else {
            Err(Error::vendor(
                self.code,
                self.message.clone().unwrap_or_else(|| "Unknown error".to_string()),
            ))
        }
    }
}

/// `createTask` payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskData {
    /// Task identifier used for polling
    pub task_id: String,
}

/// `recordInfo` payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordInfoData {
    /// Task identifier
    #[serde(default)]
    pub task_id: Option<String>,
    /// Task state: waiting, queuing, generating, success or fail
    #[serde(default)]
    pub state: Option<String>,
    /// JSON-encoded result, present on success
    #[serde(default)]
    pub result_json: Option<String>,
    /// Failure code, present on failure
    #[serde(default)]
    pub fail_code: Option<serde_json::Value>,
    /// Failure message, present on failure
    #[serde(default)]
    pub fail_msg: Option<String>,
}

impl RecordInfoData {
    fn failure_message(&self) -> String {
        let message = self
            .fail_msg
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or("task failed without a message");

        match &self.fail_code {
            Some(serde_json::Value::String(code)) if !code.is_empty() => format!("{} (code {})", message, code),
            Some(serde_json::Value::Number(code)) => format!("{} (code {})", message, code),
            _ => message.to_string(),
        }
    }
}

/// Decoded `resultJson`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultPayload {
    #[serde(default)]
    result_urls: Option<ResultUrls>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResultUrls {
    Many(Vec<String>),
    One(String),
}
