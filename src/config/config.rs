//! # Tutor Configuration
//!
//! `TutorConfig` is the common interface between the CLI and the library. It
//! is read from the process environment, optionally overridden by CLI flags,
//! validated once at startup and then split into the per-component configs.
//!
//! ## Configuration Parameters
//!
//! | Parameter | Env var | Default | Description |
//! |-----------|---------|---------|-------------|
//! | `api_key` | `DASHSCOPE_API_KEY` | none (required) | Bearer credential |
//! | `endpoint` | `TUTOR_ENDPOINT` | DashScope compatible mode | OpenAI-compatible base URL |
//! | `model` | `TUTOR_MODEL` | `qwen3-vl-plus` | Vision-language model name |
//! | `image_quality` | `TUTOR_IMAGE_QUALITY` | 75 | JPEG quality, 1-100 |
//! | `image_max_side` | `TUTOR_IMAGE_MAX_SIDE` | 1280 | Longest side sent to the model |
//! | `analysis_interval` | `TUTOR_ANALYSIS_INTERVAL` | 0.5 s | Gap after one analysis completes |
//! | `dwell_threshold_secs` | `TUTOR_DWELL_THRESHOLD` | 30 s | Dwell before a hint is offered |
//! | `request_timeout` | `TUTOR_REQUEST_TIMEOUT` | 60 s | Per-request model timeout |
//! | `max_output_tokens` | `TUTOR_MAX_TOKENS` | 2000 | Reply size cap per model call |
//! | `render_fps` | `TUTOR_RENDER_FPS` | 10 | Display/capture tick rate |
//!
//! ## Examples
//!
//! ```rust
//! use desk_tutor::config::TutorConfig;
//!
//! let config = TutorConfig::from_lookup(|name| match name {
//!     "DASHSCOPE_API_KEY" => Some("sk-test-0000".to_string()),
//!     "TUTOR_DWELL_THRESHOLD" => Some("20".to_string()),
//!     _ => None,
//! })
//! .unwrap();
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.decision_config().dwell_threshold_secs, 20.0);
//! ```

use std::{fmt, str::FromStr, time::Duration};

use crate::{
    decision::DecisionConfig,
    error::{TutorError, TutorResult},
    gateway::{GatewayConfig, ImageOptions},
    scheduler::SchedulerConfig,
};

pub const ENV_API_KEY: &str = "DASHSCOPE_API_KEY";
pub const ENV_ENDPOINT: &str = "TUTOR_ENDPOINT";
pub const ENV_MODEL: &str = "TUTOR_MODEL";
pub const ENV_IMAGE_QUALITY: &str = "TUTOR_IMAGE_QUALITY";
pub const ENV_IMAGE_MAX_SIDE: &str = "TUTOR_IMAGE_MAX_SIDE";
pub const ENV_ANALYSIS_INTERVAL: &str = "TUTOR_ANALYSIS_INTERVAL";
pub const ENV_DWELL_THRESHOLD: &str = "TUTOR_DWELL_THRESHOLD";
pub const ENV_REQUEST_TIMEOUT: &str = "TUTOR_REQUEST_TIMEOUT";
pub const ENV_MAX_TOKENS: &str = "TUTOR_MAX_TOKENS";
pub const ENV_RENDER_FPS: &str = "TUTOR_RENDER_FPS";

pub const DEFAULT_ENDPOINT: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";
pub const DEFAULT_MODEL: &str = "qwen3-vl-plus";

/// Configuration for one tutoring session.
///
/// `Debug` masks the credential so the struct can be logged.
#[derive(Clone, PartialEq)]
pub struct TutorConfig {
    /// Bearer credential for the model endpoint. Empty means unset.
    pub api_key: String,

    /// OpenAI-compatible base URL, without the `/chat/completions` suffix.
    pub endpoint: String,

    /// Model name sent with every request.
    pub model: String,

    /// JPEG quality used when encoding frames for the model.
    pub image_quality: u8,

    /// Frames are downscaled so their longest side does not exceed this.
    pub image_max_side: u32,

    /// Minimum gap between the end of one analysis and the start of the next.
    pub analysis_interval: Duration,

    /// Seconds on the active problem before a hint is considered.
    pub dwell_threshold_secs: f64,

    /// Timeout applied to every model request.
    pub request_timeout: Duration,

    /// Reply size cap for each model call.
    pub max_output_tokens: u32,

    /// Capture and render ticks per second.
    pub render_fps: u32,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            image_quality: 75,
            image_max_side: 1280,
            analysis_interval: Duration::from_millis(500),
            dwell_threshold_secs: 30.0,
            request_timeout: Duration::from_secs(60),
            max_output_tokens: 2000,
            render_fps: 10,
        }
    }
}

impl fmt::Debug for TutorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TutorConfig")
            .field("api_key", &mask_credential(&self.api_key))
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("image_quality", &self.image_quality)
            .field("image_max_side", &self.image_max_side)
            .field("analysis_interval", &self.analysis_interval)
            .field("dwell_threshold_secs", &self.dwell_threshold_secs)
            .field("request_timeout", &self.request_timeout)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("render_fps", &self.render_fps)
            .finish()
    }
}

impl TutorConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> TutorResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    ///
    /// Unset or blank variables keep their defaults; a set but unparseable
    /// variable is a configuration error.
    pub fn from_lookup<F>(lookup: F) -> TutorResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(key) = get(ENV_API_KEY) {
            config.api_key = key;
        }
        if let Some(endpoint) = get(ENV_ENDPOINT) {
            config.endpoint = endpoint;
        }
        if let Some(model) = get(ENV_MODEL) {
            config.model = model;
        }
        if let Some(raw) = get(ENV_IMAGE_QUALITY) {
            config.image_quality = parse_field(ENV_IMAGE_QUALITY, &raw)?;
        }
        if let Some(raw) = get(ENV_IMAGE_MAX_SIDE) {
            config.image_max_side = parse_field(ENV_IMAGE_MAX_SIDE, &raw)?;
        }
        if let Some(raw) = get(ENV_ANALYSIS_INTERVAL) {
            config.analysis_interval = parse_seconds(ENV_ANALYSIS_INTERVAL, &raw)?;
        }
        if let Some(raw) = get(ENV_DWELL_THRESHOLD) {
            config.dwell_threshold_secs = parse_field(ENV_DWELL_THRESHOLD, &raw)?;
        }
        if let Some(raw) = get(ENV_REQUEST_TIMEOUT) {
            config.request_timeout = parse_seconds(ENV_REQUEST_TIMEOUT, &raw)?;
        }
        if let Some(raw) = get(ENV_MAX_TOKENS) {
            config.max_output_tokens = parse_field(ENV_MAX_TOKENS, &raw)?;
        }
        if let Some(raw) = get(ENV_RENDER_FPS) {
            config.render_fps = parse_field(ENV_RENDER_FPS, &raw)?;
        }
        Ok(config)
    }

    /// Validates the configuration parameters.
    ///
    /// A missing credential is fatal: the process refuses to start.
    pub fn validate(&self) -> TutorResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(TutorError::config(ENV_API_KEY, "", "credential must be set")
                .with_recovery_suggestion(format!(
                    "export {}=<your key> before starting",
                    ENV_API_KEY
                )));
        }
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(TutorError::config(
                "endpoint",
                &self.endpoint,
                "must be an http(s) URL",
            ));
        }
        if self.model.trim().is_empty() {
            return Err(TutorError::config("model", "", "model name must be set"));
        }
        if !(1..=100).contains(&self.image_quality) {
            return Err(TutorError::config(
                "image_quality",
                self.image_quality.to_string(),
                "must be between 1 and 100",
            ));
        }
        if self.image_max_side < 32 {
            return Err(TutorError::config(
                "image_max_side",
                self.image_max_side.to_string(),
                "must be at least 32 pixels",
            ));
        }
        if self.analysis_interval.is_zero() {
            return Err(TutorError::config(
                "analysis_interval",
                "0",
                "must be greater than 0 seconds",
            ));
        }
        if !self.dwell_threshold_secs.is_finite() || self.dwell_threshold_secs < 0.0 {
            return Err(TutorError::config(
                "dwell_threshold_secs",
                self.dwell_threshold_secs.to_string(),
                "must be a non-negative number of seconds",
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(TutorError::config(
                "request_timeout",
                "0",
                "must be greater than 0 seconds",
            ));
        }
        if self.max_output_tokens == 0 {
            return Err(TutorError::config(
                "max_output_tokens",
                "0",
                "must be greater than 0",
            ));
        }
        if !(1..=60).contains(&self.render_fps) {
            return Err(TutorError::config(
                "render_fps",
                self.render_fps.to_string(),
                "must be between 1 and 60",
            ));
        }
        Ok(())
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            endpoint: self.endpoint.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            timeout: self.request_timeout,
        }
    }

    pub fn image_options(&self) -> ImageOptions {
        ImageOptions {
            quality: self.image_quality,
            max_side: self.image_max_side,
        }
    }

    pub fn decision_config(&self) -> DecisionConfig {
        DecisionConfig {
            dwell_threshold_secs: self.dwell_threshold_secs,
            max_output_tokens: self.max_output_tokens,
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            analysis_interval: self.analysis_interval,
            render_interval: Duration::from_secs_f64(1.0 / f64::from(self.render_fps.max(1))),
            perception_max_tokens: self.max_output_tokens,
        }
    }
}

fn parse_field<T: FromStr>(name: &str, raw: &str) -> TutorResult<T> {
    raw.parse::<T>()
        .map_err(|_| TutorError::config(name, raw, "could not be parsed"))
}

fn parse_seconds(name: &str, raw: &str) -> TutorResult<Duration> {
    let secs: f64 = parse_field(name, raw)?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(TutorError::config(name, raw, "must be a non-negative number of seconds"));
    }
    Ok(Duration::from_secs_f64(secs))
}

/// Mask a credential for display: first 8 and last 4 characters kept.
///
/// Credentials of 12 characters or fewer are fully masked.
pub fn mask_credential(credential: &str) -> String {
    let chars: Vec<char> = credential.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 12), tail)
}

/// DashScope keys start with `sk-`.
pub fn credential_looks_valid(credential: &str) -> bool {
    credential.trim().starts_with("sk-")
}
