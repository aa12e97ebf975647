//! # Error Handling
//!
//! Error types for the tutoring pipeline. Every failure the pipeline can meet
//! falls into one of a few classes, and the class decides what happens next:
//!
//! | Variant | Where | Effect |
//! |---------|-------|--------|
//! | `Transport` | model gateway | cycle dropped, next tick retries |
//! | `Auth` | model gateway | fatal at startup |
//! | `MalformedModelOutput` | reconciler, decision engine | previous state kept |
//! | `RenderGeometry` | drawing surface | that one draw command dropped |
//! | `Capture` | capture source | main loop ends, resources released |
//! | `Config` | startup | process refuses to start |
//!
//! ## Usage
//!
//! ```rust
//! use desk_tutor::error::{TutorError, Retryable};
//!
//! let error = TutorError::transport("chat_completions", "connection reset")
//!     .with_context("perception call")
//!     .with_recovery_suggestion("Check network connectivity to the model endpoint");
//!
//! assert!(error.is_retryable());
//! ```

use std::{error::Error as StdError, fmt, time::SystemTime};

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational errors
    Info,
    /// Warnings that may indicate potential issues
    Warning,
    /// Errors that affect operation but can be recovered from
    Error,
    /// Fatal errors that cannot be recovered from
    Fatal,
}

/// Metadata about when and where an error occurred
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// When the error occurred
    pub timestamp: SystemTime,
    /// The operation being performed when the error occurred
    pub operation: Option<String>,
    /// Additional context about the error
    pub context: Option<String>,
    /// Suggested recovery action
    pub recovery_suggestion: Option<String>,
    /// Error severity level
    pub severity: ErrorSeverity,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            timestamp: SystemTime::now(),
            operation: None,
            context: None,
            recovery_suggestion: None,
            severity: ErrorSeverity::Error,
        }
    }
}

impl ErrorContext {
    /// Create a new error context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context with an explicit severity
    pub fn with_severity(severity: ErrorSeverity) -> Self {
        Self {
            severity,
            ..Self::default()
        }
    }
}

/// Base error type for the tutoring pipeline
#[derive(Debug)]
pub enum TutorError {
    /// Network failure or timeout talking to the model endpoint
    Transport {
        operation: String,
        reason: String,
        timed_out: bool,
        source: Option<Box<dyn StdError + Send + Sync>>,
        context: ErrorContext,
    },
    /// Credential rejected by the model endpoint
    Auth {
        operation: String,
        reason: String,
        context: ErrorContext,
    },
    /// Model reply missing, unparseable or semantically invalid
    MalformedModelOutput {
        stage: String,
        reason: String,
        context: ErrorContext,
    },
    /// Draw command with illegal or out-of-range geometry
    RenderGeometry {
        command: String,
        reason: String,
        context: ErrorContext,
    },
    /// Capture source failed to deliver a frame
    Capture {
        reason: String,
        context: ErrorContext,
    },
    /// Configuration validation errors
    Config {
        field: String,
        value: String,
        reason: String,
        context: ErrorContext,
    },
    /// Image encoding or scaling failures
    Encoding {
        reason: String,
        context: ErrorContext,
    },
    /// I/O errors
    Io {
        operation: String,
        path: Option<String>,
        source: std::io::Error,
        context: ErrorContext,
    },
}

impl TutorError {
    /// Create a transport error
    pub fn transport(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transport {
            operation: operation.into(),
            reason: reason.into(),
            timed_out: false,
            source: None,
            context: ErrorContext::with_severity(ErrorSeverity::Warning),
        }
    }

    /// Create a transport error for an elapsed request timeout
    pub fn timeout(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        match Self::transport(operation, reason) {
            Self::Transport {
                operation,
                reason,
                source,
                context,
                ..
            } => Self::Transport {
                operation,
                reason,
                timed_out: true,
                source,
                context,
            },
            other => other,
        }
    }

    /// Create an authentication error
    pub fn auth(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Auth {
            operation: operation.into(),
            reason: reason.into(),
            context: ErrorContext::with_severity(ErrorSeverity::Fatal),
        }
    }

    /// Create a malformed model output error
    pub fn malformed(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedModelOutput {
            stage: stage.into(),
            reason: reason.into(),
            context: ErrorContext::with_severity(ErrorSeverity::Warning),
        }
    }

    /// Create a render geometry error
    pub fn render_geometry(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RenderGeometry {
            command: command.into(),
            reason: reason.into(),
            context: ErrorContext::with_severity(ErrorSeverity::Info),
        }
    }

    /// Create a capture error
    pub fn capture(reason: impl Into<String>) -> Self {
        Self::Capture {
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a configuration error
    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
            context: ErrorContext::with_severity(ErrorSeverity::Fatal),
        }
    }

    /// Create an encoding error
    pub fn encoding(reason: impl Into<String>) -> Self {
        Self::Encoding {
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: None,
            source,
            context: ErrorContext::new(),
        }
    }

    /// Attach the path an I/O error refers to
    pub fn with_path(mut self, new_path: impl Into<String>) -> Self {
        if let Self::Io { path, .. } = &mut self {
            *path = Some(new_path.into());
        }
        self
    }

    /// Attach the underlying cause of a transport error
    pub fn with_source(mut self, cause: impl StdError + Send + Sync + 'static) -> Self {
        if let Self::Transport { source, .. } = &mut self {
            *source = Some(Box::new(cause));
        }
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_mut().context = Some(context.into());
        self
    }

    /// Add operation context
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    /// Add recovery suggestion
    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context_mut().recovery_suggestion = Some(suggestion.into());
        self
    }

    /// Set severity
    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.context_mut().severity = severity;
        self
    }

    /// Get the error context
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Transport { context, .. } => context,
            Self::Auth { context, .. } => context,
            Self::MalformedModelOutput { context, .. } => context,
            Self::RenderGeometry { context, .. } => context,
            Self::Capture { context, .. } => context,
            Self::Config { context, .. } => context,
            Self::Encoding { context, .. } => context,
            Self::Io { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::Transport { context, .. } => context,
            Self::Auth { context, .. } => context,
            Self::MalformedModelOutput { context, .. } => context,
            Self::RenderGeometry { context, .. } => context,
            Self::Capture { context, .. } => context,
            Self::Config { context, .. } => context,
            Self::Encoding { context, .. } => context,
            Self::Io { context, .. } => context,
        }
    }

    /// Get the error category as a string
    pub fn category(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Auth { .. } => "auth",
            Self::MalformedModelOutput { .. } => "malformed_model_output",
            Self::RenderGeometry { .. } => "render_geometry",
            Self::Capture { .. } => "capture",
            Self::Config { .. } => "config",
            Self::Encoding { .. } => "encoding",
            Self::Io { .. } => "io",
        }
    }

    /// Get the recovery suggestion, if any
    pub fn recovery_suggestion(&self) -> Option<&str> {
        self.context().recovery_suggestion.as_deref()
    }

    /// Get the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        self.context().severity
    }
}

impl fmt::Display for TutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TutorError::Transport {
                operation,
                reason,
                timed_out,
                ..
            } => {
                if *timed_out {
                    write!(f, "Model request timed out during {}: {}", operation, reason)
                } else {
                    write!(f, "Model transport failed during {}: {}", operation, reason)
                }
            }
            TutorError::Auth {
                operation, reason, ..
            } => {
                write!(f, "Authentication error during {}: {}", operation, reason)
            }
            TutorError::MalformedModelOutput { stage, reason, .. } => {
                write!(f, "Malformed model output in {}: {}", stage, reason)
            }
            TutorError::RenderGeometry {
                command, reason, ..
            } => {
                write!(f, "Illegal geometry for {}: {}", command, reason)
            }
            TutorError::Capture { reason, .. } => {
                write!(f, "Frame capture failed: {}", reason)
            }
            TutorError::Config {
                field,
                value,
                reason,
                ..
            } => {
                write!(
                    f,
                    "Configuration error in '{}': {} (value: {})",
                    field, reason, value
                )
            }
            TutorError::Encoding { reason, .. } => {
                write!(f, "Frame encoding failed: {}", reason)
            }
            TutorError::Io {
                operation,
                path,
                source,
                ..
            } => {
                if let Some(path) = path {
                    write!(
                        f,
                        "I/O error during {} on '{}': {}",
                        operation, path, source
                    )
                } else {
                    write!(f, "I/O error during {}: {}", operation, source)
                }
            }
        }
    }
}

impl StdError for TutorError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Transport {
                source: Some(source),
                ..
            } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result type alias using our custom error type
pub type TutorResult<T> = Result<T, TutorError>;

/// Trait for errors that can be retried
pub trait Retryable {
    /// Check if this error can be retried
    fn is_retryable(&self) -> bool;
}

impl Retryable for TutorError {
    // Nothing is retried in place; retryable means the next analysis tick may succeed.
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::MalformedModelOutput { .. } | Self::Encoding { .. }
        )
    }
}

/// Error classification utilities
pub mod classify {
    use super::*;

    /// Check if an error is transient (may resolve itself)
    pub fn is_transient(error: &TutorError) -> bool {
        matches!(
            error,
            TutorError::Transport { .. } | TutorError::MalformedModelOutput { .. }
        )
    }

    /// Check if an error is fatal (cannot be recovered from)
    pub fn is_fatal(error: &TutorError) -> bool {
        matches!(error, TutorError::Config { .. } | TutorError::Auth { .. })
            || error.severity() == ErrorSeverity::Fatal
    }

    /// Check if an error ends the capture loop
    pub fn ends_capture_loop(error: &TutorError) -> bool {
        matches!(error, TutorError::Capture { .. })
    }
}

impl From<std::io::Error> for TutorError {
    fn from(error: std::io::Error) -> Self {
        Self::io("unknown", error)
    }
}

impl From<tutor_scale::cpu::ScaleError> for TutorError {
    fn from(error: tutor_scale::cpu::ScaleError) -> Self {
        Self::encoding(error.to_string()).with_operation("scale_frame")
    }
}

impl From<image::ImageError> for TutorError {
    fn from(error: image::ImageError) -> Self {
        Self::encoding(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = TutorError::config("credential", "", "must be set");
        assert_eq!(error.category(), "config");
        assert!(!error.is_retryable());
        assert!(classify::is_fatal(&error));
    }

    #[test]
    fn test_error_with_context() {
        let error = TutorError::malformed("perception", "bbox out of range")
            .with_context("merging perception update")
            .with_recovery_suggestion("previous snapshot kept");

        assert_eq!(error.category(), "malformed_model_output");
        assert!(error.is_retryable());
        assert_eq!(error.recovery_suggestion(), Some("previous snapshot kept"));
        assert_eq!(error.severity(), ErrorSeverity::Warning);
    }

    #[test]
    fn test_timeout_is_transport() {
        let error = TutorError::timeout("chat_completions", "60s elapsed");
        assert_eq!(error.category(), "transport");
        assert!(error.to_string().contains("timed out"));
        assert!(classify::is_transient(&error));
    }

    #[test]
    fn test_error_classification() {
        let auth = TutorError::auth("probe", "401 Unauthorized");
        assert!(classify::is_fatal(&auth));
        assert!(!classify::is_transient(&auth));

        let capture = TutorError::capture("camera unplugged");
        assert!(classify::ends_capture_loop(&capture));
        assert!(!classify::is_fatal(&capture));
    }
}
