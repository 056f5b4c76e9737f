//! Structured error types for the Aria cognitive core.
//!
//! Provides type-safe error handling with the kinds named in the error
//! taxonomy (not type names, kinds): Configuration, Validation,
//! Unavailable/RateLimited, Retryable, Protected, BudgetExceeded, Cancelled,
//! Internal.

use std::time::Duration;
use thiserror::Error;

/// Primary error type for Aria core operations.
#[derive(Error, Debug)]
pub enum AriaError {
    // ---------------------------------------------------------------
    // Configuration — fatal at startup
    // ---------------------------------------------------------------
    #[error("invalid configuration: {message}")]
    Configuration { message: String },

    #[error("missing required configuration: {key}")]
    MissingConfig { key: String },

    #[error("invalid cron expression '{expr}': {reason}")]
    InvalidCron { expr: String, reason: String },

    #[error("unknown model in catalog: {model}")]
    UnknownModel { model: String },

    // ---------------------------------------------------------------
    // Validation — surfaced to caller, no retry
    // ---------------------------------------------------------------
    #[error("invalid input: {message}")]
    Validation { message: String },

    #[error("invalid tool arguments for {tool}: {reason}")]
    InvalidToolArguments { tool: String, reason: String },

    #[error("tool not found: {skill}.{tool}")]
    ToolNotFound { skill: String, tool: String },

    #[error("skill not found: {skill}")]
    SkillNotFound { skill: String },

    #[error(
        "tool schema mismatch for {skill}.{tool}: parameter '{parameter}' declared in schema \
         has no matching handler parameter"
    )]
    SchemaMismatch {
        skill: String,
        tool: String,
        parameter: String,
    },

    #[error("duplicate skill registration: {skill}")]
    DuplicateSkill { skill: String },

    // ---------------------------------------------------------------
    // Unavailable / rate-limited — retried at call site up to N=2, then surfaced
    // ---------------------------------------------------------------
    #[error("skill unavailable: {skill}")]
    Unavailable { skill: String },

    #[error("rate limited: {skill}")]
    RateLimited {
        skill: String,
        retry_after: Duration,
    },

    // ---------------------------------------------------------------
    // Retryable — exponential backoff with jitter at the call site
    // ---------------------------------------------------------------
    #[error("transient failure: {message}")]
    Retryable { message: String },

    #[error("provider error: {status} - {message}")]
    ProviderError { status: u16, message: String },

    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("connection failed: {message}")]
    ConnectionFailed { message: String },

    // ---------------------------------------------------------------
    // Protected — surfaced immediately, never retried
    // ---------------------------------------------------------------
    #[error("cannot delete current session {session_id}")]
    Protected { session_id: String },

    // ---------------------------------------------------------------
    // BudgetExceeded — surfaced, falls back to local/free until window resets
    // ---------------------------------------------------------------
    #[error("budget exceeded: {budget_kind}")]
    BudgetExceeded { budget_kind: String },

    // ---------------------------------------------------------------
    // IncompatibleModel — router guard, not in §7 taxonomy by name but
    // behaves like Validation (surfaced, never retried).
    // ---------------------------------------------------------------
    #[error("model {model} does not support tool calling")]
    IncompatibleModel { model: String },

    // ---------------------------------------------------------------
    // Cancelled — propagated, never logged above info
    // ---------------------------------------------------------------
    #[error("operation cancelled")]
    Cancelled,

    // ---------------------------------------------------------------
    // Internal — unexpected; logged at error, surfaced generically
    // ---------------------------------------------------------------
    #[error("internal error: {message}")]
    Internal { message: String },

    #[error("unexpected state: {description}")]
    UnexpectedState { description: String },

    #[error("not found: {what}")]
    NotFound { what: String },

    // ---------------------------------------------------------------
    // External error wrappers
    // ---------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

impl AriaError {
    /// Whether a retry loop should automatically retry this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. }
            | Self::Timeout { .. }
            | Self::Retryable { .. }
            | Self::Unavailable { .. }
            | Self::RateLimited { .. } => true,
            Self::ProviderError { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            Self::Io(io_err) => matches!(
                io_err.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }

    /// Suggested delay before the next retry, when retryable.
    pub fn retry_delay(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => Some(*retry_after),
            Self::ProviderError { status: 429, .. } => Some(Duration::from_secs(5)),
            Self::Timeout { .. } => Some(Duration::from_secs(1)),
            Self::ConnectionFailed { .. } => Some(Duration::from_secs(2)),
            Self::Unavailable { .. } => Some(Duration::from_secs(3)),
            _ => None,
        }
    }

    /// A user-facing message appropriate for the error's kind (§7 propagation policy).
    pub fn user_message(&self) -> String {
        match self {
            Self::Retryable { .. }
            | Self::ConnectionFailed { .. }
            | Self::Timeout { .. }
            | Self::ProviderError { .. } => {
                "Sorry, that didn't go through. I'll try again shortly.".to_string()
            }
            Self::Protected { session_id } => {
                format!("I can't delete session {session_id} — it's a protected main session.")
            }
            Self::Unavailable { skill } => {
                format!("The {skill} capability is temporarily unavailable; service is degraded.")
            }
            Self::RateLimited { skill, .. } => {
                format!("{skill} is rate-limited right now; I'll retry shortly.")
            }
            Self::BudgetExceeded { .. } => {
                "Today's model budget is used up; falling back to free-tier models.".to_string()
            }
            Self::Internal { .. } | Self::UnexpectedState { .. } => {
                "Something went wrong on my end. I've logged it.".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Whether this error (if it reaches the activity log) should be logged
    /// above `info` level. Cancelled errors never are (§7).
    pub fn log_level(&self) -> &'static str {
        match self {
            Self::Cancelled => "info",
            Self::Internal { .. } | Self::UnexpectedState { .. } => "error",
            _ if self.is_retryable() => "warn",
            _ => "error",
        }
    }
}

impl From<anyhow::Error> for AriaError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(io_err) = err.downcast_ref::<std::io::Error>() {
            return Self::Io(std::io::Error::new(io_err.kind(), io_err.to_string()));
        }
        Self::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for AriaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias using `AriaError`.
pub type Result<T> = std::result::Result<T, AriaError>;
