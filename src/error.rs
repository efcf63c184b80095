//! Error handling module for buildprep
//!
//! Provides centralized error handling with proper error types using thiserror.
//! All errors in the application should use these types for consistency.

use thiserror::Error;

/// Main error type for buildprep
#[derive(Error, Debug)]
pub enum BuildPrepError {
    /// IO errors (file operations, pipes, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest errors (loading, parsing, validation)
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// Preflight environment check failures
    #[error("Preflight check failed: {0}")]
    Preflight(String),

    /// An installer step exited non-zero
    #[error("{step} failed (exit code {code})")]
    Step { step: String, code: i32 },

    /// Stage machine transition errors
    #[error("Stage transition error: {0}")]
    StageTransition(String),

    /// Webhook notification errors
    #[error("Notification error: {0}")]
    Notify(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General errors (catch-all for edge cases)
    #[error("{0}")]
    General(String),
}

/// Result type alias for buildprep operations
pub type Result<T> = std::result::Result<T, BuildPrepError>;

// Convenient error constructors
impl BuildPrepError {
    /// Create a manifest error
    pub fn manifest(msg: impl Into<String>) -> Self {
        Self::Manifest(msg.into())
    }

    /// Create a preflight error
    pub fn preflight(msg: impl Into<String>) -> Self {
        Self::Preflight(msg.into())
    }

    /// Create a step-failure error carrying the child's exit code
    pub fn step(step: impl Into<String>, code: i32) -> Self {
        Self::Step {
            step: step.into(),
            code,
        }
    }

    /// Create a stage transition error
    pub fn stage_transition(msg: impl Into<String>) -> Self {
        Self::StageTransition(msg.into())
    }

    /// Create a notification error
    pub fn notify(msg: impl Into<String>) -> Self {
        Self::Notify(msg.into())
    }

    /// Create a general error
    pub fn general(msg: impl Into<String>) -> Self {
        Self::General(msg.into())
    }

    /// Process exit code for this error.
    ///
    /// Step failures propagate the child's exit code unchanged; every other
    /// error maps to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Step { code, .. } => *code,
            _ => 1,
        }
    }
}
