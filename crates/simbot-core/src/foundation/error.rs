//! Unified error types for simbot components.
//!
//! Component crates convert their own protocol-level failures into
//! [`BotError`] so that application code only has to deal with one type.

use thiserror::Error;

// =============================================================================
// Bot Errors
// =============================================================================

/// Errors that can occur while operating bots and their contacts.
#[derive(Debug, Clone, Error)]
pub enum BotError {
    /// The bot has not been started yet (or has been cancelled).
    #[error("bot '{id}' is not started")]
    NotStarted {
        /// The bot identifier.
        id: String,
    },

    /// Logging in failed.
    #[error("bot login failed: {reason}")]
    LoginFailed {
        /// Reason for failure.
        reason: String,
    },

    /// The wrapped protocol library reported a failure.
    #[error("native error: {0}")]
    Native(String),

    /// The operation is not supported by this component or target.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// A required element could not be found.
    #[error("no such element: {0}")]
    NoSuchElement(String),

    /// Verify info was meant for another component.
    #[error("component mismatch: [{actual}] != [{expected}]")]
    ComponentMismatch {
        /// The component id the verify info targets.
        actual: String,
        /// The component id of the manager asked to register it.
        expected: String,
    },

    /// Verify info could not be turned into a bot.
    #[error("verify failure: {0}")]
    VerifyFailure(String),

    /// An argument could not be interpreted.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for BotError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BotError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl BotError {
    /// Creates a native error.
    pub fn native(msg: impl Into<String>) -> Self {
        Self::Native(msg.into())
    }

    /// Creates an unsupported-operation error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Creates a missing-element error.
    pub fn no_such_element(msg: impl Into<String>) -> Self {
        Self::NoSuchElement(msg.into())
    }

    /// Creates an invalid-argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates a verify failure.
    pub fn verify(msg: impl Into<String>) -> Self {
        Self::VerifyFailure(msg.into())
    }

    /// Creates a login failure.
    pub fn login(reason: impl Into<String>) -> Self {
        Self::LoginFailed {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for bot operations.
pub type BotResult<T> = Result<T, BotError>;
