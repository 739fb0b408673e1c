//! Runtime error types.

use simbot_core::BotError;
use thiserror::Error;

pub use crate::config::{ConfigError, ConfigResult};

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A bot could not be registered.
    #[error("Failed to register bot '{name}': {source}")]
    Registration {
        name: String,
        #[source]
        source: BotError,
    },

    /// A bot operation failed.
    #[error(transparent)]
    Bot(#[from] BotError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
