//! Configuration error types.

use std::path::PathBuf;

use simbot_core::BotError;
use thiserror::Error;

/// Errors raised while turning verify info into a bot configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Neither `passwordInfo` nor a legacy password field is present.
    #[error("One of the [password] or [passwordMD5] must exist")]
    MissingPassword,

    /// An environment password names neither a property nor a variable.
    #[error("[passwordInfo.prop] and [passwordInfo.env] cannot be null at the same time")]
    MissingEnvKey,

    /// The property and the variable are both unset.
    #[error("no such element: {0}")]
    EnvValueNotFound(String),

    /// An md5 password is not 16 bytes of hex.
    #[error("Invalid md5 password: {0}")]
    InvalidMd5(String),

    /// `resource` device info without paths.
    #[error("[deviceInfo.paths] must not be empty")]
    EmptyResourcePaths,

    /// None of the device info paths could be read.
    #[error("no valid deviceInfo resource path in {0:?}")]
    DeviceInfoNotFound(Vec<String>),

    /// A device info file could not be read.
    #[error("Cannot read device info {path}: {source}")]
    DeviceInfoRead {
        /// The file.
        path: PathBuf,
        /// The cause.
        #[source]
        source: std::io::Error,
    },

    /// A device info file could not be parsed.
    #[error("Cannot parse device info {path}: {source}")]
    DeviceInfoParse {
        /// The file.
        path: PathBuf,
        /// The cause.
        #[source]
        source: serde_json::Error,
    },

    /// An enum value was not recognised.
    #[error("Unknown {kind} value: {value}")]
    UnknownEnum {
        /// Enum name.
        kind: &'static str,
        /// Offending value.
        value: String,
    },
}

impl ConfigError {
    /// Creates an unknown-enum error.
    pub fn unknown_enum(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownEnum {
            kind,
            value: value.into(),
        }
    }
}

impl From<ConfigError> for BotError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingPassword => BotError::VerifyFailure(err.to_string()),
            ConfigError::EnvValueNotFound(msg) => BotError::NoSuchElement(msg),
            ConfigError::DeviceInfoRead { source, .. } => BotError::Io(source.to_string()),
            other => BotError::Config(other.to_string()),
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
