//! Configuration for simbot applications.
//!
//! Configuration is layered with figment and validated before use.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, ENV_PREFIX, Profile, load_config, load_config_from_file};
pub use schema::{LogFormat, LogLevel, LogOutput, LoggingConfig, SimbotConfig, SpanEventConfig};
pub use validation::validate_config;
