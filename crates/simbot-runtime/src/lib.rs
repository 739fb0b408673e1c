//! simbot Runtime - configuration, logging and bot lifecycle.
//!
//! This crate provides:
//! - Layered configuration loading (`ConfigLoader`, `SimbotConfig`)
//! - Logging setup on `tracing-subscriber` (`LoggingBuilder`)
//! - The application driving registered bot managers (`SimbotApplication`)
//!
//! ```rust,ignore
//! use simbot_runtime::SimbotApplication;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let app = SimbotApplication::new();
//!     app.register_manager(mirai_manager).await;
//!
//!     // Registers bots from config, starts them, runs until Ctrl+C
//!     app.run().await?;
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod config;
pub mod error;
pub mod logging;

// Re-exports
pub use application::{ApplicationBuilder, SimbotApplication};
pub use config::{ConfigError, ConfigLoader, ConfigResult, LoggingConfig, SimbotConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
