//! # simbot
//!
//! A multi-platform bot framework. Components adapt protocol libraries to the
//! framework interfaces in [`core`]; the [`runtime`] loads configuration,
//! sets up logging and drives bot lifecycles.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  BotVerifyInfo  ┌────────────────┐  register  ┌──────────┐
//! │   Runtime    │────────────────▶│   BotManager   │───────────▶│   Bot    │
//! │ (simbot.toml)│                 │ (simbot.mirai) │            │          │
//! └──────────────┘                 └────────────────┘            └────┬─────┘
//!                                                                     │ events
//!                                                                     ▼
//!                                                            ┌────────────────┐
//!                                                            │ EventProcessor │
//!                                                            └────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use simbot::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let dispatcher = ListenerDispatcher::new().with(&MESSAGE_EVENT, |event| async move {
//!         if let Some(message) = event.as_message_event() {
//!             message.reply(&Messages::text("pong")).await?;
//!         }
//!         Ok(())
//!     });
//!
//!     let manager = MiraiBotManager::new(protocol_factory, Arc::new(dispatcher));
//!     simbot::run(vec![manager]).await
//! }
//! ```
//!
//! ## Features
//!
//! - `mirai` *(default)*: the mirai component
//! - `toml-config` *(default)*, `yaml-config`: configuration file formats
//! - `json-log`: JSON log lines

pub use simbot_core as core;
pub use simbot_runtime as runtime;

#[cfg(feature = "mirai")]
pub use simbot_adapter_mirai as mirai;

use simbot_core::BoxedBotManager;
use simbot_runtime::SimbotApplication;

/// Loads configuration from the default locations, registers `managers`,
/// and runs until Ctrl+C.
pub async fn run(managers: Vec<BoxedBotManager>) -> anyhow::Result<()> {
    let mut builder = SimbotApplication::builder();
    for manager in managers {
        builder = builder.manager(manager);
    }
    let app = builder.build()?;
    app.run().await?;
    Ok(())
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use simbot_core::prelude::*;
    pub use simbot_core::{BotVerifyInfo, BoxedEvent, MESSAGE_EVENT, MessageEvent, Messages};
    pub use simbot_runtime::prelude::*;
    pub use simbot_runtime::{SimbotApplication, SimbotConfig};

    #[cfg(feature = "mirai")]
    pub use simbot_adapter_mirai::{MiraiBot, MiraiBotManager, event as mirai_event};

    pub use std::sync::Arc;
}
