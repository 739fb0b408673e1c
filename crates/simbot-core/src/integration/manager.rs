//! Bot managers and verify info.
//!
//! A [`BotManager`] owns every bot of one component. The runtime reads a list
//! of [`BotVerifyInfo`] documents from configuration and hands each one to the
//! manager whose component id matches.
//!
//! ```rust,ignore
//! let info: BotVerifyInfo = serde_json::from_str(r#"{
//!     "component": "simbot.mirai",
//!     "name": "main",
//!     "config": { "code": 123456, "passwordInfo": { "type": "text", "text": "pwd" } }
//! }"#)?;
//!
//! let bot = manager.register(&info).await?;
//! bot.start().await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{BotError, BotResult};
use crate::foundation::id::Id;
use crate::integration::objective::BoxedBot;

/// A boxed bot manager.
pub type BoxedBotManager = Arc<dyn BotManager>;

/// A configuration document describing one bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotVerifyInfo {
    /// Component id the bot belongs to, e.g. `"simbot.mirai"`.
    pub component: String,

    /// Optional display name, used in logs and for duplicate detection.
    #[serde(default)]
    pub name: Option<String>,

    /// Disabled entries are skipped by the runtime.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Component-specific configuration.
    #[serde(default)]
    pub config: serde_json::Value,
}

fn default_enabled() -> bool {
    true
}

impl BotVerifyInfo {
    /// Creates verify info for a component.
    pub fn new(component: impl Into<String>, config: serde_json::Value) -> Self {
        Self {
            component: component.into(),
            name: None,
            enabled: true,
            config,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the display name, falling back to the component id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.component)
    }

    /// Decodes the component-specific configuration.
    pub fn decode<T: DeserializeOwned>(&self) -> BotResult<T> {
        serde_json::from_value(self.config.clone()).map_err(|e| {
            BotError::verify(format!(
                "cannot decode verify info '{}': {e}",
                self.display_name()
            ))
        })
    }
}

/// Registers and controls the bots of one component.
#[async_trait]
pub trait BotManager: Send + Sync {
    /// The component id this manager serves.
    fn component(&self) -> &'static str;

    /// Returns true if the verify info targets this manager's component.
    fn is_supported(&self, info: &BotVerifyInfo) -> bool {
        info.component == self.component()
    }

    /// Creates a bot from verify info. The bot is not started.
    async fn register(&self, info: &BotVerifyInfo) -> BotResult<BoxedBot>;

    /// Finds a registered bot.
    fn get(&self, id: &Id) -> Option<BoxedBot>;

    /// Lists all registered bots.
    fn all(&self) -> Vec<BoxedBot>;

    /// Starts every registered bot.
    async fn start(&self) -> BotResult<()>;

    /// Cancels every registered bot.
    async fn cancel(&self) -> BotResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tokio_test::{assert_err, assert_ok};

    #[derive(Debug, Deserialize)]
    struct Sample {
        code: i64,
    }

    #[test]
    fn test_verify_info_defaults() {
        let info: BotVerifyInfo =
            serde_json::from_str(r#"{"component": "simbot.mirai", "config": {"code": 1}}"#)
                .unwrap();
        assert!(info.enabled);
        assert_eq!(info.display_name(), "simbot.mirai");
        assert_eq!(assert_ok!(info.decode::<Sample>()).code, 1);
    }

    #[test]
    fn test_verify_info_decode_failure() {
        let info = BotVerifyInfo::new("simbot.mirai", serde_json::json!({"code": "x"}))
            .with_name("main");
        let err = assert_err!(info.decode::<Sample>());
        assert!(matches!(err, BotError::VerifyFailure(msg) if msg.contains("'main'")));
    }
}
