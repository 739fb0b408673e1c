//! The mirai bot manager.
//!
//! [`MiraiBotManager`] turns verify info documents whose component is
//! `"simbot.mirai"` into [`MiraiBot`]s and keeps them by account id.
//!
//! ```rust,ignore
//! let manager = MiraiBotManager::new(factory, processor);
//! let bot = manager.register(&verify_info).await?;
//! manager.start().await?;
//! manager.join().await;
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::join_all;
use simbot_core::{
    Bot, BotError, BotManager, BotResult, BotVerifyInfo, BoxedBot, BoxedEventProcessor, Id,
};
use tracing::{debug, info, warn};

use crate::bot::{COMPONENT_ID, MiraiBot};
use crate::config::{MiraiBotConfiguration, MiraiBotVerifyInfoConfiguration, PasswordKind};
use crate::native::NativeBotFactory;

/// Directory device files are resolved against unless configured otherwise.
pub const DEFAULT_RESOURCE_ROOT: &str = "resources";

/// Owns every mirai bot of an application.
pub struct MiraiBotManager {
    me: Weak<Self>,
    factory: Arc<dyn NativeBotFactory>,
    processor: BoxedEventProcessor,
    bots: DashMap<i64, Arc<MiraiBot>>,
    resource_root: PathBuf,
}

impl MiraiBotManager {
    /// Creates a manager resolving resources under [`DEFAULT_RESOURCE_ROOT`].
    pub fn new(factory: Arc<dyn NativeBotFactory>, processor: BoxedEventProcessor) -> Arc<Self> {
        Self::with_resource_root(factory, processor, DEFAULT_RESOURCE_ROOT)
    }

    /// Creates a manager resolving device files under `resource_root`.
    pub fn with_resource_root(
        factory: Arc<dyn NativeBotFactory>,
        processor: BoxedEventProcessor,
        resource_root: impl Into<PathBuf>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            factory,
            processor,
            bots: DashMap::new(),
            resource_root: resource_root.into(),
        })
    }

    /// Root directory for device files.
    pub fn resource_root(&self) -> &Path {
        &self.resource_root
    }

    /// Creates a bot from resolved settings, replacing any bot with the same
    /// code. The replaced bot is cancelled. The new bot is not started.
    pub async fn register_with(
        &self,
        code: i64,
        password: PasswordKind,
        configuration: MiraiBotConfiguration,
    ) -> BotResult<Arc<MiraiBot>> {
        let native = self.factory.new_bot(code, password, &configuration)?;
        let bot = MiraiBot::new(native, self.processor.clone(), self.me.clone(), configuration);

        if let Some(previous) = self.bots.insert(code, bot.clone()) {
            warn!(bot_id = code, "Bot registered again, cancelling the previous one");
            if let Err(e) = previous.cancel().await {
                warn!(bot_id = code, error = %e, "Cancelling the replaced bot failed");
            }
        }
        info!(bot_id = code, "Bot registered");
        Ok(bot)
    }

    /// Finds a bot by account id.
    pub fn mirai_bot(&self, code: i64) -> Option<Arc<MiraiBot>> {
        self.bots.get(&code).map(|entry| entry.value().clone())
    }

    /// All registered bots.
    pub fn mirai_bots(&self) -> Vec<Arc<MiraiBot>> {
        self.bots.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Removes a bot without cancelling it.
    pub fn remove(&self, code: i64) -> Option<Arc<MiraiBot>> {
        self.bots.remove(&code).map(|(_, bot)| bot)
    }

    /// Waits until every registered bot stops.
    pub async fn join(&self) {
        join_all(self.mirai_bots().iter().map(|bot| bot.join())).await;
    }
}

#[async_trait]
impl BotManager for MiraiBotManager {
    fn component(&self) -> &'static str {
        COMPONENT_ID
    }

    async fn register(&self, info: &BotVerifyInfo) -> BotResult<BoxedBot> {
        if !self.is_supported(info) {
            return Err(BotError::ComponentMismatch {
                actual: info.component.clone(),
                expected: COMPONENT_ID.to_string(),
            });
        }
        let verify: MiraiBotVerifyInfoConfiguration = info.decode()?;
        let password = verify.password_kind()?;
        let configuration = verify.bot_configuration(&self.resource_root)?;
        debug!(bot_id = verify.code, name = info.display_name(), "Registering bot");

        let bot = self.register_with(verify.code, password, configuration).await?;
        Ok(bot)
    }

    fn get(&self, id: &Id) -> Option<BoxedBot> {
        let code = id.to_long()?;
        self.mirai_bot(code).map(|bot| bot as BoxedBot)
    }

    fn all(&self) -> Vec<BoxedBot> {
        self.mirai_bots()
            .into_iter()
            .map(|bot| bot as BoxedBot)
            .collect()
    }

    async fn start(&self) -> BotResult<()> {
        let mut first_error = None;
        for bot in self.mirai_bots() {
            if let Err(e) = bot.start().await {
                warn!(bot_id = bot.code(), error = %e, "Bot failed to start");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn cancel(&self) -> BotResult<()> {
        for bot in self.mirai_bots() {
            bot.cancel().await?;
        }
        info!(count = self.bots.len(), "All bots cancelled");
        Ok(())
    }
}
