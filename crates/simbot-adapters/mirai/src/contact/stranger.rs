//! Stranger wrapper.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use simbot_core::{BotResult, BoxedReceipt, Contact, Id, Messages, Stranger};

use super::send_to;
use crate::bot::MiraiBot;
use crate::native::{NativeContact, NativeStranger, NativeUserProfile};
use crate::receipt::MiraiMessageReceipt;

/// A user the bot is not friends with.
pub struct MiraiStranger {
    bot: Arc<MiraiBot>,
    native: Arc<dyn NativeStranger>,
}

impl MiraiStranger {
    /// Wraps a native stranger.
    pub fn new(bot: Arc<MiraiBot>, native: Arc<dyn NativeStranger>) -> Self {
        Self { bot, native }
    }

    /// The owning bot.
    pub fn bot(&self) -> &Arc<MiraiBot> {
        &self.bot
    }

    /// The native stranger.
    pub fn native(&self) -> &Arc<dyn NativeStranger> {
        &self.native
    }

    /// Nudges the stranger.
    pub async fn nudge(&self) -> BotResult<bool> {
        let contact = NativeContact::Stranger(self.native.clone());
        Ok(self.native.nudge(&contact).await?)
    }

    /// Queries the stranger's profile from the server.
    pub async fn query_profile(&self) -> BotResult<NativeUserProfile> {
        super::query_profile(&self.bot, self.native.id()).await
    }

    /// Sends a message and returns the mirai receipt.
    pub async fn send_message(&self, message: &Messages) -> BotResult<MiraiMessageReceipt> {
        send_to(&self.bot, NativeContact::Stranger(self.native.clone()), message).await
    }
}

#[async_trait]
impl Contact for MiraiStranger {
    fn id(&self) -> Id {
        Id::Long(self.native.id())
    }

    fn username(&self) -> String {
        self.native.nick()
    }

    fn avatar(&self) -> String {
        self.native.avatar_url()
    }

    async fn send(&self, message: &Messages) -> BotResult<BoxedReceipt> {
        Ok(Arc::new(self.send_message(message).await?))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Stranger for MiraiStranger {}
