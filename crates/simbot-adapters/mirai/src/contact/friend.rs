//! Friend wrapper.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use simbot_core::{BotResult, BoxedReceipt, Contact, Friend, Id, Messages};
use tracing::info;

use super::send_to;
use crate::bot::MiraiBot;
use crate::native::{NativeContact, NativeFriend, NativeUserProfile};
use crate::receipt::MiraiMessageReceipt;

/// A friend of a [`MiraiBot`].
pub struct MiraiFriend {
    bot: Arc<MiraiBot>,
    native: Arc<dyn NativeFriend>,
}

impl MiraiFriend {
    /// Wraps a native friend.
    pub fn new(bot: Arc<MiraiBot>, native: Arc<dyn NativeFriend>) -> Self {
        Self { bot, native }
    }

    /// The owning bot.
    pub fn bot(&self) -> &Arc<MiraiBot> {
        &self.bot
    }

    /// The native friend.
    pub fn native(&self) -> &Arc<dyn NativeFriend> {
        &self.native
    }

    fn contact(&self) -> NativeContact {
        NativeContact::Friend(self.native.clone())
    }

    /// Changes the remark.
    pub async fn set_remark(&self, remark: &str) -> BotResult<()> {
        self.native.set_remark(remark).await?;
        Ok(())
    }

    /// Deletes the friend.
    pub async fn delete(&self) -> BotResult<bool> {
        self.native.delete().await?;
        info!(bot_id = self.bot.code(), friend_id = self.native.id(), "Friend deleted");
        Ok(true)
    }

    /// Nudges the friend in the friend conversation.
    pub async fn nudge(&self) -> BotResult<bool> {
        Ok(self.native.nudge(&self.contact()).await?)
    }

    /// Queries the friend's profile from the server.
    pub async fn query_profile(&self) -> BotResult<NativeUserProfile> {
        super::query_profile(&self.bot, self.native.id()).await
    }

    /// Sends a message and returns the mirai receipt.
    pub async fn send_message(&self, message: &Messages) -> BotResult<MiraiMessageReceipt> {
        send_to(&self.bot, self.contact(), message).await
    }
}

#[async_trait]
impl Contact for MiraiFriend {
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

impl Friend for MiraiFriend {
    fn remark(&self) -> Option<String> {
        Some(self.native.remark()).filter(|remark| !remark.is_empty())
    }
}
