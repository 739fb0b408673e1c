//! Group wrapper.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use simbot_core::{BotResult, BoxedReceipt, Element, Group, Id, Member, Messages, Resource};
use tracing::info;

use super::member::{MemberRole, MiraiMember};
use super::{MiraiAnnouncements, send_to};
use crate::bot::MiraiBot;
use crate::message::MiraiImage;
use crate::native::{NativeContact, NativeGroup};
use crate::receipt::MiraiMessageReceipt;

/// A group the bot is in.
pub struct MiraiGroup {
    bot: Arc<MiraiBot>,
    native: Arc<dyn NativeGroup>,
}

impl MiraiGroup {
    /// Wraps a native group.
    pub fn new(bot: Arc<MiraiBot>, native: Arc<dyn NativeGroup>) -> Self {
        Self { bot, native }
    }

    /// The owning bot.
    pub fn bot(&self) -> &Arc<MiraiBot> {
        &self.bot
    }

    /// The native group.
    pub fn native(&self) -> &Arc<dyn NativeGroup> {
        &self.native
    }

    fn wrap(&self, member: Arc<dyn crate::native::NativeMember>) -> Arc<MiraiMember> {
        Arc::new(MiraiMember::new(self.bot.clone(), member))
    }

    /// The owner.
    pub fn mirai_owner(&self) -> Arc<MiraiMember> {
        self.wrap(self.native.owner())
    }

    /// Finds a member.
    pub fn mirai_member(&self, id: i64) -> Option<Arc<MiraiMember>> {
        self.native.get_member(id).map(|m| self.wrap(m))
    }

    /// All members, not including the bot.
    pub fn mirai_members(&self) -> Vec<Arc<MiraiMember>> {
        self.native.members().into_iter().map(|m| self.wrap(m)).collect()
    }

    /// The bot as a member of this group.
    pub fn bot_as_member(&self) -> Arc<MiraiMember> {
        self.wrap(self.native.bot_as_member())
    }

    /// The bot's role in this group.
    pub fn bot_role(&self) -> MemberRole {
        self.native.bot_permission().into()
    }

    /// Seconds until the bot is unmuted, 0 if not muted.
    pub fn bot_mute_remaining(&self) -> i32 {
        self.native.bot_mute_remaining()
    }

    /// True while the whole group is muted.
    pub fn is_mute_all(&self) -> bool {
        self.native.is_mute_all()
    }

    /// Announcements of this group.
    pub fn announcements(&self) -> MiraiAnnouncements {
        MiraiAnnouncements::new(self.bot.clone(), self.native.id(), self.native.announcements())
    }

    /// Mutes the whole group for `seconds`. Zero mutes until unmuted.
    pub async fn mute_seconds(&self, seconds: i64) -> BotResult<bool> {
        Ok(self.bot.mute_timer().mute(self.native.clone(), seconds).await?)
    }

    /// Leaves the group. Returns false if the bot was not in it.
    pub async fn quit(&self) -> BotResult<bool> {
        let quit = self.native.quit().await?;
        if quit {
            info!(bot_id = self.bot.code(), group_id = self.native.id(), "Quit group");
        }
        Ok(quit)
    }

    /// Sends a message and returns the mirai receipt.
    pub async fn send_message(&self, message: &Messages) -> BotResult<MiraiMessageReceipt> {
        send_to(&self.bot, NativeContact::Group(self.native.clone()), message).await
    }
}

#[async_trait]
impl Group for MiraiGroup {
    fn id(&self) -> Id {
        Id::Long(self.native.id())
    }

    fn name(&self) -> String {
        self.native.name()
    }

    fn avatar(&self) -> String {
        self.native.avatar_url()
    }

    fn owner_id(&self) -> Id {
        Id::Long(self.native.owner().id())
    }

    async fn owner(&self) -> BotResult<Arc<dyn Member>> {
        Ok(self.mirai_owner())
    }

    async fn member(&self, id: &Id) -> BotResult<Option<Arc<dyn Member>>> {
        let Some(id) = id.to_long() else {
            return Ok(None);
        };
        Ok(self.mirai_member(id).map(|m| m as Arc<dyn Member>))
    }

    async fn members(&self) -> BotResult<Vec<Arc<dyn Member>>> {
        Ok(self
            .mirai_members()
            .into_iter()
            .map(|m| m as Arc<dyn Member>)
            .collect())
    }

    async fn mute(&self, duration: Duration) -> BotResult<bool> {
        match super::mute_seconds(duration) {
            Some(seconds) => self.mute_seconds(seconds).await,
            None => Ok(false),
        }
    }

    async fn unmute(&self) -> BotResult<bool> {
        Ok(self.bot.mute_timer().unmute(self.native.clone()).await?)
    }

    async fn send(&self, message: &Messages) -> BotResult<BoxedReceipt> {
        Ok(Arc::new(self.send_message(message).await?))
    }

    async fn upload_image(&self, resource: &Resource) -> BotResult<Element> {
        let data = resource.read_bytes()?;
        let image = self.native.upload_image(&resource.name(), &data).await?;
        Ok(Element::extension(MiraiImage::of(&image, false)))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
