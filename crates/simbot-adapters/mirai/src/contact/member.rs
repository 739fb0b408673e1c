//! Group member wrapper and member roles.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use simbot_core::{BotError, BotResult, BoxedReceipt, Group, Id, Member, Messages, Role};
use tracing::info;

use super::send_to;
use crate::bot::MiraiBot;
use crate::native::{NativeContact, NativeMember, NativePermission, NativeUserProfile};
use crate::receipt::MiraiMessageReceipt;

// =============================================================================
// Role
// =============================================================================

/// Role of a member, mapped from the native permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    /// Regular member.
    Member = 0,
    /// Administrator.
    Administrator = 1,
    /// Owner.
    Owner = 2,
}

impl MemberRole {
    /// Numeric level.
    pub fn level(self) -> i32 {
        self as i32
    }

    /// Role name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Member => "MEMBER",
            Self::Administrator => "ADMINISTRATOR",
            Self::Owner => "OWNER",
        }
    }
}

impl From<NativePermission> for MemberRole {
    fn from(permission: NativePermission) -> Self {
        match permission {
            NativePermission::Member => Self::Member,
            NativePermission::Administrator => Self::Administrator,
            NativePermission::Owner => Self::Owner,
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MemberRole::name(*self))
    }
}

impl Role for MemberRole {
    fn id(&self) -> Id {
        Id::Int(self.level())
    }

    fn name(&self) -> String {
        MemberRole::name(*self).to_string()
    }

    fn is_admin(&self) -> bool {
        *self >= Self::Administrator
    }

    fn is_owner(&self) -> bool {
        *self == Self::Owner
    }
}

// =============================================================================
// Member
// =============================================================================

/// A member of a group.
pub struct MiraiMember {
    bot: Arc<MiraiBot>,
    native: Arc<dyn NativeMember>,
}

impl MiraiMember {
    /// Wraps a native member.
    pub fn new(bot: Arc<MiraiBot>, native: Arc<dyn NativeMember>) -> Self {
        Self { bot, native }
    }

    /// The owning bot.
    pub fn bot(&self) -> &Arc<MiraiBot> {
        &self.bot
    }

    /// The native member.
    pub fn native(&self) -> &Arc<dyn NativeMember> {
        &self.native
    }

    /// Special title, empty when unset.
    pub fn special_title(&self) -> String {
        self.native.special_title()
    }

    /// The member's role.
    pub fn role(&self) -> MemberRole {
        self.native.permission().into()
    }

    /// Seconds until the member is unmuted, 0 if not muted.
    pub fn mute_time_remaining(&self) -> i32 {
        self.native.mute_time_remaining()
    }

    /// Mutes for `seconds`. Zero unmutes; negative or oversized values are
    /// rejected with `false`.
    pub async fn mute_seconds(&self, seconds: i64) -> BotResult<bool> {
        if seconds == 0 {
            self.native.unmute().await?;
            return Ok(true);
        }
        let Ok(seconds) = i32::try_from(seconds) else {
            return Ok(false);
        };
        if seconds < 0 {
            return Ok(false);
        }
        self.native.mute(seconds).await?;
        Ok(true)
    }

    /// Removes the member from the group. Anonymous members cannot be kicked.
    pub async fn kick(&self, message: &str, block: bool) -> BotResult<bool> {
        if !self.native.is_normal() {
            return Err(BotError::unsupported(format!(
                "member {} of group {} is not a normal member",
                self.native.id(),
                self.native.group_id()
            )));
        }
        self.native.kick(message, block).await?;
        info!(
            group_id = self.native.group_id(),
            member_id = self.native.id(),
            block,
            "Member kicked"
        );
        Ok(true)
    }

    /// Nudges the member, shown in the group.
    pub async fn nudge(&self) -> BotResult<bool> {
        let subject = match self.bot.native_bot().get_group(self.native.group_id()) {
            Some(group) => NativeContact::Group(group),
            None => NativeContact::Member(self.native.clone()),
        };
        Ok(self.native.nudge(&subject).await?)
    }

    /// Queries the member's account profile from the server.
    pub async fn query_profile(&self) -> BotResult<NativeUserProfile> {
        super::query_profile(&self.bot, self.native.id()).await
    }

    /// Sends a temp message and returns the mirai receipt.
    pub async fn send_message(&self, message: &Messages) -> BotResult<MiraiMessageReceipt> {
        send_to(&self.bot, NativeContact::Member(self.native.clone()), message).await
    }
}

#[async_trait]
impl Member for MiraiMember {
    fn id(&self) -> Id {
        Id::Long(self.native.id())
    }

    fn username(&self) -> String {
        self.native.nick()
    }

    fn nickname(&self) -> String {
        self.native.name_card()
    }

    fn avatar(&self) -> String {
        self.native.avatar_url()
    }

    fn group_id(&self) -> Id {
        Id::Long(self.native.group_id())
    }

    async fn group(&self) -> BotResult<Arc<dyn Group>> {
        let group = self.bot.mirai_group(self.native.group_id())?.ok_or_else(|| {
            BotError::no_such_element(format!("group {}", self.native.group_id()))
        })?;
        Ok(group)
    }

    fn roles(&self) -> Vec<Arc<dyn Role>> {
        vec![Arc::new(self.role())]
    }

    fn is_admin(&self) -> bool {
        self.native.permission().is_operator()
    }

    fn is_owner(&self) -> bool {
        self.native.permission() == NativePermission::Owner
    }

    async fn mute(&self, duration: Duration) -> BotResult<bool> {
        match super::mute_seconds(duration) {
            Some(seconds) => self.mute_seconds(seconds).await,
            None => Ok(false),
        }
    }

    async fn unmute(&self) -> BotResult<bool> {
        self.mute_seconds(0).await
    }

    async fn send(&self, message: &Messages) -> BotResult<BoxedReceipt> {
        Ok(Arc::new(self.send_message(message).await?))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
