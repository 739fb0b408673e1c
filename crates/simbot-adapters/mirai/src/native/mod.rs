//! The protocol library seam.
//!
//! Everything the adapter needs from the QQ protocol library is expressed as
//! the object-safe traits in this module. A protocol implementation provides
//! a [`NativeBotFactory`]; the adapter wraps whatever it produces.
//!
//! ```text
//! ┌──────────────┐  NativeBotFactory  ┌─────────────┐   wrap   ┌──────────┐
//! │ MiraiManager │───────────────────▶│  NativeBot  │─────────▶│ MiraiBot │
//! └──────────────┘                    └─────────────┘          └──────────┘
//!                                        │ subscribe()
//!                                        ▼
//!                               broadcast<NativeEvent>
//! ```

pub mod event;
pub mod message;

#[cfg(test)]
pub mod testing;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use simbot_core::BotError;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::{MiraiBotConfiguration, PasswordKind};

pub use event::{NativeEvent, NativeRequest};
pub use message::{
    MessageSourceKind, MusicKind, NativeAudio, NativeForwardNode, NativeImage, NativeMessage,
    NativeMessageChain, NativeMessageSource, NativeMusicShare,
};

// =============================================================================
// Errors
// =============================================================================

/// Failures reported by the protocol library.
#[derive(Debug, Clone, Error)]
pub enum NativeError {
    /// Login was rejected or interrupted.
    #[error("login failed: {0}")]
    Login(String),

    /// The bot is not online.
    #[error("bot is offline")]
    Offline,

    /// The bot lacks the permission for the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The contact does not support the operation.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Uploading a resource failed.
    #[error("upload failed: {0}")]
    Upload(String),

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

impl NativeError {
    /// Creates an unsupported-operation error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Creates a generic error.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

impl From<NativeError> for BotError {
    fn from(err: NativeError) -> Self {
        match err {
            NativeError::Login(reason) => BotError::LoginFailed { reason },
            NativeError::Unsupported(msg) => BotError::Unsupported(msg),
            other => BotError::Native(other.to_string()),
        }
    }
}

/// Result type for protocol library calls.
pub type NativeResult<T> = Result<T, NativeError>;

// =============================================================================
// Permissions
// =============================================================================

/// Permission of a member inside a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NativePermission {
    /// Regular member.
    Member,
    /// Group administrator.
    Administrator,
    /// Group owner.
    Owner,
}

impl NativePermission {
    /// Numeric level, 0 for members.
    pub fn level(self) -> i32 {
        match self {
            Self::Member => 0,
            Self::Administrator => 1,
            Self::Owner => 2,
        }
    }

    /// True for administrators and owners.
    pub fn is_operator(self) -> bool {
        self >= Self::Administrator
    }
}

// =============================================================================
// Profiles
// =============================================================================

/// Sex stated on a user profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserSex {
    /// Male.
    Male,
    /// Female.
    Female,
    /// Not stated.
    #[default]
    Unknown,
}

/// Public profile of a user, as queried from the server.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeUserProfile {
    /// Nickname.
    pub nickname: String,
    /// Email, empty when hidden.
    pub email: String,
    /// Age, 0 when hidden.
    pub age: i32,
    /// Account level.
    pub q_level: i32,
    /// Friend group the user is sorted into, 0 for strangers.
    pub friend_group_id: i32,
    /// Personal signature.
    pub sign: String,
    /// Sex.
    pub sex: UserSex,
}

// =============================================================================
// Contacts
// =============================================================================

/// A logged-in protocol bot.
#[async_trait]
pub trait NativeBot: Send + Sync {
    /// Account id.
    fn id(&self) -> i64;

    /// Account nick.
    fn nick(&self) -> String;

    /// Avatar url.
    fn avatar_url(&self) -> String;

    /// True while connected.
    fn is_online(&self) -> bool;

    /// Logs in. May be called again after a logout.
    async fn login(&self) -> NativeResult<()>;

    /// Closes the bot. Closing twice has no effect.
    async fn close(&self);

    /// Waits until the bot is closed.
    async fn join(&self);

    /// Subscribes to the event stream of this bot.
    fn subscribe(&self) -> broadcast::Receiver<NativeEvent>;

    /// Friend list.
    fn friends(&self) -> Vec<Arc<dyn NativeFriend>>;

    /// Finds a friend.
    fn get_friend(&self, id: i64) -> Option<Arc<dyn NativeFriend>>;

    /// Group list.
    fn groups(&self) -> Vec<Arc<dyn NativeGroup>>;

    /// Finds a group.
    fn get_group(&self, id: i64) -> Option<Arc<dyn NativeGroup>>;

    /// Known strangers.
    fn strangers(&self) -> Vec<Arc<dyn NativeStranger>>;

    /// Finds a stranger.
    fn get_stranger(&self, id: i64) -> Option<Arc<dyn NativeStranger>>;

    /// The bot viewed as its own friend.
    fn as_friend(&self) -> Arc<dyn NativeFriend>;

    /// Nudges the bot itself, shown in `to`.
    async fn nudge(&self, to: &NativeContact) -> NativeResult<bool>;

    /// Recalls a message by its source.
    async fn recall(&self, source: &NativeMessageSource) -> NativeResult<()>;

    /// Accepts a friend, invitation or join request.
    async fn accept_request(&self, request: &NativeRequest) -> NativeResult<()>;

    /// Rejects a friend, invitation or join request.
    async fn reject_request(
        &self,
        request: &NativeRequest,
        message: Option<&str>,
        blacklist: bool,
    ) -> NativeResult<()>;

    /// Queries the profile of any user by id.
    async fn query_profile(&self, user_id: i64) -> NativeResult<NativeUserProfile>;
}

/// A friend.
#[async_trait]
pub trait NativeFriend: Send + Sync {
    /// Account id.
    fn id(&self) -> i64;

    /// Account nick.
    fn nick(&self) -> String;

    /// Avatar url.
    fn avatar_url(&self) -> String;

    /// Remark, empty when unset.
    fn remark(&self) -> String;

    /// Changes the remark.
    async fn set_remark(&self, remark: &str) -> NativeResult<()>;

    /// Deletes the friend.
    async fn delete(&self) -> NativeResult<()>;

    /// Sends a message.
    async fn send_message(&self, chain: &NativeMessageChain) -> NativeResult<Arc<dyn NativeReceipt>>;

    /// Uploads an image for this contact.
    async fn upload_image(&self, name: &str, data: &[u8]) -> NativeResult<NativeImage>;

    /// Nudges this friend, shown in `to`.
    async fn nudge(&self, to: &NativeContact) -> NativeResult<bool>;
}

/// A user that is not a friend.
#[async_trait]
pub trait NativeStranger: Send + Sync {
    /// Account id.
    fn id(&self) -> i64;

    /// Account nick.
    fn nick(&self) -> String;

    /// Avatar url.
    fn avatar_url(&self) -> String;

    /// Sends a message.
    async fn send_message(&self, chain: &NativeMessageChain) -> NativeResult<Arc<dyn NativeReceipt>>;

    /// Uploads an image for this contact.
    async fn upload_image(&self, name: &str, data: &[u8]) -> NativeResult<NativeImage>;

    /// Nudges this stranger, shown in `to`.
    async fn nudge(&self, to: &NativeContact) -> NativeResult<bool>;
}

/// A group.
#[async_trait]
pub trait NativeGroup: Send + Sync {
    /// Group id.
    fn id(&self) -> i64;

    /// Group name.
    fn name(&self) -> String;

    /// Avatar url.
    fn avatar_url(&self) -> String;

    /// The owner.
    fn owner(&self) -> Arc<dyn NativeMember>;

    /// The bot as a member of this group.
    fn bot_as_member(&self) -> Arc<dyn NativeMember>;

    /// Members, not including the bot.
    fn members(&self) -> Vec<Arc<dyn NativeMember>>;

    /// Finds a member.
    fn get_member(&self, id: i64) -> Option<Arc<dyn NativeMember>>;

    /// True while the whole group is muted.
    fn is_mute_all(&self) -> bool;

    /// Mutes or unmutes the whole group.
    async fn set_mute_all(&self, mute: bool) -> NativeResult<()>;

    /// Seconds until the bot itself is unmuted, 0 if not muted.
    fn bot_mute_remaining(&self) -> i32;

    /// The bot's own permission.
    fn bot_permission(&self) -> NativePermission;

    /// Sends a message.
    async fn send_message(&self, chain: &NativeMessageChain) -> NativeResult<Arc<dyn NativeReceipt>>;

    /// Uploads an image for this group.
    async fn upload_image(&self, name: &str, data: &[u8]) -> NativeResult<NativeImage>;

    /// Group announcements.
    fn announcements(&self) -> Arc<dyn NativeAnnouncements>;

    /// Leaves the group. Returns false if the bot was not a member.
    async fn quit(&self) -> NativeResult<bool>;
}

/// A member of a group.
#[async_trait]
pub trait NativeMember: Send + Sync {
    /// Account id.
    fn id(&self) -> i64;

    /// Id of the group.
    fn group_id(&self) -> i64;

    /// Name card inside the group, empty when unset.
    fn name_card(&self) -> String;

    /// Account nick.
    fn nick(&self) -> String;

    /// Special title, empty when unset.
    fn special_title(&self) -> String;

    /// Permission.
    fn permission(&self) -> NativePermission;

    /// Avatar url.
    fn avatar_url(&self) -> String;

    /// Seconds until unmuted, 0 if not muted.
    fn mute_time_remaining(&self) -> i32;

    /// Mutes for `seconds`.
    async fn mute(&self, seconds: i32) -> NativeResult<()>;

    /// Lifts a mute.
    async fn unmute(&self) -> NativeResult<()>;

    /// Removes the member from the group.
    async fn kick(&self, message: &str, block: bool) -> NativeResult<()>;

    /// Sends a temp message.
    async fn send_message(&self, chain: &NativeMessageChain) -> NativeResult<Arc<dyn NativeReceipt>>;

    /// Uploads an image for this member.
    async fn upload_image(&self, name: &str, data: &[u8]) -> NativeResult<NativeImage>;

    /// Nudges this member, shown in `to`.
    async fn nudge(&self, to: &NativeContact) -> NativeResult<bool>;

    /// False for anonymous members.
    fn is_normal(&self) -> bool;
}

/// Any contact a message can be sent to.
#[derive(Clone)]
pub enum NativeContact {
    /// A friend.
    Friend(Arc<dyn NativeFriend>),
    /// A group.
    Group(Arc<dyn NativeGroup>),
    /// A member, for temp messages.
    Member(Arc<dyn NativeMember>),
    /// A stranger.
    Stranger(Arc<dyn NativeStranger>),
}

impl NativeContact {
    /// Contact id.
    pub fn id(&self) -> i64 {
        match self {
            Self::Friend(c) => c.id(),
            Self::Group(c) => c.id(),
            Self::Member(c) => c.id(),
            Self::Stranger(c) => c.id(),
        }
    }

    /// Sends a message.
    pub async fn send_message(
        &self,
        chain: &NativeMessageChain,
    ) -> NativeResult<Arc<dyn NativeReceipt>> {
        match self {
            Self::Friend(c) => c.send_message(chain).await,
            Self::Group(c) => c.send_message(chain).await,
            Self::Member(c) => c.send_message(chain).await,
            Self::Stranger(c) => c.send_message(chain).await,
        }
    }

    /// Uploads an image.
    pub async fn upload_image(&self, name: &str, data: &[u8]) -> NativeResult<NativeImage> {
        match self {
            Self::Friend(c) => c.upload_image(name, data).await,
            Self::Group(c) => c.upload_image(name, data).await,
            Self::Member(c) => c.upload_image(name, data).await,
            Self::Stranger(c) => c.upload_image(name, data).await,
        }
    }

    /// Nudges this contact, shown in `to`. Groups cannot be nudged.
    pub async fn nudge(&self, to: &NativeContact) -> NativeResult<bool> {
        match self {
            Self::Friend(c) => c.nudge(to).await,
            Self::Member(c) => c.nudge(to).await,
            Self::Stranger(c) => c.nudge(to).await,
            Self::Group(c) => Err(NativeError::unsupported(format!(
                "group {} cannot be nudged",
                c.id()
            ))),
        }
    }
}

impl std::fmt::Debug for NativeContact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Friend(c) => write!(f, "Friend({})", c.id()),
            Self::Group(c) => write!(f, "Group({})", c.id()),
            Self::Member(c) => write!(f, "Member({}@{})", c.id(), c.group_id()),
            Self::Stranger(c) => write!(f, "Stranger({})", c.id()),
        }
    }
}

/// A user or the bot, as found on nudge events.
#[derive(Clone)]
pub enum NativeUser {
    /// The bot itself.
    Bot(Arc<dyn NativeBot>),
    /// A friend.
    Friend(Arc<dyn NativeFriend>),
    /// A member.
    Member(Arc<dyn NativeMember>),
    /// A stranger.
    Stranger(Arc<dyn NativeStranger>),
}

impl NativeUser {
    /// User id.
    pub fn id(&self) -> i64 {
        match self {
            Self::Bot(u) => u.id(),
            Self::Friend(u) => u.id(),
            Self::Member(u) => u.id(),
            Self::Stranger(u) => u.id(),
        }
    }

    /// Nudges this user, shown in `to`.
    pub async fn nudge(&self, to: &NativeContact) -> NativeResult<bool> {
        match self {
            Self::Bot(u) => u.nudge(to).await,
            Self::Friend(u) => u.nudge(to).await,
            Self::Member(u) => u.nudge(to).await,
            Self::Stranger(u) => u.nudge(to).await,
        }
    }
}

impl std::fmt::Debug for NativeUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bot(u) => write!(f, "Bot({})", u.id()),
            Self::Friend(u) => write!(f, "Friend({})", u.id()),
            Self::Member(u) => write!(f, "Member({}@{})", u.id(), u.group_id()),
            Self::Stranger(u) => write!(f, "Stranger({})", u.id()),
        }
    }
}

// =============================================================================
// Receipts
// =============================================================================

/// Outcome of a successful send.
#[async_trait]
pub trait NativeReceipt: Send + Sync {
    /// Identity of the sent message.
    fn source(&self) -> &NativeMessageSource;

    /// Where the message was sent.
    fn target(&self) -> NativeContact;

    /// Recalls the sent message.
    async fn recall(&self) -> NativeResult<()>;

    /// A quote element referring to the sent message.
    fn quote(&self) -> NativeMessage {
        NativeMessage::QuoteReply(self.source().clone())
    }
}

// =============================================================================
// Announcements
// =============================================================================

/// Image attached to an announcement.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnnouncementImage {
    /// Image id.
    pub id: String,
    /// Height in pixels.
    pub height: String,
    /// Width in pixels.
    pub width: String,
}

/// Options of an announcement.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementParameters {
    /// Also sent to members who join later.
    #[serde(default)]
    pub send_to_new_member: bool,
    /// Pinned to the top.
    #[serde(default)]
    pub is_pinned: bool,
    /// Shows the edit-card prompt.
    #[serde(default)]
    pub show_edit_card: bool,
    /// Shown as a popup.
    #[serde(default)]
    pub show_popup: bool,
    /// Members must confirm reading it.
    #[serde(default)]
    pub require_confirmation: bool,
    /// Attached image.
    #[serde(default)]
    pub image: Option<AnnouncementImage>,
}

/// An announcement published in a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeOnlineAnnouncement {
    /// Announcement id.
    pub fid: String,
    /// Group id.
    pub group_id: i64,
    /// Publisher id.
    pub sender_id: i64,
    /// Content.
    pub content: String,
    /// Options.
    pub parameters: AnnouncementParameters,
    /// True once every member has confirmed.
    pub all_confirmed: bool,
    /// Number of confirmations.
    pub confirmed_members_count: i32,
    /// Publication time, epoch seconds.
    pub publication_time: i64,
}

/// Announcement operations of one group.
#[async_trait]
pub trait NativeAnnouncements: Send + Sync {
    /// Lists published announcements.
    async fn list(&self) -> NativeResult<Vec<NativeOnlineAnnouncement>>;

    /// Finds an announcement.
    async fn get(&self, fid: &str) -> NativeResult<Option<NativeOnlineAnnouncement>>;

    /// Publishes an announcement.
    async fn publish(
        &self,
        content: &str,
        parameters: &AnnouncementParameters,
    ) -> NativeResult<NativeOnlineAnnouncement>;

    /// Deletes an announcement. Returns false if it did not exist.
    async fn delete(&self, fid: &str) -> NativeResult<bool>;

    /// Members who have (or have not) confirmed an announcement.
    async fn members(&self, fid: &str, confirmed: bool) -> NativeResult<Vec<Arc<dyn NativeMember>>>;

    /// Reminds members who have not confirmed.
    async fn remind(&self, fid: &str) -> NativeResult<()>;
}

// =============================================================================
// Factory
// =============================================================================

/// Creates protocol bots.
pub trait NativeBotFactory: Send + Sync {
    /// Creates a bot. The bot is not logged in.
    fn new_bot(
        &self,
        code: i64,
        password: PasswordKind,
        configuration: &MiraiBotConfiguration,
    ) -> NativeResult<Arc<dyn NativeBot>>;
}
