//! Bot and contact traits.
//!
//! Components implement these traits on wrappers around their own protocol
//! objects. Application code written against them does not need to know which
//! component it is talking to; it can still reach the concrete type through
//! `as_any` when it needs component-specific APIs.
//!
//! # Example
//!
//! ```rust,ignore
//! use simbot_core::{BoxedBot, downcast_bot};
//!
//! async fn greet(bot: BoxedBot, group_id: i64) -> BotResult<()> {
//!     if let Some(group) = bot.group(&group_id.into()).await? {
//!         group.send_text("Hello!").await?;
//!     }
//!     Ok(())
//! }
//! ```

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::foundation::error::BotResult;
use crate::foundation::id::Id;
use crate::foundation::message::{Messages, Resource};

/// A boxed Bot trait object.
pub type BoxedBot = Arc<dyn Bot>;

/// A boxed receipt trait object.
pub type BoxedReceipt = Arc<dyn MessageReceipt>;

// =============================================================================
// Bot
// =============================================================================

/// An active bot instance.
#[async_trait]
pub trait Bot: Send + Sync {
    /// Returns the bot's identifier.
    fn id(&self) -> Id;

    /// Returns the bot's display name.
    fn username(&self) -> String;

    /// Returns the bot's avatar url.
    fn avatar(&self) -> String;

    /// Returns the component id this bot belongs to.
    fn component(&self) -> &'static str;

    /// Returns true if `id` refers to this bot.
    fn is_me(&self, id: &Id) -> bool {
        self.id() == *id
    }

    /// Returns true once the bot has been started and not yet cancelled.
    fn is_active(&self) -> bool;

    /// Starts the bot. Returns false if it was already started.
    async fn start(&self) -> BotResult<bool>;

    /// Cancels the bot. Returns false if it was already cancelled.
    async fn cancel(&self) -> BotResult<bool>;

    /// Waits until the bot is cancelled.
    async fn join(&self);

    /// Finds a friend by id.
    async fn friend(&self, id: &Id) -> BotResult<Option<Arc<dyn Friend>>>;

    /// Lists all friends.
    async fn friends(&self) -> BotResult<Vec<Arc<dyn Friend>>>;

    /// Finds a group by id.
    async fn group(&self, id: &Id) -> BotResult<Option<Arc<dyn Group>>>;

    /// Lists all groups.
    async fn groups(&self) -> BotResult<Vec<Arc<dyn Group>>>;

    /// Finds any single-user contact by id.
    async fn contact(&self, id: &Id) -> BotResult<Option<Arc<dyn Contact>>>;

    /// Lists all single-user contacts.
    async fn contacts(&self) -> BotResult<Vec<Arc<dyn Contact>>>;

    /// Resolves an image that is already known by id into a sendable element.
    async fn resolve_image(&self, id: &Id) -> BotResult<crate::foundation::message::Element>;

    /// Returns self as an `Arc<dyn Any>` for safe downcasting.
    ///
    /// Implementors should simply return `self`.
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Attempts to downcast a BoxedBot to a specific concrete type.
///
/// # Example
///
/// ```rust,ignore
/// use simbot_adapter_mirai::MiraiBot;
///
/// if let Some(mirai) = downcast_bot::<MiraiBot>(bot) {
///     mirai.native_bot().nudge().await.ok();
/// }
/// ```
pub fn downcast_bot<T: Bot + 'static>(bot: BoxedBot) -> Option<Arc<T>> {
    Arc::downcast::<T>(bot.as_any()).ok()
}

// =============================================================================
// Contacts
// =============================================================================

/// A single user the bot can talk to.
#[async_trait]
pub trait Contact: Send + Sync {
    /// The contact id.
    fn id(&self) -> Id;

    /// The contact's own name.
    fn username(&self) -> String;

    /// The contact's avatar url.
    fn avatar(&self) -> String;

    /// Sends a message.
    async fn send(&self, message: &Messages) -> BotResult<BoxedReceipt>;

    /// Sends plain text.
    async fn send_text(&self, text: &str) -> BotResult<BoxedReceipt> {
        self.send(&Messages::from(text)).await
    }

    /// Returns self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

/// A friend of the bot.
pub trait Friend: Contact {
    /// The remark the bot set for this friend, if any.
    fn remark(&self) -> Option<String>;
}

/// A user that is not a friend.
pub trait Stranger: Contact {}

/// A role a member holds in a group.
pub trait Role: Send + Sync {
    /// Role id.
    fn id(&self) -> Id;

    /// Role name.
    fn name(&self) -> String;

    /// True for roles with operator rights.
    fn is_admin(&self) -> bool;

    /// True for the owner role.
    fn is_owner(&self) -> bool;
}

/// A member of a group.
#[async_trait]
pub trait Member: Send + Sync {
    /// The member id.
    fn id(&self) -> Id;

    /// The user's own name.
    fn username(&self) -> String;

    /// The member's name inside the group.
    fn nickname(&self) -> String;

    /// The member's avatar url.
    fn avatar(&self) -> String;

    /// Id of the group this member belongs to.
    fn group_id(&self) -> Id;

    /// The group this member belongs to.
    async fn group(&self) -> BotResult<Arc<dyn Group>>;

    /// Roles held by the member.
    fn roles(&self) -> Vec<Arc<dyn Role>>;

    /// True if any held role has operator rights.
    fn is_admin(&self) -> bool {
        self.roles().iter().any(|r| r.is_admin())
    }

    /// True if the member owns the group.
    fn is_owner(&self) -> bool {
        self.roles().iter().any(|r| r.is_owner())
    }

    /// Mutes the member. Returns false if the duration is rejected.
    async fn mute(&self, duration: Duration) -> BotResult<bool>;

    /// Lifts a mute.
    async fn unmute(&self) -> BotResult<bool>;

    /// Sends a direct message to the member.
    async fn send(&self, message: &Messages) -> BotResult<BoxedReceipt>;

    /// Returns self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

/// A group chat.
#[async_trait]
pub trait Group: Send + Sync {
    /// The group id.
    fn id(&self) -> Id;

    /// The group name.
    fn name(&self) -> String;

    /// The group avatar url.
    fn avatar(&self) -> String;

    /// Id of the group owner.
    fn owner_id(&self) -> Id;

    /// The group owner.
    async fn owner(&self) -> BotResult<Arc<dyn Member>>;

    /// Finds a member by id.
    async fn member(&self, id: &Id) -> BotResult<Option<Arc<dyn Member>>>;

    /// Lists all members.
    async fn members(&self) -> BotResult<Vec<Arc<dyn Member>>>;

    /// Mutes the whole group. Returns false if the duration is rejected.
    async fn mute(&self, duration: Duration) -> BotResult<bool>;

    /// Lifts a whole-group mute. Returns false if the group was not muted.
    async fn unmute(&self) -> BotResult<bool>;

    /// Sends a message to the group.
    async fn send(&self, message: &Messages) -> BotResult<BoxedReceipt>;

    /// Sends plain text to the group.
    async fn send_text(&self, text: &str) -> BotResult<BoxedReceipt> {
        self.send(&Messages::from(text)).await
    }

    /// Uploads an image for later sending.
    async fn upload_image(&self, resource: &Resource) -> BotResult<crate::foundation::message::Element>;

    /// Returns self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

// =============================================================================
// Receipts
// =============================================================================

/// The outcome of sending a message.
#[async_trait]
pub trait MessageReceipt: Send + Sync {
    /// Id of the sent message.
    fn id(&self) -> Id;

    /// Whether the message was sent.
    fn is_success(&self) -> bool;

    /// Deletes (recalls) the sent message.
    async fn delete(&self) -> BotResult<bool>;

    /// Returns self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}
