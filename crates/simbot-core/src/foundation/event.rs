//! Event system for simbot components.
//!
//! This module provides the core event infrastructure:
//!
//! - [`EventKey`] - Hierarchical event type identity
//! - [`Event`] - Base trait for all events
//! - [`EventType`] - Coarse classification (message, notice, request, meta)
//! - [`MessageEvent`], [`RequestEvent`], [`ChangedEvent`] - Category views
//! - [`BoxedEvent`] - Type-erased container passed to event processors
//!
//! # Event Keys
//!
//! Every event type owns a static [`EventKey`]. Keys form a DAG through their
//! parents, so a listener registered for [`MESSAGE_EVENT`] also receives
//! every component-specific message event:
//!
//! ```rust,ignore
//! pub static GROUP_MESSAGE: EventKey =
//!     EventKey::new("mirai.group_message", &[&MIRAI_EVENT, &GROUP_MESSAGE_EVENT]);
//!
//! assert!(GROUP_MESSAGE.is_sub_of(&MESSAGE_EVENT));
//! ```

use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use async_trait::async_trait;

use crate::foundation::error::BotResult;
use crate::foundation::id::{Id, Timestamp};
use crate::foundation::message::Messages;
use crate::integration::objective::{BoxedBot, BoxedReceipt};

// ============================================================================
// Event Keys
// ============================================================================

/// Identity of an event type together with its parent types.
pub struct EventKey {
    id: &'static str,
    parents: &'static [&'static EventKey],
}

impl EventKey {
    /// Creates a new key.
    pub const fn new(id: &'static str, parents: &'static [&'static EventKey]) -> Self {
        Self { id, parents }
    }

    /// Returns the key id, e.g. `"mirai.group_message"`.
    pub fn id(&self) -> &'static str {
        self.id
    }

    /// Returns the direct parents.
    pub fn parents(&self) -> &'static [&'static EventKey] {
        self.parents
    }

    /// Returns true if `self` is `other` or one of its descendants.
    pub fn is_sub_of(&self, other: &EventKey) -> bool {
        self == other || self.parents.iter().any(|p| p.is_sub_of(other))
    }
}

impl PartialEq for EventKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventKey {}

impl fmt::Debug for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventKey({})", self.id)
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id)
    }
}

/// Root of all events.
pub static EVENT: EventKey = EventKey::new("simbot.event", &[]);
/// Events related to a bot.
pub static BOT_EVENT: EventKey = EventKey::new("simbot.bot_event", &[&EVENT]);
/// Messages received by a bot.
pub static MESSAGE_EVENT: EventKey = EventKey::new("simbot.message_event", &[&BOT_EVENT]);
/// Messages from a single contact (friend, stranger, group member in private).
pub static CONTACT_MESSAGE_EVENT: EventKey =
    EventKey::new("simbot.contact_message_event", &[&MESSAGE_EVENT]);
/// Messages from a friend.
pub static FRIEND_MESSAGE_EVENT: EventKey =
    EventKey::new("simbot.friend_message_event", &[&CONTACT_MESSAGE_EVENT]);
/// Messages in a group.
pub static GROUP_MESSAGE_EVENT: EventKey =
    EventKey::new("simbot.group_message_event", &[&MESSAGE_EVENT]);
/// Requests that can be accepted or rejected.
pub static REQUEST_EVENT: EventKey = EventKey::new("simbot.request_event", &[&BOT_EVENT]);
/// Something changed from one value to another.
pub static CHANGED_EVENT: EventKey = EventKey::new("simbot.changed_event", &[&BOT_EVENT]);
/// Notifications about contacts and groups.
pub static NOTICE_EVENT: EventKey = EventKey::new("simbot.notice_event", &[&BOT_EVENT]);
/// Bot lifecycle events.
pub static BOT_LIFECYCLE_EVENT: EventKey =
    EventKey::new("simbot.bot_lifecycle_event", &[&BOT_EVENT]);

// ============================================================================
// Event Type Classification
// ============================================================================

/// Coarse classification of event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Message events (private messages, group messages, etc.)
    Message,
    /// Notice events (group changes, recalls, friend adds, etc.)
    Notice,
    /// Request events (friend requests, group join requests, etc.)
    Request,
    /// Meta events (lifecycle, etc.)
    Meta,
    /// Other/unknown event types
    Other,
}

impl EventType {
    /// Classifies a key by its ancestry.
    pub fn of(key: &EventKey) -> Self {
        if key.is_sub_of(&MESSAGE_EVENT) {
            Self::Message
        } else if key.is_sub_of(&REQUEST_EVENT) {
            Self::Request
        } else if key.is_sub_of(&CHANGED_EVENT) || key.is_sub_of(&NOTICE_EVENT) {
            Self::Notice
        } else if key.is_sub_of(&BOT_LIFECYCLE_EVENT) {
            Self::Meta
        } else {
            Self::Other
        }
    }
}

// ============================================================================
// Core Event Trait
// ============================================================================

/// The base trait for all events.
///
/// Events are type-erased through [`BoxedEvent`] and can be downcast to
/// concrete types using `as_any()`. Category behaviour is reached through the
/// `as_*_event` accessors, which concrete events override.
pub trait Event: Any + Send + Sync {
    /// Returns the key of this event type.
    fn key(&self) -> &'static EventKey;

    /// Returns the unique id of this event instance.
    fn id(&self) -> &Id;

    /// Returns when the event was created.
    fn timestamp(&self) -> Timestamp;

    /// Returns the bot this event belongs to.
    fn bot(&self) -> BoxedBot;

    /// Returns the component id of the bot (e.g., "simbot.mirai").
    fn component(&self) -> &'static str;

    /// Returns the coarse event type classification.
    fn event_type(&self) -> EventType {
        EventType::of(self.key())
    }

    /// Returns a reference to self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns the message view of this event, if it is a message event.
    fn as_message_event(&self) -> Option<&dyn MessageEvent> {
        None
    }

    /// Returns the request view of this event, if it is a request event.
    fn as_request_event(&self) -> Option<&dyn RequestEvent> {
        None
    }

    /// Returns the changed view of this event, if it is a changed event.
    fn as_changed_event(&self) -> Option<&dyn ChangedEvent> {
        None
    }
}

// ============================================================================
// Category Views
// ============================================================================

/// An event carrying a received message.
#[async_trait]
pub trait MessageEvent: Send + Sync {
    /// Id of the received message.
    fn message_id(&self) -> Id;

    /// The received message, translated to framework elements.
    fn messages(&self) -> &Messages;

    /// Plain text content of the received message.
    fn plain_text(&self) -> String {
        use crate::foundation::message::Message;
        self.messages().extract_plain_text()
    }

    /// Replies to the message, quoting it where the platform supports it.
    async fn reply(&self, message: &Messages) -> BotResult<BoxedReceipt>;

    /// Sends a message to where this message came from, without quoting.
    async fn send(&self, message: &Messages) -> BotResult<BoxedReceipt>;

    /// Deletes (recalls) the received message.
    async fn delete(&self) -> BotResult<bool>;
}

/// An event that can be accepted or rejected.
#[async_trait]
pub trait RequestEvent: Send + Sync {
    /// Id of whoever issued the request.
    fn requester_id(&self) -> Id;

    /// Message attached to the request.
    fn message(&self) -> Option<&str>;

    /// Accepts the request.
    async fn accept(&self) -> BotResult<bool>;

    /// Rejects the request.
    async fn reject(&self, message: Option<&str>) -> BotResult<bool>;
}

/// An event describing a value change.
pub trait ChangedEvent: Send + Sync {
    /// Value before the change, rendered as text.
    fn before(&self) -> Option<String>;

    /// Value after the change, rendered as text.
    fn after(&self) -> Option<String>;
}

// ============================================================================
// Boxed Event
// ============================================================================

/// A type-erased container for events that supports runtime downcasting.
///
/// `BoxedEvent` implements `Deref<Target = dyn Event>`, so trait methods can
/// be called on it directly.
#[derive(Clone)]
pub struct BoxedEvent {
    inner: Arc<dyn Event>,
}

impl BoxedEvent {
    /// Creates a new `BoxedEvent` from any type implementing `Event`.
    pub fn new<E: Event + 'static>(event: E) -> Self {
        Self {
            inner: Arc::new(event),
        }
    }

    /// Returns the inner `Arc<dyn Event>`.
    pub fn inner(&self) -> &Arc<dyn Event> {
        &self.inner
    }

    /// Attempts to downcast to a concrete event type.
    pub fn downcast_ref<E: Event + 'static>(&self) -> Option<&E> {
        self.inner.as_any().downcast_ref()
    }

    /// Returns true if the inner event is of type `E`.
    pub fn is<E: Event + 'static>(&self) -> bool {
        self.inner.as_any().is::<E>()
    }
}

impl Deref for BoxedEvent {
    type Target = dyn Event;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl fmt::Debug for BoxedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxedEvent")
            .field("key", &self.key().id())
            .field("id", self.id())
            .field("component", &self.component())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static TEST_COMPONENT_EVENT: EventKey = EventKey::new("test.event", &[&EVENT]);
    static TEST_GROUP_MESSAGE: EventKey = EventKey::new(
        "test.group_message",
        &[&TEST_COMPONENT_EVENT, &GROUP_MESSAGE_EVENT],
    );

    #[test]
    fn test_key_hierarchy() {
        assert!(TEST_GROUP_MESSAGE.is_sub_of(&TEST_GROUP_MESSAGE));
        assert!(TEST_GROUP_MESSAGE.is_sub_of(&MESSAGE_EVENT));
        assert!(TEST_GROUP_MESSAGE.is_sub_of(&TEST_COMPONENT_EVENT));
        assert!(TEST_GROUP_MESSAGE.is_sub_of(&EVENT));
        assert!(!TEST_GROUP_MESSAGE.is_sub_of(&REQUEST_EVENT));
        assert!(!MESSAGE_EVENT.is_sub_of(&TEST_GROUP_MESSAGE));
    }

    #[test]
    fn test_event_type_classification() {
        assert_eq!(EventType::of(&TEST_GROUP_MESSAGE), EventType::Message);
        assert_eq!(EventType::of(&REQUEST_EVENT), EventType::Request);
        assert_eq!(EventType::of(&CHANGED_EVENT), EventType::Notice);
        assert_eq!(EventType::of(&BOT_LIFECYCLE_EVENT), EventType::Meta);
        assert_eq!(EventType::of(&TEST_COMPONENT_EVENT), EventType::Other);
    }
}
