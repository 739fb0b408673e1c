//! Foundation layer - Core abstractions and type system.
//!
//! This module contains the fundamental building blocks shared by components:
//! - Identifiers and timestamps
//! - Message elements and message lists
//! - Event keys, event traits and the type-erased event container
//! - The unified error type

pub mod error;
pub mod event;
pub mod id;
pub mod message;

pub use error::{BotError, BotResult};
pub use event::{
    BOT_EVENT, BOT_LIFECYCLE_EVENT, BoxedEvent, CHANGED_EVENT, CONTACT_MESSAGE_EVENT,
    ChangedEvent, EVENT, Event, EventKey, EventType, FRIEND_MESSAGE_EVENT, GROUP_MESSAGE_EVENT,
    MESSAGE_EVENT, MessageEvent, NOTICE_EVENT, REQUEST_EVENT, RequestEvent,
};
pub use id::{Id, Timestamp};
pub use message::{
    AtKind, Element, ElementExtension, Image, Message, MessageSegment, Messages, Resource,
};
