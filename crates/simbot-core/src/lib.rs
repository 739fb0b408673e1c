//! # simbot Core
//!
//! Framework interfaces shared by all simbot components.
//!
//! Components (such as the mirai adapter) implement the traits in this crate
//! on top of their own protocol libraries. Application code written against
//! them works with any component.
//!
//! ## Architecture Layers
//!
//! ### Foundation Layer
//!
//! Core abstractions and type system:
//! - **Identifiers**: [`Id`], [`Timestamp`]
//! - **Messages**: [`Element`], [`Messages`], [`ElementExtension`]
//! - **Events**: hierarchical [`EventKey`]s, [`Event`], [`BoxedEvent`] and the
//!   category views [`MessageEvent`], [`RequestEvent`], [`ChangedEvent`]
//! - **Errors**: [`BotError`]
//!
//! ### Framework Layer
//!
//! - [`EventProcessor`], the sink components push events into
//! - [`ListenerDispatcher`], a key-matched processor
//!
//! ### Integration Layer
//!
//! - [`Bot`], [`Friend`], [`Stranger`], [`Group`], [`Member`], [`Role`],
//!   [`MessageReceipt`]
//! - [`BotManager`] and [`BotVerifyInfo`]
//!
//! ## Event Flow
//!
//! ```text
//! ┌─────────────┐     ┌────────────────┐     ┌──────────┐
//! │  Component  │────▶│ EventProcessor │────▶│ Listener │
//! │   (mirai)   │     │  (dispatcher)  │────▶│ Listener │
//! └─────────────┘     └────────────────┘     └──────────┘
//! ```

// Architectural layers
pub mod foundation;
pub mod framework;
pub mod integration;

// Re-export foundation types
pub use foundation::{
    AtKind, BOT_EVENT, BOT_LIFECYCLE_EVENT, BotError, BotResult, BoxedEvent, CHANGED_EVENT,
    CONTACT_MESSAGE_EVENT, ChangedEvent, EVENT, Element, ElementExtension, Event, EventKey,
    EventType, FRIEND_MESSAGE_EVENT, GROUP_MESSAGE_EVENT, Id, Image, MESSAGE_EVENT, Message,
    MessageEvent, MessageSegment, Messages, NOTICE_EVENT, REQUEST_EVENT, RequestEvent, Resource,
    Timestamp,
};

// Re-export framework types
pub use framework::{
    BoxedEventProcessor, EventListener, EventProcessingResult, EventProcessor, ListenerDispatcher,
};

// Re-export integration types
pub use integration::{
    Bot, BotManager, BotVerifyInfo, BoxedBot, BoxedBotManager, BoxedReceipt, Contact, Friend,
    Group, Member, MessageReceipt, Role, Stranger, downcast_bot,
};

/// Prelude for common imports.
pub mod prelude {
    pub use super::foundation::*;
    pub use super::framework::{EventProcessor, ListenerDispatcher};
    pub use super::integration::{
        Bot, BotManager, BoxedBot, Contact, Friend, Group, Member, Stranger,
    };
}
