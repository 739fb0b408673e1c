//! Framework events produced from native mirai events.
//!
//! Every event type owns a static [`EventKey`] whose parents reach
//! [`MIRAI_EVENT`], so listeners can subscribe at any level. All keys but
//! [`MIRAI_UNSUPPORTED`] also reach one framework category:
//!
//! ```text
//! simbot.event
//! └── simbot.bot_event
//!     ├── mirai.event ─────────────┐
//!     ├── simbot.message_event     │
//!     │   └── simbot.group_message_event
//!     │       └── mirai.group_message ◀┘
//!     ├── simbot.request_event
//!     ├── simbot.changed_event
//!     └── simbot.notice_event
//! ```
//!
//! Events are built by the switchboard. Each carries a random id, the time it
//! was built, its bot and, except for lifecycle events, the native event it
//! came from.

use std::sync::Arc;

use simbot_core::{BOT_EVENT, BOT_LIFECYCLE_EVENT, EventKey, Id, Timestamp};

use crate::bot::MiraiBot;
use crate::native::NativeEvent;

/// Root of every mirai event.
pub static MIRAI_EVENT: EventKey = EventKey::new("mirai.event", &[&BOT_EVENT]);

/// Fields shared by every mirai event.
pub struct EventBase {
    pub(crate) id: Id,
    pub(crate) timestamp: Timestamp,
    pub(crate) bot: Arc<MiraiBot>,
    pub(crate) original: Option<NativeEvent>,
}

impl EventBase {
    /// A fresh base for an event of `bot`.
    pub fn new(bot: Arc<MiraiBot>, original: Option<NativeEvent>) -> Self {
        Self {
            id: Id::random(),
            timestamp: Timestamp::now(),
            bot,
            original,
        }
    }
}

/// Declares a mirai event: its key, its struct and its `Event` impl.
///
/// ```rust,ignore
/// mirai_event! {
///     /// A friend changed their nick.
///     MIRAI_FRIEND_NICK_CHANGED = "mirai.friend_nick_changed", [CHANGED_EVENT], views [changed];
///     pub struct FriendNickChangedEvent {
///         pub friend: Arc<MiraiFriend>,
///     }
/// }
/// ```
///
/// Listed views make the `as_*_event` accessors return `Some(self)`; the
/// matching view trait must be implemented separately.
macro_rules! mirai_event {
    (@view message) => {
        fn as_message_event(&self) -> Option<&dyn simbot_core::MessageEvent> {
            Some(self)
        }
    };
    (@view request) => {
        fn as_request_event(&self) -> Option<&dyn simbot_core::RequestEvent> {
            Some(self)
        }
    };
    (@view changed) => {
        fn as_changed_event(&self) -> Option<&dyn simbot_core::ChangedEvent> {
            Some(self)
        }
    };
    (
        $(#[$meta:meta])*
        $key:ident = $id:literal, [$($parent:path),*] $(, views [$($view:ident),+])?;
        pub struct $name:ident {
            $( $(#[$fmeta:meta])* pub $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        #[doc = concat!("Key of [`", stringify!($name), "`].")]
        pub static $key: simbot_core::EventKey = simbot_core::EventKey::new(
            $id,
            &[&$crate::event::MIRAI_EVENT $(, &$parent)*],
        );

        $(#[$meta])*
        pub struct $name {
            base: $crate::event::EventBase,
            $( $(#[$fmeta])* pub $field: $ty, )*
        }

        impl $name {
            #[allow(clippy::too_many_arguments)]
            pub(crate) fn new(base: $crate::event::EventBase, $($field: $ty),*) -> Self {
                Self { base, $($field),* }
            }

            /// The native event this event was built from.
            pub fn original(&self) -> Option<&$crate::native::NativeEvent> {
                self.base.original.as_ref()
            }

            /// The bot that received this event.
            pub fn mirai_bot(&self) -> &std::sync::Arc<$crate::bot::MiraiBot> {
                &self.base.bot
            }
        }

        impl simbot_core::Event for $name {
            fn key(&self) -> &'static simbot_core::EventKey {
                &$key
            }

            fn id(&self) -> &simbot_core::Id {
                &self.base.id
            }

            fn timestamp(&self) -> simbot_core::Timestamp {
                self.base.timestamp
            }

            fn bot(&self) -> simbot_core::BoxedBot {
                self.base.bot.clone()
            }

            fn component(&self) -> &'static str {
                $crate::bot::COMPONENT_ID
            }

            fn as_any(&self) -> &dyn std::any::Any {
                self
            }

            $($( mirai_event!(@view $view); )+)?
        }
    };
}

pub mod friend;
pub mod group;
pub mod member;
pub mod message;
pub mod nudge;
pub mod post_send;
pub mod recall;
pub(crate) mod switchboard;

pub use friend::*;
pub use group::*;
pub use member::*;
pub use message::*;
pub use nudge::*;
pub use post_send::*;
pub use recall::*;

mirai_event! {
    /// The bot logged in and started.
    MIRAI_BOT_STARTED = "mirai.bot_started", [BOT_LIFECYCLE_EVENT];
    pub struct BotStartedEvent {}
}

mirai_event! {
    /// A native event with no framework counterpart.
    ///
    /// The native event is available through [`original`](Self::original).
    MIRAI_UNSUPPORTED = "mirai.unsupported", [];
    pub struct UnsupportedMiraiEvent {}
}

impl UnsupportedMiraiEvent {
    /// Name of the native event.
    pub fn native_name(&self) -> &str {
        self.original().map_or("", NativeEvent::name)
    }
}

/// Renders one side of a change.
pub(crate) fn display<T: ToString>(value: &T) -> Option<String> {
    Some(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use simbot_core::{EVENT, Event, EventType, MESSAGE_EVENT, NOTICE_EVENT};

    #[test]
    fn test_key_hierarchy() {
        assert!(MIRAI_EVENT.is_sub_of(&EVENT));
        assert!(MIRAI_BOT_STARTED.is_sub_of(&MIRAI_EVENT));
        assert_eq!(EventType::of(&MIRAI_BOT_STARTED), EventType::Meta);
        assert!(MIRAI_GROUP_MESSAGE.is_sub_of(&MESSAGE_EVENT));
        assert!(MIRAI_GROUP_MESSAGE.is_sub_of(&MIRAI_EVENT));
        assert!(MIRAI_MEMBER_JOIN.is_sub_of(&NOTICE_EVENT));
        assert_eq!(EventType::of(&MIRAI_FRIEND_REQUEST), EventType::Request);
        assert_eq!(EventType::of(&MIRAI_UNSUPPORTED), EventType::Other);
    }

    #[test]
    fn test_unsupported_event_carries_native() {
        let native = crate::native::testing::TestBot::new(1);
        let bot = MiraiBot::new(
            native,
            Arc::new(simbot_core::ListenerDispatcher::new()),
            std::sync::Weak::new(),
            crate::config::MiraiBotConfiguration::for_code(1),
        );
        let event = UnsupportedMiraiEvent::new(EventBase::new(
            bot,
            Some(NativeEvent::Other {
                name: "OtherClientOnlineEvent".into(),
            }),
        ));
        assert_eq!(event.native_name(), "OtherClientOnlineEvent");
        assert_eq!(event.component(), "simbot.mirai");
        assert!(event.as_message_event().is_none());
        assert_eq!(event.key().id(), "mirai.unsupported");
    }
}
