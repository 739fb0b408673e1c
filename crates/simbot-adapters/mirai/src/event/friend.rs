//! Friend events and requests handled through the native bot.

use std::sync::Arc;

use simbot_core::{BotResult, CHANGED_EVENT, ChangedEvent, NOTICE_EVENT, REQUEST_EVENT};
use tracing::info;

use super::display;
use crate::bot::MiraiBot;
use crate::contact::MiraiFriend;
use crate::native::NativeRequest;

mirai_event! {
    /// Someone asks to become a friend.
    MIRAI_FRIEND_REQUEST = "mirai.friend_request", [REQUEST_EVENT], views [request];
    pub struct FriendRequestEvent {
        /// The native request.
        pub request: NativeRequest,
    }
}

impl FriendRequestEvent {
    /// Rejects the request and blocks the requester.
    pub async fn reject_and_blacklist(&self) -> BotResult<bool> {
        reject(self.mirai_bot(), &self.request, None, true).await
    }
}

/// Implements `RequestEvent` on top of the native request handlers.
macro_rules! native_request_event {
    ($name:ident) => {
        #[async_trait::async_trait]
        impl simbot_core::RequestEvent for $name {
            fn requester_id(&self) -> simbot_core::Id {
                simbot_core::Id::Long(self.request.requester_id())
            }

            fn message(&self) -> Option<&str> {
                self.request.message()
            }

            async fn accept(&self) -> simbot_core::BotResult<bool> {
                $crate::event::friend::accept(self.mirai_bot(), &self.request).await
            }

            async fn reject(&self, message: Option<&str>) -> simbot_core::BotResult<bool> {
                $crate::event::friend::reject(self.mirai_bot(), &self.request, message, false)
                    .await
            }
        }
    };
}

pub(crate) use native_request_event;

pub(crate) async fn accept(bot: &MiraiBot, request: &NativeRequest) -> BotResult<bool> {
    bot.native_bot().accept_request(request).await?;
    info!(
        bot_id = bot.code(),
        event_id = request.event_id(),
        requester = request.requester_id(),
        "Request accepted"
    );
    Ok(true)
}

pub(crate) async fn reject(
    bot: &MiraiBot,
    request: &NativeRequest,
    message: Option<&str>,
    blacklist: bool,
) -> BotResult<bool> {
    bot.native_bot()
        .reject_request(request, message, blacklist)
        .await?;
    info!(
        bot_id = bot.code(),
        event_id = request.event_id(),
        requester = request.requester_id(),
        blacklist,
        "Request rejected"
    );
    Ok(true)
}

native_request_event!(FriendRequestEvent);

mirai_event! {
    /// A friend started or stopped typing.
    MIRAI_FRIEND_INPUT_STATUS_CHANGED = "mirai.friend_input_status_changed", [CHANGED_EVENT], views [changed];
    pub struct FriendInputStatusChangedEvent {
        /// Friend.
        pub friend: Arc<MiraiFriend>,
        /// True while typing.
        pub inputting: bool,
    }
}

impl ChangedEvent for FriendInputStatusChangedEvent {
    fn before(&self) -> Option<String> {
        display(&!self.inputting)
    }

    fn after(&self) -> Option<String> {
        display(&self.inputting)
    }
}

mirai_event! {
    /// A friend changed their nick.
    MIRAI_FRIEND_NICK_CHANGED = "mirai.friend_nick_changed", [CHANGED_EVENT], views [changed];
    pub struct FriendNickChangedEvent {
        /// Friend.
        pub friend: Arc<MiraiFriend>,
        /// Old nick.
        pub from: String,
        /// New nick.
        pub to: String,
    }
}

impl ChangedEvent for FriendNickChangedEvent {
    fn before(&self) -> Option<String> {
        Some(self.from.clone())
    }

    fn after(&self) -> Option<String> {
        Some(self.to.clone())
    }
}

mirai_event! {
    /// A friend changed their avatar.
    MIRAI_FRIEND_AVATAR_CHANGED = "mirai.friend_avatar_changed", [NOTICE_EVENT];
    pub struct FriendAvatarChangedEvent {
        /// Friend.
        pub friend: Arc<MiraiFriend>,
    }
}

mirai_event! {
    /// A friend was removed.
    MIRAI_FRIEND_DECREASE = "mirai.friend_decrease", [NOTICE_EVENT];
    pub struct FriendDecreaseEvent {
        /// Former friend.
        pub friend: Arc<MiraiFriend>,
    }
}

mirai_event! {
    /// A friend was added.
    MIRAI_FRIEND_INCREASE = "mirai.friend_increase", [NOTICE_EVENT];
    pub struct FriendIncreaseEvent {
        /// New friend.
        pub friend: Arc<MiraiFriend>,
    }
}

mirai_event! {
    /// The bot changed the remark of a friend.
    MIRAI_FRIEND_REMARK_CHANGE = "mirai.friend_remark_change", [CHANGED_EVENT], views [changed];
    pub struct FriendRemarkChangeEvent {
        /// Friend.
        pub friend: Arc<MiraiFriend>,
        /// Old remark.
        pub old_remark: String,
        /// New remark.
        pub new_remark: String,
    }
}

impl ChangedEvent for FriendRemarkChangeEvent {
    fn before(&self) -> Option<String> {
        Some(self.old_remark.clone())
    }

    fn after(&self) -> Option<String> {
        Some(self.new_remark.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MiraiBotConfiguration;
    use crate::event::EventBase;
    use crate::native::testing::TestBot;
    use simbot_core::{Event, Id, ListenerDispatcher};

    fn request() -> NativeRequest {
        NativeRequest::Friend {
            event_id: 7,
            from_id: 42,
            from_nick: "someone".into(),
            from_group_id: 0,
            message: "let me in".into(),
        }
    }

    #[tokio::test]
    async fn test_friend_request_accept_and_reject() {
        let native = TestBot::new(1);
        let bot = MiraiBot::new(
            native.clone(),
            Arc::new(ListenerDispatcher::new()),
            std::sync::Weak::new(),
            MiraiBotConfiguration::for_code(1),
        );
        let event = FriendRequestEvent::new(EventBase::new(bot, None), request());
        let view = event.as_request_event().unwrap();
        assert_eq!(view.requester_id(), Id::Long(42));
        assert_eq!(view.message(), Some("let me in"));

        assert!(view.accept().await.unwrap());
        assert!(view.reject(Some("no")).await.unwrap());
        assert!(event.reject_and_blacklist().await.unwrap());
        assert_eq!(
            *native.requests.lock(),
            vec![
                (7, true, None, false),
                (7, false, Some("no".to_string()), false),
                (7, false, None, true),
            ]
        );
    }
}
