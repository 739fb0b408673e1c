//! Message events.
//!
//! `reply` quotes the received message, `send` does not. `delete` recalls the
//! received message, which needs admin rights in groups.

use std::sync::Arc;

use async_trait::async_trait;
use simbot_core::{
    BotError, BotResult, BoxedReceipt, CONTACT_MESSAGE_EVENT, Element, FRIEND_MESSAGE_EVENT,
    GROUP_MESSAGE_EVENT, Id, MessageEvent, Messages,
};
use tracing::debug;

use crate::bot::MiraiBot;
use crate::contact::{MiraiFriend, MiraiGroup, MiraiMember, MiraiStranger};
use crate::message::MiraiQuoteReply;
use crate::native::{NativeMessageChain, NativeMessageSource};
use crate::receipt::source_id;

mirai_event! {
    /// A friend sent a message.
    MIRAI_FRIEND_MESSAGE = "mirai.friend_message", [FRIEND_MESSAGE_EVENT], views [message];
    pub struct FriendMessageEvent {
        /// Sender.
        pub friend: Arc<MiraiFriend>,
        /// The native chain, with source.
        pub chain: NativeMessageChain,
        /// The translated chain.
        pub messages: Messages,
    }
}

mirai_event! {
    /// A stranger sent a message.
    MIRAI_STRANGER_MESSAGE = "mirai.stranger_message", [CONTACT_MESSAGE_EVENT], views [message];
    pub struct StrangerMessageEvent {
        /// Sender.
        pub stranger: Arc<MiraiStranger>,
        /// The native chain, with source.
        pub chain: NativeMessageChain,
        /// The translated chain.
        pub messages: Messages,
    }
}

mirai_event! {
    /// A member sent a message in a group.
    MIRAI_GROUP_MESSAGE = "mirai.group_message", [GROUP_MESSAGE_EVENT], views [message];
    pub struct GroupMessageEvent {
        /// Group.
        pub group: Arc<MiraiGroup>,
        /// Sender.
        pub author: Arc<MiraiMember>,
        /// The native chain, with source.
        pub chain: NativeMessageChain,
        /// The translated chain.
        pub messages: Messages,
    }
}

mirai_event! {
    /// A member sent a temp message through a group.
    MIRAI_MEMBER_MESSAGE = "mirai.group_temp_message", [CONTACT_MESSAGE_EVENT], views [message];
    pub struct MemberMessageEvent {
        /// Group the member belongs to.
        pub group: Arc<MiraiGroup>,
        /// Sender.
        pub member: Arc<MiraiMember>,
        /// The native chain, with source.
        pub chain: NativeMessageChain,
        /// The translated chain.
        pub messages: Messages,
    }
}

fn source(chain: &NativeMessageChain) -> BotResult<&NativeMessageSource> {
    chain
        .source
        .as_ref()
        .ok_or_else(|| BotError::no_such_element("message source"))
}

fn message_id(chain: &NativeMessageChain, bot: &MiraiBot) -> Id {
    match &chain.source {
        Some(source) => source_id(source, bot.code()),
        None => Id::Text(String::new()),
    }
}

fn quoted(chain: &NativeMessageChain, message: &Messages) -> Messages {
    match &chain.source {
        Some(source) => {
            Messages::from(Element::extension(MiraiQuoteReply::of(source.clone()))) + message.clone()
        }
        None => message.clone(),
    }
}

async fn recall(chain: &NativeMessageChain, bot: &MiraiBot) -> BotResult<bool> {
    let source = source(chain)?;
    bot.native_bot().recall(source).await?;
    debug!(bot_id = bot.code(), ids = ?source.ids, "Received message recalled");
    Ok(true)
}

/// Implements `MessageEvent` for an event whose replies go to `$contact`.
macro_rules! contact_message_event {
    ($name:ident, $contact:ident) => {
        #[async_trait]
        impl MessageEvent for $name {
            fn message_id(&self) -> Id {
                message_id(&self.chain, self.mirai_bot())
            }

            fn messages(&self) -> &Messages {
                &self.messages
            }

            async fn reply(&self, message: &Messages) -> BotResult<BoxedReceipt> {
                let message = quoted(&self.chain, message);
                Ok(Arc::new(self.$contact.send_message(&message).await?))
            }

            async fn send(&self, message: &Messages) -> BotResult<BoxedReceipt> {
                Ok(Arc::new(self.$contact.send_message(message).await?))
            }

            async fn delete(&self) -> BotResult<bool> {
                recall(&self.chain, self.mirai_bot()).await
            }
        }
    };
}

contact_message_event!(FriendMessageEvent, friend);
contact_message_event!(StrangerMessageEvent, stranger);
contact_message_event!(GroupMessageEvent, group);
contact_message_event!(MemberMessageEvent, member);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MiraiBotConfiguration;
    use crate::event::EventBase;
    use crate::message::to_simbot;
    use crate::native::testing::{TEST_BOT_ID, TestBot, TestGroup, TestMember, inbound};
    use crate::native::{MessageSourceKind, NativeMessage, NativePermission};
    use simbot_core::{Event, ListenerDispatcher};

    fn group_event() -> (Arc<TestBot>, Arc<TestGroup>, GroupMessageEvent) {
        let native = TestBot::new(TEST_BOT_ID);
        let group = TestGroup::new(100, "group");
        group.add_member(TestMember::new(4, 100, "four", NativePermission::Member));
        native.add_group(group.clone());
        let bot = MiraiBot::new(
            native.clone(),
            Arc::new(ListenerDispatcher::new()),
            std::sync::Weak::new(),
            MiraiBotConfiguration::for_code(TEST_BOT_ID),
        );

        let chain = inbound(
            vec![NativeMessage::PlainText("hi".into())],
            4,
            100,
            MessageSourceKind::Group,
        );
        let mirai_group = bot.mirai_group(100).unwrap().unwrap();
        let author = mirai_group.mirai_member(4).unwrap();
        let messages = to_simbot(&chain);
        let event = GroupMessageEvent::new(EventBase::new(bot, None), mirai_group, author, chain, messages);
        (native, group, event)
    }

    #[tokio::test]
    async fn test_group_message_view() {
        let (native, group, event) = group_event();
        let view = event.as_message_event().unwrap();
        assert_eq!(view.plain_text(), "hi");
        assert_eq!(view.message_id().literal().split(':').nth(3), Some("10000"));

        let receipt = view.reply(&Messages::from("pong")).await.unwrap();
        assert!(receipt.is_success());
        let sent = group.record.sent_elements();
        assert!(matches!(sent[0][0], NativeMessage::QuoteReply(_)));
        assert_eq!(sent[0].len(), 2);

        view.send(&Messages::from("plain")).await.unwrap();
        assert_eq!(group.record.sent_elements()[1].len(), 1);

        assert!(view.delete().await.unwrap());
        assert_eq!(native.recalled.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_without_source() {
        let (_, _, mut event) = group_event();
        event.chain.source = None;
        assert!(event.message_id().literal().is_empty());
        assert!(matches!(
            event.delete().await,
            Err(BotError::NoSuchElement(_))
        ));
    }
}
