//! Recall events, filled from the recall message cache.
//!
//! The native notification only names the recalled message. When the bot's
//! recall cache strategy kept the chain, the event carries its content too.

use std::sync::Arc;

use simbot_core::{Messages, NOTICE_EVENT};

use crate::bot::MiraiBot;
use crate::contact::{MiraiFriend, MiraiGroup, MiraiMember};
use crate::message::to_simbot;
use crate::native::NativeMessageChain;
use crate::util::RecallKey;

mirai_event! {
    /// A friend recalled a message.
    MIRAI_FRIEND_MESSAGE_RECALL = "mirai.friend_message_recall", [NOTICE_EVENT];
    pub struct FriendMessageRecallEvent {
        /// Friend.
        pub friend: Arc<MiraiFriend>,
        /// Who recalled the message.
        pub operator_id: i64,
        /// Key of the recalled message.
        pub key: RecallKey,
        /// The recalled chain, if it was cached.
        pub chain: Option<NativeMessageChain>,
    }
}

impl FriendMessageRecallEvent {
    /// Content of the recalled message, if it was cached.
    pub fn messages(&self) -> Option<Messages> {
        self.chain.as_ref().map(to_simbot)
    }
}

mirai_event! {
    /// A group message was recalled.
    MIRAI_GROUP_MESSAGE_RECALL = "mirai.group_message_recall", [NOTICE_EVENT];
    pub struct GroupMessageRecallEvent {
        /// Group.
        pub group: Arc<MiraiGroup>,
        /// Author id.
        pub author_id: i64,
        /// Author, if still in the group.
        pub author: Option<Arc<MiraiMember>>,
        /// Who recalled it, `None` when it was the bot.
        pub operator: Option<Arc<MiraiMember>>,
        /// Key of the recalled message.
        pub key: RecallKey,
        /// The recalled chain, if it was cached.
        pub chain: Option<NativeMessageChain>,
    }
}

impl GroupMessageRecallEvent {
    /// Content of the recalled message, if it was cached.
    pub fn messages(&self) -> Option<Messages> {
        self.chain.as_ref().map(to_simbot)
    }

    /// True when the author recalled their own message.
    pub fn is_self_recall(&self) -> bool {
        self.operator
            .as_ref()
            .is_some_and(|op| op.native().id() == self.author_id)
    }
}

/// Looks up a recalled friend message in the bot's cache.
pub(crate) fn cached_friend_message(bot: &MiraiBot, friend_id: i64, key: &RecallKey) -> Option<NativeMessageChain> {
    bot.recall_cache_strategy()
        .friend_message_cache(bot.code(), friend_id, key)
}

/// Looks up a recalled group message in the bot's cache.
pub(crate) fn cached_group_message(bot: &MiraiBot, group_id: i64, key: &RecallKey) -> Option<NativeMessageChain> {
    bot.recall_cache_strategy()
        .group_message_cache(bot.code(), group_id, key)
}
