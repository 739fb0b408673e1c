//! Events emitted after the bot sent a message, successfully or not.

use std::sync::Arc;

use simbot_core::{Messages, NOTICE_EVENT};

use crate::contact::{MiraiFriend, MiraiGroup, MiraiMember, MiraiStranger};
use crate::message::to_simbot;
use crate::native::NativeMessageChain;
use crate::receipt::MiraiMessageReceipt;

macro_rules! post_send_event {
    ($(#[$meta:meta])* $key:ident = $id:literal; $name:ident { $target:ident: $ty:ty }) => {
        mirai_event! {
            $(#[$meta])*
            $key = $id, [NOTICE_EVENT];
            pub struct $name {
                /// Receiver.
                pub $target: Arc<$ty>,
                /// The sent chain.
                pub chain: NativeMessageChain,
                /// Receipt, absent when sending failed.
                pub receipt: Option<Arc<MiraiMessageReceipt>>,
                /// Why sending failed.
                pub error: Option<String>,
            }
        }

        impl $name {
            /// True when the message was delivered.
            pub fn is_success(&self) -> bool {
                self.receipt.is_some()
            }

            /// The sent message, translated.
            pub fn messages(&self) -> Messages {
                to_simbot(&self.chain)
            }
        }
    };
}

post_send_event! {
    /// The bot sent a message to a friend.
    MIRAI_FRIEND_MESSAGE_POST_SEND = "mirai.friend_message_post_send";
    FriendMessagePostSendEvent { friend: MiraiFriend }
}

post_send_event! {
    /// The bot sent a message to a group.
    MIRAI_GROUP_MESSAGE_POST_SEND = "mirai.group_message_post_send";
    GroupMessagePostSendEvent { group: MiraiGroup }
}

post_send_event! {
    /// The bot sent a temp message to a member.
    MIRAI_MEMBER_MESSAGE_POST_SEND = "mirai.group_temp_message_post_send";
    MemberMessagePostSendEvent { member: MiraiMember }
}

post_send_event! {
    /// The bot sent a message to a stranger.
    MIRAI_STRANGER_MESSAGE_POST_SEND = "mirai.stranger_message_post_send";
    StrangerMessagePostSendEvent { stranger: MiraiStranger }
}
