//! Nudge events, one per kind of conversation the nudge was shown in.

use std::sync::Arc;

use simbot_core::NOTICE_EVENT;

use crate::contact::{MiraiFriend, MiraiGroup, MiraiMember, MiraiStranger};
use crate::native::{NativeContact, NativeUser};

/// Declares a nudge event shown in a `$contact` conversation.
macro_rules! nudge_event {
    ($(#[$meta:meta])* $key:ident = $id:literal; $name:ident { $contact:ident: $ty:ty }) => {
        mirai_event! {
            $(#[$meta])*
            $key = $id, [NOTICE_EVENT];
            pub struct $name {
                /// Conversation the nudge was shown in.
                pub $contact: Arc<$ty>,
                /// Who nudged.
                pub sender: NativeUser,
                /// Who was nudged.
                pub target_id: i64,
                /// Action text.
                pub action: String,
                /// Suffix text.
                pub suffix: String,
                /// The native subject.
                pub subject: NativeContact,
            }
        }

        impl $name {
            /// Nudges the sender back in the same conversation.
            pub async fn reply_nudge(&self) -> simbot_core::BotResult<bool> {
                Ok(self.sender.nudge(&self.subject).await?)
            }

            /// True when the bot was nudged.
            pub fn is_bot_target(&self) -> bool {
                self.target_id == self.mirai_bot().code()
            }
        }
    };
}

nudge_event! {
    /// Someone nudged someone in a group.
    MIRAI_GROUP_NUDGE = "mirai.group_nudge";
    GroupNudgeEvent { group: MiraiGroup }
}

nudge_event! {
    /// A friend nudged, or was nudged, in the friend conversation.
    MIRAI_FRIEND_NUDGE = "mirai.friend_nudge";
    FriendNudgeEvent { friend: MiraiFriend }
}

nudge_event! {
    /// A member nudged, or was nudged, in a temp conversation.
    MIRAI_MEMBER_NUDGE = "mirai.member_nudge";
    MemberNudgeEvent { member: MiraiMember }
}

nudge_event! {
    /// A stranger nudged, or was nudged.
    MIRAI_STRANGER_NUDGE = "mirai.stranger_nudge";
    StrangerNudgeEvent { stranger: MiraiStranger }
}

impl GroupNudgeEvent {
    /// The sender as a member of the group. `None` when the bot nudged.
    pub fn from_member(&self) -> Option<Arc<MiraiMember>> {
        match &self.sender {
            NativeUser::Member(member) => Some(Arc::new(MiraiMember::new(
                self.mirai_bot().clone(),
                member.clone(),
            ))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::MiraiBot;
    use crate::config::MiraiBotConfiguration;
    use crate::event::EventBase;
    use crate::native::NativePermission;
    use crate::native::testing::{TEST_BOT_ID, TestBot, TestGroup, TestMember};
    use simbot_core::ListenerDispatcher;

    #[tokio::test]
    async fn test_reply_nudge_in_group() {
        let native = TestBot::new(TEST_BOT_ID);
        let group = TestGroup::new(100, "group");
        let member = TestMember::new(4, 100, "four", NativePermission::Member);
        group.add_member(member.clone());
        native.add_group(group.clone());
        let bot = MiraiBot::new(
            native,
            Arc::new(ListenerDispatcher::new()),
            std::sync::Weak::new(),
            MiraiBotConfiguration::for_code(TEST_BOT_ID),
        );

        let event = GroupNudgeEvent::new(
            EventBase::new(bot.clone(), None),
            bot.mirai_group(100).unwrap().unwrap(),
            NativeUser::Member(member.clone()),
            TEST_BOT_ID,
            "戳了戳".into(),
            String::new(),
            NativeContact::Group(group),
        );
        assert!(event.is_bot_target());
        assert_eq!(event.from_member().map(|m| m.native().id()), Some(4));
        assert!(event.reply_nudge().await.unwrap());
        assert_eq!(member.record.nudged_in.lock().as_slice(), [100]);
    }
}
