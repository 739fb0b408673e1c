//! Member events.

use std::sync::Arc;

use simbot_core::{CHANGED_EVENT, ChangedEvent, NOTICE_EVENT, REQUEST_EVENT};

use super::display;
use super::friend::native_request_event;
use crate::contact::{MemberRole, MiraiGroup, MiraiMember};
use crate::native::NativeRequest;
use crate::native::event::JoinKind;

mirai_event! {
    /// The most talkative member of a group changed.
    MIRAI_GROUP_TALKATIVE_CHANGE = "mirai.group_talkative_change", [CHANGED_EVENT], views [changed];
    pub struct GroupTalkativeChangeEvent {
        /// Group.
        pub group: Arc<MiraiGroup>,
        /// New holder.
        pub now: Arc<MiraiMember>,
        /// Previous holder.
        pub previous: Arc<MiraiMember>,
    }
}

impl ChangedEvent for GroupTalkativeChangeEvent {
    fn before(&self) -> Option<String> {
        display(&self.previous.native().id())
    }

    fn after(&self) -> Option<String> {
        display(&self.now.native().id())
    }
}

mirai_event! {
    /// A member gained or lost an honor.
    MIRAI_MEMBER_HONOR_CHANGE = "mirai.member_honor_change", [NOTICE_EVENT];
    pub struct MemberHonorChangeEvent {
        /// Member.
        pub member: Arc<MiraiMember>,
        /// Honor name.
        pub honor: String,
        /// True when gained.
        pub achieved: bool,
    }
}

mirai_event! {
    /// A member was unmuted.
    MIRAI_MEMBER_UNMUTE = "mirai.member_unmute", [NOTICE_EVENT];
    pub struct MemberUnmuteEvent {
        /// Member.
        pub member: Arc<MiraiMember>,
        /// Operator, `None` when it was the bot.
        pub operator: Option<Arc<MiraiMember>>,
    }
}

mirai_event! {
    /// A member was muted.
    MIRAI_MEMBER_MUTE = "mirai.member_mute", [NOTICE_EVENT];
    pub struct MemberMuteEvent {
        /// Member.
        pub member: Arc<MiraiMember>,
        /// Mute duration.
        pub duration_seconds: i32,
        /// Operator, `None` when it was the bot.
        pub operator: Option<Arc<MiraiMember>>,
    }
}

mirai_event! {
    /// A member's role changed.
    MIRAI_MEMBER_ROLE_CHANGE = "mirai.member_role_change", [CHANGED_EVENT], views [changed];
    pub struct MemberRoleChangeEvent {
        /// Member.
        pub member: Arc<MiraiMember>,
        /// Old role.
        pub origin: MemberRole,
        /// New role.
        pub current: MemberRole,
    }
}

impl ChangedEvent for MemberRoleChangeEvent {
    fn before(&self) -> Option<String> {
        display(&self.origin)
    }

    fn after(&self) -> Option<String> {
        display(&self.current)
    }
}

impl MemberRoleChangeEvent {
    /// True when the member was promoted.
    pub fn is_promotion(&self) -> bool {
        self.current > self.origin
    }
}

mirai_event! {
    /// A member's special title changed.
    MIRAI_MEMBER_SPECIAL_TITLE_CHANGE = "mirai.member_special_title_change", [CHANGED_EVENT], views [changed];
    pub struct MemberSpecialTitleChangeEvent {
        /// Member.
        pub member: Arc<MiraiMember>,
        /// Old title.
        pub origin: String,
        /// New title.
        pub current: String,
        /// Operator, `None` when it was the bot.
        pub operator: Option<Arc<MiraiMember>>,
    }
}

impl ChangedEvent for MemberSpecialTitleChangeEvent {
    fn before(&self) -> Option<String> {
        Some(self.origin.clone())
    }

    fn after(&self) -> Option<String> {
        Some(self.current.clone())
    }
}

mirai_event! {
    /// A member's name card changed.
    MIRAI_MEMBER_CARD_CHANGE = "mirai.member_card_change", [CHANGED_EVENT], views [changed];
    pub struct MemberCardChangeEvent {
        /// Member.
        pub member: Arc<MiraiMember>,
        /// Old card.
        pub origin: String,
        /// New card.
        pub current: String,
    }
}

impl ChangedEvent for MemberCardChangeEvent {
    fn before(&self) -> Option<String> {
        Some(self.origin.clone())
    }

    fn after(&self) -> Option<String> {
        Some(self.current.clone())
    }
}

mirai_event! {
    /// Someone asks to join a group the bot manages.
    MIRAI_MEMBER_JOIN_REQUEST = "mirai.member_join_request", [REQUEST_EVENT], views [request];
    pub struct MemberJoinRequestEvent {
        /// Group, when the bot still sees it.
        pub group: Option<Arc<MiraiGroup>>,
        /// The native request.
        pub request: NativeRequest,
    }
}

native_request_event!(MemberJoinRequestEvent);

impl MemberJoinRequestEvent {
    /// Member who invited the requester, if any.
    pub fn invitor(&self) -> Option<Arc<MiraiMember>> {
        let NativeRequest::MemberJoin {
            invitor_id: Some(invitor_id),
            ..
        } = &self.request
        else {
            return None;
        };
        self.group.as_ref()?.mirai_member(*invitor_id)
    }
}

mirai_event! {
    /// A member left or was kicked.
    MIRAI_MEMBER_LEAVE = "mirai.member_leave", [NOTICE_EVENT];
    pub struct MemberLeaveEvent {
        /// Former member.
        pub member: Arc<MiraiMember>,
        /// True when kicked.
        pub kicked: bool,
        /// Operator of a kick, `None` when it was the bot.
        pub operator: Option<Arc<MiraiMember>>,
    }
}

mirai_event! {
    /// A member joined.
    MIRAI_MEMBER_JOIN = "mirai.member_join", [NOTICE_EVENT];
    pub struct MemberJoinEvent {
        /// New member.
        pub member: Arc<MiraiMember>,
        /// How they joined.
        pub kind: JoinKind,
        /// Inviter, for invitations.
        pub invitor: Option<Arc<MiraiMember>>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::MiraiBot;
    use crate::config::MiraiBotConfiguration;
    use crate::event::EventBase;
    use crate::native::NativePermission;
    use crate::native::testing::{TestBot, TestGroup, TestMember};
    use simbot_core::{Event, ListenerDispatcher};

    #[tokio::test]
    async fn test_member_join_request_invitor() {
        let native = TestBot::new(1);
        let group = TestGroup::new(100, "group");
        group.add_member(TestMember::new(4, 100, "four", NativePermission::Member));
        native.add_group(group);
        let bot = MiraiBot::new(
            native.clone(),
            Arc::new(ListenerDispatcher::new()),
            std::sync::Weak::new(),
            MiraiBotConfiguration::for_code(1),
        );
        let request = NativeRequest::MemberJoin {
            event_id: 9,
            from_id: 50,
            from_nick: "newbie".into(),
            group_id: 100,
            group_name: "group".into(),
            message: "hello".into(),
            invitor_id: Some(4),
        };
        let mirai_group = bot.mirai_group(100).unwrap();
        let event = MemberJoinRequestEvent::new(EventBase::new(bot, None), mirai_group, request);

        assert_eq!(event.invitor().map(|m| m.native().id()), Some(4));
        let view = event.as_request_event().unwrap();
        assert!(view.reject(Some("full")).await.unwrap());
        assert_eq!(
            native.requests.lock().as_slice(),
            [(9, false, Some("full".to_string()), false)]
        );
    }

    #[test]
    fn test_role_change_view() {
        let native = TestBot::new(1);
        let group = TestGroup::new(100, "group");
        native.add_group(group);
        let bot = MiraiBot::new(
            native,
            Arc::new(ListenerDispatcher::new()),
            std::sync::Weak::new(),
            MiraiBotConfiguration::for_code(1),
        );
        let member = bot.mirai_group(100).unwrap().unwrap().mirai_owner();
        let event = MemberRoleChangeEvent::new(
            EventBase::new(bot, None),
            member,
            MemberRole::Member,
            MemberRole::Administrator,
        );
        let view = event.as_changed_event().unwrap();
        assert_eq!(view.before().as_deref(), Some("MEMBER"));
        assert_eq!(view.after().as_deref(), Some("ADMINISTRATOR"));
        assert!(event.is_promotion());
    }
}
