//! Events about the bot in a group and about group settings.

use std::sync::Arc;

use simbot_core::{CHANGED_EVENT, ChangedEvent, NOTICE_EVENT, REQUEST_EVENT};

use super::display;
use super::friend::native_request_event;
use crate::contact::{MemberRole, MiraiGroup, MiraiMember};
use crate::native::NativeRequest;
use crate::native::event::LeaveKind;

// =============================================================================
// The bot in a group
// =============================================================================

mirai_event! {
    /// The bot is invited into a group.
    MIRAI_BOT_INVITED_JOIN_GROUP_REQUEST = "mirai.bot_invited_join_group_request", [REQUEST_EVENT], views [request];
    pub struct BotInvitedJoinGroupRequestEvent {
        /// The native request.
        pub request: NativeRequest,
    }
}

native_request_event!(BotInvitedJoinGroupRequestEvent);

impl BotInvitedJoinGroupRequestEvent {
    /// Id and name of the group the bot is invited into.
    pub fn group(&self) -> Option<(i64, &str)> {
        match &self.request {
            NativeRequest::InvitedJoinGroup {
                group_id,
                group_name,
                ..
            } => Some((*group_id, group_name)),
            _ => None,
        }
    }
}

mirai_event! {
    /// The bot left a group.
    MIRAI_BOT_LEAVE = "mirai.bot_leave", [NOTICE_EVENT];
    pub struct BotLeaveEvent {
        /// Group.
        pub group: Arc<MiraiGroup>,
        /// How the bot left.
        pub kind: LeaveKind,
        /// Operator of a kick or disband.
        pub operator: Option<Arc<MiraiMember>>,
    }
}

mirai_event! {
    /// The bot joined a group.
    MIRAI_BOT_JOIN_GROUP = "mirai.bot_join_group", [NOTICE_EVENT];
    pub struct BotJoinGroupEvent {
        /// Group.
        pub group: Arc<MiraiGroup>,
        /// Inviter, when invited.
        pub invitor: Option<Arc<MiraiMember>>,
    }
}

mirai_event! {
    /// The bot was muted.
    MIRAI_BOT_MUTE = "mirai.bot_mute", [NOTICE_EVENT];
    pub struct BotMuteEvent {
        /// Group.
        pub group: Arc<MiraiGroup>,
        /// Who muted the bot.
        pub operator: Arc<MiraiMember>,
        /// Mute duration.
        pub duration_seconds: i32,
    }
}

mirai_event! {
    /// The bot was unmuted.
    MIRAI_BOT_UNMUTE = "mirai.bot_unmute", [NOTICE_EVENT];
    pub struct BotUnmuteEvent {
        /// Group.
        pub group: Arc<MiraiGroup>,
        /// Who unmuted the bot.
        pub operator: Arc<MiraiMember>,
    }
}

mirai_event! {
    /// The bot's role in a group changed.
    MIRAI_BOT_GROUP_ROLE_CHANGE = "mirai.bot_group_role_change", [CHANGED_EVENT], views [changed];
    pub struct BotGroupRoleChangeEvent {
        /// Group.
        pub group: Arc<MiraiGroup>,
        /// Old role.
        pub origin: MemberRole,
        /// New role.
        pub current: MemberRole,
    }
}

impl ChangedEvent for BotGroupRoleChangeEvent {
    fn before(&self) -> Option<String> {
        display(&self.origin)
    }

    fn after(&self) -> Option<String> {
        display(&self.current)
    }
}

// =============================================================================
// Group settings
// =============================================================================

/// Declares a group setting change whose operator is `None` when it was the
/// bot.
macro_rules! group_setting_event {
    ($(#[$meta:meta])* $key:ident = $id:literal; $name:ident($ty:ty)) => {
        mirai_event! {
            $(#[$meta])*
            $key = $id, [CHANGED_EVENT], views [changed];
            pub struct $name {
                /// Group.
                pub group: Arc<MiraiGroup>,
                /// Old value.
                pub origin: $ty,
                /// New value.
                pub current: $ty,
                /// Operator, `None` when it was the bot.
                pub operator: Option<Arc<MiraiMember>>,
            }
        }

        impl ChangedEvent for $name {
            fn before(&self) -> Option<String> {
                display(&self.origin)
            }

            fn after(&self) -> Option<String> {
                display(&self.current)
            }
        }

        impl $name {
            /// True when the bot made the change.
            pub fn is_by_bot(&self) -> bool {
                self.operator.is_none()
            }
        }
    };
}

group_setting_event! {
    /// The group was renamed.
    MIRAI_GROUP_NAME_CHANGE = "mirai.group_name_change";
    GroupNameChangeEvent(String)
}

group_setting_event! {
    /// The entrance announcement changed.
    MIRAI_GROUP_ENTRANCE_ANNOUNCEMENT_CHANGE = "mirai.group_entrance_announcement_change";
    GroupEntranceAnnouncementChangeEvent(String)
}

group_setting_event! {
    /// Whole-group mute was toggled.
    MIRAI_GROUP_MUTE_ALL = "mirai.group_mute_all";
    GroupMuteAllEvent(bool)
}

group_setting_event! {
    /// Anonymous chat was toggled.
    MIRAI_GROUP_ALLOW_ANONYMOUS_CHAT = "mirai.group_allow_anonymous_chat";
    GroupAllowAnonymousChatEvent(bool)
}

group_setting_event! {
    /// Member invitations were toggled.
    MIRAI_GROUP_ALLOW_MEMBER_INVITE = "mirai.group_allow_member_invite";
    GroupAllowMemberInviteEvent(bool)
}

mirai_event! {
    /// Confess talk was toggled.
    MIRAI_GROUP_ALLOW_CONFESS_TALK = "mirai.group_allow_confess_talk", [CHANGED_EVENT], views [changed];
    pub struct GroupAllowConfessTalkEvent {
        /// Group.
        pub group: Arc<MiraiGroup>,
        /// Old state.
        pub origin: bool,
        /// New state.
        pub current: bool,
        /// True when the bot made the change.
        pub is_by_bot: bool,
    }
}

impl ChangedEvent for GroupAllowConfessTalkEvent {
    fn before(&self) -> Option<String> {
        display(&self.origin)
    }

    fn after(&self) -> Option<String> {
        display(&self.current)
    }
}

impl BotLeaveEvent {
    /// True when the group no longer exists.
    pub fn is_disband(&self) -> bool {
        self.kind == LeaveKind::Disband
    }
}
