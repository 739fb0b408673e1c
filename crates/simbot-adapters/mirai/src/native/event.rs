//! Events emitted by the protocol library.

use std::fmt;
use std::sync::Arc;

use super::{
    NativeContact, NativeFriend, NativeGroup, NativeMember, NativeMessageChain, NativePermission,
    NativeReceipt, NativeStranger, NativeUser,
};

/// A request that can be accepted or rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeRequest {
    /// Someone asks to become a friend.
    Friend {
        /// Request id.
        event_id: i64,
        /// Requester id.
        from_id: i64,
        /// Requester nick.
        from_nick: String,
        /// Group the requester found the bot through, 0 if none.
        from_group_id: i64,
        /// Attached message.
        message: String,
    },
    /// The bot is invited into a group.
    InvitedJoinGroup {
        /// Request id.
        event_id: i64,
        /// Inviter id.
        invitor_id: i64,
        /// Inviter nick.
        invitor_nick: String,
        /// Group id.
        group_id: i64,
        /// Group name.
        group_name: String,
    },
    /// Someone asks to join a group the bot manages.
    MemberJoin {
        /// Request id.
        event_id: i64,
        /// Requester id.
        from_id: i64,
        /// Requester nick.
        from_nick: String,
        /// Group id.
        group_id: i64,
        /// Group name.
        group_name: String,
        /// Attached message.
        message: String,
        /// Member who invited the requester, if any.
        invitor_id: Option<i64>,
    },
}

impl NativeRequest {
    /// Request id.
    pub fn event_id(&self) -> i64 {
        match self {
            Self::Friend { event_id, .. }
            | Self::InvitedJoinGroup { event_id, .. }
            | Self::MemberJoin { event_id, .. } => *event_id,
        }
    }

    /// Id of whoever issued the request.
    pub fn requester_id(&self) -> i64 {
        match self {
            Self::Friend { from_id, .. } | Self::MemberJoin { from_id, .. } => *from_id,
            Self::InvitedJoinGroup { invitor_id, .. } => *invitor_id,
        }
    }

    /// Nick of whoever issued the request.
    pub fn requester_nick(&self) -> &str {
        match self {
            Self::Friend { from_nick, .. } | Self::MemberJoin { from_nick, .. } => from_nick,
            Self::InvitedJoinGroup { invitor_nick, .. } => invitor_nick,
        }
    }

    /// Attached message, if the request kind carries one.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Friend { message, .. } | Self::MemberJoin { message, .. } => Some(message),
            Self::InvitedJoinGroup { .. } => None,
        }
    }
}

/// How the bot left a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveKind {
    /// Left on its own.
    Active,
    /// Was kicked.
    Kick,
    /// The group was disbanded.
    Disband,
}

/// How a member joined a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Joined through a request.
    Active,
    /// Was invited.
    Invite,
    /// Took over an existing group as its new owner.
    Retrieve,
}

/// An event emitted on a bot's broadcast channel.
#[derive(Clone)]
pub enum NativeEvent {
    // ===== Messages =====
    /// A friend sent a message.
    FriendMessage {
        /// Sender.
        sender: Arc<dyn NativeFriend>,
        /// Message, with source.
        chain: NativeMessageChain,
    },
    /// A stranger sent a message.
    StrangerMessage {
        /// Sender.
        sender: Arc<dyn NativeStranger>,
        /// Message, with source.
        chain: NativeMessageChain,
    },
    /// A member sent a message in a group.
    GroupMessage {
        /// Group.
        group: Arc<dyn NativeGroup>,
        /// Sender.
        sender: Arc<dyn NativeMember>,
        /// Message, with source.
        chain: NativeMessageChain,
    },
    /// A member sent a temp message.
    GroupTempMessage {
        /// Group.
        group: Arc<dyn NativeGroup>,
        /// Sender.
        sender: Arc<dyn NativeMember>,
        /// Message, with source.
        chain: NativeMessageChain,
    },

    // ===== Friends =====
    /// Someone asks to become a friend.
    FriendRequest(NativeRequest),
    /// A friend started or stopped typing.
    FriendInputStatusChanged {
        /// Friend.
        friend: Arc<dyn NativeFriend>,
        /// True while typing.
        inputting: bool,
    },
    /// A friend changed their nick.
    FriendNickChanged {
        /// Friend.
        friend: Arc<dyn NativeFriend>,
        /// Old nick.
        from: String,
        /// New nick.
        to: String,
    },
    /// A friend changed their avatar.
    FriendAvatarChanged {
        /// Friend.
        friend: Arc<dyn NativeFriend>,
    },
    /// A friend was removed.
    FriendDecrease {
        /// Former friend.
        friend: Arc<dyn NativeFriend>,
    },
    /// A friend was added.
    FriendIncrease {
        /// New friend.
        friend: Arc<dyn NativeFriend>,
    },
    /// The remark of a friend changed.
    FriendRemarkChange {
        /// Friend.
        friend: Arc<dyn NativeFriend>,
        /// Old remark.
        old_remark: String,
        /// New remark.
        new_remark: String,
    },

    // ===== Bot in groups =====
    /// The bot is invited into a group.
    BotInvitedJoinGroupRequest(NativeRequest),
    /// The bot left a group.
    BotLeave {
        /// Group.
        group: Arc<dyn NativeGroup>,
        /// How it left.
        kind: LeaveKind,
        /// Operator for kicks and disbands.
        operator: Option<Arc<dyn NativeMember>>,
    },
    /// The bot joined a group.
    BotJoinGroup {
        /// Group.
        group: Arc<dyn NativeGroup>,
        /// Inviter, if invited.
        invitor: Option<Arc<dyn NativeMember>>,
    },
    /// The bot was muted.
    BotMute {
        /// Group.
        group: Arc<dyn NativeGroup>,
        /// Operator.
        operator: Arc<dyn NativeMember>,
        /// Mute duration.
        duration_seconds: i32,
    },
    /// The bot's permission changed.
    BotGroupPermissionChange {
        /// Group.
        group: Arc<dyn NativeGroup>,
        /// Old permission.
        origin: NativePermission,
        /// New permission.
        new: NativePermission,
    },
    /// The bot was unmuted.
    BotUnmute {
        /// Group.
        group: Arc<dyn NativeGroup>,
        /// Operator.
        operator: Arc<dyn NativeMember>,
    },

    // ===== Group settings =====
    /// Group name changed.
    GroupNameChange {
        /// Group.
        group: Arc<dyn NativeGroup>,
        /// Old name.
        origin: String,
        /// New name.
        new: String,
        /// Operator, `None` when it was the bot.
        operator: Option<Arc<dyn NativeMember>>,
    },
    /// Entrance announcement changed.
    GroupEntranceAnnouncementChange {
        /// Group.
        group: Arc<dyn NativeGroup>,
        /// Old announcement.
        origin: String,
        /// New announcement.
        new: String,
        /// Operator, `None` when it was the bot.
        operator: Option<Arc<dyn NativeMember>>,
    },
    /// Whole-group mute toggled.
    GroupMuteAll {
        /// Group.
        group: Arc<dyn NativeGroup>,
        /// Old state.
        origin: bool,
        /// New state.
        new: bool,
        /// Operator, `None` when it was the bot.
        operator: Option<Arc<dyn NativeMember>>,
    },
    /// Anonymous chat toggled.
    GroupAllowAnonymousChat {
        /// Group.
        group: Arc<dyn NativeGroup>,
        /// Old state.
        origin: bool,
        /// New state.
        new: bool,
        /// Operator, `None` when it was the bot.
        operator: Option<Arc<dyn NativeMember>>,
    },
    /// Confess talk toggled.
    GroupAllowConfessTalk {
        /// Group.
        group: Arc<dyn NativeGroup>,
        /// Old state.
        origin: bool,
        /// New state.
        new: bool,
        /// True when the bot made the change.
        is_by_bot: bool,
    },
    /// Member invitations toggled.
    GroupAllowMemberInvite {
        /// Group.
        group: Arc<dyn NativeGroup>,
        /// Old state.
        origin: bool,
        /// New state.
        new: bool,
        /// Operator, `None` when it was the bot.
        operator: Option<Arc<dyn NativeMember>>,
    },

    // ===== Members =====
    /// The most talkative member changed.
    GroupTalkativeChange {
        /// Group.
        group: Arc<dyn NativeGroup>,
        /// New holder.
        now: Arc<dyn NativeMember>,
        /// Previous holder.
        previous: Arc<dyn NativeMember>,
    },
    /// A member gained or lost an honor.
    MemberHonorChange {
        /// Member.
        member: Arc<dyn NativeMember>,
        /// Honor name.
        honor: String,
        /// True when gained.
        achieved: bool,
    },
    /// A member was unmuted.
    MemberUnmute {
        /// Member.
        member: Arc<dyn NativeMember>,
        /// Operator, `None` when it was the bot.
        operator: Option<Arc<dyn NativeMember>>,
    },
    /// A member was muted.
    MemberMute {
        /// Member.
        member: Arc<dyn NativeMember>,
        /// Mute duration.
        duration_seconds: i32,
        /// Operator, `None` when it was the bot.
        operator: Option<Arc<dyn NativeMember>>,
    },
    /// A member's permission changed.
    MemberPermissionChange {
        /// Member.
        member: Arc<dyn NativeMember>,
        /// Old permission.
        origin: NativePermission,
        /// New permission.
        new: NativePermission,
    },
    /// A member's special title changed.
    MemberSpecialTitleChange {
        /// Member.
        member: Arc<dyn NativeMember>,
        /// Old title.
        origin: String,
        /// New title.
        new: String,
        /// Operator, `None` when it was the bot.
        operator: Option<Arc<dyn NativeMember>>,
    },
    /// A member's name card changed.
    MemberCardChange {
        /// Member.
        member: Arc<dyn NativeMember>,
        /// Old card.
        origin: String,
        /// New card.
        new: String,
    },
    /// Someone asks to join a group.
    MemberJoinRequest(NativeRequest),
    /// A member left.
    MemberLeave {
        /// Former member.
        member: Arc<dyn NativeMember>,
        /// True when kicked.
        kicked: bool,
        /// Operator for kicks, `None` when it was the bot.
        operator: Option<Arc<dyn NativeMember>>,
    },
    /// A member joined.
    MemberJoin {
        /// New member.
        member: Arc<dyn NativeMember>,
        /// How they joined.
        kind: JoinKind,
        /// Inviter, for invitations.
        invitor: Option<Arc<dyn NativeMember>>,
    },

    // ===== Recalls =====
    /// A friend recalled a message.
    FriendRecall {
        /// Friend.
        friend: Arc<dyn NativeFriend>,
        /// Message ids.
        message_ids: Vec<i32>,
        /// Internal ids.
        message_internal_ids: Vec<i32>,
        /// Message time, epoch seconds.
        message_time: i32,
        /// Who recalled it.
        operator_id: i64,
    },
    /// A group message was recalled.
    GroupRecall {
        /// Group.
        group: Arc<dyn NativeGroup>,
        /// Author id.
        author_id: i64,
        /// Message ids.
        message_ids: Vec<i32>,
        /// Internal ids.
        message_internal_ids: Vec<i32>,
        /// Message time, epoch seconds.
        message_time: i32,
        /// Who recalled it, `None` when it was the bot.
        operator: Option<Arc<dyn NativeMember>>,
    },

    // ===== Nudge =====
    /// Someone nudged someone.
    Nudge {
        /// Who nudged.
        from: NativeUser,
        /// Who was nudged.
        target: NativeUser,
        /// Conversation the nudge was shown in.
        subject: NativeContact,
        /// Action text, e.g. "戳了戳".
        action: String,
        /// Suffix text.
        suffix: String,
    },

    // ===== Post send =====
    /// The bot sent a friend message.
    FriendMessagePostSend {
        /// Receiver.
        target: Arc<dyn NativeFriend>,
        /// Sent message.
        chain: NativeMessageChain,
        /// Receipt, absent on failure.
        receipt: Option<Arc<dyn NativeReceipt>>,
        /// Failure reason.
        error: Option<String>,
    },
    /// The bot sent a group message.
    GroupMessagePostSend {
        /// Receiver.
        target: Arc<dyn NativeGroup>,
        /// Sent message.
        chain: NativeMessageChain,
        /// Receipt, absent on failure.
        receipt: Option<Arc<dyn NativeReceipt>>,
        /// Failure reason.
        error: Option<String>,
    },
    /// The bot sent a temp message.
    GroupTempMessagePostSend {
        /// Receiver.
        target: Arc<dyn NativeMember>,
        /// Sent message.
        chain: NativeMessageChain,
        /// Receipt, absent on failure.
        receipt: Option<Arc<dyn NativeReceipt>>,
        /// Failure reason.
        error: Option<String>,
    },
    /// The bot sent a stranger message.
    StrangerMessagePostSend {
        /// Receiver.
        target: Arc<dyn NativeStranger>,
        /// Sent message.
        chain: NativeMessageChain,
        /// Receipt, absent on failure.
        receipt: Option<Arc<dyn NativeReceipt>>,
        /// Failure reason.
        error: Option<String>,
    },

    /// Any event the adapter does not map.
    Other {
        /// Event name.
        name: String,
    },
}

impl NativeEvent {
    /// Event name, for logs.
    pub fn name(&self) -> &str {
        match self {
            Self::FriendMessage { .. } => "FriendMessageEvent",
            Self::StrangerMessage { .. } => "StrangerMessageEvent",
            Self::GroupMessage { .. } => "GroupMessageEvent",
            Self::GroupTempMessage { .. } => "GroupTempMessageEvent",
            Self::FriendRequest(_) => "NewFriendRequestEvent",
            Self::FriendInputStatusChanged { .. } => "FriendInputStatusChangedEvent",
            Self::FriendNickChanged { .. } => "FriendNickChangedEvent",
            Self::FriendAvatarChanged { .. } => "FriendAvatarChangedEvent",
            Self::FriendDecrease { .. } => "FriendDeleteEvent",
            Self::FriendIncrease { .. } => "FriendAddEvent",
            Self::FriendRemarkChange { .. } => "FriendRemarkChangeEvent",
            Self::BotInvitedJoinGroupRequest(_) => "BotInvitedJoinGroupRequestEvent",
            Self::BotLeave { .. } => "BotLeaveEvent",
            Self::BotJoinGroup { .. } => "BotJoinGroupEvent",
            Self::BotMute { .. } => "BotMuteEvent",
            Self::BotGroupPermissionChange { .. } => "BotGroupPermissionChangeEvent",
            Self::BotUnmute { .. } => "BotUnmuteEvent",
            Self::GroupNameChange { .. } => "GroupNameChangeEvent",
            Self::GroupEntranceAnnouncementChange { .. } => "GroupEntranceAnnouncementChangeEvent",
            Self::GroupMuteAll { .. } => "GroupMuteAllEvent",
            Self::GroupAllowAnonymousChat { .. } => "GroupAllowAnonymousChatEvent",
            Self::GroupAllowConfessTalk { .. } => "GroupAllowConfessTalkEvent",
            Self::GroupAllowMemberInvite { .. } => "GroupAllowMemberInviteEvent",
            Self::GroupTalkativeChange { .. } => "GroupTalkativeChangeEvent",
            Self::MemberHonorChange { .. } => "MemberHonorChangeEvent",
            Self::MemberUnmute { .. } => "MemberUnmuteEvent",
            Self::MemberMute { .. } => "MemberMuteEvent",
            Self::MemberPermissionChange { .. } => "MemberPermissionChangeEvent",
            Self::MemberSpecialTitleChange { .. } => "MemberSpecialTitleChangeEvent",
            Self::MemberCardChange { .. } => "MemberCardChangeEvent",
            Self::MemberJoinRequest(_) => "MemberJoinRequestEvent",
            Self::MemberLeave { .. } => "MemberLeaveEvent",
            Self::MemberJoin { .. } => "MemberJoinEvent",
            Self::FriendRecall { .. } => "FriendRecallEvent",
            Self::GroupRecall { .. } => "GroupRecallEvent",
            Self::Nudge { .. } => "NudgeEvent",
            Self::FriendMessagePostSend { .. } => "FriendMessagePostSendEvent",
            Self::GroupMessagePostSend { .. } => "GroupMessagePostSendEvent",
            Self::GroupTempMessagePostSend { .. } => "GroupTempMessagePostSendEvent",
            Self::StrangerMessagePostSend { .. } => "StrangerMessagePostSendEvent",
            Self::Other { name } => name,
        }
    }
}

impl fmt::Debug for NativeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeEvent({})", self.name())
    }
}
