//! Maps the native event stream of a bot to framework events.
//!
//! Each bot subscribes once. Every received native event is handled on its own
//! task: it is mapped to its framework event, which is built and pushed only
//! when the event processor has a listener for its key.
//!
//! Inbound friend and group chains are handed to the recall cache before that
//! check, so recall events can carry content even when nobody listens to
//! messages.

use std::sync::Arc;

use simbot_core::{BoxedEvent, Event, EventKey};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, trace, warn};

use super::recall::{cached_friend_message, cached_group_message};
use super::*;
use crate::bot::MiraiBot;
use crate::message::to_simbot;
use crate::native::{NativeContact, NativeEvent, NativeMember, NativeReceipt, NativeRequest};
use crate::receipt::MiraiMessageReceipt;
use crate::util::RecallKey;

/// Starts the event loop of `bot`. The loop ends when the bot is cancelled or
/// the native channel closes.
pub(crate) fn register(bot: &Arc<MiraiBot>) {
    let mut receiver = bot.native_bot().subscribe();
    let token = bot.cancel_token().clone();
    let bot = bot.clone();
    let bot_id = bot.code();
    debug!(bot_id, "Event loop registered");

    tokio::spawn(async move {
        loop {
            tokio::select! {
                () = token.cancelled() => break,
                received = receiver.recv() => match received {
                    Ok(event) => {
                        let bot = bot.clone();
                        tokio::spawn(async move { dispatch(bot, event).await });
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(bot_id, skipped, "Native events dropped, event loop lagging");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
        debug!(bot_id, "Event loop stopped");
    });
}

async fn dispatch(bot: Arc<MiraiBot>, event: NativeEvent) {
    let bot_id = bot.code();
    trace!(bot_id, event = event.name(), "Native event received");

    let Some(event) = convert(&bot, event) else {
        return;
    };
    let result = bot.event_processor().push(event.clone()).await;
    if !result.is_success() {
        warn!(
            bot_id,
            event_key = %event.key(),
            errors = result.errors.len(),
            "Event processing finished with errors"
        );
    }
}

/// Builds an event only when its key is processable.
fn build<E: Event + 'static>(
    bot: &Arc<MiraiBot>,
    key: &EventKey,
    original: &NativeEvent,
    event: impl FnOnce(EventBase) -> E,
) -> Option<BoxedEvent> {
    if !bot.event_processor().is_processable(key) {
        return None;
    }
    let base = EventBase::new(bot.clone(), Some(original.clone()));
    Some(BoxedEvent::new(event(base)))
}

fn receipt(bot: &MiraiBot, native: Option<&Arc<dyn NativeReceipt>>) -> Option<Arc<MiraiMessageReceipt>> {
    native.map(|r| Arc::new(MiraiMessageReceipt::new(r.clone(), bot.code())))
}

/// Maps one native event.
pub(crate) fn convert(bot: &Arc<MiraiBot>, event: NativeEvent) -> Option<BoxedEvent> {
    let strategy = bot.recall_cache_strategy();
    let e = &event;
    let wrap_opt = |m: &Option<Arc<dyn NativeMember>>| m.clone().map(|m| bot.wrap_member(m));

    match e {
        // ===== Messages =====
        NativeEvent::FriendMessage { sender, chain } => {
            if sender.id() == bot.code() {
                return None;
            }
            strategy.cache_friend_message(bot.code(), sender.id(), chain);
            build(bot, &MIRAI_FRIEND_MESSAGE, e, |base| {
                FriendMessageEvent::new(base, bot.wrap_friend(sender.clone()), chain.clone(), to_simbot(chain))
            })
        }
        NativeEvent::StrangerMessage { sender, chain } => build(bot, &MIRAI_STRANGER_MESSAGE, e, |base| {
            StrangerMessageEvent::new(base, bot.wrap_stranger(sender.clone()), chain.clone(), to_simbot(chain))
        }),
        NativeEvent::GroupMessage { group, sender, chain } => {
            strategy.cache_group_message(bot.code(), group.id(), chain);
            build(bot, &MIRAI_GROUP_MESSAGE, e, |base| {
                GroupMessageEvent::new(
                    base,
                    bot.wrap_group(group.clone()),
                    bot.wrap_member(sender.clone()),
                    chain.clone(),
                    to_simbot(chain),
                )
            })
        }
        NativeEvent::GroupTempMessage { group, sender, chain } => build(bot, &MIRAI_MEMBER_MESSAGE, e, |base| {
            MemberMessageEvent::new(
                base,
                bot.wrap_group(group.clone()),
                bot.wrap_member(sender.clone()),
                chain.clone(),
                to_simbot(chain),
            )
        }),

        // ===== Friends =====
        NativeEvent::FriendRequest(request) => build(bot, &MIRAI_FRIEND_REQUEST, e, |base| {
            FriendRequestEvent::new(base, request.clone())
        }),
        NativeEvent::FriendInputStatusChanged { friend, inputting } => {
            build(bot, &MIRAI_FRIEND_INPUT_STATUS_CHANGED, e, |base| {
                FriendInputStatusChangedEvent::new(base, bot.wrap_friend(friend.clone()), *inputting)
            })
        }
        NativeEvent::FriendNickChanged { friend, from, to } => build(bot, &MIRAI_FRIEND_NICK_CHANGED, e, |base| {
            FriendNickChangedEvent::new(base, bot.wrap_friend(friend.clone()), from.clone(), to.clone())
        }),
        NativeEvent::FriendAvatarChanged { friend } => build(bot, &MIRAI_FRIEND_AVATAR_CHANGED, e, |base| {
            FriendAvatarChangedEvent::new(base, bot.wrap_friend(friend.clone()))
        }),
        NativeEvent::FriendDecrease { friend } => build(bot, &MIRAI_FRIEND_DECREASE, e, |base| {
            FriendDecreaseEvent::new(base, bot.wrap_friend(friend.clone()))
        }),
        NativeEvent::FriendIncrease { friend } => build(bot, &MIRAI_FRIEND_INCREASE, e, |base| {
            FriendIncreaseEvent::new(base, bot.wrap_friend(friend.clone()))
        }),
        NativeEvent::FriendRemarkChange {
            friend,
            old_remark,
            new_remark,
        } => build(bot, &MIRAI_FRIEND_REMARK_CHANGE, e, |base| {
            FriendRemarkChangeEvent::new(
                base,
                bot.wrap_friend(friend.clone()),
                old_remark.clone(),
                new_remark.clone(),
            )
        }),

        // ===== The bot in groups =====
        NativeEvent::BotInvitedJoinGroupRequest(request) => {
            build(bot, &MIRAI_BOT_INVITED_JOIN_GROUP_REQUEST, e, |base| {
                BotInvitedJoinGroupRequestEvent::new(base, request.clone())
            })
        }
        NativeEvent::BotLeave { group, kind, operator } => build(bot, &MIRAI_BOT_LEAVE, e, |base| {
            BotLeaveEvent::new(base, bot.wrap_group(group.clone()), *kind, wrap_opt(operator))
        }),
        NativeEvent::BotJoinGroup { group, invitor } => build(bot, &MIRAI_BOT_JOIN_GROUP, e, |base| {
            BotJoinGroupEvent::new(base, bot.wrap_group(group.clone()), wrap_opt(invitor))
        }),
        NativeEvent::BotMute {
            group,
            operator,
            duration_seconds,
        } => build(bot, &MIRAI_BOT_MUTE, e, |base| {
            BotMuteEvent::new(
                base,
                bot.wrap_group(group.clone()),
                bot.wrap_member(operator.clone()),
                *duration_seconds,
            )
        }),
        NativeEvent::BotUnmute { group, operator } => build(bot, &MIRAI_BOT_UNMUTE, e, |base| {
            BotUnmuteEvent::new(base, bot.wrap_group(group.clone()), bot.wrap_member(operator.clone()))
        }),
        NativeEvent::BotGroupPermissionChange { group, origin, new } => {
            build(bot, &MIRAI_BOT_GROUP_ROLE_CHANGE, e, |base| {
                BotGroupRoleChangeEvent::new(base, bot.wrap_group(group.clone()), (*origin).into(), (*new).into())
            })
        }

        // ===== Group settings =====
        NativeEvent::GroupNameChange {
            group,
            origin,
            new,
            operator,
        } => build(bot, &MIRAI_GROUP_NAME_CHANGE, e, |base| {
            GroupNameChangeEvent::new(
                base,
                bot.wrap_group(group.clone()),
                origin.clone(),
                new.clone(),
                wrap_opt(operator),
            )
        }),
        NativeEvent::GroupEntranceAnnouncementChange {
            group,
            origin,
            new,
            operator,
        } => build(bot, &MIRAI_GROUP_ENTRANCE_ANNOUNCEMENT_CHANGE, e, |base| {
            GroupEntranceAnnouncementChangeEvent::new(
                base,
                bot.wrap_group(group.clone()),
                origin.clone(),
                new.clone(),
                wrap_opt(operator),
            )
        }),
        NativeEvent::GroupMuteAll {
            group,
            origin,
            new,
            operator,
        } => build(bot, &MIRAI_GROUP_MUTE_ALL, e, |base| {
            GroupMuteAllEvent::new(base, bot.wrap_group(group.clone()), *origin, *new, wrap_opt(operator))
        }),
        NativeEvent::GroupAllowAnonymousChat {
            group,
            origin,
            new,
            operator,
        } => build(bot, &MIRAI_GROUP_ALLOW_ANONYMOUS_CHAT, e, |base| {
            GroupAllowAnonymousChatEvent::new(base, bot.wrap_group(group.clone()), *origin, *new, wrap_opt(operator))
        }),
        NativeEvent::GroupAllowConfessTalk {
            group,
            origin,
            new,
            is_by_bot,
        } => build(bot, &MIRAI_GROUP_ALLOW_CONFESS_TALK, e, |base| {
            GroupAllowConfessTalkEvent::new(base, bot.wrap_group(group.clone()), *origin, *new, *is_by_bot)
        }),
        NativeEvent::GroupAllowMemberInvite {
            group,
            origin,
            new,
            operator,
        } => build(bot, &MIRAI_GROUP_ALLOW_MEMBER_INVITE, e, |base| {
            GroupAllowMemberInviteEvent::new(base, bot.wrap_group(group.clone()), *origin, *new, wrap_opt(operator))
        }),

        // ===== Members =====
        NativeEvent::GroupTalkativeChange { group, now, previous } => {
            build(bot, &MIRAI_GROUP_TALKATIVE_CHANGE, e, |base| {
                GroupTalkativeChangeEvent::new(
                    base,
                    bot.wrap_group(group.clone()),
                    bot.wrap_member(now.clone()),
                    bot.wrap_member(previous.clone()),
                )
            })
        }
        NativeEvent::MemberHonorChange {
            member,
            honor,
            achieved,
        } => build(bot, &MIRAI_MEMBER_HONOR_CHANGE, e, |base| {
            MemberHonorChangeEvent::new(base, bot.wrap_member(member.clone()), honor.clone(), *achieved)
        }),
        NativeEvent::MemberUnmute { member, operator } => build(bot, &MIRAI_MEMBER_UNMUTE, e, |base| {
            MemberUnmuteEvent::new(base, bot.wrap_member(member.clone()), wrap_opt(operator))
        }),
        NativeEvent::MemberMute {
            member,
            duration_seconds,
            operator,
        } => build(bot, &MIRAI_MEMBER_MUTE, e, |base| {
            MemberMuteEvent::new(base, bot.wrap_member(member.clone()), *duration_seconds, wrap_opt(operator))
        }),
        NativeEvent::MemberPermissionChange { member, origin, new } => {
            build(bot, &MIRAI_MEMBER_ROLE_CHANGE, e, |base| {
                MemberRoleChangeEvent::new(base, bot.wrap_member(member.clone()), (*origin).into(), (*new).into())
            })
        }
        NativeEvent::MemberSpecialTitleChange {
            member,
            origin,
            new,
            operator,
        } => build(bot, &MIRAI_MEMBER_SPECIAL_TITLE_CHANGE, e, |base| {
            MemberSpecialTitleChangeEvent::new(
                base,
                bot.wrap_member(member.clone()),
                origin.clone(),
                new.clone(),
                wrap_opt(operator),
            )
        }),
        NativeEvent::MemberCardChange { member, origin, new } => build(bot, &MIRAI_MEMBER_CARD_CHANGE, e, |base| {
            MemberCardChangeEvent::new(base, bot.wrap_member(member.clone()), origin.clone(), new.clone())
        }),
        NativeEvent::MemberJoinRequest(request) => build(bot, &MIRAI_MEMBER_JOIN_REQUEST, e, |base| {
            let group = match request {
                NativeRequest::MemberJoin { group_id, .. } => {
                    bot.native_bot().get_group(*group_id).map(|g| bot.wrap_group(g))
                }
                _ => None,
            };
            MemberJoinRequestEvent::new(base, group, request.clone())
        }),
        NativeEvent::MemberLeave {
            member,
            kicked,
            operator,
        } => build(bot, &MIRAI_MEMBER_LEAVE, e, |base| {
            MemberLeaveEvent::new(base, bot.wrap_member(member.clone()), *kicked, wrap_opt(operator))
        }),
        NativeEvent::MemberJoin { member, kind, invitor } => build(bot, &MIRAI_MEMBER_JOIN, e, |base| {
            MemberJoinEvent::new(base, bot.wrap_member(member.clone()), *kind, wrap_opt(invitor))
        }),

        // ===== Recalls =====
        NativeEvent::FriendRecall {
            friend,
            message_ids,
            message_internal_ids,
            message_time,
            operator_id,
        } => build(bot, &MIRAI_FRIEND_MESSAGE_RECALL, e, |base| {
            let key = RecallKey::new(message_ids, message_internal_ids, *message_time);
            let chain = cached_friend_message(bot, friend.id(), &key);
            FriendMessageRecallEvent::new(base, bot.wrap_friend(friend.clone()), *operator_id, key, chain)
        }),
        NativeEvent::GroupRecall {
            group,
            author_id,
            message_ids,
            message_internal_ids,
            message_time,
            operator,
        } => build(bot, &MIRAI_GROUP_MESSAGE_RECALL, e, |base| {
            let key = RecallKey::new(message_ids, message_internal_ids, *message_time);
            let chain = cached_group_message(bot, group.id(), &key);
            let author = group.get_member(*author_id).map(|m| bot.wrap_member(m));
            GroupMessageRecallEvent::new(
                base,
                bot.wrap_group(group.clone()),
                *author_id,
                author,
                wrap_opt(operator),
                key,
                chain,
            )
        }),

        // ===== Nudge =====
        NativeEvent::Nudge {
            from,
            target,
            subject,
            action,
            suffix,
        } => match subject {
            NativeContact::Group(group) => build(bot, &MIRAI_GROUP_NUDGE, e, |base| {
                GroupNudgeEvent::new(
                    base,
                    bot.wrap_group(group.clone()),
                    from.clone(),
                    target.id(),
                    action.clone(),
                    suffix.clone(),
                    subject.clone(),
                )
            }),
            NativeContact::Friend(friend) => build(bot, &MIRAI_FRIEND_NUDGE, e, |base| {
                FriendNudgeEvent::new(
                    base,
                    bot.wrap_friend(friend.clone()),
                    from.clone(),
                    target.id(),
                    action.clone(),
                    suffix.clone(),
                    subject.clone(),
                )
            }),
            NativeContact::Member(member) => build(bot, &MIRAI_MEMBER_NUDGE, e, |base| {
                MemberNudgeEvent::new(
                    base,
                    bot.wrap_member(member.clone()),
                    from.clone(),
                    target.id(),
                    action.clone(),
                    suffix.clone(),
                    subject.clone(),
                )
            }),
            NativeContact::Stranger(stranger) => build(bot, &MIRAI_STRANGER_NUDGE, e, |base| {
                StrangerNudgeEvent::new(
                    base,
                    bot.wrap_stranger(stranger.clone()),
                    from.clone(),
                    target.id(),
                    action.clone(),
                    suffix.clone(),
                    subject.clone(),
                )
            }),
        },

        // ===== Post send =====
        NativeEvent::FriendMessagePostSend {
            target,
            chain,
            receipt: native,
            error,
        } => build(bot, &MIRAI_FRIEND_MESSAGE_POST_SEND, e, |base| {
            FriendMessagePostSendEvent::new(
                base,
                bot.wrap_friend(target.clone()),
                chain.clone(),
                receipt(bot, native.as_ref()),
                error.clone(),
            )
        }),
        NativeEvent::GroupMessagePostSend {
            target,
            chain,
            receipt: native,
            error,
        } => build(bot, &MIRAI_GROUP_MESSAGE_POST_SEND, e, |base| {
            GroupMessagePostSendEvent::new(
                base,
                bot.wrap_group(target.clone()),
                chain.clone(),
                receipt(bot, native.as_ref()),
                error.clone(),
            )
        }),
        NativeEvent::GroupTempMessagePostSend {
            target,
            chain,
            receipt: native,
            error,
        } => build(bot, &MIRAI_MEMBER_MESSAGE_POST_SEND, e, |base| {
            MemberMessagePostSendEvent::new(
                base,
                bot.wrap_member(target.clone()),
                chain.clone(),
                receipt(bot, native.as_ref()),
                error.clone(),
            )
        }),
        NativeEvent::StrangerMessagePostSend {
            target,
            chain,
            receipt: native,
            error,
        } => build(bot, &MIRAI_STRANGER_MESSAGE_POST_SEND, e, |base| {
            StrangerMessagePostSendEvent::new(
                base,
                bot.wrap_stranger(target.clone()),
                chain.clone(),
                receipt(bot, native.as_ref()),
                error.clone(),
            )
        }),

        NativeEvent::Other { .. } => build(bot, &MIRAI_UNSUPPORTED, e, UnsupportedMiraiEvent::new),
    }
}
