//! Framework wrappers around native contacts.
//!
//! Every wrapper holds its native object and the owning [`MiraiBot`], and
//! implements the matching framework trait.

pub mod announcement;
pub mod friend;
pub mod group;
pub mod member;
pub mod stranger;

pub use announcement::{MiraiAnnouncement, MiraiAnnouncements, MiraiOnlineAnnouncement};
pub use friend::MiraiFriend;
pub use group::MiraiGroup;
pub use member::{MemberRole, MiraiMember};
pub use stranger::MiraiStranger;

use std::time::Duration;

use simbot_core::{BotResult, Messages};
use tracing::debug;

use crate::bot::MiraiBot;
use crate::message::to_native;
use crate::native::{NativeContact, NativeUserProfile};
use crate::receipt::MiraiMessageReceipt;

/// Whole seconds of a mute, rounded up so a short mute is never zero.
/// `None` when it does not fit an `i64`.
pub(crate) fn mute_seconds(duration: Duration) -> Option<i64> {
    let seconds = duration
        .as_secs()
        .checked_add(u64::from(duration.subsec_nanos() > 0))?;
    i64::try_from(seconds).ok()
}

/// Translates and sends `messages` to `contact`.
///
/// A message that translates to nothing is not sent and yields an
/// unsuccessful receipt.
pub(crate) async fn send_to(
    bot: &MiraiBot,
    contact: NativeContact,
    messages: &Messages,
) -> BotResult<MiraiMessageReceipt> {
    let chain = to_native(messages, &contact, bot.native_bot()).await?;
    if chain.is_empty() {
        debug!(contact = ?contact, "Nothing to send after translation");
        return Ok(MiraiMessageReceipt::empty());
    }

    let receipt = contact.send_message(&chain).await?;
    debug!(contact = ?contact, elements = chain.elements.len(), "Message sent");
    Ok(MiraiMessageReceipt::new(receipt, bot.code()))
}

/// Queries the profile of `user_id` through the owning bot.
pub(crate) async fn query_profile(bot: &MiraiBot, user_id: i64) -> BotResult<NativeUserProfile> {
    let profile = bot.native_bot().query_profile(user_id).await?;
    debug!(bot_id = bot.code(), user_id, "Profile queried");
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mute_seconds_round_up() {
        assert_eq!(mute_seconds(Duration::ZERO), Some(0));
        assert_eq!(mute_seconds(Duration::from_nanos(1)), Some(1));
        assert_eq!(mute_seconds(Duration::from_secs(60)), Some(60));
        assert_eq!(mute_seconds(Duration::from_millis(60_001)), Some(61));
        assert_eq!(mute_seconds(Duration::from_secs(u64::MAX)), None);
    }
}
