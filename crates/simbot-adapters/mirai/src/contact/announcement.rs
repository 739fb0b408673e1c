//! Group announcements.
//!
//! ```rust,ignore
//! let announcements = group.announcements();
//! let published = MiraiAnnouncement::new("Meeting at 8")
//!     .pinned()
//!     .publish_to(&announcements)
//!     .await?;
//! published.remind().await?;
//! ```

use std::sync::Arc;

use simbot_core::BotResult;
use tracing::info;

use super::member::MiraiMember;
use crate::bot::MiraiBot;
use crate::native::{AnnouncementParameters, NativeAnnouncements, NativeOnlineAnnouncement};

/// An announcement that has not been published.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MiraiAnnouncement {
    /// Content.
    pub content: String,
    /// Options.
    pub parameters: AnnouncementParameters,
}

impl MiraiAnnouncement {
    /// Creates an announcement with default options.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            parameters: AnnouncementParameters::default(),
        }
    }

    /// Replaces the options.
    pub fn with_parameters(mut self, parameters: AnnouncementParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Pins the announcement.
    pub fn pinned(mut self) -> Self {
        self.parameters.is_pinned = true;
        self
    }

    /// Publishes to a group.
    pub async fn publish_to(&self, announcements: &MiraiAnnouncements) -> BotResult<MiraiOnlineAnnouncement> {
        announcements.publish(self).await
    }
}

/// A published announcement.
pub struct MiraiOnlineAnnouncement {
    bot: Arc<MiraiBot>,
    native: NativeOnlineAnnouncement,
    announcements: Arc<dyn NativeAnnouncements>,
}

impl MiraiOnlineAnnouncement {
    /// Announcement id.
    pub fn fid(&self) -> &str {
        &self.native.fid
    }

    /// Group id.
    pub fn group_id(&self) -> i64 {
        self.native.group_id
    }

    /// Publisher id.
    pub fn sender_id(&self) -> i64 {
        self.native.sender_id
    }

    /// Content.
    pub fn content(&self) -> &str {
        &self.native.content
    }

    /// Options.
    pub fn parameters(&self) -> &AnnouncementParameters {
        &self.native.parameters
    }

    /// True once every member has confirmed.
    pub fn all_confirmed(&self) -> bool {
        self.native.all_confirmed
    }

    /// Number of confirmations.
    pub fn confirmed_members_count(&self) -> i32 {
        self.native.confirmed_members_count
    }

    /// Publication time, epoch seconds.
    pub fn publication_time(&self) -> i64 {
        self.native.publication_time
    }

    /// The offline form of this announcement.
    pub fn to_announcement(&self) -> MiraiAnnouncement {
        MiraiAnnouncement {
            content: self.native.content.clone(),
            parameters: self.native.parameters.clone(),
        }
    }

    /// Deletes this announcement.
    pub async fn delete(&self) -> BotResult<bool> {
        Ok(self.announcements.delete(&self.native.fid).await?)
    }

    /// Members who have, or have not, confirmed.
    pub async fn members(&self, confirmed: bool) -> BotResult<Vec<Arc<MiraiMember>>> {
        members(&self.bot, self.announcements.as_ref(), &self.native.fid, confirmed).await
    }

    /// Reminds members who have not confirmed.
    pub async fn remind(&self) -> BotResult<()> {
        Ok(self.announcements.remind(&self.native.fid).await?)
    }
}

async fn members(
    bot: &Arc<MiraiBot>,
    announcements: &dyn NativeAnnouncements,
    fid: &str,
    confirmed: bool,
) -> BotResult<Vec<Arc<MiraiMember>>> {
    Ok(announcements
        .members(fid, confirmed)
        .await?
        .into_iter()
        .map(|m| Arc::new(MiraiMember::new(bot.clone(), m)))
        .collect())
}

/// Announcement operations of one group.
pub struct MiraiAnnouncements {
    bot: Arc<MiraiBot>,
    group_id: i64,
    native: Arc<dyn NativeAnnouncements>,
}

impl MiraiAnnouncements {
    /// Wraps the native announcements of a group.
    pub fn new(bot: Arc<MiraiBot>, group_id: i64, native: Arc<dyn NativeAnnouncements>) -> Self {
        Self {
            bot,
            group_id,
            native,
        }
    }

    fn online(&self, native: NativeOnlineAnnouncement) -> MiraiOnlineAnnouncement {
        MiraiOnlineAnnouncement {
            bot: self.bot.clone(),
            native,
            announcements: self.native.clone(),
        }
    }

    /// Published announcements.
    pub async fn list(&self) -> BotResult<Vec<MiraiOnlineAnnouncement>> {
        let list = self.native.list().await?;
        Ok(list.into_iter().map(|a| self.online(a)).collect())
    }

    /// Finds an announcement.
    pub async fn get(&self, fid: &str) -> BotResult<Option<MiraiOnlineAnnouncement>> {
        Ok(self.native.get(fid).await?.map(|a| self.online(a)))
    }

    /// Publishes an announcement.
    pub async fn publish(&self, announcement: &MiraiAnnouncement) -> BotResult<MiraiOnlineAnnouncement> {
        let published = self
            .native
            .publish(&announcement.content, &announcement.parameters)
            .await?;
        info!(group_id = self.group_id, fid = %published.fid, "Announcement published");
        Ok(self.online(published))
    }

    /// Deletes an announcement. Returns false if it did not exist.
    pub async fn delete(&self, fid: &str) -> BotResult<bool> {
        Ok(self.native.delete(fid).await?)
    }

    /// Members who have, or have not, confirmed an announcement.
    pub async fn members(&self, fid: &str, confirmed: bool) -> BotResult<Vec<Arc<MiraiMember>>> {
        members(&self.bot, self.native.as_ref(), fid, confirmed).await
    }

    /// Reminds members who have not confirmed an announcement.
    pub async fn remind(&self, fid: &str) -> BotResult<()> {
        Ok(self.native.remind(fid).await?)
    }
}
