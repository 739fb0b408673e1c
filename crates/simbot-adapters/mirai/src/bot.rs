//! The mirai bot wrapper.
//!
//! `MiraiBot` wraps one native bot and implements the framework [`Bot`]
//! trait. It owns the per-bot state: the login lock, the recall cache
//! strategy, the group mute timer and the optional contact caches.
//!
//! # Usage
//!
//! ```rust,ignore
//! use simbot_adapter_mirai::MiraiBot;
//! use simbot_core::downcast_bot;
//!
//! if let Some(mirai) = downcast_bot::<MiraiBot>(bot) {
//!     if let Some(group) = mirai.mirai_group(123456)? {
//!         group.mute_seconds(60).await?;
//!     }
//! }
//! ```

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::Mutex;
use simbot_core::{
    Bot, BotError, BotResult, BoxedEvent, BoxedEventProcessor, Contact, Element, Friend, Group, Id,
    Resource,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::MiraiBotConfiguration;
use crate::contact::{MiraiFriend, MiraiGroup, MiraiMember, MiraiStranger};
use crate::event::{MIRAI_BOT_STARTED, BotStartedEvent, EventBase};
use crate::manager::MiraiBotManager;
use crate::message::{MiraiImage, MiraiSendOnlyImage};
use crate::native::{NativeBot, NativeFriend, NativeGroup, NativeMember, NativeStranger};
use crate::event::switchboard;
use crate::util::{BoxedRecallStrategy, GroupMuteTimer, LruCacheMap, recall_strategy};

/// Component id of the mirai component.
pub const COMPONENT_ID: &str = "simbot.mirai";

/// Smallest contact cache capacity.
const MIN_CONTACT_CACHE_SIZE: usize = 16;

// =============================================================================
// Contact cache
// =============================================================================

/// Wrappers keyed by native id, sized on first use.
struct ContactCache<T> {
    map: Mutex<Option<LruCacheMap<i64, Arc<T>>>>,
}

impl<T> Default for ContactCache<T> {
    fn default() -> Self {
        Self {
            map: Mutex::new(None),
        }
    }
}

impl<T> ContactCache<T> {
    fn get_or_wrap(
        &self,
        enabled: bool,
        id: i64,
        native_count: impl FnOnce() -> usize,
        wrap: impl FnOnce() -> Arc<T>,
    ) -> Arc<T> {
        if !enabled {
            return wrap();
        }
        let mut guard = self.map.lock();
        let map = guard.get_or_insert_with(|| {
            LruCacheMap::with_max_size((native_count() / 2).max(MIN_CONTACT_CACHE_SIZE))
        });
        map.get_or_insert_with(id, wrap)
    }

    fn len(&self) -> usize {
        self.map.lock().as_ref().map_or(0, LruCacheMap::len)
    }

    fn clear(&self) {
        *self.map.lock() = None;
    }
}

// =============================================================================
// MiraiBot
// =============================================================================

/// A bot of the mirai component.
pub struct MiraiBot {
    me: Weak<MiraiBot>,
    native: Arc<dyn NativeBot>,
    processor: BoxedEventProcessor,
    manager: Weak<MiraiBotManager>,
    configuration: MiraiBotConfiguration,
    recall_strategy: BoxedRecallStrategy,
    mute_timer: GroupMuteTimer,
    cancel_token: CancellationToken,
    login_lock: tokio::sync::Mutex<()>,
    events_registered: AtomicBool,
    started: AtomicBool,
    cache_contacts: AtomicBool,
    friends: ContactCache<MiraiFriend>,
    groups: ContactCache<MiraiGroup>,
    strangers: ContactCache<MiraiStranger>,
}

impl MiraiBot {
    /// Wraps a native bot. The bot is not started.
    pub fn new(
        native: Arc<dyn NativeBot>,
        processor: BoxedEventProcessor,
        manager: Weak<MiraiBotManager>,
        configuration: MiraiBotConfiguration,
    ) -> Arc<Self> {
        let recall_strategy = recall_strategy(configuration.recall_message_cache_strategy());
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            native,
            processor,
            manager,
            configuration,
            recall_strategy,
            mute_timer: GroupMuteTimer::new(),
            cancel_token: CancellationToken::new(),
            login_lock: tokio::sync::Mutex::new(()),
            events_registered: AtomicBool::new(false),
            started: AtomicBool::new(false),
            cache_contacts: AtomicBool::new(false),
            friends: ContactCache::default(),
            groups: ContactCache::default(),
            strangers: ContactCache::default(),
        })
    }

    fn shared(&self) -> BotResult<Arc<Self>> {
        self.me
            .upgrade()
            .ok_or_else(|| BotError::native(format!("bot {} has been dropped", self.code())))
    }

    /// Account id.
    pub fn code(&self) -> i64 {
        self.native.id()
    }

    /// The native bot.
    pub fn native_bot(&self) -> &Arc<dyn NativeBot> {
        &self.native
    }

    /// Where this bot pushes its events.
    pub fn event_processor(&self) -> &BoxedEventProcessor {
        &self.processor
    }

    /// The manager that registered this bot, if it is still alive.
    pub fn manager(&self) -> Option<Arc<MiraiBotManager>> {
        self.manager.upgrade()
    }

    /// The configuration the native bot was created with.
    pub fn configuration(&self) -> &MiraiBotConfiguration {
        &self.configuration
    }

    /// The recall cache strategy.
    pub fn recall_cache_strategy(&self) -> &BoxedRecallStrategy {
        &self.recall_strategy
    }

    pub(crate) fn mute_timer(&self) -> &GroupMuteTimer {
        &self.mute_timer
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    /// Enables or disables the contact caches. Disabling clears them.
    pub fn cache_contacts(&self, enabled: bool) {
        self.cache_contacts.store(enabled, Ordering::SeqCst);
        if !enabled {
            self.clear_caches();
        }
    }

    fn caching(&self) -> bool {
        self.cache_contacts.load(Ordering::SeqCst)
    }

    fn clear_caches(&self) {
        self.friends.clear();
        self.groups.clear();
        self.strangers.clear();
    }

    /// Number of cached wrappers: friends, groups, strangers.
    pub fn cached_contacts(&self) -> (usize, usize, usize) {
        (self.friends.len(), self.groups.len(), self.strangers.len())
    }

    /// True once cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// An image already known to the server.
    pub fn id_image(&self, id: impl Into<String>, flash: bool) -> Element {
        Element::extension(MiraiImage::from_id(id, flash))
    }

    /// An image uploaded to whichever contact it is sent to.
    pub fn send_only_image(&self, resource: Resource, flash: bool) -> Element {
        Element::extension(MiraiSendOnlyImage { resource, flash })
    }

    // ===== Wrapping =====

    /// Wraps a native friend, through the cache when enabled.
    pub fn wrap_friend(self: &Arc<Self>, native: Arc<dyn NativeFriend>) -> Arc<MiraiFriend> {
        self.friends.get_or_wrap(
            self.caching(),
            native.id(),
            || self.native.friends().len(),
            || Arc::new(MiraiFriend::new(self.clone(), native)),
        )
    }

    /// Wraps a native group, through the cache when enabled.
    pub fn wrap_group(self: &Arc<Self>, native: Arc<dyn NativeGroup>) -> Arc<MiraiGroup> {
        self.groups.get_or_wrap(
            self.caching(),
            native.id(),
            || self.native.groups().len(),
            || Arc::new(MiraiGroup::new(self.clone(), native)),
        )
    }

    /// Wraps a native stranger, through the cache when enabled.
    pub fn wrap_stranger(self: &Arc<Self>, native: Arc<dyn NativeStranger>) -> Arc<MiraiStranger> {
        self.strangers.get_or_wrap(
            self.caching(),
            native.id(),
            || self.native.strangers().len(),
            || Arc::new(MiraiStranger::new(self.clone(), native)),
        )
    }

    /// Wraps a native member.
    pub fn wrap_member(self: &Arc<Self>, native: Arc<dyn NativeMember>) -> Arc<MiraiMember> {
        Arc::new(MiraiMember::new(self.clone(), native))
    }

    // ===== Lookups =====

    /// Finds a friend.
    pub fn mirai_friend(&self, id: i64) -> BotResult<Option<Arc<MiraiFriend>>> {
        let me = self.shared()?;
        Ok(self.native.get_friend(id).map(|f| me.wrap_friend(f)))
    }

    /// All friends.
    pub fn mirai_friends(&self) -> BotResult<Vec<Arc<MiraiFriend>>> {
        let me = self.shared()?;
        Ok(self.native.friends().into_iter().map(|f| me.wrap_friend(f)).collect())
    }

    /// Finds a group.
    pub fn mirai_group(&self, id: i64) -> BotResult<Option<Arc<MiraiGroup>>> {
        let me = self.shared()?;
        Ok(self.native.get_group(id).map(|g| me.wrap_group(g)))
    }

    /// All groups.
    pub fn mirai_groups(&self) -> BotResult<Vec<Arc<MiraiGroup>>> {
        let me = self.shared()?;
        Ok(self.native.groups().into_iter().map(|g| me.wrap_group(g)).collect())
    }

    /// Finds a stranger.
    pub fn mirai_stranger(&self, id: i64) -> BotResult<Option<Arc<MiraiStranger>>> {
        let me = self.shared()?;
        Ok(self.native.get_stranger(id).map(|s| me.wrap_stranger(s)))
    }

    /// All strangers.
    pub fn mirai_strangers(&self) -> BotResult<Vec<Arc<MiraiStranger>>> {
        let me = self.shared()?;
        Ok(self
            .native
            .strangers()
            .into_iter()
            .map(|s| me.wrap_stranger(s))
            .collect())
    }

    /// The bot viewed as its own friend.
    pub fn as_friend(&self) -> BotResult<Arc<MiraiFriend>> {
        let me = self.shared()?;
        Ok(Arc::new(MiraiFriend::new(me, self.native.as_friend())))
    }
}

#[async_trait]
impl Bot for MiraiBot {
    fn id(&self) -> Id {
        Id::Long(self.code())
    }

    fn username(&self) -> String {
        self.native.nick()
    }

    fn avatar(&self) -> String {
        self.native.avatar_url()
    }

    fn component(&self) -> &'static str {
        COMPONENT_ID
    }

    fn is_me(&self, id: &Id) -> bool {
        id.to_long() == Some(self.code())
    }

    fn is_active(&self) -> bool {
        self.started.load(Ordering::SeqCst) && !self.is_cancelled()
    }

    async fn start(&self) -> BotResult<bool> {
        let _login = self.login_lock.lock().await;
        let bot_id = self.code();
        if self.is_cancelled() {
            warn!(bot_id, "Cannot start a cancelled bot");
            return Ok(false);
        }
        if self.started.load(Ordering::SeqCst) {
            return Ok(false);
        }

        let me = self.shared()?;
        if !self.events_registered.swap(true, Ordering::SeqCst) {
            switchboard::register(&me);
        }

        if let Err(e) = self.native.login().await {
            warn!(bot_id, error = %e, "Bot login failed");
            return Err(e.into());
        }
        self.started.store(true, Ordering::SeqCst);
        info!(bot_id, nick = %self.native.nick(), "Bot started");

        if self.processor.is_processable(&MIRAI_BOT_STARTED) {
            let event = BotStartedEvent::new(EventBase::new(me, None));
            let result = self.processor.push(BoxedEvent::new(event)).await;
            debug!(bot_id, invoked = result.invoked, "Bot started event pushed");
        }
        Ok(true)
    }

    async fn cancel(&self) -> BotResult<bool> {
        if self.cancel_token.is_cancelled() {
            return Ok(false);
        }
        self.cancel_token.cancel();

        let bot_id = self.code();
        self.native.close().await;
        self.recall_strategy.on_bot_completion(bot_id);
        self.mute_timer.cancel_all();
        self.clear_caches();
        self.started.store(false, Ordering::SeqCst);
        info!(bot_id, "Bot cancelled");
        Ok(true)
    }

    async fn join(&self) {
        tokio::select! {
            _ = self.cancel_token.cancelled() => {}
            _ = self.native.join() => {}
        }
    }

    async fn friend(&self, id: &Id) -> BotResult<Option<Arc<dyn Friend>>> {
        let Some(id) = id.to_long() else {
            return Ok(None);
        };
        Ok(self.mirai_friend(id)?.map(|f| f as Arc<dyn Friend>))
    }

    async fn friends(&self) -> BotResult<Vec<Arc<dyn Friend>>> {
        Ok(self
            .mirai_friends()?
            .into_iter()
            .map(|f| f as Arc<dyn Friend>)
            .collect())
    }

    async fn group(&self, id: &Id) -> BotResult<Option<Arc<dyn Group>>> {
        let Some(id) = id.to_long() else {
            return Ok(None);
        };
        Ok(self.mirai_group(id)?.map(|g| g as Arc<dyn Group>))
    }

    async fn groups(&self) -> BotResult<Vec<Arc<dyn Group>>> {
        Ok(self
            .mirai_groups()?
            .into_iter()
            .map(|g| g as Arc<dyn Group>)
            .collect())
    }

    async fn contact(&self, id: &Id) -> BotResult<Option<Arc<dyn Contact>>> {
        let Some(id) = id.to_long() else {
            return Ok(None);
        };
        if let Some(friend) = self.mirai_friend(id)? {
            return Ok(Some(friend));
        }
        Ok(self.mirai_stranger(id)?.map(|s| s as Arc<dyn Contact>))
    }

    async fn contacts(&self) -> BotResult<Vec<Arc<dyn Contact>>> {
        let friends = self.mirai_friends()?.into_iter().map(|f| f as Arc<dyn Contact>);
        let strangers = self
            .mirai_strangers()?
            .into_iter()
            .map(|s| s as Arc<dyn Contact>);
        Ok(friends.chain(strangers).collect())
    }

    async fn resolve_image(&self, id: &Id) -> BotResult<Element> {
        let id = id.literal();
        if id.is_empty() {
            return Err(BotError::invalid_argument("image id is empty"));
        }
        Ok(self.id_image(id, false))
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
