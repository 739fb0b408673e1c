//! Recall message cache strategies.
//!
//! Recall notifications only carry message ids. A strategy keeps recent
//! inbound chains so that recall events can expose what was recalled.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;

use super::lru::LruCacheMap;
use crate::config::RecallMessageCacheStrategyType;
use crate::native::{NativeMessageChain, NativeMessageSource};

/// Stores and looks up recently received chains.
pub trait RecallMessageCacheStrategy: Send + Sync {
    /// Remembers a group message.
    fn cache_group_message(&self, bot_id: i64, group_id: i64, chain: &NativeMessageChain);

    /// Remembers a friend message.
    fn cache_friend_message(&self, bot_id: i64, friend_id: i64, chain: &NativeMessageChain);

    /// Looks up a recalled group message.
    fn group_message_cache(&self, bot_id: i64, group_id: i64, key: &RecallKey) -> Option<NativeMessageChain>;

    /// Looks up a recalled friend message.
    fn friend_message_cache(&self, bot_id: i64, friend_id: i64, key: &RecallKey) -> Option<NativeMessageChain>;

    /// Called once the bot is cancelled.
    fn on_bot_completion(&self, bot_id: i64);
}

/// Shared strategy handle.
pub type BoxedRecallStrategy = Arc<dyn RecallMessageCacheStrategy>;

/// Creates the strategy for a configured type.
pub fn recall_strategy(kind: RecallMessageCacheStrategyType) -> BoxedRecallStrategy {
    match kind {
        RecallMessageCacheStrategyType::Invalid => Arc::new(InvalidRecallStrategy),
        RecallMessageCacheStrategyType::MemoryLru => Arc::new(MemoryLruRecallStrategy::default()),
    }
}

// =============================================================================
// Cache key
// =============================================================================

/// Identity of a message shared by inbound chains and recall notifications.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecallKey(String);

impl RecallKey {
    /// Builds the key from message ids, internal ids and time.
    pub fn new(ids: &[i32], internal_ids: &[i32], time: i32) -> Self {
        Self(format!("{},{},,{time}", join(ids), join(internal_ids)))
    }

    /// Builds the key of an inbound message.
    pub fn of_source(source: &NativeMessageSource) -> Self {
        Self::new(&source.ids, &source.internal_ids, source.time)
    }

    /// Key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn join(ids: &[i32]) -> String {
    ids.iter().map(i32::to_string).collect::<Vec<_>>().join(".")
}

// =============================================================================
// Strategies
// =============================================================================

/// Caches nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvalidRecallStrategy;

impl RecallMessageCacheStrategy for InvalidRecallStrategy {
    fn cache_group_message(&self, _: i64, _: i64, _: &NativeMessageChain) {}

    fn cache_friend_message(&self, _: i64, _: i64, _: &NativeMessageChain) {}

    fn group_message_cache(&self, _: i64, _: i64, _: &RecallKey) -> Option<NativeMessageChain> {
        None
    }

    fn friend_message_cache(&self, _: i64, _: i64, _: &RecallKey) -> Option<NativeMessageChain> {
        None
    }

    fn on_bot_completion(&self, _: i64) {}
}

/// Default group segment capacity.
pub const DEFAULT_GROUP_MAX_SIZE: usize = 767;

/// Default friend segment capacity.
pub const DEFAULT_FRIEND_MAX_SIZE: usize = 95;

type Segment = Arc<RwLock<LruCacheMap<RecallKey, NativeMessageChain>>>;

#[derive(Default)]
struct BotSegments {
    groups: DashMap<i64, Segment>,
    friends: DashMap<i64, Segment>,
}

/// Per-bot, per-conversation LRU segments in memory.
pub struct MemoryLruRecallStrategy {
    group_max_size: usize,
    friend_max_size: usize,
    bots: DashMap<i64, Arc<BotSegments>>,
}

impl Default for MemoryLruRecallStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_GROUP_MAX_SIZE, DEFAULT_FRIEND_MAX_SIZE)
    }
}

impl MemoryLruRecallStrategy {
    /// Creates a strategy with explicit segment capacities.
    pub fn new(group_max_size: usize, friend_max_size: usize) -> Self {
        Self {
            group_max_size,
            friend_max_size,
            bots: DashMap::new(),
        }
    }

    fn bot(&self, bot_id: i64) -> Arc<BotSegments> {
        self.bots.entry(bot_id).or_default().clone()
    }

    fn segment(map: &DashMap<i64, Segment>, id: i64, max_size: usize) -> Segment {
        map.entry(id)
            .or_insert_with(|| Arc::new(RwLock::new(LruCacheMap::with_max_size(max_size))))
            .clone()
    }

    fn lookup(map: &DashMap<i64, Segment>, id: i64, key: &RecallKey) -> Option<NativeMessageChain> {
        let segment = map.get(&id)?.clone();
        let found = segment.read().peek(key).cloned();
        found
    }

    /// Number of bots with cached segments.
    pub fn bot_count(&self) -> usize {
        self.bots.len()
    }
}

impl RecallMessageCacheStrategy for MemoryLruRecallStrategy {
    fn cache_group_message(&self, bot_id: i64, group_id: i64, chain: &NativeMessageChain) {
        let Some(source) = &chain.source else {
            return;
        };
        let segment = Self::segment(&self.bot(bot_id).groups, group_id, self.group_max_size);
        segment.write().insert(RecallKey::of_source(source), chain.clone());
    }

    fn cache_friend_message(&self, bot_id: i64, friend_id: i64, chain: &NativeMessageChain) {
        let Some(source) = &chain.source else {
            return;
        };
        let segment = Self::segment(&self.bot(bot_id).friends, friend_id, self.friend_max_size);
        segment.write().insert(RecallKey::of_source(source), chain.clone());
    }

    fn group_message_cache(&self, bot_id: i64, group_id: i64, key: &RecallKey) -> Option<NativeMessageChain> {
        let bot = self.bots.get(&bot_id)?.clone();
        Self::lookup(&bot.groups, group_id, key)
    }

    fn friend_message_cache(&self, bot_id: i64, friend_id: i64, key: &RecallKey) -> Option<NativeMessageChain> {
        let bot = self.bots.get(&bot_id)?.clone();
        Self::lookup(&bot.friends, friend_id, key)
    }

    /// Drops every segment of `bot_id`. A strategy shared between bots keeps
    /// the other bots' segments.
    fn on_bot_completion(&self, bot_id: i64) {
        self.bots.remove(&bot_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{MessageSourceKind, NativeMessage};

    fn chain(ids: Vec<i32>, text: &str) -> NativeMessageChain {
        NativeMessageChain::new(vec![NativeMessage::PlainText(text.into())]).with_source(
            NativeMessageSource {
                internal_ids: ids.iter().map(|i| i + 100).collect(),
                ids,
                time: 1_650_000_000,
                from_id: 2,
                target_id: 3,
                kind: MessageSourceKind::Group,
                original_message: vec![],
            },
        )
    }

    #[test]
    fn test_key_format() {
        let key = RecallKey::new(&[1, 2], &[3], 99);
        assert_eq!(key.as_str(), "1.2,3,,99");
        assert_eq!(RecallKey::new(&[], &[], 5).as_str(), ",,,5");
    }

    #[test]
    fn test_invalid_caches_nothing() {
        let strategy = recall_strategy(RecallMessageCacheStrategyType::Invalid);
        let chain = chain(vec![1], "hi");
        strategy.cache_group_message(1, 10, &chain);
        let key = RecallKey::of_source(chain.source.as_ref().unwrap());
        assert!(strategy.group_message_cache(1, 10, &key).is_none());
    }

    #[test]
    fn test_memory_lru_round_trip_per_conversation() {
        let strategy = MemoryLruRecallStrategy::default();
        let chain = chain(vec![7], "hello");
        let key = RecallKey::of_source(chain.source.as_ref().unwrap());

        strategy.cache_group_message(1, 10, &chain);
        assert_eq!(strategy.group_message_cache(1, 10, &key), Some(chain.clone()));
        assert!(strategy.group_message_cache(1, 11, &key).is_none());
        assert!(strategy.friend_message_cache(1, 10, &key).is_none());
        assert!(strategy.group_message_cache(2, 10, &key).is_none());

        strategy.cache_friend_message(1, 20, &chain);
        assert!(strategy.friend_message_cache(1, 20, &key).is_some());

        strategy.on_bot_completion(1);
        assert!(strategy.group_message_cache(1, 10, &key).is_none());
        assert_eq!(strategy.bot_count(), 0);
    }

    #[test]
    fn test_memory_lru_evicts_oldest() {
        let strategy = MemoryLruRecallStrategy::new(3, 3);
        let chains: Vec<_> = (0..3).map(|i| chain(vec![i], "m")).collect();
        for c in &chains {
            strategy.cache_friend_message(1, 5, c);
        }
        let first = RecallKey::of_source(chains[0].source.as_ref().unwrap());
        let last = RecallKey::of_source(chains[2].source.as_ref().unwrap());
        assert!(strategy.friend_message_cache(1, 5, &first).is_none());
        assert!(strategy.friend_message_cache(1, 5, &last).is_some());
    }

    #[test]
    fn test_completion_clears_only_that_bot() {
        let strategy = MemoryLruRecallStrategy::default();
        let chain = chain(vec![3], "bye");
        let key = RecallKey::of_source(chain.source.as_ref().unwrap());
        strategy.cache_group_message(1, 10, &chain);
        strategy.cache_friend_message(1, 20, &chain);
        strategy.cache_group_message(2, 10, &chain);

        strategy.on_bot_completion(1);
        assert!(strategy.group_message_cache(1, 10, &key).is_none());
        assert!(strategy.friend_message_cache(1, 20, &key).is_none());
        assert!(strategy.group_message_cache(2, 10, &key).is_some());
        assert_eq!(strategy.bot_count(), 1);
    }

    #[test]
    fn test_chain_without_source_is_skipped() {
        let strategy = MemoryLruRecallStrategy::default();
        strategy.cache_group_message(1, 10, &NativeMessageChain::new(vec![]));
        assert_eq!(strategy.bot_count(), 0);
    }
}
