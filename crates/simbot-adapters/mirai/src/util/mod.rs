//! Caches and timers used by the bot wrapper.

pub mod lru;
pub mod mute;
pub mod recall;

pub use lru::LruCacheMap;
pub use mute::GroupMuteTimer;
pub use recall::{
    BoxedRecallStrategy, InvalidRecallStrategy, MemoryLruRecallStrategy, RecallKey,
    RecallMessageCacheStrategy, recall_strategy,
};
