//! # simbot component for mirai
//!
//! This crate connects the simbot framework to a mirai-style QQ protocol
//! library.
//!
//! ## Overview
//!
//! The protocol library is reached through the object-safe traits in
//! [`native`]. Everything on top of them is provided here:
//!
//! - Wrappers implementing the framework objectives: [`MiraiBot`],
//!   [`MiraiFriend`], [`MiraiStranger`], [`MiraiGroup`], [`MiraiMember`]
//! - Event mapping from the native stream to framework [`event`]s
//! - Message translation in both directions, plus the cat-code text codec
//! - The recall message cache, contact caches and the group mute timer
//! - Verify info decoding, password sources and device identities
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use simbot_adapter_mirai::MiraiBotManager;
//! use simbot_core::{BotManager, ListenerDispatcher};
//!
//! let dispatcher = ListenerDispatcher::new()
//!     .with(&simbot_adapter_mirai::event::MIRAI_GROUP_MESSAGE, |event| async move {
//!         tracing::info!(key = %event.key(), "group message");
//!         Ok(())
//!     });
//!
//! let manager = MiraiBotManager::new(protocol_factory, Arc::new(dispatcher));
//! manager.register(&verify_info).await?;
//! manager.start().await?;
//! manager.join().await;
//! ```
//!
//! ## Event Hierarchy
//!
//! ```text
//! mirai.event
//! ├── mirai.bot_started             (bot lifecycle)
//! ├── mirai.friend_message, ...     (message events)
//! ├── mirai.friend_request, ...     (request events)
//! ├── mirai.member_card_change, ... (changed events)
//! └── mirai.group_nudge, ...        (notice events)
//! ```

pub mod bot;
pub mod config;
pub mod contact;
pub mod event;
pub mod manager;
pub mod message;
pub mod native;
pub mod receipt;
pub mod util;

pub use bot::{COMPONENT_ID, MiraiBot};
pub use config::{
    Config, ConfigError, DeviceInfo, DeviceInfoConfiguration, MiraiBotConfiguration,
    MiraiBotVerifyInfoConfiguration, PasswordInfoConfiguration, PasswordKind,
};
pub use contact::{
    MemberRole, MiraiAnnouncement, MiraiAnnouncements, MiraiFriend, MiraiGroup, MiraiMember,
    MiraiOnlineAnnouncement, MiraiStranger,
};
pub use manager::MiraiBotManager;
pub use message::{CatCode, CatCodec, MiraiForwardMessage, MiraiForwardNode, to_native, to_simbot};
pub use native::{NativeBot, NativeBotFactory, NativeEvent, NativeUserProfile, UserSex};
pub use receipt::MiraiMessageReceipt;
pub use util::RecallMessageCacheStrategy;
