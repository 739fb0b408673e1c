//! Integration layer - Interfaces implemented by components.
//!
//! - Bot, contact and receipt traits
//! - Bot managers that turn verify info into bots

pub mod manager;
pub mod objective;

pub use manager::{BotManager, BotVerifyInfo, BoxedBotManager};
pub use objective::{
    Bot, BoxedBot, BoxedReceipt, Contact, Friend, Group, Member, MessageReceipt, Role, Stranger,
    downcast_bot,
};
