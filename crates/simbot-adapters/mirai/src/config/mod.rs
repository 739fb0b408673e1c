//! Mirai bot configuration: verify info, password and device sources.

pub mod bot;
pub mod device;
pub mod error;
pub mod password;
pub mod properties;

pub use bot::{
    Config, ContactListCache, HeartbeatStrategy, MiraiBotConfiguration,
    MiraiBotVerifyInfoConfiguration, MiraiProtocol, RecallMessageCacheStrategyType,
};
pub use device::{
    DeviceInfo, DeviceInfoConfiguration, SimpleDeviceInfo, load_device_info, random_device_info,
    simbot_device_info,
};
pub use error::{ConfigError, ConfigResult};
pub use password::{PasswordInfoConfiguration, PasswordKind};
pub use properties::{property, remove_property, set_property};
