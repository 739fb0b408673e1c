//! Bot verify info and effective configuration.
//!
//! A mirai verify info document looks like:
//!
//! ```json
//! {
//!   "code": 123456789,
//!   "passwordInfo": { "type": "text", "text": "password" },
//!   "config": {
//!     "protocol": "ANDROID_PAD",
//!     "deviceInfo": { "type": "auto", "baseDir": "devices" },
//!     "recallMessageCacheStrategy": "memory-lru"
//!   }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::device::{DEFAULT_DEVICE_INFO_SEED, DeviceInfo, DeviceInfoConfiguration, simbot_device_info};
use super::error::{ConfigError, ConfigResult};
use super::password::{PasswordInfoConfiguration, PasswordKind, md5_from_hex};

/// Declares an enum whose names deserialize ignoring case, with `-` read as `_`.
macro_rules! config_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Canonical name.
            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $text ),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ConfigError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().replace('-', "_").to_ascii_uppercase();
                match normalized.as_str() {
                    $( $text => Ok(Self::$variant), )+
                    _ => Err(ConfigError::unknown_enum(stringify!($name), s)),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.name())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                text.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

config_enum! {
    /// Heartbeat strategy of the protocol library.
    HeartbeatStrategy {
        /// Stat heartbeat.
        StatHb => "STAT_HB",
        /// Register packets as heartbeat.
        Register => "REGISTER",
        /// No heartbeat.
        None => "NONE",
    }
}

config_enum! {
    /// Client protocol to impersonate.
    MiraiProtocol {
        /// Android phone.
        AndroidPhone => "ANDROID_PHONE",
        /// Android pad.
        AndroidPad => "ANDROID_PAD",
        /// Android watch.
        AndroidWatch => "ANDROID_WATCH",
        /// iPad.
        Ipad => "IPAD",
        /// macOS.
        Macos => "MACOS",
    }
}

config_enum! {
    /// Recall message cache strategy.
    RecallMessageCacheStrategyType {
        /// Cache nothing.
        Invalid => "INVALID",
        /// Per-bot LRU segments in memory.
        MemoryLru => "MEMORY_LRU",
    }
}

/// Contact list cache settings of the protocol library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactListCache {
    /// Save interval.
    pub save_interval_millis: i64,
    /// Cache the friend list.
    pub friend_list_cache_enabled: bool,
    /// Cache group member lists.
    pub group_member_list_cache_enabled: bool,
}

impl Default for ContactListCache {
    fn default() -> Self {
        Self {
            save_interval_millis: 60_000,
            friend_list_cache_enabled: false,
            group_member_list_cache_enabled: false,
        }
    }
}

/// Bot settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Seed for the default device info.
    pub device_info_seed: i64,
    /// Working directory of the protocol library.
    pub working_dir: PathBuf,
    /// Heartbeat period.
    pub heartbeat_period_millis: i64,
    /// Stat heartbeat period.
    pub stat_heartbeat_period_millis: i64,
    /// Heartbeat timeout.
    pub heartbeat_timeout_millis: i64,
    /// Heartbeat strategy.
    pub heartbeat_strategy: HeartbeatStrategy,
    /// Reconnection attempts.
    pub reconnection_retry_times: i32,
    /// Reconnect after being forced offline.
    pub auto_reconnect_on_force_offline: bool,
    /// Client protocol.
    pub protocol: MiraiProtocol,
    /// Parallel upload workers.
    pub highway_upload_coroutine_count: i32,
    /// Device info source. Defaults to a device derived from the bot code and
    /// `deviceInfoSeed`.
    pub device_info: Option<DeviceInfoConfiguration>,
    /// Silence the network log.
    pub no_network_log: bool,
    /// Silence the bot log.
    pub no_bot_log: bool,
    /// Log every event verbosely.
    pub is_showing_verbose_event_log: bool,
    /// Cache directory, relative to the working directory.
    pub cache_dir: PathBuf,
    /// Contact list cache settings.
    pub contact_list_cache: ContactListCache,
    /// Keep the login session between runs.
    pub login_cache_enabled: bool,
    /// Convert line separators in outgoing text.
    pub convert_line_separator: bool,
    /// Recall message cache strategy.
    pub recall_message_cache_strategy: RecallMessageCacheStrategyType,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_info_seed: DEFAULT_DEVICE_INFO_SEED,
            working_dir: PathBuf::from("."),
            heartbeat_period_millis: 60_000,
            stat_heartbeat_period_millis: 300_000,
            heartbeat_timeout_millis: 5_000,
            heartbeat_strategy: HeartbeatStrategy::StatHb,
            reconnection_retry_times: i32::MAX,
            auto_reconnect_on_force_offline: false,
            protocol: MiraiProtocol::AndroidPhone,
            highway_upload_coroutine_count: 4,
            device_info: None,
            no_network_log: false,
            no_bot_log: false,
            is_showing_verbose_event_log: false,
            cache_dir: PathBuf::from("cache"),
            contact_list_cache: ContactListCache::default(),
            login_cache_enabled: true,
            convert_line_separator: true,
            recall_message_cache_strategy: RecallMessageCacheStrategyType::Invalid,
        }
    }
}

/// A mirai verify info document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiraiBotVerifyInfoConfiguration {
    /// Account id.
    pub code: i64,
    /// Password source.
    #[serde(default)]
    pub password_info: Option<PasswordInfoConfiguration>,
    /// Legacy plain password.
    #[serde(default)]
    pub password: Option<String>,
    /// Legacy md5 hex password.
    #[serde(default, rename = "passwordMD5")]
    pub password_md5: Option<String>,
    /// Legacy md5 bytes password.
    #[serde(default, rename = "passwordMD5Bytes")]
    pub password_md5_bytes: Option<Vec<u8>>,
    /// Bot settings.
    #[serde(default)]
    pub config: Config,
}

impl MiraiBotVerifyInfoConfiguration {
    /// Resolves the password, preferring `passwordInfo` over legacy fields.
    pub fn password_kind(&self) -> ConfigResult<PasswordKind> {
        if let Some(info) = &self.password_info {
            return info.resolve(self.code);
        }
        if let Some(password) = &self.password {
            return Ok(PasswordKind::Text(password.clone()));
        }
        if let Some(md5) = &self.password_md5 {
            return md5_from_hex(md5).map(PasswordKind::Md5);
        }
        if let Some(bytes) = &self.password_md5_bytes {
            return PasswordInfoConfiguration::Md5Bytes { md5: bytes.clone() }.resolve(self.code);
        }
        Err(ConfigError::MissingPassword)
    }

    /// Builds the effective configuration, resolving device info.
    pub fn bot_configuration(&self, resource_root: &Path) -> ConfigResult<MiraiBotConfiguration> {
        let device_info = match &self.config.device_info {
            Some(device) => device.resolve(self.code, resource_root)?,
            None => simbot_device_info(self.code, self.config.device_info_seed),
        };
        Ok(MiraiBotConfiguration {
            config: self.config.clone(),
            device_info,
        })
    }
}

/// The configuration a protocol bot is created with.
#[derive(Debug, Clone, PartialEq)]
pub struct MiraiBotConfiguration {
    /// Bot settings.
    pub config: Config,
    /// Resolved device identity.
    pub device_info: DeviceInfo,
}

impl MiraiBotConfiguration {
    /// Default settings with a device derived from `code`.
    pub fn for_code(code: i64) -> Self {
        Self {
            config: Config::default(),
            device_info: simbot_device_info(code, DEFAULT_DEVICE_INFO_SEED),
        }
    }

    /// Recall cache strategy.
    pub fn recall_message_cache_strategy(&self) -> RecallMessageCacheStrategyType {
        self.config.recall_message_cache_strategy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.heartbeat_strategy, HeartbeatStrategy::StatHb);
        assert_eq!(config.reconnection_retry_times, i32::MAX);
        assert_eq!(config.contact_list_cache.save_interval_millis, 60_000);
        assert!(config.login_cache_enabled);
        assert_eq!(
            config.recall_message_cache_strategy,
            RecallMessageCacheStrategyType::Invalid
        );
    }

    #[test]
    fn test_enums_ignore_case_and_dashes() {
        let yaml = r#"
protocol: android-pad
heartbeatStrategy: register
recallMessageCacheStrategy: Memory-Lru
contactListCache:
  friendListCacheEnabled: true
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.protocol, MiraiProtocol::AndroidPad);
        assert_eq!(config.heartbeat_strategy, HeartbeatStrategy::Register);
        assert_eq!(
            config.recall_message_cache_strategy,
            RecallMessageCacheStrategyType::MemoryLru
        );
        assert!(config.contact_list_cache.friend_list_cache_enabled);
        assert_eq!(config.contact_list_cache.save_interval_millis, 60_000);

        assert!(serde_json::from_str::<MiraiProtocol>(r#""WINDOWS""#).is_err());
        assert_eq!(
            serde_json::to_string(&MiraiProtocol::AndroidWatch).unwrap(),
            r#""ANDROID_WATCH""#
        );
    }

    #[test]
    fn test_legacy_password_fields() {
        let verify: MiraiBotVerifyInfoConfiguration =
            serde_json::from_str(r#"{"code": 1, "password": "pwd"}"#).unwrap();
        assert_eq!(verify.password_kind().unwrap(), PasswordKind::Text("pwd".into()));

        let verify: MiraiBotVerifyInfoConfiguration = serde_json::from_str(
            r#"{"code": 1, "passwordMD5": "00112233445566778899aabbccddeeff"}"#,
        )
        .unwrap();
        assert!(matches!(verify.password_kind().unwrap(), PasswordKind::Md5(b) if b[1] == 0x11));

        let verify: MiraiBotVerifyInfoConfiguration =
            serde_json::from_str(r#"{"code": 1}"#).unwrap();
        let err = verify.password_kind().unwrap_err();
        assert_eq!(err.to_string(), "One of the [password] or [passwordMD5] must exist");
    }

    #[test]
    fn test_password_info_wins_over_legacy() {
        let verify: MiraiBotVerifyInfoConfiguration = serde_json::from_str(
            r#"{"code": 1, "password": "legacy", "passwordInfo": {"type": "text", "text": "new"}}"#,
        )
        .unwrap();
        assert_eq!(verify.password_kind().unwrap(), PasswordKind::Text("new".into()));
    }

    #[test]
    fn test_default_device_uses_seed() {
        let verify: MiraiBotVerifyInfoConfiguration = serde_json::from_str(
            r#"{"code": 10086, "password": "x", "config": {"deviceInfoSeed": 3}}"#,
        )
        .unwrap();
        let configuration = verify.bot_configuration(Path::new(".")).unwrap();
        assert_eq!(configuration.device_info, simbot_device_info(10086, 3));
    }
}
