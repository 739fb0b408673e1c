//! Password sources.
//!
//! ```yaml
//! passwordInfo:
//!   type: env_text
//!   env: MIRAI_PASSWORD_$CODE$
//! ```

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};
use super::properties::property;

/// Placeholder replaced by the bot code in property and variable names.
pub const CODE_MARK: &str = "$CODE$";

/// How the bot authenticates.
#[derive(Clone, PartialEq, Eq)]
pub enum PasswordKind {
    /// Plain password.
    Text(String),
    /// MD5 digest of the password.
    Md5([u8; 16]),
    /// Scan a QR code with the mobile client.
    QrCode,
}

impl std::fmt::Debug for PasswordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(_) => f.write_str("Text(***)"),
            Self::Md5(_) => f.write_str("Md5(***)"),
            Self::QrCode => f.write_str("QrCode"),
        }
    }
}

/// Where to read the password from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PasswordInfoConfiguration {
    /// Plain text.
    Text {
        /// The password.
        text: String,
    },
    /// MD5 digest as hex.
    Md5Text {
        /// 32 hex digits.
        md5: String,
    },
    /// MD5 digest as bytes.
    Md5Bytes {
        /// 16 bytes.
        md5: Vec<u8>,
    },
    /// Plain text read from a property or an environment variable.
    EnvText {
        /// Property name.
        #[serde(default)]
        prop: Option<String>,
        /// Environment variable name.
        #[serde(default)]
        env: Option<String>,
    },
    /// MD5 hex read from a property or an environment variable.
    EnvMd5Text {
        /// Property name.
        #[serde(default)]
        prop: Option<String>,
        /// Environment variable name.
        #[serde(default)]
        env: Option<String>,
    },
    /// QR code login.
    QrCode,
}

impl PasswordInfoConfiguration {
    /// Resolves the password for the bot `code`.
    pub fn resolve(&self, code: i64) -> ConfigResult<PasswordKind> {
        match self {
            Self::Text { text } => Ok(PasswordKind::Text(text.clone())),
            Self::Md5Text { md5 } => md5_from_hex(md5).map(PasswordKind::Md5),
            Self::Md5Bytes { md5 } => md5_from_bytes(md5).map(PasswordKind::Md5),
            Self::EnvText { prop, env } => {
                env_value(prop.as_deref(), env.as_deref(), code).map(PasswordKind::Text)
            }
            Self::EnvMd5Text { prop, env } => {
                let hex = env_value(prop.as_deref(), env.as_deref(), code)?;
                md5_from_hex(&hex).map(PasswordKind::Md5)
            }
            Self::QrCode => Ok(PasswordKind::QrCode),
        }
    }
}

/// Decodes 32 hex digits into an MD5 digest.
pub fn md5_from_hex(hex_text: &str) -> ConfigResult<[u8; 16]> {
    let bytes = hex::decode(hex_text.trim())
        .map_err(|e| ConfigError::InvalidMd5(format!("{hex_text}: {e}")))?;
    md5_from_bytes(&bytes)
}

fn md5_from_bytes(bytes: &[u8]) -> ConfigResult<[u8; 16]> {
    <[u8; 16]>::try_from(bytes)
        .map_err(|_| ConfigError::InvalidMd5(format!("expected 16 bytes, got {}", bytes.len())))
}

fn env_value(prop: Option<&str>, env: Option<&str>, code: i64) -> ConfigResult<String> {
    if prop.is_none() && env.is_none() {
        return Err(ConfigError::MissingEnvKey);
    }

    let code = code.to_string();
    let prop = prop.map(|p| p.replace(CODE_MARK, &code));
    let env = env.map(|e| e.replace(CODE_MARK, &code));

    if let Some(value) = prop.as_deref().and_then(property) {
        return Ok(value);
    }
    if let Some(value) = env.as_deref().and_then(|e| std::env::var(e).ok()) {
        return Ok(value);
    }

    let mut missing = String::new();
    if let Some(p) = &prop {
        missing.push_str(&format!("value of [prop] with key [{p}]; "));
    }
    if let Some(e) = &env {
        missing.push_str(&format!("value of [env] with key [{e}]; "));
    }
    Err(ConfigError::EnvValueNotFound(missing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::properties::{remove_property, set_property};

    #[test]
    fn test_deserialize_tagged() {
        let info: PasswordInfoConfiguration =
            serde_yaml::from_str("type: md5_text\nmd5: 0123456789abcdef0123456789abcdef\n").unwrap();
        let PasswordKind::Md5(bytes) = info.resolve(1).unwrap() else {
            panic!("expected md5");
        };
        assert_eq!(bytes[0], 0x01);
        assert_eq!(bytes[15], 0xef);

        let qr: PasswordInfoConfiguration = serde_json::from_str(r#"{"type":"qr_code"}"#).unwrap();
        assert_eq!(qr.resolve(1).unwrap(), PasswordKind::QrCode);
    }

    #[test]
    fn test_md5_length_checked() {
        let info = PasswordInfoConfiguration::Md5Bytes { md5: vec![1, 2, 3] };
        assert!(matches!(info.resolve(1), Err(ConfigError::InvalidMd5(_))));
        assert!(md5_from_hex("zz").is_err());
    }

    #[test]
    fn test_env_text_prefers_property() {
        set_property("simbot.test.password.778899", "from-prop");
        let info = PasswordInfoConfiguration::EnvText {
            prop: Some("simbot.test.password.$CODE$".into()),
            env: Some("SIMBOT_TEST_PASSWORD_UNSET_$CODE$".into()),
        };
        assert_eq!(
            info.resolve(778899).unwrap(),
            PasswordKind::Text("from-prop".into())
        );
        remove_property("simbot.test.password.778899");

        let err = info.resolve(778899).unwrap_err();
        let ConfigError::EnvValueNotFound(msg) = err else {
            panic!("expected missing value");
        };
        assert!(msg.contains("[simbot.test.password.778899]"));
        assert!(msg.contains("[SIMBOT_TEST_PASSWORD_UNSET_778899]"));
    }

    #[test]
    fn test_env_requires_a_key() {
        let info = PasswordInfoConfiguration::EnvMd5Text {
            prop: None,
            env: None,
        };
        assert!(matches!(info.resolve(1), Err(ConfigError::MissingEnvKey)));
    }
}
