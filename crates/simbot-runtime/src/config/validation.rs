//! Configuration validation utilities.

use std::collections::HashSet;

use simbot_core::BotVerifyInfo;

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, LoggingConfig, SimbotConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &SimbotConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_bots_config(&config.bots)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    if logging.output == LogOutput::File && logging.max_files == 0 {
        return Err(ConfigError::validation("logging.max_files must be greater than 0"));
    }
    Ok(())
}

fn validate_bots_config(bots: &[BotVerifyInfo]) -> ConfigResult<()> {
    let mut seen_names = HashSet::new();

    for (index, bot) in bots.iter().enumerate() {
        if bot.component.trim().is_empty() {
            return Err(ConfigError::missing_field(format!("bots[{index}].component")));
        }
        if let Some(name) = &bot.name
            && !seen_names.insert(name.as_str())
        {
            return Err(ConfigError::DuplicateBotName(name.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mirai(name: &str) -> BotVerifyInfo {
        BotVerifyInfo::new("simbot.mirai", json!({"code": 1})).with_name(name)
    }

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&SimbotConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_duplicate_bot_name() {
        let config = SimbotConfig {
            bots: vec![mirai("main"), mirai("other"), mirai("main")],
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::DuplicateBotName(name)) if name == "main"));
    }

    #[test]
    fn test_unnamed_bots_do_not_clash() {
        let bot = BotVerifyInfo::new("simbot.mirai", json!({}));
        let config = SimbotConfig {
            bots: vec![bot.clone(), bot],
            ..Default::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_empty_component() {
        let config = SimbotConfig {
            bots: vec![BotVerifyInfo::new(" ", json!({}))],
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { field }) if field == "bots[0].component"
        ));
    }

    #[test]
    fn test_validate_file_output_requires_path() {
        let mut config = SimbotConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some("simbot.log".into());
        assert!(validate_config(&config).is_ok());
    }
}
