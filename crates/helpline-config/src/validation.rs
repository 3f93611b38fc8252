// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that serde attributes cannot express,
//! such as non-zero timeouts and well-formed administrator handles.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::HelplineConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Upper bound for hour-valued TTLs, ten years.
pub const MAX_TTL_HOURS: u64 = 24 * 365 * 10;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &HelplineConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.relay.log_level.as_str()) {
        fail(format!(
            "relay.log_level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.relay.log_level
        ));
    }

    if let Some(token) = &config.telegram.bot_token
        && token.trim().is_empty()
    {
        fail("telegram.bot_token must not be empty when set".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.storage.op_timeout_ms == 0 {
        fail("storage.op_timeout_ms must be greater than 0".to_string());
    }

    if config.cache.op_timeout_ms == 0 {
        fail("cache.op_timeout_ms must be greater than 0".to_string());
    }

    for (name, hours) in [
        ("cache.retention_hours", config.cache.retention_hours),
        ("cache.ban_ttl_hours", config.cache.ban_ttl_hours),
    ] {
        if hours == 0 {
            fail(format!("{name} must be greater than 0"));
        } else if hours > MAX_TTL_HOURS {
            fail(format!("{name} must be at most {MAX_TTL_HOURS}, got {hours}"));
        }
    }

    let mut seen = HashSet::new();
    for (i, raw) in config.admins.bootstrap.iter().enumerate() {
        let handle = raw.trim().trim_start_matches('@').to_ascii_lowercase();
        if handle.is_empty() {
            fail(format!("admins.bootstrap[{i}] must not be empty"));
        } else if !handle.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            fail(format!(
                "admins.bootstrap[{i}] `{raw}` is not a valid handle (letters, digits, underscore)"
            ));
        } else if !seen.insert(handle) {
            fail(format!("duplicate handle `{raw}` in admins.bootstrap"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&HelplineConfig::default()).is_ok());
    }

    #[test]
    fn zero_timeouts_fail_validation() {
        let mut config = HelplineConfig::default();
        config.storage.op_timeout_ms = 0;
        config.cache.op_timeout_ms = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(has_message(&errors, "storage.op_timeout_ms"));
        assert!(has_message(&errors, "cache.op_timeout_ms"));
    }

    #[test]
    fn ttl_hours_outside_range_fail_validation() {
        let mut config = HelplineConfig::default();
        config.cache.retention_hours = 0;
        config.cache.ban_ttl_hours = u64::MAX;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(has_message(&errors, "cache.retention_hours must be greater than 0"));
        assert!(has_message(&errors, "cache.ban_ttl_hours must be at most"));

        config.cache.retention_hours = MAX_TTL_HOURS;
        config.cache.ban_ttl_hours = MAX_TTL_HOURS;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut config = HelplineConfig::default();
        config.relay.log_level = "verbose".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "relay.log_level"));
    }

    #[test]
    fn empty_token_fails_but_missing_token_passes() {
        let mut config = HelplineConfig::default();
        config.telegram.bot_token = Some("  ".into());
        assert!(has_message(
            &validate_config(&config).unwrap_err(),
            "telegram.bot_token"
        ));

        config.telegram.bot_token = None;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn duplicate_bootstrap_handles_fail_after_normalization() {
        let mut config = HelplineConfig::default();
        config.admins.bootstrap = vec!["@Alice".into(), "alice".into()];
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "duplicate handle"));
    }

    #[test]
    fn malformed_bootstrap_handle_fails() {
        let mut config = HelplineConfig::default();
        config.admins.bootstrap = vec!["not a handle".into()];
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "admins.bootstrap[0]"));
    }
}
