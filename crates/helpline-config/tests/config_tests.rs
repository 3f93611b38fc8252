// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Helpline configuration system.

use helpline_config::diagnostic::ConfigError;
use helpline_config::model::{CacheBackend, HelplineConfig};
use helpline_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known sections deserializes successfully.
#[test]
fn valid_toml_deserializes_into_helpline_config() {
    let toml = r#"
[relay]
log_level = "debug"
notify_banned = false

[telegram]
bot_token = "123:ABC"

[storage]
database_path = "/tmp/helpline.db"
wal_mode = false
op_timeout_ms = 750

[cache]
backend = "memory"
retention_hours = 12
ban_ttl_hours = 240
op_timeout_ms = 300
sweep_interval_secs = 0

[admins]
bootstrap = ["alice", "@bob"]

[messages]
welcome = "hi"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.relay.log_level, "debug");
    assert!(!config.relay.notify_banned);
    assert_eq!(config.telegram.bot_token.as_deref(), Some("123:ABC"));
    assert_eq!(config.storage.database_path, "/tmp/helpline.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.storage.op_timeout_ms, 750);
    assert_eq!(config.cache.backend, CacheBackend::Memory);
    assert_eq!(config.cache.retention_hours, 12);
    assert_eq!(config.cache.ban_ttl_hours, 240);
    assert_eq!(config.cache.op_timeout_ms, 300);
    assert_eq!(config.cache.sweep_interval_secs, 0);
    assert_eq!(config.admins.bootstrap, vec!["alice", "@bob"]);
    assert_eq!(config.messages.welcome, "hi");
    // Untouched texts keep their defaults.
    assert_eq!(config.messages.queue_empty, "No pending conversations.");
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.relay.log_level, "info");
    assert!(config.relay.notify_banned);
    assert!(config.telegram.bot_token.is_none());
    assert_eq!(config.storage.database_path, "helpline.db");
    assert!(config.storage.wal_mode);
    assert_eq!(config.cache.backend, CacheBackend::Sqlite);
    assert_eq!(config.cache.retention_hours, 48);
    assert_eq!(config.cache.ban_ttl_hours, 100);
    assert!(config.admins.bootstrap.is_empty());
}

/// Unknown field in [cache] is rejected with the bad key in the message.
#[test]
fn unknown_field_in_cache_produces_error() {
    let toml = r#"
[cache]
retention_hour = 5
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("retention_hour"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// Unknown cache backend value is rejected.
#[test]
fn unknown_cache_backend_is_rejected() {
    let toml = r#"
[cache]
backend = "redis"
"#;
    assert!(load_config_from_str(toml).is_err());
}

/// Unexpected top-level section is rejected by deny_unknown_fields.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[agent]
name = "x"
"#;
    let err = load_config_from_str(toml).expect_err("unknown section should be rejected");
    assert!(format!("{err}").contains("agent") || format!("{err}").contains("unknown field"));
}

/// The diagnostic path turns an unknown key into a suggestion.
#[test]
fn load_and_validate_str_suggests_close_key() {
    let toml = r#"
[telegram]
bot_tokn = "abc"
"#;
    let errors = load_and_validate_str(toml).expect_err("should fail");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { key, suggestion: Some(s), .. } if key == "bot_tokn" && s == "bot_token"
    )));
}

/// Validation errors surface through the high-level loader.
#[test]
fn load_and_validate_str_runs_validation() {
    let toml = r#"
[cache]
retention_hours = 0
"#;
    let errors = load_and_validate_str(toml).expect_err("zero retention should fail");
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::Validation { message } if message.contains("retention_hours"))
    ));
}

/// `HELPLINE_TELEGRAM_BOT_TOKEN` maps to `telegram.bot_token`, not `telegram.bot.token`.
#[test]
#[serial_test::serial]
fn env_vars_override_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "helpline.toml",
            r#"
[telegram]
bot_token = "from-file"

[cache]
retention_hours = 10
"#,
        )?;
        jail.set_env("HELPLINE_TELEGRAM_BOT_TOKEN", "from-env");
        jail.set_env("HELPLINE_CACHE_RETENTION_HOURS", "3");

        let config: HelplineConfig =
            helpline_config::load_config_from_path(std::path::Path::new("helpline.toml"))?;
        assert_eq!(config.telegram.bot_token.as_deref(), Some("from-env"));
        assert_eq!(config.cache.retention_hours, 3);
        Ok(())
    });
}

/// Missing config files are silently skipped (Figment's Toml::file() behavior).
#[test]
fn missing_config_file_yields_defaults() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let config: HelplineConfig = Figment::new()
        .merge(Serialized::defaults(HelplineConfig::default()))
        .merge(Toml::file("/nonexistent/path/helpline.toml"))
        .extract()
        .expect("missing file should be silently skipped");

    assert_eq!(config.storage.database_path, "helpline.db");
}
