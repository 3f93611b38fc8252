// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Helpline relay.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Helpline configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HelplineConfig {
    /// Process-level settings.
    #[serde(default)]
    pub relay: RelayConfig,

    /// Telegram bot integration settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Persisted table store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Ephemeral correlation/ban cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Administrator roster seeding.
    #[serde(default)]
    pub admins: AdminsConfig,

    /// User- and administrator-facing texts.
    #[serde(default)]
    pub messages: MessagesConfig,
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Send the `messages.banned` notice when a banned user writes.
    #[serde(default = "default_true")]
    pub notify_banned: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            notify_banned: true,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. Required by `serve`.
    #[serde(default)]
    pub bot_token: Option<String>,
}

/// Persisted table store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_true")]
    pub wal_mode: bool,

    /// Deadline for a single table operation, in milliseconds.
    #[serde(default = "default_storage_timeout_ms")]
    pub op_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
            op_timeout_ms: default_storage_timeout_ms(),
        }
    }
}

fn default_database_path() -> String {
    "helpline.db".to_string()
}

fn default_storage_timeout_ms() -> u64 {
    5_000
}

/// Which ephemeral KV backend holds correlations and ban flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// In-process map; correlations are lost on restart.
    Memory,
    /// Expiring rows in the same SQLite database as the tables.
    #[default]
    Sqlite,
}

/// Ephemeral cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,

    /// How long a forwarded message stays answerable, in hours.
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u64,

    /// Lifetime of a ban flag in the cache, in hours.
    #[serde(default = "default_ban_ttl_hours")]
    pub ban_ttl_hours: u64,

    /// Deadline for a single cache operation, in milliseconds.
    #[serde(default = "default_cache_timeout_ms")]
    pub op_timeout_ms: u64,

    /// Interval between expired-entry sweeps, in seconds. `0` disables sweeping.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            retention_hours: default_retention_hours(),
            ban_ttl_hours: default_ban_ttl_hours(),
            op_timeout_ms: default_cache_timeout_ms(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_retention_hours() -> u64 {
    48
}

fn default_ban_ttl_hours() -> u64 {
    100
}

fn default_cache_timeout_ms() -> u64 {
    2_000
}

fn default_sweep_interval_secs() -> u64 {
    300
}

/// Administrator roster seeding.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AdminsConfig {
    /// Handles added to the persisted roster on startup if absent.
    #[serde(default)]
    pub bootstrap: Vec<String>,
}

/// Every text the relay sends on its own behalf.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MessagesConfig {
    #[serde(default = "default_welcome")]
    pub welcome: String,
    #[serde(default = "default_feedback")]
    pub feedback: String,
    #[serde(default = "default_region_prompt")]
    pub region_prompt: String,
    #[serde(default = "default_region_saved")]
    pub region_saved: String,
    #[serde(default = "default_unknown_command")]
    pub unknown_command: String,
    #[serde(default = "default_banned")]
    pub banned: String,
    #[serde(default = "default_already_answered")]
    pub already_answered: String,
    #[serde(default = "default_correlation_lost")]
    pub correlation_lost: String,
    #[serde(default = "default_queue_empty")]
    pub queue_empty: String,
    #[serde(default = "default_next_failed")]
    pub next_failed: String,
    #[serde(default = "default_admin_added")]
    pub admin_added: String,
    #[serde(default = "default_user_banned")]
    pub user_banned: String,
    #[serde(default = "default_admin_banner")]
    pub admin_banner: String,
    #[serde(default = "default_admin_help")]
    pub admin_help: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            welcome: default_welcome(),
            feedback: default_feedback(),
            region_prompt: default_region_prompt(),
            region_saved: default_region_saved(),
            unknown_command: default_unknown_command(),
            banned: default_banned(),
            already_answered: default_already_answered(),
            correlation_lost: default_correlation_lost(),
            queue_empty: default_queue_empty(),
            next_failed: default_next_failed(),
            admin_added: default_admin_added(),
            user_banned: default_user_banned(),
            admin_banner: default_admin_banner(),
            admin_help: default_admin_help(),
        }
    }
}

fn default_welcome() -> String {
    "Welcome! Leave us a message and we will answer soon.".to_string()
}

fn default_feedback() -> String {
    "Thank you, your message has been received. Feel free to add more.".to_string()
}

fn default_region_prompt() -> String {
    "Please enter the region you live in:".to_string()
}

fn default_region_saved() -> String {
    "Region saved.".to_string()
}

fn default_unknown_command() -> String {
    "Unknown command.".to_string()
}

fn default_banned() -> String {
    "Your account has been blocked.".to_string()
}

fn default_already_answered() -> String {
    "This message has already been answered.".to_string()
}

fn default_correlation_lost() -> String {
    "This message is too old to route; the sender can no longer be resolved.".to_string()
}

fn default_queue_empty() -> String {
    "No pending conversations.".to_string()
}

fn default_next_failed() -> String {
    "Could not deliver the conversation here; it stays in the queue.".to_string()
}

fn default_admin_added() -> String {
    "New administrator added.".to_string()
}

fn default_user_banned() -> String {
    "User banned.".to_string()
}

fn default_admin_banner() -> String {
    "ADMIN".to_string()
}

fn default_admin_help() -> String {
    "/help - this help\n\
     /next - messages of the next user in the queue\n\
     /add <handle> - add an administrator\n\
     /ban <handle> - ban a user (or reply to a forwarded message with /ban)\n\
     /all <text> - send text to every user\n\
     /stat - bot statistics"
        .to_string()
}
