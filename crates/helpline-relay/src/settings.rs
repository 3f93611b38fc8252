// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Engine settings derived from [`HelplineConfig`].

use std::time::Duration;

use helpline_config::model::{HelplineConfig, MessagesConfig};

const HOUR: u64 = 60 * 60;

fn hours(count: u64) -> Duration {
    Duration::from_secs(count.saturating_mul(HOUR))
}

#[derive(Debug, Clone)]
pub struct RelaySettings {
    /// How long a forwarded copy stays answerable.
    pub retention: Duration,
    pub ban_ttl: Duration,
    /// Deadline for each KV round trip.
    pub cache_timeout: Duration,
    /// Deadline for each table round trip.
    pub table_timeout: Duration,
    pub messages: MessagesConfig,
}

impl From<&HelplineConfig> for RelaySettings {
    fn from(config: &HelplineConfig) -> Self {
        Self {
            retention: hours(config.cache.retention_hours),
            ban_ttl: hours(config.cache.ban_ttl_hours),
            cache_timeout: Duration::from_millis(config.cache.op_timeout_ms),
            table_timeout: Duration::from_millis(config.storage.op_timeout_ms),
            messages: config.messages.clone(),
        }
    }
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self::from(&HelplineConfig::default())
    }
}
