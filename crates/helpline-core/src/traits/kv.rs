// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ephemeral key-value store trait with per-key expiry.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::RelayError;
use crate::traits::adapter::PluginAdapter;

/// An opaque TTL-keyed store.
///
/// Individual operations are atomic. An expired key behaves exactly like a
/// key that was never written.
#[async_trait]
pub trait KvStore: PluginAdapter {
    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// `ttl = None` keeps the entry until it is overwritten.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), RelayError>;

    /// Reads the live value under `key`; `None` on a miss or after expiry.
    async fn get(&self, key: &str) -> Result<Option<String>, RelayError>;

    /// Drops expired entries, returning how many were removed.
    async fn purge_expired(&self) -> Result<usize, RelayError>;
}
