// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process implementation of [`KvStore`].
//!
//! Entries live in a [`DashMap`] and carry an optional deadline measured on
//! the tokio clock, so tests can drive expiry with `tokio::time::pause`.
//! Everything is lost when the process exits, which the relay accepts for
//! correlations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use helpline_core::{AdapterType, HealthStatus, KvStore, PluginAdapter, RelayError};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|deadline| deadline > now)
    }
}

/// TTL-keyed map held in process memory.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: DashMap<String, Entry>,
    closed: AtomicBool,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including ones that expired but were not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn ensure_open(&self, operation: &str) -> Result<(), RelayError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(RelayError::StoreUnavailable {
                operation: operation.to_string(),
                reason: "cache has been shut down".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for MemoryKv {
    fn name(&self) -> &str {
        "memory-kv"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Cache
    }

    async fn health_check(&self) -> Result<HealthStatus, RelayError> {
        if self.closed.load(Ordering::Acquire) {
            Ok(HealthStatus::Unhealthy("cache has been shut down".into()))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }

    async fn shutdown(&self) -> Result<(), RelayError> {
        self.closed.store(true, Ordering::Release);
        debug!(entries = self.entries.len(), "memory cache closed");
        self.entries.clear();
        Ok(())
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), RelayError> {
        self.ensure_open("kv.set")?;
        let entry = Entry {
            value: value.to_string(),
            // A deadline past what the clock can represent never expires.
            expires_at: ttl.and_then(|t| Instant::now().checked_add(t)),
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, RelayError> {
        self.ensure_open("kv.get")?;
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };
        // The read guard is released here; removing under it would deadlock.
        if expired {
            self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        }
        Ok(None)
    }

    async fn purge_expired(&self) -> Result<usize, RelayError> {
        self.ensure_open("kv.purge_expired")?;
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        Ok(before.saturating_sub(self.entries.len()))
    }
}
