// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ban registry.
//!
//! The in-process set is authoritative for the life of the process. The KV
//! flag (`ban/{key}`) and the persisted `banned` table are written after it,
//! so `is_banned` turns true before either round trip completes.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use helpline_core::{AdminHandle, KvStore, RelayError, RosterStore, UserId, bounded};
use tracing::{debug, warn};

/// Ban key for a user id.
pub fn user_key(user: UserId) -> String {
    user.0.to_string()
}

/// Ban key for a handle, always `@`-prefixed and normalized.
pub fn handle_key(handle: &AdminHandle) -> String {
    format!("@{handle}")
}

/// Normalizes a raw ban key: numeric ids stay as they are, anything else is a handle.
pub fn normalize_key(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.parse::<i64>() {
        Ok(id) => user_key(UserId(id)),
        Err(_) => handle_key(&AdminHandle::new(trimmed)),
    }
}

fn flag_key(key: &str) -> String {
    format!("ban/{key}")
}

pub struct BanRegistry {
    banned: DashSet<String>,
    kv: Arc<dyn KvStore>,
    store: Arc<dyn RosterStore>,
    ttl: Duration,
    cache_timeout: Duration,
    table_timeout: Duration,
}

impl BanRegistry {
    pub fn new(
        kv: Arc<dyn KvStore>,
        store: Arc<dyn RosterStore>,
        ttl: Duration,
        cache_timeout: Duration,
        table_timeout: Duration,
    ) -> Self {
        Self {
            banned: DashSet::new(),
            kv,
            store,
            ttl,
            cache_timeout,
            table_timeout,
        }
    }

    /// Seeds the in-process set from persisted keys.
    pub fn load<I, S>(&self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for key in keys {
            self.banned.insert(normalize_key(key.as_ref()));
        }
        debug!(count = self.banned.len(), "ban list loaded");
    }

    /// Bans `raw_key` (a user id or a handle). Idempotent.
    ///
    /// The ban is effective in-process even if the cache or table write fails;
    /// the error is still returned so the caller can report it.
    pub async fn ban(&self, raw_key: &str) -> Result<(), RelayError> {
        let key = normalize_key(raw_key);
        self.banned.insert(key.clone());

        bounded(
            "bans.flag",
            self.cache_timeout,
            self.kv.set(&flag_key(&key), "1", Some(self.ttl)),
        )
        .await?;
        bounded(
            "bans.persist",
            self.table_timeout,
            self.store.append_banned(&key),
        )
        .await
    }

    /// Whether `user` (or the handle it writes from) is banned.
    ///
    /// Cache failures are logged and treated as "not banned".
    pub async fn is_banned(&self, user: UserId, handle: Option<&AdminHandle>) -> bool {
        let mut keys = vec![user_key(user)];
        if let Some(handle) = handle {
            keys.push(handle_key(handle));
        }

        if keys.iter().any(|k| self.banned.contains(k)) {
            return true;
        }

        for key in &keys {
            match bounded("bans.lookup", self.cache_timeout, self.kv.get(&flag_key(key))).await {
                Ok(Some(_)) => {
                    self.banned.insert(key.clone());
                    return true;
                }
                Ok(None) => {}
                Err(e) => warn!(user = %user, error = %e, "ban lookup failed; treating as not banned"),
            }
        }
        false
    }

    pub fn len(&self) -> usize {
        self.banned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banned.is_empty()
    }
}
