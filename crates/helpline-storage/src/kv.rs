// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`KvStore`] backed by the `kv_entries` table.
//!
//! Unlike the in-process cache, correlations stored here survive a restart
//! for the rest of their retention window.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use helpline_core::{AdapterType, HealthStatus, KvStore, PluginAdapter, RelayError};

use crate::database::Database;
use crate::queries;

/// Wall clock in unix milliseconds.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

pub struct SqliteKv {
    db: Arc<Database>,
    clock: Clock,
    closed: AtomicBool,
}

impl SqliteKv {
    pub fn new(db: Arc<Database>) -> Self {
        Self::with_clock(db, Arc::new(|| chrono::Utc::now().timestamp_millis()))
    }

    pub fn with_clock(db: Arc<Database>, clock: Clock) -> Self {
        Self {
            db,
            clock,
            closed: AtomicBool::new(false),
        }
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
impl PluginAdapter for SqliteKv {
    fn name(&self) -> &str {
        "sqlite-kv"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Cache
    }

    async fn health_check(&self) -> Result<HealthStatus, RelayError> {
        if self.closed.load(Ordering::Acquire) {
            return Ok(HealthStatus::Unhealthy("cache has been shut down".into()));
        }
        Ok(HealthStatus::Healthy)
    }

    /// Purges what has already expired and refuses further operations.
    async fn shutdown(&self) -> Result<(), RelayError> {
        let purged = queries::kv::delete_expired(&self.db, (self.clock)()).await?;
        self.closed.store(true, Ordering::Release);
        debug!(purged, "sqlite cache drained");
        Ok(())
    }
}

#[async_trait]
impl KvStore for SqliteKv {
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), RelayError> {
        self.ensure_open("kv.set")?;
        let expires_at = ttl.map(|t| {
            let millis = i64::try_from(t.as_millis()).unwrap_or(i64::MAX);
            (self.clock)().saturating_add(millis)
        });
        queries::kv::put(&self.db, key, value, expires_at).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, RelayError> {
        self.ensure_open("kv.get")?;
        queries::kv::get_live(&self.db, key, (self.clock)()).await
    }

    async fn purge_expired(&self) -> Result<usize, RelayError> {
        self.ensure_open("kv.purge_expired")?;
        queries::kv::delete_expired(&self.db, (self.clock)()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicI64;
    use tempfile::tempdir;

    async fn setup(now: Arc<AtomicI64>) -> (SqliteKv, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kv.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        let clock: Clock = Arc::new(move || now.load(Ordering::SeqCst));
        (SqliteKv::with_clock(Arc::new(db), clock), dir)
    }

    #[tokio::test]
    async fn value_expires_with_the_clock() {
        let now = Arc::new(AtomicI64::new(1_000));
        let (kv, _dir) = setup(Arc::clone(&now)).await;

        kv.set("fwd/55", "7", Some(Duration::from_secs(10))).await.unwrap();
        assert_eq!(kv.get("fwd/55").await.unwrap().as_deref(), Some("7"));

        now.store(10_999, Ordering::SeqCst);
        assert_eq!(kv.get("fwd/55").await.unwrap().as_deref(), Some("7"));

        now.store(11_000, Ordering::SeqCst);
        assert_eq!(kv.get("fwd/55").await.unwrap(), None);
    }

    #[tokio::test]
    async fn overwrite_replaces_value_and_ttl() {
        let now = Arc::new(AtomicI64::new(0));
        let (kv, _dir) = setup(Arc::clone(&now)).await;

        kv.set("answered/1", "alice", Some(Duration::from_millis(5))).await.unwrap();
        kv.set("answered/1", "bob", None).await.unwrap();
        now.store(1_000_000, Ordering::SeqCst);
        assert_eq!(kv.get("answered/1").await.unwrap().as_deref(), Some("bob"));
    }

    #[tokio::test]
    async fn purge_counts_expired_rows() {
        let now = Arc::new(AtomicI64::new(0));
        let (kv, _dir) = setup(Arc::clone(&now)).await;

        kv.set("a", "1", Some(Duration::from_millis(10))).await.unwrap();
        kv.set("b", "2", Some(Duration::from_millis(10))).await.unwrap();
        kv.set("c", "3", None).await.unwrap();
        now.store(50, Ordering::SeqCst);

        assert_eq!(kv.purge_expired().await.unwrap(), 2);
        assert_eq!(kv.purge_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn ttl_beyond_the_millisecond_range_saturates() {
        let now = Arc::new(AtomicI64::new(1_700_000_000_000));
        let (kv, _dir) = setup(Arc::clone(&now)).await;

        // u64::MAX millis wraps to -1 when cast straight to i64.
        kv.set("wide", "1", Some(Duration::from_millis(u64::MAX))).await.unwrap();
        kv.set("max", "2", Some(Duration::MAX)).await.unwrap();
        assert_eq!(kv.get("wide").await.unwrap().as_deref(), Some("1"));
        assert_eq!(kv.get("max").await.unwrap().as_deref(), Some("2"));
        assert_eq!(kv.purge_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn shutdown_refuses_further_operations() {
        let now = Arc::new(AtomicI64::new(0));
        let (kv, _dir) = setup(now).await;
        kv.shutdown().await.unwrap();
        assert!(kv.set("k", "v", None).await.unwrap_err().is_transient());
    }
}
