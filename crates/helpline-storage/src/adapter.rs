// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the table store traits.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use helpline_config::model::StorageConfig;
use helpline_core::{
    AdapterType, AdminHandle, AdminRecord, ChatId, ContactRecord, ContactStore, HealthStatus,
    MessageId, PendingRow, PendingTable, PluginAdapter, RelayError, RosterStore, UserId,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed table store.
///
/// Holds the pending queue, contact directory, administrator roster and ban
/// list. The [`Database`] handle can be shared with a [`SqliteKv`](crate::SqliteKv).
pub struct SqliteStorage {
    db: Arc<Database>,
}

impl SqliteStorage {
    /// Opens the database described by `config`.
    pub async fn open(config: &StorageConfig) -> Result<Self, RelayError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        debug!(path = %config.database_path, "SQLite storage initialized");
        Ok(Self::from_database(Arc::new(db)))
    }

    pub fn from_database(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn database(&self) -> Arc<Database> {
        Arc::clone(&self.db)
    }

    pub async fn contact(&self, user: UserId) -> Result<Option<ContactRecord>, RelayError> {
        queries::contacts::get_contact(&self.db, user).await
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Table
    }

    async fn health_check(&self) -> Result<HealthStatus, RelayError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RelayError> {
        self.db.checkpoint().await?;
        debug!("shutdown: WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl PendingTable for SqliteStorage {
    async fn rows_for(&self, user: UserId) -> Result<Vec<PendingRow>, RelayError> {
        queries::pending::rows_for(&self.db, user).await
    }

    async fn append(
        &self,
        user: UserId,
        message_ids: &[MessageId],
        updated_at: i64,
    ) -> Result<i64, RelayError> {
        queries::pending::append(&self.db, user, message_ids, updated_at).await
    }

    async fn update(&self, row: &PendingRow) -> Result<(), RelayError> {
        queries::pending::update(&self.db, row).await
    }

    async fn read_all(&self) -> Result<Vec<PendingRow>, RelayError> {
        queries::pending::read_all(&self.db).await
    }

    async fn clear(&self, key: i64) -> Result<(), RelayError> {
        queries::pending::clear(&self.db, key).await
    }

    async fn count(&self) -> Result<usize, RelayError> {
        queries::pending::count(&self.db).await
    }
}

#[async_trait]
impl ContactStore for SqliteStorage {
    async fn save_contact(&self, contact: &ContactRecord) -> Result<bool, RelayError> {
        queries::contacts::insert_contact(&self.db, contact).await
    }

    async fn save_region(&self, user: UserId, region: &str) -> Result<(), RelayError> {
        queries::contacts::upsert_region(&self.db, user, region).await
    }

    async fn contacts(&self) -> Result<Vec<UserId>, RelayError> {
        queries::contacts::list_contact_ids(&self.db).await
    }

    async fn count(&self) -> Result<usize, RelayError> {
        queries::contacts::count(&self.db).await
    }
}

#[async_trait]
impl RosterStore for SqliteStorage {
    async fn load_admins(&self) -> Result<Vec<AdminRecord>, RelayError> {
        queries::roster::list_admins(&self.db).await
    }

    async fn append_admin(&self, handle: &AdminHandle) -> Result<(), RelayError> {
        queries::roster::insert_admin(&self.db, handle).await
    }

    async fn set_admin_channel(
        &self,
        handle: &AdminHandle,
        channel: ChatId,
    ) -> Result<(), RelayError> {
        queries::roster::set_admin_chat(&self.db, handle, channel).await
    }

    async fn load_banned(&self) -> Result<Vec<String>, RelayError> {
        queries::roster::list_banned(&self.db).await
    }

    async fn append_banned(&self, key: &str) -> Result<(), RelayError> {
        queries::roster::insert_banned(&self.db, key).await
    }
}
