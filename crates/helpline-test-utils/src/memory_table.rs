// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory table store.
//!
//! Behaves like the SQLite store but lets tests plant duplicate pending rows
//! and slow every call down to exercise deadlines.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use helpline_core::{
    AdminHandle, AdminRecord, ChatId, ContactRecord, ContactStore, MessageId, PendingRow,
    PendingTable, RelayError, RosterStore, UserId,
};

#[derive(Default)]
struct Tables {
    next_key: i64,
    pending: BTreeMap<i64, PendingRow>,
    contacts: BTreeMap<UserId, ContactRecord>,
    admins: Vec<AdminRecord>,
    banned: Vec<String>,
}

#[derive(Default)]
pub struct MemoryTable {
    tables: Mutex<Tables>,
    delay: Mutex<Option<Duration>>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every subsequent call by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.lock().await = Some(delay);
    }

    /// Inserts a raw row, bypassing the one-row-per-user convention.
    pub async fn inject_row(&self, user: UserId, message_ids: &[MessageId], updated_at: i64) -> i64 {
        let mut tables = self.tables.lock().await;
        tables.next_key += 1;
        let key = tables.next_key;
        tables.pending.insert(
            key,
            PendingRow {
                key,
                user,
                message_ids: message_ids.to_vec(),
                updated_at,
            },
        );
        key
    }

    pub async fn pending_rows(&self) -> Vec<PendingRow> {
        self.tables.lock().await.pending.values().cloned().collect()
    }

    pub async fn contact(&self, user: UserId) -> Option<ContactRecord> {
        self.tables.lock().await.contacts.get(&user).cloned()
    }

    pub async fn admins(&self) -> Vec<AdminRecord> {
        self.tables.lock().await.admins.clone()
    }

    pub async fn banned(&self) -> Vec<String> {
        self.tables.lock().await.banned.clone()
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl PendingTable for MemoryTable {
    async fn rows_for(&self, user: UserId) -> Result<Vec<PendingRow>, RelayError> {
        self.pause().await;
        let tables = self.tables.lock().await;
        Ok(tables
            .pending
            .values()
            .filter(|row| row.user == user)
            .cloned()
            .collect())
    }

    async fn append(
        &self,
        user: UserId,
        message_ids: &[MessageId],
        updated_at: i64,
    ) -> Result<i64, RelayError> {
        self.pause().await;
        Ok(self.inject_row(user, message_ids, updated_at).await)
    }

    async fn update(&self, row: &PendingRow) -> Result<(), RelayError> {
        self.pause().await;
        let mut tables = self.tables.lock().await;
        match tables.pending.get_mut(&row.key) {
            Some(existing) => {
                *existing = row.clone();
                Ok(())
            }
            None => Err(RelayError::Storage {
                source: format!("pending row {} does not exist", row.key).into(),
            }),
        }
    }

    async fn read_all(&self) -> Result<Vec<PendingRow>, RelayError> {
        self.pause().await;
        // Reverse key order so callers cannot rely on storage order.
        Ok(self
            .tables
            .lock()
            .await
            .pending
            .values()
            .rev()
            .cloned()
            .collect())
    }

    async fn clear(&self, key: i64) -> Result<(), RelayError> {
        self.pause().await;
        self.tables.lock().await.pending.remove(&key);
        Ok(())
    }
}

#[async_trait]
impl ContactStore for MemoryTable {
    async fn save_contact(&self, contact: &ContactRecord) -> Result<bool, RelayError> {
        self.pause().await;
        let mut tables = self.tables.lock().await;
        if tables.contacts.contains_key(&contact.user) {
            return Ok(false);
        }
        tables.contacts.insert(contact.user, contact.clone());
        Ok(true)
    }

    async fn save_region(&self, user: UserId, region: &str) -> Result<(), RelayError> {
        self.pause().await;
        let mut tables = self.tables.lock().await;
        let entry = tables.contacts.entry(user).or_insert_with(|| ContactRecord {
            user,
            name: String::new(),
            handle: None,
            region: None,
        });
        entry.region = Some(region.to_string());
        Ok(())
    }

    async fn contacts(&self) -> Result<Vec<UserId>, RelayError> {
        self.pause().await;
        Ok(self.tables.lock().await.contacts.keys().copied().collect())
    }
}

#[async_trait]
impl RosterStore for MemoryTable {
    async fn load_admins(&self) -> Result<Vec<AdminRecord>, RelayError> {
        self.pause().await;
        Ok(self.admins().await)
    }

    async fn append_admin(&self, handle: &AdminHandle) -> Result<(), RelayError> {
        self.pause().await;
        let mut tables = self.tables.lock().await;
        if !tables.admins.iter().any(|a| &a.handle == handle) {
            tables.admins.push(AdminRecord {
                handle: handle.clone(),
                channel: None,
            });
        }
        Ok(())
    }

    async fn set_admin_channel(
        &self,
        handle: &AdminHandle,
        channel: ChatId,
    ) -> Result<(), RelayError> {
        self.pause().await;
        let mut tables = self.tables.lock().await;
        match tables.admins.iter_mut().find(|a| &a.handle == handle) {
            Some(record) => record.channel = Some(channel),
            None => tables.admins.push(AdminRecord {
                handle: handle.clone(),
                channel: Some(channel),
            }),
        }
        Ok(())
    }

    async fn load_banned(&self) -> Result<Vec<String>, RelayError> {
        self.pause().await;
        Ok(self.banned().await)
    }

    async fn append_banned(&self, key: &str) -> Result<(), RelayError> {
        self.pause().await;
        let mut tables = self.tables.lock().await;
        if !tables.banned.iter().any(|k| k == key) {
            tables.banned.push(key.to_string());
        }
        Ok(())
    }
}
