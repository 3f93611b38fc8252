// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted table store traits.
//!
//! The relay treats the table store as a simple rectangular, eventually
//! consistent store: no trait here promises ordering, and callers sort
//! explicitly before relying on row order.

use async_trait::async_trait;

use crate::error::RelayError;
use crate::types::{AdminHandle, AdminRecord, ChatId, ContactRecord, MessageId, PendingRow, UserId};

/// The append-only pending-queue table, one row per user.
#[async_trait]
pub trait PendingTable: Send + Sync {
    /// All rows whose user column matches `user`.
    async fn rows_for(&self, user: UserId) -> Result<Vec<PendingRow>, RelayError>;

    /// Appends a new row and returns its key.
    async fn append(
        &self,
        user: UserId,
        message_ids: &[MessageId],
        updated_at: i64,
    ) -> Result<i64, RelayError>;

    /// Rewrites the row identified by `row.key`.
    async fn update(&self, row: &PendingRow) -> Result<(), RelayError>;

    /// Every row, in no particular order.
    async fn read_all(&self) -> Result<Vec<PendingRow>, RelayError>;

    /// Removes the row identified by `key`.
    async fn clear(&self, key: i64) -> Result<(), RelayError>;

    /// Number of pending rows.
    async fn count(&self) -> Result<usize, RelayError> {
        Ok(self.read_all().await?.len())
    }
}

/// Contact directory written by `/start` and the region dialog.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Inserts a contact; returns `false` if one already exists for the user.
    async fn save_contact(&self, contact: &ContactRecord) -> Result<bool, RelayError>;

    /// Stores the region answer for `user`, creating a bare contact if needed.
    async fn save_region(&self, user: UserId, region: &str) -> Result<(), RelayError>;

    /// Every known contact id.
    async fn contacts(&self) -> Result<Vec<UserId>, RelayError>;

    /// Number of known contacts.
    async fn count(&self) -> Result<usize, RelayError> {
        Ok(self.contacts().await?.len())
    }
}

/// Durable replay source for the administrator roster and the ban list.
#[async_trait]
pub trait RosterStore: Send + Sync {
    async fn load_admins(&self) -> Result<Vec<AdminRecord>, RelayError>;

    async fn append_admin(&self, handle: &AdminHandle) -> Result<(), RelayError>;

    async fn set_admin_channel(
        &self,
        handle: &AdminHandle,
        channel: ChatId,
    ) -> Result<(), RelayError>;

    async fn load_banned(&self) -> Result<Vec<String>, RelayError>;

    async fn append_banned(&self, key: &str) -> Result<(), RelayError>;
}
