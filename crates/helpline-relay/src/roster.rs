// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Administrator roster.
//!
//! Membership and delivery channels live in memory for the life of the
//! process; the persisted table is only a replay source.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use helpline_core::{AdminHandle, AdminRecord, ChatId, RelayError, RosterStore, bounded};
use tracing::{debug, info, warn};

pub struct AdminRoster {
    admins: DashMap<AdminHandle, Option<ChatId>>,
    store: Arc<dyn RosterStore>,
    timeout: Duration,
}

impl AdminRoster {
    pub fn new(store: Arc<dyn RosterStore>, timeout: Duration) -> Self {
        Self {
            admins: DashMap::new(),
            store,
            timeout,
        }
    }

    /// Seeds membership from persisted records.
    pub fn load(&self, records: Vec<AdminRecord>) {
        for record in records {
            self.admins.insert(record.handle, record.channel);
        }
        debug!(count = self.admins.len(), "admin roster loaded");
    }

    pub fn is_admin(&self, handle: &AdminHandle) -> bool {
        self.admins.contains_key(handle)
    }

    pub fn channel_for(&self, handle: &AdminHandle) -> Option<ChatId> {
        self.admins.get(handle).and_then(|entry| *entry)
    }

    /// Adds `handle`. Membership is visible before the persisted append completes.
    pub async fn add(&self, handle: &AdminHandle) -> Result<(), RelayError> {
        if handle.is_empty() {
            return Err(RelayError::Internal("empty administrator handle".into()));
        }
        self.admins.entry(handle.clone()).or_insert(None);
        info!(admin = %handle, "administrator added");
        bounded("roster.append", self.timeout, self.store.append_admin(handle)).await
    }

    /// Binds `handle` to the chat it just wrote from. Persisting the change is best-effort.
    pub async fn observe(&self, handle: &AdminHandle, chat: ChatId) {
        let changed = match self.admins.get_mut(handle) {
            Some(mut entry) if *entry != Some(chat) => {
                *entry = Some(chat);
                true
            }
            _ => false,
        };
        if !changed {
            return;
        }
        debug!(admin = %handle, chat = %chat, "administrator channel bound");
        if let Err(e) = bounded(
            "roster.set_channel",
            self.timeout,
            self.store.set_admin_channel(handle, chat),
        )
        .await
        {
            warn!(admin = %handle, error = %e, "failed to persist administrator channel");
        }
    }

    /// Every administrator with a known channel, minus `excluding`.
    pub fn targets(&self, excluding: Option<&AdminHandle>) -> Vec<(AdminHandle, ChatId)> {
        let mut targets: Vec<(AdminHandle, ChatId)> = self
            .admins
            .iter()
            .filter(|entry| Some(entry.key()) != excluding)
            .filter_map(|entry| entry.value().map(|chat| (entry.key().clone(), chat)))
            .collect();
        targets.sort_by(|a, b| a.0.cmp(&b.0));
        targets
    }

    pub fn len(&self) -> usize {
        self.admins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }
}
