// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `helpline stat`: counts read straight from the table store.

use helpline_config::HelplineConfig;
use helpline_core::{ContactStore, HealthStatus, PendingTable, PluginAdapter, RelayError, RosterStore};
use helpline_storage::SqliteStorage;

/// Snapshot of the persisted relay state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub database: String,
    pub health: String,
    pub contacts: usize,
    pub pending: usize,
    pub admins: usize,
    pub banned: usize,
}

impl StatusReport {
    pub async fn collect(config: &HelplineConfig) -> Result<Self, RelayError> {
        let storage = SqliteStorage::open(&config.storage).await?;
        let health = match storage.health_check().await? {
            HealthStatus::Healthy => "healthy".to_string(),
            HealthStatus::Degraded(reason) => format!("degraded ({reason})"),
            HealthStatus::Unhealthy(reason) => format!("unhealthy ({reason})"),
        };

        let report = Self {
            database: config.storage.database_path.clone(),
            health,
            contacts: ContactStore::count(&storage).await?,
            pending: PendingTable::count(&storage).await?,
            admins: storage.load_admins().await?.len(),
            banned: storage.load_banned().await?.len(),
        };
        storage.shutdown().await?;
        Ok(report)
    }

    pub fn render(&self) -> String {
        format!(
            "database:     {} ({})\ncontacts:     {}\npending:      {}\nadmins:       {}\nbanned:       {}",
            self.database, self.health, self.contacts, self.pending, self.admins, self.banned
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpline_core::{ContactRecord, MessageId, UserId};

    #[tokio::test]
    async fn collect_counts_persisted_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = HelplineConfig::default();
        config.storage.database_path = dir.path().join("stat.db").display().to_string();

        {
            let storage = SqliteStorage::open(&config.storage).await.unwrap();
            storage
                .save_contact(&ContactRecord {
                    user: UserId(1),
                    name: "Ada".into(),
                    handle: Some("ada".into()),
                    region: None,
                })
                .await
                .unwrap();
            storage
                .append(UserId(1), &[MessageId(5)], 100)
                .await
                .unwrap();
            storage.append_banned("@spam").await.unwrap();
            storage.shutdown().await.unwrap();
        }

        let report = StatusReport::collect(&config).await.unwrap();
        assert_eq!(report.health, "healthy");
        assert_eq!(report.contacts, 1);
        assert_eq!(report.pending, 1);
        assert_eq!(report.admins, 0);
        assert_eq!(report.banned, 1);
        assert!(report.render().contains("pending:      1"));
    }
}
