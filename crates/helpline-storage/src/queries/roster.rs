// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Administrator and ban-list tables.

use helpline_core::{AdminHandle, AdminRecord, ChatId, RelayError};
use rusqlite::params;

use crate::database::Database;

pub async fn list_admins(db: &Database) -> Result<Vec<AdminRecord>, RelayError> {
    db.connection()
        .call(|conn| -> Result<Vec<AdminRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare("SELECT handle, chat_id FROM admins ORDER BY added_at")?;
            let rows = stmt.query_map([], |row| {
                let handle: String = row.get(0)?;
                let chat: Option<i64> = row.get(1)?;
                Ok(AdminRecord {
                    handle: AdminHandle::new(&handle),
                    channel: chat.map(ChatId),
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Inserts `handle` unless already present.
pub async fn insert_admin(db: &Database, handle: &AdminHandle) -> Result<(), RelayError> {
    let handle = handle.as_str().to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO admins (handle) VALUES (?1)",
                params![handle],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Records the chat an administrator talks from, inserting the admin if needed.
pub async fn set_admin_chat(
    db: &Database,
    handle: &AdminHandle,
    chat: ChatId,
) -> Result<(), RelayError> {
    let handle = handle.as_str().to_string();
    let chat = chat.0;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO admins (handle, chat_id) VALUES (?1, ?2)
                 ON CONFLICT(handle) DO UPDATE SET chat_id = excluded.chat_id",
                params![handle, chat],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn list_banned(db: &Database) -> Result<Vec<String>, RelayError> {
    db.connection()
        .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
            let mut stmt = conn.prepare("SELECT key FROM banned ORDER BY banned_at")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn insert_banned(db: &Database, key: &str) -> Result<(), RelayError> {
    let key = key.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute("INSERT OR IGNORE INTO banned (key) VALUES (?1)", params![key])?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
