// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expiring key-value rows. `expires_at` is unix millis; `NULL` never expires.

use helpline_core::RelayError;
use rusqlite::params;

use crate::database::Database;

pub async fn put(
    db: &Database,
    key: &str,
    value: &str,
    expires_at: Option<i64>,
) -> Result<(), RelayError> {
    let key = key.to_string();
    let value = value.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO kv_entries (key, value, expires_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
                params![key, value, expires_at],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// The value under `key` if it has not expired at `now`.
pub async fn get_live(db: &Database, key: &str, now: i64) -> Result<Option<String>, RelayError> {
    let key = key.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT value FROM kv_entries
                 WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
                params![key, now],
                |row| row.get(0),
            );
            match result {
                Ok(value) => Ok(Some(value)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Deletes rows that expired at or before `now`.
pub async fn delete_expired(db: &Database, now: i64) -> Result<usize, RelayError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM kv_entries WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                params![now],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}
