// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pending-queue rows. Message ids are stored as a JSON integer array, newest first.

use helpline_core::{MessageId, PendingRow, RelayError, UserId};
use rusqlite::params;

use crate::database::Database;

fn encode_ids(ids: &[MessageId]) -> Result<String, RelayError> {
    let raw: Vec<i64> = ids.iter().map(|id| id.0).collect();
    serde_json::to_string(&raw).map_err(|e| RelayError::Storage {
        source: Box::new(e),
    })
}

fn decode_row(key: i64, user: i64, ids: &str, updated_at: i64) -> Result<PendingRow, RelayError> {
    let raw: Vec<i64> = serde_json::from_str(ids).map_err(|e| RelayError::Storage {
        source: Box::new(e),
    })?;
    Ok(PendingRow {
        key,
        user: UserId(user),
        message_ids: raw.into_iter().map(MessageId).collect(),
        updated_at,
    })
}

type RawRow = (i64, i64, String, i64);

fn decode_all(rows: Vec<RawRow>) -> Result<Vec<PendingRow>, RelayError> {
    rows.into_iter()
        .map(|(key, user, ids, updated_at)| decode_row(key, user, &ids, updated_at))
        .collect()
}

/// All rows for `user`, in storage order.
pub async fn rows_for(db: &Database, user: UserId) -> Result<Vec<PendingRow>, RelayError> {
    let user = user.0;
    let raw = db
        .connection()
        .call(move |conn| -> Result<Vec<RawRow>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, message_ids, updated_at FROM pending WHERE user_id = ?1",
            )?;
            let rows = stmt.query_map(params![user], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    decode_all(raw)
}

/// Appends a row and returns its key.
pub async fn append(
    db: &Database,
    user: UserId,
    message_ids: &[MessageId],
    updated_at: i64,
) -> Result<i64, RelayError> {
    let ids = encode_ids(message_ids)?;
    let user = user.0;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO pending (user_id, message_ids, updated_at) VALUES (?1, ?2, ?3)",
                params![user, ids, updated_at],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Rewrites the ids and timestamp of the row keyed by `row.key`.
pub async fn update(db: &Database, row: &PendingRow) -> Result<(), RelayError> {
    let ids = encode_ids(&row.message_ids)?;
    let (key, user, updated_at) = (row.key, row.user.0, row.updated_at);
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE pending SET user_id = ?1, message_ids = ?2, updated_at = ?3 WHERE id = ?4",
                params![user, ids, updated_at, key],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    if changed == 0 {
        return Err(RelayError::Storage {
            source: format!("pending row {key} does not exist").into(),
        });
    }
    Ok(())
}

/// Every row, in no guaranteed order.
pub async fn read_all(db: &Database) -> Result<Vec<PendingRow>, RelayError> {
    let raw = db
        .connection()
        .call(|conn| -> Result<Vec<RawRow>, rusqlite::Error> {
            let mut stmt = conn.prepare("SELECT id, user_id, message_ids, updated_at FROM pending")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    decode_all(raw)
}

/// Deletes the row keyed by `key`. Missing rows are not an error.
pub async fn clear(db: &Database, key: i64) -> Result<(), RelayError> {
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM pending WHERE id = ?1", params![key])?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn count(db: &Database) -> Result<usize, RelayError> {
    db.connection()
        .call(|conn| -> Result<i64, rusqlite::Error> {
            conn.query_row("SELECT COUNT(*) FROM pending", [], |row| row.get(0))
        })
        .await
        .map(|n| n.max(0) as usize)
        .map_err(crate::database::map_tr_err)
}
