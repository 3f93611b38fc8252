// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact directory queries.

use helpline_core::{ContactRecord, RelayError, UserId};
use rusqlite::params;

use crate::database::Database;

/// Inserts a contact. Returns `false` when the user is already known.
pub async fn insert_contact(db: &Database, contact: &ContactRecord) -> Result<bool, RelayError> {
    let user = contact.user.0;
    let name = contact.name.clone();
    let handle = contact.handle.clone();
    let region = contact.region.clone();
    let inserted = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO contacts (user_id, name, handle, region)
                 VALUES (?1, ?2, ?3, ?4)",
                params![user, name, handle, region],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    Ok(inserted > 0)
}

/// Stores `region` for `user`, creating a bare contact when none exists.
pub async fn upsert_region(db: &Database, user: UserId, region: &str) -> Result<(), RelayError> {
    let user = user.0;
    let region = region.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO contacts (user_id, region) VALUES (?1, ?2)
                 ON CONFLICT(user_id) DO UPDATE SET region = excluded.region",
                params![user, region],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn get_contact(db: &Database, user: UserId) -> Result<Option<ContactRecord>, RelayError> {
    let id = user.0;
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT user_id, name, handle, region FROM contacts WHERE user_id = ?1",
                params![id],
                |row| {
                    Ok(ContactRecord {
                        user: UserId(row.get(0)?),
                        name: row.get(1)?,
                        handle: row.get(2)?,
                        region: row.get(3)?,
                    })
                },
            );
            match result {
                Ok(contact) => Ok(Some(contact)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Every contact id, oldest first.
pub async fn list_contact_ids(db: &Database) -> Result<Vec<UserId>, RelayError> {
    db.connection()
        .call(|conn| -> Result<Vec<UserId>, rusqlite::Error> {
            let mut stmt = conn.prepare("SELECT user_id FROM contacts ORDER BY created_at, user_id")?;
            let rows = stmt.query_map([], |row| Ok(UserId(row.get(0)?)))?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn count(db: &Database) -> Result<usize, RelayError> {
    db.connection()
        .call(|conn| -> Result<i64, rusqlite::Error> {
            conn.query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))
        })
        .await
        .map(|n| n.max(0) as usize)
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap(), true).await.unwrap();
        (db, dir)
    }

    fn contact(user: i64) -> ContactRecord {
        ContactRecord {
            user: UserId(user),
            name: "Ann".into(),
            handle: Some("ann".into()),
            region: None,
        }
    }

    #[tokio::test]
    async fn second_insert_for_same_user_is_ignored() {
        let (db, _dir) = setup_db().await;
        assert!(insert_contact(&db, &contact(1)).await.unwrap());
        assert!(!insert_contact(&db, &contact(1)).await.unwrap());
        assert_eq!(count(&db).await.unwrap(), 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn region_updates_existing_contact() {
        let (db, _dir) = setup_db().await;
        insert_contact(&db, &contact(1)).await.unwrap();
        upsert_region(&db, UserId(1), "North").await.unwrap();

        let stored = get_contact(&db, UserId(1)).await.unwrap().unwrap();
        assert_eq!(stored.region.as_deref(), Some("North"));
        assert_eq!(stored.name, "Ann");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn region_creates_bare_contact() {
        let (db, _dir) = setup_db().await;
        upsert_region(&db, UserId(5), "South").await.unwrap();

        let stored = get_contact(&db, UserId(5)).await.unwrap().unwrap();
        assert_eq!(stored.name, "");
        assert_eq!(stored.region.as_deref(), Some("South"));
        assert_eq!(list_contact_ids(&db).await.unwrap(), vec![UserId(5)]);
        db.close().await.unwrap();
    }
}
