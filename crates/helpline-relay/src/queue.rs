// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pending-conversation FIFO rebuilt from the persisted table.
//!
//! Each user owns at most one row whose id list is kept newest first;
//! [`PendingQueue::dequeue_oldest`] hands the list back in arrival order.

use std::sync::Arc;
use std::time::Duration;

use helpline_core::{MessageId, PendingRow, PendingTable, RelayError, UserId, bounded};
use tracing::{debug, error};

/// Unix-millisecond clock.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(|| chrono::Utc::now().timestamp_millis())
}

/// FIFO of users waiting for an answer.
///
/// `dequeue_oldest` reads, then clears. A message enqueued for the same user
/// between those two calls is dropped with the row. This race is accepted:
/// events are handled one at a time, so only an external writer can hit it.
pub struct PendingQueue {
    table: Arc<dyn PendingTable>,
    timeout: Duration,
    clock: Clock,
}

impl PendingQueue {
    pub fn new(table: Arc<dyn PendingTable>, timeout: Duration) -> Self {
        Self::with_clock(table, timeout, system_clock())
    }

    pub fn with_clock(table: Arc<dyn PendingTable>, timeout: Duration, clock: Clock) -> Self {
        Self {
            table,
            timeout,
            clock,
        }
    }

    /// Adds `message` to the front of `user`'s row, creating the row if needed.
    pub async fn enqueue(&self, user: UserId, message: MessageId) -> Result<(), RelayError> {
        let rows = bounded("pending.rows_for", self.timeout, self.table.rows_for(user)).await?;
        let now = (self.clock)();

        match rows.as_slice() {
            [] => {
                let key = bounded(
                    "pending.append",
                    self.timeout,
                    self.table.append(user, &[message], now),
                )
                .await?;
                debug!(user = %user, row = key, "pending row created");
                Ok(())
            }
            [row] => {
                let mut row = row.clone();
                row.message_ids.insert(0, message);
                row.updated_at = now;
                bounded("pending.update", self.timeout, self.table.update(&row)).await
            }
            many => {
                let keys: Vec<i64> = many.iter().map(|r| r.key).collect();
                error!(user = %user, count = many.len(), rows = ?keys, "multiple pending rows for one user");
                Err(RelayError::MultipleRows {
                    user,
                    count: many.len(),
                })
            }
        }
    }

    /// Removes the least recently updated row and returns its ids oldest first.
    pub async fn dequeue_oldest(&self) -> Result<(UserId, Vec<MessageId>), RelayError> {
        let rows = bounded("pending.read_all", self.timeout, self.table.read_all()).await?;
        let oldest = rows
            .into_iter()
            .min_by_key(|row| (row.updated_at, row.key))
            .ok_or(RelayError::Empty)?;

        bounded("pending.clear", self.timeout, self.table.clear(oldest.key)).await?;

        let mut ids = oldest.message_ids;
        ids.reverse();
        Ok((oldest.user, ids))
    }

    /// Puts a conversation taken by `dequeue_oldest` back at the head of the queue.
    ///
    /// `messages` is oldest first. If the user wrote again in the meantime the
    /// returned ids are kept behind the newer ones in the same row.
    pub async fn requeue(&self, user: UserId, messages: &[MessageId]) -> Result<(), RelayError> {
        if messages.is_empty() {
            return Ok(());
        }
        let rows = bounded("pending.read_all", self.timeout, self.table.read_all()).await?;
        let head = rows
            .iter()
            .map(|row| row.updated_at)
            .min()
            .map_or_else(|| (self.clock)(), |oldest| oldest.saturating_sub(1));
        let newest_first: Vec<MessageId> = messages.iter().rev().copied().collect();

        let own: Vec<&PendingRow> = rows.iter().filter(|row| row.user == user).collect();
        match own.as_slice() {
            [] => {
                let key = bounded(
                    "pending.append",
                    self.timeout,
                    self.table.append(user, &newest_first, head),
                )
                .await?;
                debug!(user = %user, row = key, "pending row restored");
                Ok(())
            }
            [row] => {
                let mut row = (*row).clone();
                row.message_ids.extend(newest_first);
                row.updated_at = head;
                bounded("pending.update", self.timeout, self.table.update(&row)).await
            }
            many => {
                error!(user = %user, count = many.len(), "multiple pending rows for one user");
                Err(RelayError::MultipleRows {
                    user,
                    count: many.len(),
                })
            }
        }
    }

    /// Number of users waiting.
    pub async fn len(&self) -> Result<usize, RelayError> {
        bounded("pending.count", self.timeout, self.table.count()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    use helpline_test_utils::MemoryTable;

    fn ticking_clock() -> Clock {
        let now = Arc::new(AtomicI64::new(0));
        Arc::new(move || now.fetch_add(1, Ordering::SeqCst))
    }

    fn queue(table: Arc<MemoryTable>) -> PendingQueue {
        PendingQueue::with_clock(table, Duration::from_secs(1), ticking_clock())
    }

    #[tokio::test]
    async fn ids_are_stored_newest_first_and_returned_in_arrival_order() {
        let table = Arc::new(MemoryTable::new());
        let queue = queue(Arc::clone(&table));

        queue.enqueue(UserId(1), MessageId(10)).await.unwrap();
        queue.enqueue(UserId(1), MessageId(11)).await.unwrap();

        let rows = table.pending_rows().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].message_ids, vec![MessageId(11), MessageId(10)]);

        let (user, ids) = queue.dequeue_oldest().await.unwrap();
        assert_eq!(user, UserId(1));
        assert_eq!(ids, vec![MessageId(10), MessageId(11)]);
    }

    #[tokio::test]
    async fn many_enqueues_then_one_dequeue_drains_the_user() {
        let queue = queue(Arc::new(MemoryTable::new()));
        let sent: Vec<MessageId> = (100..=120).map(MessageId).collect();
        for id in &sent {
            queue.enqueue(UserId(3), *id).await.unwrap();
        }

        let (_, ids) = queue.dequeue_oldest().await.unwrap();
        assert_eq!(ids, sent);
        assert!(matches!(queue.dequeue_oldest().await, Err(RelayError::Empty)));
    }

    #[tokio::test]
    async fn least_recently_updated_user_comes_first() {
        let queue = queue(Arc::new(MemoryTable::new()));
        queue.enqueue(UserId(1), MessageId(1)).await.unwrap();
        queue.enqueue(UserId(2), MessageId(2)).await.unwrap();
        // Refreshes user 1, so user 2 is now the oldest.
        queue.enqueue(UserId(1), MessageId(3)).await.unwrap();

        assert_eq!(queue.len().await.unwrap(), 2);
        assert_eq!(queue.dequeue_oldest().await.unwrap().0, UserId(2));
        assert_eq!(queue.dequeue_oldest().await.unwrap().0, UserId(1));
    }

    #[tokio::test]
    async fn requeued_conversation_is_next_again() {
        let queue = queue(Arc::new(MemoryTable::new()));
        queue.enqueue(UserId(1), MessageId(1)).await.unwrap();
        queue.enqueue(UserId(1), MessageId(2)).await.unwrap();
        queue.enqueue(UserId(2), MessageId(3)).await.unwrap();

        let (user, ids) = queue.dequeue_oldest().await.unwrap();
        assert_eq!(user, UserId(1));
        queue.requeue(user, &ids).await.unwrap();

        assert_eq!(
            queue.dequeue_oldest().await.unwrap(),
            (UserId(1), vec![MessageId(1), MessageId(2)])
        );
        assert_eq!(queue.dequeue_oldest().await.unwrap().0, UserId(2));
    }

    #[tokio::test]
    async fn requeue_keeps_newer_messages_of_the_same_user() {
        let queue = queue(Arc::new(MemoryTable::new()));
        queue.enqueue(UserId(1), MessageId(1)).await.unwrap();
        let (user, ids) = queue.dequeue_oldest().await.unwrap();
        queue.enqueue(UserId(1), MessageId(2)).await.unwrap();

        queue.requeue(user, &ids).await.unwrap();
        assert_eq!(queue.len().await.unwrap(), 1);
        assert_eq!(
            queue.dequeue_oldest().await.unwrap().1,
            vec![MessageId(1), MessageId(2)]
        );
    }

    #[tokio::test]
    async fn timestamp_ties_break_on_row_key() {
        let table = Arc::new(MemoryTable::new());
        let late = table.inject_row(UserId(8), &[MessageId(1)], 5).await;
        table.inject_row(UserId(9), &[MessageId(2)], 5).await;
        assert!(late < table.pending_rows().await[1].key);

        let queue = queue(table);
        assert_eq!(queue.dequeue_oldest().await.unwrap().0, UserId(8));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn duplicate_rows_are_reported_and_left_untouched() {
        let table = Arc::new(MemoryTable::new());
        table.inject_row(UserId(4), &[MessageId(1)], 1).await;
        table.inject_row(UserId(4), &[MessageId(2)], 2).await;
        let queue = queue(Arc::clone(&table));

        let err = queue.enqueue(UserId(4), MessageId(3)).await.unwrap_err();
        assert!(matches!(err, RelayError::MultipleRows { user: UserId(4), count: 2 }));
        assert!(logs_contain("multiple pending rows"));

        let rows: Vec<PendingRow> = table.pending_rows().await;
        assert!(rows.iter().all(|r| r.message_ids.len() == 1));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_table_is_store_unavailable() {
        let table = Arc::new(MemoryTable::new());
        table.set_delay(Duration::from_secs(30)).await;
        let queue = queue(table);
        assert!(queue.dequeue_oldest().await.unwrap_err().is_transient());
    }
}
