// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Helpline relay.

use std::time::Duration;

use thiserror::Error;

use crate::types::{AdminHandle, MessageId, UserId};

/// The primary error type used across all Helpline adapter traits and core operations.
///
/// None of these variants is process-fatal inside the relay core. Callers
/// decide per event whether to report, retry, or drop.
#[derive(Debug, Error)]
pub enum RelayError {
    /// A correlation entry expired or was never recorded.
    #[error("no correlation for forwarded message {forwarded}")]
    NotFound { forwarded: MessageId },

    /// Another administrator already answered this forwarded message.
    #[error("forwarded message {forwarded} already answered by @{by}")]
    AlreadyAnswered {
        forwarded: MessageId,
        by: AdminHandle,
    },

    /// The pending queue has no rows.
    #[error("pending queue is empty")]
    Empty,

    /// More than one pending row exists for a single user.
    #[error("pending table holds {count} rows for user {user}")]
    MultipleRows { user: UserId, count: usize },

    /// A cache or table operation did not complete in time, or the backend is gone.
    #[error("store unavailable during {operation}: {reason}")]
    StoreUnavailable { operation: String, reason: String },

    /// Storage backend errors (query failure, serialization, migrations).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Messaging gateway errors (send failure, closed inbound stream).
    #[error("gateway error: {message}")]
    Gateway {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors (missing token, invalid backend).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Builds a [`RelayError::StoreUnavailable`] for an operation that exceeded its deadline.
    pub fn timed_out(operation: &str, limit: Duration) -> Self {
        RelayError::StoreUnavailable {
            operation: operation.to_string(),
            reason: format!("timed out after {limit:?}"),
        }
    }

    /// Returns `true` for the conditions a caller may retry later.
    pub fn is_transient(&self) -> bool {
        matches!(self, RelayError::StoreUnavailable { .. })
    }
}
