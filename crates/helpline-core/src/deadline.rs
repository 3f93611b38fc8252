// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Caller-supplied deadlines for cache and table round trips.

use std::future::Future;
use std::time::Duration;

use crate::error::RelayError;

/// Runs a store operation under `limit`.
///
/// An elapsed deadline becomes [`RelayError::StoreUnavailable`] naming
/// `operation`, so a slow backend is never mistaken for a miss.
pub async fn bounded<T, F>(operation: &str, limit: Duration, fut: F) -> Result<T, RelayError>
where
    F: Future<Output = Result<T, RelayError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, limit_ms = limit.as_millis() as u64, "store operation timed out");
            Err(RelayError::timed_out(operation, limit))
        }
    }
}
