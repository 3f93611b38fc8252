// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Forwarded-copy to sender correlation, and the first-answer marker.
//!
//! Message ids are only unique inside one chat, so a copy is addressed by the
//! administrator chat it landed in plus its id there.
//!
//! Keys: `fwd/{chat}/{forwarded}` maps a copy to the [`Origin`] it was made
//! from and expires after the retention window. `answered/{user}/{message}`
//! names the administrator whose answer to that original message was
//! delivered and never expires. Every copy of one user message shares the
//! answered marker.

use std::sync::Arc;
use std::time::Duration;

use helpline_core::{AdminHandle, ChatId, KvStore, MessageId, RelayError, UserId, bounded};
use tracing::warn;

/// The user message a forwarded copy stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Origin {
    pub user: UserId,
    /// Id of the original message in the user's chat.
    pub message: MessageId,
}

impl Origin {
    pub fn new(user: UserId, message: MessageId) -> Self {
        Self { user, message }
    }

    fn encode(self) -> String {
        format!("{}/{}", self.user, self.message)
    }

    fn decode(raw: &str) -> Option<Self> {
        let (user, message) = raw.split_once('/')?;
        Some(Self {
            user: UserId(user.parse().ok()?),
            message: MessageId(message.parse().ok()?),
        })
    }
}

fn forward_key(chat: ChatId, forwarded: MessageId) -> String {
    format!("fwd/{chat}/{forwarded}")
}

fn answered_key(origin: Origin) -> String {
    format!("answered/{}", origin.encode())
}

pub struct CorrelationStore {
    kv: Arc<dyn KvStore>,
    retention: Duration,
    timeout: Duration,
}

impl CorrelationStore {
    pub fn new(kv: Arc<dyn KvStore>, retention: Duration, timeout: Duration) -> Self {
        Self {
            kv,
            retention,
            timeout,
        }
    }

    /// Remembers that copy `forwarded` in `chat` was made from `origin`. Overwrites.
    pub async fn record_forward(
        &self,
        chat: ChatId,
        forwarded: MessageId,
        origin: Origin,
    ) -> Result<(), RelayError> {
        bounded(
            "correlation.record_forward",
            self.timeout,
            self.kv
                .set(&forward_key(chat, forwarded), &origin.encode(), Some(self.retention)),
        )
        .await
    }

    /// The message behind copy `forwarded` in `chat`, or [`RelayError::NotFound`] once expired.
    pub async fn resolve(&self, chat: ChatId, forwarded: MessageId) -> Result<Origin, RelayError> {
        let key = forward_key(chat, forwarded);
        let value = bounded("correlation.resolve", self.timeout, self.kv.get(&key)).await?;
        let Some(raw) = value else {
            return Err(RelayError::NotFound { forwarded });
        };
        Origin::decode(&raw).ok_or_else(|| {
            warn!(chat = %chat, forwarded = %forwarded, value = %raw, "corrupt correlation entry");
            RelayError::NotFound { forwarded }
        })
    }

    pub async fn mark_answered(&self, origin: Origin, admin: &AdminHandle) -> Result<(), RelayError> {
        bounded(
            "correlation.mark_answered",
            self.timeout,
            self.kv.set(&answered_key(origin), admin.as_str(), None),
        )
        .await
    }

    /// Who answered `origin` first, if anyone.
    pub async fn answerer(&self, origin: Origin) -> Result<Option<AdminHandle>, RelayError> {
        let key = answered_key(origin);
        let value = bounded("correlation.answerer", self.timeout, self.kv.get(&key)).await?;
        Ok(value.map(|raw| AdminHandle::new(&raw)))
    }

    /// Fails with [`RelayError::AlreadyAnswered`] when an administrator other
    /// than `admin` already answered `origin`. `forwarded` is the copy being
    /// replied to and only names the attempt in the error.
    pub async fn ensure_unanswered(
        &self,
        origin: Origin,
        forwarded: MessageId,
        admin: &AdminHandle,
    ) -> Result<(), RelayError> {
        match self.answerer(origin).await? {
            Some(by) if &by != admin => Err(RelayError::AlreadyAnswered { forwarded, by }),
            _ => Ok(()),
        }
    }
}
