// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock messaging gateway for deterministic testing.
//!
//! `MockGateway` returns injected events from `receive()` and records every
//! `send` and `forward`, handing out increasing message ids. By default ids
//! come from one counter; [`MockGateway::per_chat`] numbers each destination
//! chat separately, the way Telegram does, so ids repeat across chats.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use helpline_core::{
    AdapterType, ChatId, HealthStatus, InboundEvent, MessageId, MessagingGateway, PluginAdapter,
    RelayError,
};

/// A text delivered through `send`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentText {
    pub to: ChatId,
    pub text: String,
    pub id: MessageId,
}

/// A copy produced by `forward`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forwarded {
    pub to: ChatId,
    pub from: ChatId,
    pub message: MessageId,
    pub id: MessageId,
}

pub struct MockGateway {
    inbound: Arc<Mutex<VecDeque<InboundEvent>>>,
    notify: Arc<Notify>,
    sent: Arc<Mutex<Vec<SentText>>>,
    forwards: Arc<Mutex<Vec<Forwarded>>>,
    unreachable: Arc<Mutex<HashSet<ChatId>>>,
    no_forwards: Arc<Mutex<HashSet<ChatId>>>,
    numbering: Numbering,
}

enum Numbering {
    Global(AtomicI64),
    /// Last id handed out in each chat.
    PerChat(Mutex<HashMap<ChatId, i64>>),
}

impl MockGateway {
    /// Delivered copies get ids starting at 1000, unique across chats.
    pub fn new() -> Self {
        Self::with_numbering(Numbering::Global(AtomicI64::new(1000)))
    }

    /// Every chat numbers its own messages from 1.
    pub fn per_chat() -> Self {
        Self::with_numbering(Numbering::PerChat(Mutex::new(HashMap::new())))
    }

    fn with_numbering(numbering: Numbering) -> Self {
        Self {
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            notify: Arc::new(Notify::new()),
            sent: Arc::new(Mutex::new(Vec::new())),
            forwards: Arc::new(Mutex::new(Vec::new())),
            unreachable: Arc::new(Mutex::new(HashSet::new())),
            no_forwards: Arc::new(Mutex::new(HashSet::new())),
            numbering,
        }
    }

    /// Pretends `count` messages already exist in `chat`. No-op with global numbering.
    pub async fn advance_chat(&self, chat: ChatId, count: i64) {
        if let Numbering::PerChat(last) = &self.numbering {
            *last.lock().await.entry(chat).or_insert(0) += count;
        }
    }

    /// Queues an event for the next `receive()`.
    pub async fn inject(&self, event: InboundEvent) {
        self.inbound.lock().await.push_back(event);
        self.notify.notify_one();
    }

    /// Makes every delivery to `chat` fail with a gateway error.
    pub async fn fail_deliveries_to(&self, chat: ChatId) {
        self.unreachable.lock().await.insert(chat);
    }

    /// Makes forwards into `chat` fail while plain sends still arrive.
    pub async fn fail_forwards_to(&self, chat: ChatId) {
        self.no_forwards.lock().await.insert(chat);
    }

    pub async fn sent(&self) -> Vec<SentText> {
        self.sent.lock().await.clone()
    }

    pub async fn texts_to(&self, chat: ChatId) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|s| s.to == chat)
            .map(|s| s.text.clone())
            .collect()
    }

    pub async fn forwards(&self) -> Vec<Forwarded> {
        self.forwards.lock().await.clone()
    }

    pub async fn forwards_to(&self, chat: ChatId) -> Vec<Forwarded> {
        self.forwards
            .lock()
            .await
            .iter()
            .filter(|f| f.to == chat)
            .cloned()
            .collect()
    }

    pub async fn clear(&self) {
        self.sent.lock().await.clear();
        self.forwards.lock().await.clear();
    }

    async fn check_reachable(&self, chat: ChatId) -> Result<(), RelayError> {
        if self.unreachable.lock().await.contains(&chat) {
            return Err(RelayError::Gateway {
                message: format!("chat {chat} is unreachable"),
                source: None,
            });
        }
        Ok(())
    }

    async fn allocate_id(&self, chat: ChatId) -> MessageId {
        match &self.numbering {
            Numbering::Global(next) => MessageId(next.fetch_add(1, Ordering::SeqCst)),
            Numbering::PerChat(last) => {
                let mut last = last.lock().await;
                let id = last.entry(chat).or_insert(0);
                *id += 1;
                MessageId(*id)
            }
        }
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockGateway {
    fn name(&self) -> &str {
        "mock-gateway"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Gateway
    }

    async fn health_check(&self) -> Result<HealthStatus, RelayError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RelayError> {
        Ok(())
    }
}

#[async_trait]
impl MessagingGateway for MockGateway {
    async fn connect(&mut self) -> Result<(), RelayError> {
        Ok(())
    }

    async fn send(&self, to: ChatId, text: &str) -> Result<MessageId, RelayError> {
        self.check_reachable(to).await?;
        let id = self.allocate_id(to).await;
        self.sent.lock().await.push(SentText {
            to,
            text: text.to_string(),
            id,
        });
        Ok(id)
    }

    async fn forward(
        &self,
        to: ChatId,
        from: ChatId,
        message: MessageId,
    ) -> Result<MessageId, RelayError> {
        self.check_reachable(to).await?;
        if self.no_forwards.lock().await.contains(&to) {
            return Err(RelayError::Gateway {
                message: format!("cannot forward into chat {to}"),
                source: None,
            });
        }
        let id = self.allocate_id(to).await;
        self.forwards.lock().await.push(Forwarded {
            to,
            from,
            message,
            id,
        });
        Ok(id)
    }

    async fn receive(&self) -> Result<InboundEvent, RelayError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(event) = queue.pop_front() {
                    return Ok(event);
                }
            }
            self.notify.notified().await;
        }
    }
}
