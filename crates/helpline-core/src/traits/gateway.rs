// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging gateway trait for chat platform integrations (Telegram, etc.).

use async_trait::async_trait;

use crate::error::RelayError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChatId, InboundEvent, MessageId};

/// Adapter for the bot transport.
///
/// The relay only needs plain-text delivery, message forwarding and a single
/// inbound stream; polling versus push is the adapter's concern.
#[async_trait]
pub trait MessagingGateway: PluginAdapter {
    /// Establishes a connection to the messaging platform.
    async fn connect(&mut self) -> Result<(), RelayError>;

    /// Sends a text message and returns the id of the delivered message.
    async fn send(&self, to: ChatId, text: &str) -> Result<MessageId, RelayError>;

    /// Forwards `message` from chat `from` into chat `to`, returning the id of the copy.
    async fn forward(
        &self,
        to: ChatId,
        from: ChatId,
        message: MessageId,
    ) -> Result<MessageId, RelayError>;

    /// Receives the next inbound event.
    async fn receive(&self) -> Result<InboundEvent, RelayError>;
}
