// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram gateway adapter for the Helpline relay.
//!
//! Implements [`MessagingGateway`] for the Telegram Bot API via teloxide
//! long polling. Updates are filtered to private chats, converted to
//! [`InboundEvent`]s and handed to the relay through a bounded channel.

pub mod handler;

use async_trait::async_trait;
use helpline_config::model::TelegramConfig;
use helpline_core::{
    AdapterType, ChatId, HealthStatus, InboundEvent, MessageId, MessagingGateway, PluginAdapter,
    RelayError,
};
use teloxide::dispatching::ShutdownToken;
use teloxide::prelude::*;
use teloxide::types::{ChatId as TgChatId, MessageId as TgMessageId};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const INBOUND_CAPACITY: usize = 100;

pub struct TelegramGateway {
    bot: Bot,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundEvent>>,
    inbound_tx: mpsc::Sender<InboundEvent>,
    polling: Option<(tokio::task::JoinHandle<()>, ShutdownToken)>,
}

impl TelegramGateway {
    /// Creates the adapter. Requires `config.bot_token` to be set.
    pub fn new(config: &TelegramConfig) -> Result<Self, RelayError> {
        let token = config
            .bot_token
            .as_deref()
            .ok_or_else(|| RelayError::Config("telegram.bot_token is required".into()))?;

        if token.trim().is_empty() {
            return Err(RelayError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
        Ok(Self {
            bot: Bot::new(token),
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            polling: None,
        })
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

fn gateway_err(action: &str, e: teloxide::RequestError) -> RelayError {
    RelayError::Gateway {
        message: format!("failed to {action}: {e}"),
        source: Some(Box::new(e)),
    }
}

fn message_id(id: MessageId) -> Result<TgMessageId, RelayError> {
    i32::try_from(id.0)
        .map(TgMessageId)
        .map_err(|_| RelayError::Gateway {
            message: format!("message id {id} is out of range for Telegram"),
            source: None,
        })
}

#[async_trait]
impl PluginAdapter for TelegramGateway {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Gateway
    }

    async fn health_check(&self) -> Result<HealthStatus, RelayError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), RelayError> {
        let Some((_, token)) = &self.polling else {
            return Ok(());
        };
        match token.shutdown() {
            Ok(stopped) => {
                stopped.await;
                debug!("Telegram polling stopped");
            }
            Err(_) => debug!("Telegram polling was not running"),
        }
        Ok(())
    }
}

#[async_trait]
impl MessagingGateway for TelegramGateway {
    async fn connect(&mut self) -> Result<(), RelayError> {
        if self.polling.is_some() {
            return Ok(());
        }

        let tx = self.inbound_tx.clone();
        let handler = Update::filter_message().endpoint(move |msg: Message| {
            let tx = tx.clone();
            async move {
                if !handler::should_relay(&msg) {
                    debug!(chat_id = msg.chat.id.0, "ignoring non-private message");
                    return respond(());
                }
                if tx.send(handler::to_inbound_event(&msg)).await.is_err() {
                    warn!("inbound channel closed, dropping message");
                }
                respond(())
            }
        });

        let mut dispatcher = Dispatcher::builder(self.bot.clone(), handler)
            .default_handler(|_| async {})
            .build();
        let token = dispatcher.shutdown_token();

        info!("starting Telegram long polling");
        let handle = tokio::spawn(async move {
            dispatcher.dispatch().await;
        });
        self.polling = Some((handle, token));
        Ok(())
    }

    async fn send(&self, to: ChatId, text: &str) -> Result<MessageId, RelayError> {
        let sent = self
            .bot
            .send_message(TgChatId(to.0), text)
            .await
            .map_err(|e| gateway_err("send message", e))?;
        Ok(MessageId(i64::from(sent.id.0)))
    }

    async fn forward(
        &self,
        to: ChatId,
        from: ChatId,
        message: MessageId,
    ) -> Result<MessageId, RelayError> {
        let copy = self
            .bot
            .forward_message(TgChatId(to.0), TgChatId(from.0), message_id(message)?)
            .await
            .map_err(|e| gateway_err("forward message", e))?;
        Ok(MessageId(i64::from(copy.id.0)))
    }

    async fn receive(&self) -> Result<InboundEvent, RelayError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| RelayError::Gateway {
            message: "Telegram inbound channel closed".into(),
            source: None,
        })
    }
}
