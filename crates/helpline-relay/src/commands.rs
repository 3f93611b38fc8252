// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Administrator command dispatch.

use std::str::FromStr;

use futures::future::join_all;
use strum::EnumString;
use tracing::{info, warn};

use helpline_core::{AdminHandle, Command, InboundEvent, RelayError, bounded};

use crate::bans::normalize_key;
use crate::correlation::Origin;
use crate::engine::{Outcome, RoutingEngine};

/// Commands recognized from administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum AdminCommand {
    Start,
    Help,
    Next,
    Add,
    Ban,
    All,
    Stat,
}

impl RoutingEngine {
    pub(crate) async fn dispatch_admin_command(
        &self,
        admin: &AdminHandle,
        event: &InboundEvent,
        command: &Command,
    ) -> Result<Outcome, RelayError> {
        let outcome = Outcome::AdminCommand {
            name: command.name.clone(),
        };
        let messages = &self.settings.messages;

        let Ok(parsed) = AdminCommand::from_str(&command.name) else {
            self.notify(event.chat, &messages.unknown_command).await?;
            return Ok(outcome);
        };

        match parsed {
            AdminCommand::Start => {
                let text = format!("{}\n\n{}", messages.admin_banner, messages.admin_help);
                self.notify(event.chat, &text).await?;
            }
            AdminCommand::Help => self.notify(event.chat, &messages.admin_help).await?,
            AdminCommand::Next => self.next_conversation(admin, event).await?,
            AdminCommand::Add => {
                let handle = AdminHandle::new(&command.args);
                if handle.is_empty() {
                    self.notify(event.chat, &messages.admin_help).await?;
                    return Ok(outcome);
                }
                self.roster.add(&handle).await?;
                self.notify(event.chat, &messages.admin_added).await?;
            }
            AdminCommand::Ban => self.ban_command(admin, event, command).await?,
            AdminCommand::All => {
                if command.args.is_empty() {
                    self.notify(event.chat, &messages.admin_help).await?;
                    return Ok(outcome);
                }
                self.broadcast(admin, event, &command.args).await?;
            }
            AdminCommand::Stat => {
                let timeout = self.settings.table_timeout;
                let contacts = bounded("contacts.count", timeout, self.contacts.count()).await?;
                let pending = self.queue.len().await?;
                let text = format!(
                    "Contacts: {contacts}\nPending conversations: {pending}\nAdministrators: {}",
                    self.roster.len()
                );
                self.notify(event.chat, &text).await?;
            }
        }
        Ok(outcome)
    }

    /// Forwards the oldest pending conversation to the requesting administrator.
    async fn next_conversation(
        &self,
        admin: &AdminHandle,
        event: &InboundEvent,
    ) -> Result<(), RelayError> {
        let (user, messages) = match self.queue.dequeue_oldest().await {
            Ok(next) => next,
            Err(RelayError::Empty) => {
                return self
                    .notify(event.chat, &self.settings.messages.queue_empty)
                    .await;
            }
            Err(e) => return Err(e),
        };

        // Order matters here, so no fan-out.
        let mut delivered = 0usize;
        for message in &messages {
            let copy = match self.gateway.forward(event.chat, user.chat(), *message).await {
                Ok(copy) => copy,
                Err(e) => {
                    warn!(operation = "next.forward", admin = %admin, user = %user, message = %message, error = %e, "forward failed");
                    continue;
                }
            };
            if let Err(e) = self
                .correlations
                .record_forward(event.chat, copy, Origin::new(user, *message))
                .await
            {
                warn!(operation = "next.record", admin = %admin, forwarded = %copy, error = %e, "correlation not recorded");
            }
            delivered += 1;
        }
        if delivered == 0 {
            warn!(admin = %admin, user = %user, total = messages.len(), "no message of the conversation reached the administrator");
            self.queue.requeue(user, &messages).await?;
            return self
                .notify(event.chat, &self.settings.messages.next_failed)
                .await;
        }
        info!(admin = %admin, user = %user, delivered, total = messages.len(), "pending conversation handed out");
        Ok(())
    }

    async fn ban_command(
        &self,
        admin: &AdminHandle,
        event: &InboundEvent,
        command: &Command,
    ) -> Result<(), RelayError> {
        let key = if !command.args.is_empty() {
            normalize_key(&command.args)
        } else if let Some(forwarded) = event.reply_to {
            match self.correlations.resolve(event.chat, forwarded).await {
                Ok(origin) => origin.user.0.to_string(),
                Err(RelayError::NotFound { .. }) => {
                    return self
                        .notify(event.chat, &self.settings.messages.correlation_lost)
                        .await;
                }
                Err(e) => return Err(e),
            }
        } else {
            return self
                .notify(event.chat, &self.settings.messages.admin_help)
                .await;
        };

        if let Err(e) = self.bans.ban(&key).await {
            // The in-process ban already holds; only durability is affected.
            warn!(admin = %admin, key = %key, error = %e, "ban not fully persisted");
        }
        info!(admin = %admin, key = %key, "user banned");
        self.notify(event.chat, &self.settings.messages.user_banned)
            .await
    }

    async fn broadcast(
        &self,
        admin: &AdminHandle,
        event: &InboundEvent,
        text: &str,
    ) -> Result<(), RelayError> {
        let contacts = bounded(
            "contacts.list",
            self.settings.table_timeout,
            self.contacts.contacts(),
        )
        .await?;

        let sends = contacts.iter().map(|user| async move {
            match self.gateway.send(user.chat(), text).await {
                Ok(_) => true,
                Err(e) => {
                    warn!(operation = "broadcast", user = %user, error = %e, "broadcast delivery failed");
                    false
                }
            }
        });
        let delivered = join_all(sends).await.into_iter().filter(|ok| *ok).count();
        info!(admin = %admin, delivered, total = contacts.len(), "broadcast sent");

        let report = format!("Delivered to {delivered} of {} users.", contacts.len());
        self.notify(event.chat, &report).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use helpline_cache::MemoryKv;
    use helpline_core::{AdminRecord, ChatId, MessageId, UserId};
    use helpline_test_utils::fixtures::{admin_message, admin_reply, user_message};
    use helpline_test_utils::{MemoryTable, MockGateway};

    use super::*;
    use crate::engine::RelayStores;
    use crate::settings::RelaySettings;

    const X_CHAT: ChatId = ChatId(900);

    fn engine() -> (RoutingEngine, Arc<MockGateway>, Arc<MemoryTable>) {
        let gateway = Arc::new(MockGateway::new());
        let table = Arc::new(MemoryTable::new());
        let engine = RoutingEngine::new(
            gateway.clone(),
            RelayStores::from_tables(Arc::new(MemoryKv::new()), Arc::clone(&table)),
            RelaySettings::default(),
        );
        engine.roster.load(vec![AdminRecord {
            handle: AdminHandle::new("x"),
            channel: Some(X_CHAT),
        }]);
        (engine, gateway, table)
    }

    #[test]
    fn admin_command_names_parse() {
        assert_eq!(AdminCommand::from_str("next").unwrap(), AdminCommand::Next);
        assert_eq!(AdminCommand::from_str("stat").unwrap(), AdminCommand::Stat);
        assert!(AdminCommand::from_str("region").is_err());
    }

    #[tokio::test]
    async fn next_forwards_messages_in_arrival_order() {
        let (engine, gateway, _table) = engine();
        engine.handle(&user_message(7, 10, "a")).await.unwrap();
        engine.handle(&user_message(7, 11, "b")).await.unwrap();
        gateway.clear().await;

        let outcome = engine
            .handle(&admin_message(X_CHAT.0, "x", 1, "/next"))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::AdminCommand {
                name: "next".into()
            }
        );

        let forwards = gateway.forwards_to(X_CHAT).await;
        let originals: Vec<MessageId> = forwards.iter().map(|f| f.message).collect();
        assert_eq!(originals, vec![MessageId(10), MessageId(11)]);
        for copy in &forwards {
            assert_eq!(
                engine.correlations.resolve(X_CHAT, copy.id).await.unwrap(),
                Origin::new(UserId(7), copy.message)
            );
        }

        engine
            .handle(&admin_message(X_CHAT.0, "x", 2, "/next"))
            .await
            .unwrap();
        assert_eq!(
            gateway.texts_to(X_CHAT).await,
            vec![engine.messages().queue_empty.clone()]
        );
    }

    #[tokio::test]
    async fn next_that_reaches_nobody_keeps_the_conversation_queued() {
        let (engine, gateway, table) = engine();
        engine.handle(&user_message(7, 10, "a")).await.unwrap();
        engine.handle(&user_message(7, 11, "b")).await.unwrap();
        gateway.clear().await;
        gateway.fail_forwards_to(X_CHAT).await;

        engine
            .handle(&admin_message(X_CHAT.0, "x", 1, "/next"))
            .await
            .unwrap();
        assert!(gateway.forwards_to(X_CHAT).await.is_empty());
        assert_eq!(
            gateway.texts_to(X_CHAT).await,
            vec![engine.messages().next_failed.clone()]
        );
        let rows = table.pending_rows().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user, UserId(7));
        assert_eq!(rows[0].message_ids, vec![MessageId(11), MessageId(10)]);
    }

    #[tokio::test]
    async fn add_makes_the_handle_an_admin() {
        let (engine, gateway, table) = engine();
        engine
            .handle(&admin_message(X_CHAT.0, "x", 1, "/add @NewAdmin"))
            .await
            .unwrap();
        assert!(engine.roster.is_admin(&AdminHandle::new("newadmin")));
        assert_eq!(table.admins().await.len(), 1);
        assert_eq!(
            gateway.texts_to(X_CHAT).await,
            vec![engine.messages().admin_added.clone()]
        );
    }

    #[tokio::test]
    async fn ban_by_handle_blocks_that_sender() {
        let (engine, gateway, _table) = engine();
        engine
            .handle(&admin_message(X_CHAT.0, "x", 1, "/ban @user7"))
            .await
            .unwrap();

        let outcome = engine.handle(&user_message(7, 10, "hi")).await.unwrap();
        assert_eq!(outcome, Outcome::Banned);
        assert!(gateway.forwards().await.is_empty());
    }

    #[tokio::test]
    async fn ban_by_numeric_id() {
        let (engine, _gateway, _table) = engine();
        engine
            .handle(&admin_message(X_CHAT.0, "x", 1, "/ban 42"))
            .await
            .unwrap();
        assert!(engine.bans.is_banned(UserId(42), None).await);
    }

    #[tokio::test]
    async fn ban_as_reply_bans_the_resolved_user() {
        let (engine, gateway, table) = engine();
        engine.handle(&user_message(7, 10, "spam")).await.unwrap();
        let copy = gateway.forwards_to(X_CHAT).await[0].id;

        engine
            .handle(&admin_reply(X_CHAT.0, "x", 2, copy, "/ban"))
            .await
            .unwrap();
        assert!(engine.bans.is_banned(UserId(7), None).await);
        assert_eq!(table.banned().await, vec!["7".to_string()]);
    }

    #[tokio::test]
    async fn all_broadcasts_to_contacts_and_reports() {
        let (engine, gateway, _table) = engine();
        engine.handle(&user_message(1, 1, "/start")).await.unwrap();
        engine.handle(&user_message(2, 1, "/start")).await.unwrap();
        gateway.fail_deliveries_to(ChatId(2)).await;
        gateway.clear().await;

        engine
            .handle(&admin_message(X_CHAT.0, "x", 5, "/all Maintenance tonight"))
            .await
            .unwrap();
        assert_eq!(
            gateway.texts_to(ChatId(1)).await,
            vec!["Maintenance tonight".to_string()]
        );
        assert_eq!(
            gateway.texts_to(X_CHAT).await,
            vec!["Delivered to 1 of 2 users.".to_string()]
        );
    }

    #[tokio::test]
    async fn stat_reports_counts() {
        let (engine, gateway, _table) = engine();
        engine.handle(&user_message(1, 1, "/start")).await.unwrap();
        engine.handle(&user_message(1, 2, "question")).await.unwrap();
        gateway.clear().await;

        engine
            .handle(&admin_message(X_CHAT.0, "x", 3, "/stat"))
            .await
            .unwrap();
        let report = &gateway.texts_to(X_CHAT).await[0];
        assert!(report.contains("Contacts: 1"), "got: {report}");
        assert!(report.contains("Pending conversations: 1"), "got: {report}");
    }

    #[tokio::test]
    async fn unknown_admin_command_is_reported() {
        let (engine, gateway, _table) = engine();
        engine
            .handle(&admin_message(X_CHAT.0, "x", 1, "/frobnicate"))
            .await
            .unwrap();
        assert_eq!(
            gateway.texts_to(X_CHAT).await,
            vec![engine.messages().unknown_command.clone()]
        );
    }
}
