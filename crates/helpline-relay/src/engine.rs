// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-event routing.
//!
//! [`RoutingEngine::handle`] classifies one inbound event and drives the
//! correlation store, ban registry, pending queue, dialog state and admin
//! roster. Events are expected one at a time; deliveries inside an event may
//! run concurrently.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use helpline_config::model::MessagesConfig;
use helpline_core::{
    AdminHandle, ChatId, ContactRecord, ContactStore, InboundEvent, KvStore, MessageId,
    MessagingGateway, PendingTable, RelayError, RosterStore, UserId, bounded,
};

use crate::bans::BanRegistry;
use crate::correlation::{CorrelationStore, Origin};
use crate::dialog::{DialogKind, DialogState};
use crate::queue::{Clock, PendingQueue};
use crate::roster::AdminRoster;
use crate::settings::RelaySettings;

/// The stores the engine is built on.
#[derive(Clone)]
pub struct RelayStores {
    pub kv: Arc<dyn KvStore>,
    pub pending: Arc<dyn PendingTable>,
    pub contacts: Arc<dyn ContactStore>,
    pub roster: Arc<dyn RosterStore>,
}

impl RelayStores {
    /// Uses one table backend for every table trait.
    pub fn from_tables<T>(kv: Arc<dyn KvStore>, tables: Arc<T>) -> Self
    where
        T: PendingTable + ContactStore + RosterStore + 'static,
    {
        Self {
            kv,
            pending: tables.clone(),
            contacts: tables.clone(),
            roster: tables,
        }
    }
}

/// What handling an event amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A user message was queued and forwarded to `forwarded` administrators.
    Queued { forwarded: usize },
    /// The sender is banned; nothing was forwarded or recorded.
    Banned,
    /// A user command (`/start`, `/region`, unknown) was answered.
    UserCommand,
    /// A region answer was stored and the dialog closed.
    RegionSaved,
    /// An administrator's answer reached `user`.
    Delivered { user: UserId },
    /// The forward was already answered by `by`; the replier was told.
    AlreadyAnswered { by: AdminHandle },
    /// The forward's correlation expired; the replier was told.
    CorrelationLost,
    /// An administrator command ran.
    AdminCommand { name: String },
    /// Administrator chatter that is neither a command nor a reply.
    Ignored,
}

pub struct RoutingEngine {
    pub(crate) gateway: Arc<dyn MessagingGateway>,
    pub(crate) contacts: Arc<dyn ContactStore>,
    pub(crate) correlations: CorrelationStore,
    pub(crate) bans: BanRegistry,
    pub(crate) queue: PendingQueue,
    pub(crate) dialogs: DialogState,
    pub(crate) roster: AdminRoster,
    pub(crate) settings: RelaySettings,
    roster_store: Arc<dyn RosterStore>,
}

impl RoutingEngine {
    pub fn new(
        gateway: Arc<dyn MessagingGateway>,
        stores: RelayStores,
        settings: RelaySettings,
    ) -> Self {
        let queue = PendingQueue::new(Arc::clone(&stores.pending), settings.table_timeout);
        Self::build(gateway, stores, settings, queue)
    }

    /// Like [`RoutingEngine::new`] with a fixed clock for the pending queue.
    pub fn with_clock(
        gateway: Arc<dyn MessagingGateway>,
        stores: RelayStores,
        settings: RelaySettings,
        clock: Clock,
    ) -> Self {
        let queue =
            PendingQueue::with_clock(Arc::clone(&stores.pending), settings.table_timeout, clock);
        Self::build(gateway, stores, settings, queue)
    }

    fn build(
        gateway: Arc<dyn MessagingGateway>,
        stores: RelayStores,
        settings: RelaySettings,
        queue: PendingQueue,
    ) -> Self {
        Self {
            correlations: CorrelationStore::new(
                Arc::clone(&stores.kv),
                settings.retention,
                settings.cache_timeout,
            ),
            bans: BanRegistry::new(
                Arc::clone(&stores.kv),
                Arc::clone(&stores.roster),
                settings.ban_ttl,
                settings.cache_timeout,
                settings.table_timeout,
            ),
            roster: AdminRoster::new(Arc::clone(&stores.roster), settings.table_timeout),
            dialogs: DialogState::new(),
            queue,
            gateway,
            contacts: stores.contacts,
            roster_store: stores.roster,
            settings,
        }
    }

    /// Replays the persisted roster and ban list, then adds `bootstrap` handles.
    pub async fn bootstrap(&self, bootstrap: &[String]) -> Result<(), RelayError> {
        let timeout = self.settings.table_timeout;
        let admins = bounded("roster.load", timeout, self.roster_store.load_admins()).await?;
        self.roster.load(admins);
        let banned = bounded("bans.load", timeout, self.roster_store.load_banned()).await?;
        self.bans.load(banned);

        for raw in bootstrap {
            let handle = AdminHandle::new(raw);
            if !self.roster.is_admin(&handle) {
                self.roster.add(&handle).await?;
            }
        }
        info!(
            admins = self.roster.len(),
            banned = self.bans.len(),
            "relay state restored"
        );
        Ok(())
    }

    pub fn messages(&self) -> &MessagesConfig {
        &self.settings.messages
    }

    pub fn roster(&self) -> &AdminRoster {
        &self.roster
    }

    pub fn bans(&self) -> &BanRegistry {
        &self.bans
    }

    pub fn dialogs(&self) -> &DialogState {
        &self.dialogs
    }

    pub fn queue(&self) -> &PendingQueue {
        &self.queue
    }

    pub fn correlations(&self) -> &CorrelationStore {
        &self.correlations
    }

    /// Handles one inbound event.
    pub async fn handle(&self, event: &InboundEvent) -> Result<Outcome, RelayError> {
        if let Some(handle) = event.handle()
            && self.roster.is_admin(&handle)
        {
            self.roster.observe(&handle, event.chat).await;
            return self.handle_admin(&handle, event).await;
        }
        self.handle_user(event).await
    }

    async fn handle_admin(
        &self,
        admin: &AdminHandle,
        event: &InboundEvent,
    ) -> Result<Outcome, RelayError> {
        if let Some(command) = &event.command {
            return self.dispatch_admin_command(admin, event, command).await;
        }
        match event.reply_to {
            Some(forwarded) => self.answer(admin, event, forwarded).await,
            None => {
                debug!(admin = %admin, "ignoring administrator message without reply");
                Ok(Outcome::Ignored)
            }
        }
    }

    /// Routes an administrator's reply to the user behind copy `forwarded`.
    ///
    /// The first administrator to answer a user message owns it; later
    /// answers from others through any copy of that message are refused.
    async fn answer(
        &self,
        admin: &AdminHandle,
        event: &InboundEvent,
        forwarded: MessageId,
    ) -> Result<Outcome, RelayError> {
        let origin = match self.correlations.resolve(event.chat, forwarded).await {
            Ok(origin) => origin,
            Err(RelayError::NotFound { .. }) => {
                info!(admin = %admin, forwarded = %forwarded, "reply to an expired forward");
                self.notify(event.chat, &self.settings.messages.correlation_lost)
                    .await?;
                return Ok(Outcome::CorrelationLost);
            }
            Err(e) => return Err(e),
        };
        let user = origin.user;

        match self
            .correlations
            .ensure_unanswered(origin, forwarded, admin)
            .await
        {
            Ok(()) => {}
            Err(RelayError::AlreadyAnswered { by, .. }) => {
                info!(admin = %admin, first = %by, user = %user, forwarded = %forwarded, "duplicate answer rejected");
                self.notify(event.chat, &self.settings.messages.already_answered)
                    .await?;
                return Ok(Outcome::AlreadyAnswered { by });
            }
            Err(e) => return Err(e),
        }

        match event.text.as_deref() {
            Some(text) => self.gateway.send(user.chat(), text).await?,
            None => {
                self.gateway
                    .forward(user.chat(), event.chat, event.message_id)
                    .await?
            }
        };
        self.correlations.mark_answered(origin, admin).await?;
        info!(admin = %admin, user = %user, forwarded = %forwarded, "answer delivered");

        let others = self.roster.targets(Some(admin));
        let copies = others.iter().map(|(other, chat)| async move {
            if let Err(e) = self
                .gateway
                .forward(*chat, event.chat, event.message_id)
                .await
            {
                warn!(operation = "answer.copy", admin = %other, error = %e, "failed to copy answer");
            }
        });
        join_all(copies).await;

        Ok(Outcome::Delivered { user })
    }

    async fn handle_user(&self, event: &InboundEvent) -> Result<Outcome, RelayError> {
        let user = event.user();
        let handle = event.handle();

        if self.bans.is_banned(user, handle.as_ref()).await {
            debug!(user = %user, "dropping message from banned user");
            return Ok(Outcome::Banned);
        }

        if let Some(command) = &event.command {
            match command.name.as_str() {
                "start" => {
                    let contact = ContactRecord {
                        user,
                        name: event.sender_name.clone(),
                        handle: handle.map(|h| h.as_str().to_string()),
                        region: None,
                    };
                    let created = bounded(
                        "contacts.save",
                        self.settings.table_timeout,
                        self.contacts.save_contact(&contact),
                    )
                    .await?;
                    if created {
                        info!(user = %user, "new contact");
                    }
                    self.notify(event.chat, &self.settings.messages.welcome)
                        .await?;
                }
                "region" => {
                    self.dialogs.enter(user, DialogKind::Region);
                    self.notify(event.chat, &self.settings.messages.region_prompt)
                        .await?;
                }
                _ => {
                    self.notify(event.chat, &self.settings.messages.unknown_command)
                        .await?;
                }
            }
            return Ok(Outcome::UserCommand);
        }

        if let Some(DialogKind::Region) = self.dialogs.current(user) {
            let Some(region) = event.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
            else {
                self.notify(event.chat, &self.settings.messages.region_prompt)
                    .await?;
                return Ok(Outcome::UserCommand);
            };
            bounded(
                "contacts.save_region",
                self.settings.table_timeout,
                self.contacts.save_region(user, region),
            )
            .await?;
            self.dialogs.exit(user);
            self.notify(event.chat, &self.settings.messages.region_saved)
                .await?;
            return Ok(Outcome::RegionSaved);
        }

        self.queue.enqueue(user, event.message_id).await?;
        if let Err(e) = self
            .gateway
            .send(event.chat, &self.settings.messages.feedback)
            .await
        {
            warn!(operation = "feedback", user = %user, error = %e, "failed to acknowledge user");
        }
        let forwarded = self
            .fan_out(user, event.chat, event.message_id, &self.roster.targets(None))
            .await;
        Ok(Outcome::Queued { forwarded })
    }

    /// Forwards one user message to every target and records each copy.
    ///
    /// Returns how many copies were delivered and recorded.
    pub(crate) async fn fan_out(
        &self,
        user: UserId,
        from: ChatId,
        message: MessageId,
        targets: &[(AdminHandle, ChatId)],
    ) -> usize {
        let deliveries = targets.iter().map(|(admin, chat)| async move {
            let copy = match self.gateway.forward(*chat, from, message).await {
                Ok(copy) => copy,
                Err(e) => {
                    warn!(operation = "fan_out.forward", admin = %admin, user = %user, error = %e, "forward failed");
                    return false;
                }
            };
            match self
                .correlations
                .record_forward(*chat, copy, Origin::new(user, message))
                .await
            {
                Ok(()) => true,
                Err(e) => {
                    warn!(operation = "fan_out.record", admin = %admin, forwarded = %copy, error = %e, "correlation not recorded");
                    false
                }
            }
        });
        join_all(deliveries).await.into_iter().filter(|ok| *ok).count()
    }

    pub(crate) async fn notify(&self, chat: ChatId, text: &str) -> Result<(), RelayError> {
        self.gateway.send(chat, text).await.map(|_| ())
    }
}
