// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The receive loop and the expired-entry sweeper.
//!
//! [`RelayService::run`] pulls one event at a time from the gateway and hands
//! it to the [`RoutingEngine`]. Errors from a single event are logged and the
//! loop moves on; only a closed gateway or a cancelled token ends it.

use std::sync::Arc;
use std::time::Duration;

use helpline_core::{InboundEvent, KvStore, MessagingGateway, RelayError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::engine::{Outcome, RoutingEngine};

pub struct RelayService {
    engine: Arc<RoutingEngine>,
    gateway: Arc<dyn MessagingGateway>,
    notify_banned: bool,
}

impl RelayService {
    pub fn new(
        engine: Arc<RoutingEngine>,
        gateway: Arc<dyn MessagingGateway>,
        notify_banned: bool,
    ) -> Self {
        Self {
            engine,
            gateway,
            notify_banned,
        }
    }

    pub fn engine(&self) -> &RoutingEngine {
        &self.engine
    }

    /// Runs until `cancel` fires or the gateway stops producing events.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), RelayError> {
        info!("relay loop started");
        loop {
            let event = tokio::select! {
                result = self.gateway.receive() => result,
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, leaving relay loop");
                    break;
                }
            };

            match event {
                Ok(event) => {
                    if let Err(e) = self.process(&event).await {
                        error!(chat = %event.chat, message = %event.message_id, error = %e, "event handling failed");
                    }
                }
                Err(e) if e.is_transient() => {
                    warn!(error = %e, "transient receive error");
                }
                Err(e) => {
                    error!(error = %e, "gateway receive failed, stopping relay loop");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Routes one event and applies the transport-level follow-up.
    pub async fn process(&self, event: &InboundEvent) -> Result<Outcome, RelayError> {
        let outcome = self.engine.handle(event).await?;
        debug!(chat = %event.chat, outcome = ?outcome, "event routed");

        if outcome == Outcome::Banned && self.notify_banned {
            let text = &self.engine.messages().banned;
            if let Err(e) = self.gateway.send(event.chat, text).await {
                warn!(chat = %event.chat, error = %e, "ban notice not delivered");
            }
        }
        Ok(outcome)
    }
}

/// Spawns a task that purges expired entries from `kv` every `every`.
///
/// Returns `None` when `every` is zero.
pub fn spawn_sweeper(
    kv: Arc<dyn KvStore>,
    every: Duration,
    cancel: CancellationToken,
) -> Option<JoinHandle<()>> {
    if every.is_zero() {
        debug!("expired-entry sweeper disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick fires immediately.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match kv.purge_expired().await {
                        Ok(0) => {}
                        Ok(removed) => debug!(removed, store = kv.name(), "expired entries purged"),
                        Err(e) => warn!(store = kv.name(), error = %e, "expired-entry sweep failed"),
                    }
                }
                _ = cancel.cancelled() => {
                    debug!("expired-entry sweeper stopping");
                    break;
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use helpline_cache::MemoryKv;
    use helpline_core::{AdminHandle, AdminRecord, ChatId};
    use helpline_test_utils::fixtures::{admin_message, user_message};
    use helpline_test_utils::{MemoryTable, MockGateway};

    use super::*;
    use crate::engine::RelayStores;
    use crate::settings::RelaySettings;

    fn service(notify_banned: bool) -> (RelayService, Arc<MockGateway>) {
        let gateway = Arc::new(MockGateway::new());
        let table = Arc::new(MemoryTable::new());
        let engine = RoutingEngine::new(
            gateway.clone(),
            RelayStores::from_tables(Arc::new(MemoryKv::new()), table),
            RelaySettings::default(),
        );
        engine.roster().load(vec![AdminRecord {
            handle: AdminHandle::new("x"),
            channel: Some(ChatId(900)),
        }]);
        (
            RelayService::new(Arc::new(engine), gateway.clone(), notify_banned),
            gateway,
        )
    }

    #[tokio::test]
    async fn banned_sender_is_told_when_enabled() {
        let (service, gateway) = service(true);
        service.engine().bans().ban("7").await.unwrap();

        let outcome = service.process(&user_message(7, 1, "hi")).await.unwrap();
        assert_eq!(outcome, Outcome::Banned);
        assert_eq!(
            gateway.texts_to(ChatId(7)).await,
            vec![service.engine().messages().banned.clone()]
        );
    }

    #[tokio::test]
    async fn banned_sender_hears_nothing_when_disabled() {
        let (service, gateway) = service(false);
        service.engine().bans().ban("7").await.unwrap();

        service.process(&user_message(7, 1, "hi")).await.unwrap();
        assert!(gateway.sent().await.is_empty());
    }

    #[tokio::test]
    async fn run_processes_injected_events_until_cancelled() {
        let (service, gateway) = service(true);
        let service = Arc::new(service);
        let cancel = CancellationToken::new();

        gateway.inject(user_message(7, 10, "question")).await;
        gateway.inject(admin_message(900, "x", 1, "/stat")).await;

        let task = {
            let service = Arc::clone(&service);
            let cancel = cancel.clone();
            tokio::spawn(async move { service.run(cancel).await })
        };

        for _ in 0..100 {
            if !gateway.texts_to(ChatId(900)).await.is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        cancel.cancel();
        task.await.unwrap().unwrap();

        assert_eq!(gateway.forwards_to(ChatId(900)).await.len(), 1);
        let reports = gateway.texts_to(ChatId(900)).await;
        assert!(reports[0].contains("Pending conversations: 1"), "got: {reports:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_purges_and_stops_on_cancel() {
        let kv = Arc::new(MemoryKv::new());
        kv.set("short", "v", Some(Duration::from_secs(1))).await.unwrap();
        kv.set("long", "v", None).await.unwrap();

        let cancel = CancellationToken::new();
        let handle = spawn_sweeper(kv.clone(), Duration::from_secs(5), cancel.clone())
            .expect("sweeper enabled");

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(kv.len(), 1);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[test]
    fn zero_interval_disables_the_sweeper() {
        let kv: Arc<dyn KvStore> = Arc::new(MemoryKv::new());
        assert!(spawn_sweeper(kv, Duration::ZERO, CancellationToken::new()).is_none());
    }
}
