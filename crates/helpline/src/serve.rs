// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `helpline serve`: wires storage, cache, gateway and the relay engine, then
//! runs the receive loop until a shutdown signal.

use std::sync::Arc;
use std::time::Duration;

use helpline_cache::MemoryKv;
use helpline_config::HelplineConfig;
use helpline_config::model::CacheBackend;
use helpline_core::{KvStore, MessagingGateway, PluginAdapter, RelayError};
use helpline_relay::{RelaySettings, RelayService, RelayStores, RoutingEngine, spawn_sweeper};
use helpline_storage::{SqliteKv, SqliteStorage};
use helpline_telegram::TelegramGateway;
use tracing::{info, warn};

use crate::shutdown;

/// Runs the relay until SIGINT/SIGTERM.
pub async fn run_serve(config: HelplineConfig) -> Result<(), RelayError> {
    init_tracing(&config.relay.log_level);
    info!(
        database = %config.storage.database_path,
        cache = ?config.cache.backend,
        "starting helpline"
    );

    let storage = Arc::new(SqliteStorage::open(&config.storage).await?);
    let kv = build_kv(&config, &storage);

    let mut telegram = TelegramGateway::new(&config.telegram)?;
    telegram.connect().await?;
    let gateway: Arc<dyn MessagingGateway> = Arc::new(telegram);

    let engine = RoutingEngine::new(
        Arc::clone(&gateway),
        RelayStores::from_tables(Arc::clone(&kv), Arc::clone(&storage)),
        RelaySettings::from(&config),
    );
    engine.bootstrap(&config.admins.bootstrap).await?;
    if engine.roster().is_empty() {
        warn!("no administrators configured; inbound messages will queue without fan-out");
    }

    let cancel = shutdown::install_signal_handler();
    let sweeper = spawn_sweeper(
        Arc::clone(&kv),
        Duration::from_secs(config.cache.sweep_interval_secs),
        cancel.clone(),
    );

    let service = RelayService::new(Arc::new(engine), Arc::clone(&gateway), config.relay.notify_banned);
    let result = service.run(cancel.clone()).await;

    // The loop can also end on a closed gateway; stop the sweeper either way.
    cancel.cancel();
    if let Some(sweeper) = sweeper
        && let Err(e) = sweeper.await
    {
        warn!(error = %e, "sweeper task ended abnormally");
    }

    shutdown_adapter(gateway.as_ref()).await;
    shutdown_adapter(kv.as_ref()).await;
    shutdown_adapter(storage.as_ref()).await;

    info!("helpline stopped");
    result
}

fn build_kv(config: &HelplineConfig, storage: &SqliteStorage) -> Arc<dyn KvStore> {
    match config.cache.backend {
        CacheBackend::Memory => Arc::new(MemoryKv::new()),
        CacheBackend::Sqlite => Arc::new(SqliteKv::new(storage.database())),
    }
}

async fn shutdown_adapter(adapter: &(impl PluginAdapter + ?Sized)) {
    if let Err(e) = adapter.shutdown().await {
        warn!(adapter = adapter.name(), error = %e, "adapter shutdown failed");
    }
}

/// Initializes the tracing subscriber. `RUST_LOG` wins over `log_level`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("helpline={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
