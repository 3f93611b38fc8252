// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the Helpline relay.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod gateway;
pub mod kv;
pub mod table;

pub use adapter::PluginAdapter;
pub use gateway::MessagingGateway;
pub use kv::KvStore;
pub use table::{ContactStore, PendingTable, RosterStore};
