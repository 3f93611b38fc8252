// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relay core for Helpline.
//!
//! End users write to one bot identity; every message is queued, fanned out
//! to the administrators, and the first administrator reply is routed back
//! to the sender. The pieces:
//!
//! - [`CorrelationStore`] maps forwarded copies back to their sender and
//!   remembers who answered first.
//! - [`BanRegistry`] keeps banned senders out.
//! - [`PendingQueue`] rebuilds the "next conversation" FIFO from the table store.
//! - [`DialogState`] tracks the short region dialog.
//! - [`AdminRoster`] knows who the administrators are and where to reach them.
//! - [`RoutingEngine`] ties them together per inbound event.
//! - [`RelayService`] drives the engine from a gateway until shutdown.

pub mod bans;
pub mod commands;
pub mod correlation;
pub mod dialog;
pub mod engine;
pub mod queue;
pub mod roster;
pub mod service;
pub mod settings;

pub use bans::BanRegistry;
pub use commands::AdminCommand;
pub use correlation::{CorrelationStore, Origin};
pub use dialog::{DialogKind, DialogState};
pub use engine::{Outcome, RelayStores, RoutingEngine};
pub use queue::{Clock, PendingQueue, system_clock};
pub use roster::AdminRoster;
pub use service::{RelayService, spawn_sweeper};
pub use settings::RelaySettings;
