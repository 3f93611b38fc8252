// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Helpline integration tests.
//!
//! Provides fake adapters so the relay can be exercised without Telegram or
//! a database file.
//!
//! # Components
//!
//! - [`MockGateway`] - messaging gateway with event injection and captured deliveries
//! - [`MemoryTable`] - in-memory pending/contact/roster tables with anomaly injection
//! - [`fixtures`] - builders for inbound events

pub mod fixtures;
pub mod memory_table;
pub mod mock_gateway;

pub use memory_table::MemoryTable;
pub use mock_gateway::{Forwarded, MockGateway, SentText};
