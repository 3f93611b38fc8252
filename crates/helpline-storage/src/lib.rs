// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Helpline relay.
//!
//! Provides WAL-mode SQLite storage with embedded migrations and a
//! single-writer connection via `tokio-rusqlite`. One database file holds
//! the persisted tables (pending queue, contacts, administrators, bans) and,
//! optionally, the expiring key-value rows used for correlations.

pub mod adapter;
pub mod database;
pub mod kv;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
pub use kv::SqliteKv;
