// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules. Every function takes `&Database` and runs on its connection.

pub mod contacts;
pub mod kv;
pub mod pending;
pub mod roster;
