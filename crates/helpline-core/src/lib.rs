// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Helpline support-inbox relay.
//!
//! This crate provides the error type, identifier types, and the adapter
//! traits (messaging gateway, KV cache, table store) that the relay engine
//! is written against. Concrete adapters live in their own crates.

pub mod deadline;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use deadline::bounded;
pub use error::RelayError;
pub use types::{
    AdapterType, AdminHandle, AdminRecord, ChatId, Command, ContactRecord, HealthStatus,
    InboundEvent, MessageId, PendingRow, UserId,
};

pub use traits::{
    ContactStore, KvStore, MessagingGateway, PendingTable, PluginAdapter, RosterStore,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;

        for variant in [AdapterType::Gateway, AdapterType::Table, AdapterType::Cache] {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        assert_ne!(HealthStatus::Degraded("slow".into()), healthy);
        assert_ne!(HealthStatus::Unhealthy("down".into()), healthy);
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_gateway<T: MessagingGateway>() {}
        fn _assert_kv<T: KvStore>() {}
        fn _assert_pending<T: PendingTable>() {}
        fn _assert_contacts<T: ContactStore>() {}
        fn _assert_roster<T: RosterStore>() {}
    }

    proptest::proptest! {
        #[test]
        fn admin_handle_normalization_is_idempotent(raw in "@?[A-Za-z0-9_]{1,32}") {
            let once = AdminHandle::new(&raw);
            let twice = AdminHandle::new(once.as_str());
            proptest::prop_assert_eq!(once, twice);
        }
    }
}
