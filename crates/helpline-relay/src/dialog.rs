// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user conversational state. Not persisted.

use dashmap::DashMap;
use helpline_core::UserId;
use strum::Display;

/// What the relay is waiting for from a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum DialogKind {
    /// The next text is the user's region.
    Region,
}

#[derive(Debug, Default)]
pub struct DialogState {
    users: DashMap<UserId, DialogKind>,
}

impl DialogState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts `user` into `kind`, replacing any dialog already open.
    pub fn enter(&self, user: UserId, kind: DialogKind) {
        self.users.insert(user, kind);
    }

    pub fn is_in(&self, user: UserId) -> bool {
        self.users.contains_key(&user)
    }

    pub fn current(&self, user: UserId) -> Option<DialogKind> {
        self.users.get(&user).map(|entry| *entry)
    }

    pub fn exit(&self, user: UserId) {
        self.users.remove(&user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_exit_cycle() {
        let dialogs = DialogState::new();
        assert!(!dialogs.is_in(UserId(1)));

        dialogs.enter(UserId(1), DialogKind::Region);
        dialogs.enter(UserId(1), DialogKind::Region);
        assert_eq!(dialogs.current(UserId(1)), Some(DialogKind::Region));

        dialogs.exit(UserId(1));
        dialogs.exit(UserId(1));
        assert!(!dialogs.is_in(UserId(1)));
    }

    #[test]
    fn kind_displays_snake_case() {
        assert_eq!(DialogKind::Region.to_string(), "region");
    }
}
