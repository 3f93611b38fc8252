// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Helpline relay.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifier of an end user who writes to the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl UserId {
    /// The private chat in which this user talks to the bot.
    pub fn chat(self) -> ChatId {
        ChatId(self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A deliverable destination: a user's private chat or an administrator's channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Channel-local message identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Administrator handle, normalized without the leading `@` and lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AdminHandle(String);

impl AdminHandle {
    /// Normalizes a raw handle such as `@Alice` into `alice`.
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        let bare = trimmed.strip_prefix('@').unwrap_or(trimmed);
        Self(bare.to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AdminHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Gateway,
    Table,
    Cache,
}

/// A bot command parsed from message text, e.g. `/add @alice`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Lowercased command name without the slash or `@botname` suffix.
    pub name: String,
    /// Everything after the command name, trimmed.
    pub args: String,
}

impl Command {
    /// Parses `/name[@bot] args...`. Returns `None` for text that is not a command.
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.trim_start().strip_prefix('/')?;
        let (head, args) = match rest.find(char::is_whitespace) {
            Some(i) => (&rest[..i], rest[i..].trim()),
            None => (rest, ""),
        };
        let name = head.split('@').next().unwrap_or_default();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_ascii_lowercase(),
            args: args.to_string(),
        })
    }
}

/// One inbound chat event, already stripped of transport detail.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    /// Identifier of the message inside the sender's chat.
    pub message_id: MessageId,
    /// The chat the message arrived in (equal to the sender id for private chats).
    pub chat: ChatId,
    /// Sender's handle, when the platform exposes one.
    pub sender_handle: Option<String>,
    /// Sender's display name.
    pub sender_name: String,
    /// Text or caption, if any.
    pub text: Option<String>,
    /// Parsed command when the text starts with `/`.
    pub command: Option<Command>,
    /// Message this event replies to, in the same chat.
    pub reply_to: Option<MessageId>,
}

impl InboundEvent {
    /// The end-user identity of the sender.
    pub fn user(&self) -> UserId {
        UserId(self.chat.0)
    }

    /// The normalized sender handle, if present and non-empty.
    pub fn handle(&self) -> Option<AdminHandle> {
        self.sender_handle
            .as_deref()
            .map(AdminHandle::new)
            .filter(|h| !h.is_empty())
    }
}

/// One row of the persisted pending-queue table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRow {
    /// Store-assigned row key used for update and clear.
    pub key: i64,
    pub user: UserId,
    /// Queued message ids, newest first.
    pub message_ids: Vec<MessageId>,
    /// Last update, unix milliseconds.
    pub updated_at: i64,
}

/// A persisted administrator record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminRecord {
    pub handle: AdminHandle,
    /// Unknown until the administrator has sent the bot at least one event.
    pub channel: Option<ChatId>,
}

/// A persisted contact record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRecord {
    pub user: UserId,
    pub name: String,
    pub handle: Option<String>,
    pub region: Option<String>,
}
