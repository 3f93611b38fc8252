// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound event builders.

use helpline_core::{ChatId, Command, InboundEvent, MessageId};

/// A plain message from an end user whose private chat id equals `user`.
pub fn user_message(user: i64, message: i64, text: &str) -> InboundEvent {
    InboundEvent {
        message_id: MessageId(message),
        chat: ChatId(user),
        sender_handle: Some(format!("user{user}")),
        sender_name: format!("User {user}"),
        text: Some(text.to_string()),
        command: Command::parse(text),
        reply_to: None,
    }
}

/// A message from `handle`, talking from `chat`.
pub fn admin_message(chat: i64, handle: &str, message: i64, text: &str) -> InboundEvent {
    InboundEvent {
        message_id: MessageId(message),
        chat: ChatId(chat),
        sender_handle: Some(handle.to_string()),
        sender_name: handle.to_string(),
        text: Some(text.to_string()),
        command: Command::parse(text),
        reply_to: None,
    }
}

/// An administrator's reply to the forwarded copy `reply_to` in their own chat.
pub fn admin_reply(
    chat: i64,
    handle: &str,
    message: i64,
    reply_to: MessageId,
    text: &str,
) -> InboundEvent {
    InboundEvent {
        reply_to: Some(reply_to),
        ..admin_message(chat, handle, message, text)
    }
}
