// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Update filtering and conversion into [`InboundEvent`].

use helpline_core::{ChatId, Command, InboundEvent, MessageId};
use teloxide::prelude::*;
use teloxide::types::ChatKind;

/// Checks whether the message is from a private (DM) chat.
///
/// Group, supergroup, and channel messages return `false`.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// Only private messages with a human sender reach the relay.
pub fn should_relay(msg: &Message) -> bool {
    is_dm(msg) && msg.from.as_ref().is_some_and(|u| !u.is_bot)
}

/// Converts a Telegram message into a transport-neutral event.
///
/// Commands are only parsed from message text, never from media captions.
pub fn to_inbound_event(msg: &Message) -> InboundEvent {
    let (sender_handle, sender_name) = match msg.from.as_ref() {
        Some(user) => (user.username.clone(), user.full_name()),
        None => (None, String::new()),
    };

    let command = msg.text().and_then(Command::parse);
    let text = msg.text().or_else(|| msg.caption()).map(str::to_string);

    InboundEvent {
        message_id: MessageId(i64::from(msg.id.0)),
        chat: ChatId(msg.chat.id.0),
        sender_handle,
        sender_name,
        text,
        command,
        reply_to: msg.reply_to_message().map(|m| MessageId(i64::from(m.id.0))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a mock private chat message from JSON, matching Telegram Bot API structure.
    fn make_private_message(user_id: u64, username: Option<&str>, text: &str) -> Message {
        let mut from = serde_json::json!({
            "id": user_id,
            "is_bot": false,
            "first_name": "Test",
            "last_name": "User",
        });
        if let Some(uname) = username {
            from["username"] = serde_json::json!(uname);
        }

        let json = serde_json::json!({
            "message_id": 7,
            "date": 1700000000i64,
            "chat": {
                "id": user_id as i64,
                "type": "private",
                "first_name": "Test",
            },
            "from": from,
            "text": text,
        });

        serde_json::from_value(json).expect("failed to deserialize mock message")
    }

    fn make_reply_message(admin_id: u64, reply_to: i32, text: &str) -> Message {
        let json = serde_json::json!({
            "message_id": 20,
            "date": 1700000100i64,
            "chat": { "id": admin_id as i64, "type": "private", "first_name": "Admin" },
            "from": { "id": admin_id, "is_bot": false, "first_name": "Admin", "username": "Xavier" },
            "text": text,
            "reply_to_message": {
                "message_id": reply_to,
                "date": 1700000000i64,
                "chat": { "id": admin_id as i64, "type": "private", "first_name": "Admin" },
                "text": "forwarded question",
            },
        });
        serde_json::from_value(json).expect("failed to deserialize mock reply")
    }

    fn make_group_message(user_id: u64, text: &str) -> Message {
        let json = serde_json::json!({
            "message_id": 1,
            "date": 1700000000i64,
            "chat": {
                "id": -100123i64,
                "type": "supergroup",
                "title": "Test Group",
            },
            "from": {
                "id": user_id,
                "is_bot": false,
                "first_name": "Test",
            },
            "text": text,
        });

        serde_json::from_value(json).expect("failed to deserialize mock group message")
    }

    #[test]
    fn private_human_messages_are_relayed() {
        assert!(should_relay(&make_private_message(1, None, "hi")));
        assert!(!should_relay(&make_group_message(1, "hi")));
    }

    #[test]
    fn maps_sender_and_text() {
        let event = to_inbound_event(&make_private_message(12345, Some("Ann"), "hello"));
        assert_eq!(event.message_id, MessageId(7));
        assert_eq!(event.chat, ChatId(12345));
        assert_eq!(event.sender_handle.as_deref(), Some("Ann"));
        assert_eq!(event.sender_name, "Test User");
        assert_eq!(event.text.as_deref(), Some("hello"));
        assert!(event.command.is_none());
        assert!(event.reply_to.is_none());
    }

    #[test]
    fn parses_commands_with_bot_suffix() {
        let event = to_inbound_event(&make_private_message(1, None, "/add@HelplineBot @bob"));
        let command = event.command.unwrap();
        assert_eq!(command.name, "add");
        assert_eq!(command.args, "@bob");
    }

    #[test]
    fn reply_carries_the_replied_message_id() {
        let event = to_inbound_event(&make_reply_message(900, 55, "the answer"));
        assert_eq!(event.reply_to, Some(MessageId(55)));
        assert_eq!(event.handle().unwrap().as_str(), "xavier");
    }
}
