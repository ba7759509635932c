//! WebSocket message DTOs for the chat application.
//!
//! Every frame is a JSON object tagged by `type`.

use serde::{Deserialize, Serialize};

use crate::domain::SessionEvent;

/// Frames sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    Authenticate {
        access_token: String,
    },
    RequestRoom {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room: Option<String>,
    },
    Chat {
        message: String,
    },
}

/// Frames sent to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    Authenticated {
        user_id: String,
        display_name: String,
    },
    AuthenticationFailed {
        reason: String,
    },
    RoomJoined {
        room: String,
    },
    Chat {
        user: String,
        message: String,
        room: String,
        /// Unix timestamp (milliseconds since epoch, UTC)
        timestamp: i64,
    },
    MemberJoined {
        user: String,
        room: String,
    },
    MemberLeft {
        user: String,
        room: String,
    },
    Error {
        reason: String,
    },
}

impl From<&SessionEvent> for ServerMessage {
    fn from(event: &SessionEvent) -> Self {
        match event {
            SessionEvent::Authenticated(identity) => Self::Authenticated {
                user_id: identity.user_id.clone(),
                display_name: identity.display_name.to_string(),
            },
            SessionEvent::AuthenticationFailed { reason } => Self::AuthenticationFailed {
                reason: reason.clone(),
            },
            SessionEvent::RoomJoined(room) => Self::RoomJoined {
                room: room.to_string(),
            },
            SessionEvent::Chat(message) => Self::Chat {
                user: message.author.to_string(),
                message: message.text.to_string(),
                room: message.room.to_string(),
                timestamp: message.sent_at.value(),
            },
            SessionEvent::MemberJoined { name, room } => Self::MemberJoined {
                user: name.to_string(),
                room: room.to_string(),
            },
            SessionEvent::MemberLeft { name, room } => Self::MemberLeft {
                user: name.to_string(),
                room: room.to_string(),
            },
            SessionEvent::Error { reason } => Self::Error {
                reason: reason.clone(),
            },
        }
    }
}
