//! HTTP API response DTOs for the chat application.

use encore_shared::time::timestamp_to_rfc3339;
use serde::{Deserialize, Serialize};

use crate::domain::{ChatMessage, Room, RoomSummary};

/// Room summary for list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub id: String,
    pub members: Vec<String>,
    pub history_len: usize,
    pub created_at: String, // ISO 8601
}

impl From<RoomSummary> for RoomSummaryDto {
    fn from(summary: RoomSummary) -> Self {
        Self {
            id: summary.id.into_string(),
            members: summary.members,
            history_len: summary.history_len,
            created_at: timestamp_to_rfc3339(summary.created_at.value()),
        }
    }
}

/// Room detail for detail endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDetailDto {
    pub id: String,
    pub members: Vec<String>,
    /// Retained history, oldest first
    pub history: Vec<HistoryItemDto>,
    pub created_at: String, // ISO 8601
}

impl From<&Room> for RoomDetailDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.to_string(),
            members: room.member_names(),
            history: room.history().iter().map(HistoryItemDto::from).collect(),
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}

/// One retained chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryItemDto {
    pub user: String,
    pub message: String,
    pub sent_at: String, // ISO 8601
}

impl From<&ChatMessage> for HistoryItemDto {
    fn from(message: &ChatMessage) -> Self {
        Self {
            user: message.author.to_string(),
            message: message.text.to_string(),
            sent_at: timestamp_to_rfc3339(message.sent_at.value()),
        }
    }
}
