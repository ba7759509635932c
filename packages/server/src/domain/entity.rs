//! Core domain models for the chat application.

use std::{collections::HashMap, num::NonZeroUsize};

use serde::Serialize;

use super::{
    error::DeliveryError,
    event::{SessionEvent, SessionSender},
    history::BoundedHistory,
    value_object::{DisplayName, MessageContent, RoomId, SessionId, Timestamp},
};

/// A verified listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    /// Stable user id at the identity provider
    pub user_id: String,
    /// Name shown to other listeners
    pub display_name: DisplayName,
}

impl Identity {
    pub fn new(user_id: String, display_name: DisplayName) -> Self {
        Self {
            user_id,
            display_name,
        }
    }
}

/// Represents a chat message in the domain model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    /// Sender's display name
    pub author: DisplayName,
    /// Message content
    pub text: MessageContent,
    /// Room the message was posted to
    pub room: RoomId,
    /// Timestamp when the message was sent
    pub sent_at: Timestamp,
}

impl ChatMessage {
    /// Create a new chat message
    pub fn new(author: DisplayName, text: MessageContent, room: RoomId, sent_at: Timestamp) -> Self {
        Self {
            author,
            text,
            room,
            sent_at,
        }
    }
}

/// A session's presence in a room.
#[derive(Debug, Clone)]
pub struct Member {
    pub name: DisplayName,
    pub outbound: SessionSender,
}

impl Member {
    pub fn new(name: DisplayName, outbound: SessionSender) -> Self {
        Self { name, outbound }
    }
}

/// Represents a chat room with members and a bounded message history
#[derive(Debug)]
pub struct Room {
    /// Room identifier
    pub id: RoomId,
    /// Timestamp when the room was created
    pub created_at: Timestamp,
    history: BoundedHistory<ChatMessage>,
    members: HashMap<SessionId, Member>,
}

impl Room {
    /// Create a new empty room
    pub fn new(id: RoomId, created_at: Timestamp, history_capacity: NonZeroUsize) -> Self {
        Self {
            id,
            created_at,
            history: BoundedHistory::new(history_capacity),
            members: HashMap::new(),
        }
    }

    /// Add (or replace) a member. Returns the previous entry for this session.
    pub fn add_member(&mut self, session_id: SessionId, member: Member) -> Option<Member> {
        self.members.insert(session_id, member)
    }

    /// Remove a member by session id
    pub fn remove_member(&mut self, session_id: &SessionId) -> Option<Member> {
        self.members.remove(session_id)
    }

    pub fn is_member(&self, session_id: &SessionId) -> bool {
        self.members.contains_key(session_id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Members currently in the room
    pub fn members(&self) -> impl Iterator<Item = (&SessionId, &Member)> {
        self.members.iter()
    }

    /// Display names of current members, sorted
    pub fn member_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .members
            .values()
            .map(|m| m.name.as_str().to_string())
            .collect();
        names.sort();
        names
    }

    /// Append a message to the history
    pub fn record_message(&mut self, message: ChatMessage) {
        self.history.add(message);
    }

    /// Retained messages, oldest first
    pub fn history(&self) -> Vec<ChatMessage> {
        self.history.get_all()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

/// Push an event to one member, reporting a closed channel.
pub fn deliver(
    session_id: &SessionId,
    member: &Member,
    event: SessionEvent,
) -> Result<(), DeliveryError> {
    member.outbound.send(event).map_err(|_| DeliveryError {
        session_id: session_id.to_string(),
    })
}
