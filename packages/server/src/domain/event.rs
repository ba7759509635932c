//! Events pushed from the server to one connected session.

use tokio::sync::mpsc;

use super::{
    entity::{ChatMessage, Identity},
    value_object::{DisplayName, RoomId},
};

/// Outbound channel of a single session.
pub type SessionSender = mpsc::UnboundedSender<SessionEvent>;

/// Receiving half of [`SessionSender`].
pub type SessionReceiver = mpsc::UnboundedReceiver<SessionEvent>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Credential accepted
    Authenticated(Identity),
    /// Credential rejected; the session may retry
    AuthenticationFailed { reason: String },
    /// The session entered a room; replayed history follows
    RoomJoined(RoomId),
    /// A chat message, replayed or live
    Chat(ChatMessage),
    /// Another listener entered the session's room
    MemberJoined { name: DisplayName, room: RoomId },
    /// Another listener left the session's room
    MemberLeft { name: DisplayName, room: RoomId },
    /// A request from this session was rejected
    Error { reason: String },
}
