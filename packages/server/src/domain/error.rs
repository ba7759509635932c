//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// SessionId is not a valid UUID
    #[error("SessionId must be a valid UUID (got: {0})")]
    SessionIdInvalidFormat(String),

    /// RoomId validation error
    #[error("RoomId cannot be empty")]
    RoomIdEmpty,

    /// RoomId too long error
    #[error("RoomId cannot exceed {max} characters (got {actual})")]
    RoomIdTooLong { max: usize, actual: usize },

    /// DisplayName validation error
    #[error("DisplayName cannot be empty")]
    DisplayNameEmpty,

    /// DisplayName too long error
    #[error("DisplayName cannot exceed {max} characters (got {actual})")]
    DisplayNameTooLong { max: usize, actual: usize },

    /// MessageContent validation error
    #[error("MessageContent cannot be empty")]
    MessageContentEmpty,

    /// MessageContent too long error
    #[error("MessageContent cannot exceed {max} characters (got {actual})")]
    MessageContentTooLong { max: usize, actual: usize },

    /// AccessToken validation error
    #[error("AccessToken cannot be empty")]
    AccessTokenEmpty,
}

/// Identity verification failure reported by the identity provider.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The credential was rejected (invalid or expired token)
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// The provider could not be reached or answered unexpectedly
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Failure of a now-playing lookup. Never fatal to a session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransientExternalError {
    /// Nothing (or nothing with an artist) is currently playing
    #[error("nothing is currently playing")]
    NothingPlaying,

    /// Transport-level failure
    #[error("track lookup failed: {0}")]
    Request(String),

    /// Unexpected HTTP status from the provider
    #[error("track lookup returned status {0}")]
    Status(u16),
}

/// Failure to push an event to one room member.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("outbound channel for session {session_id} is closed")]
pub struct DeliveryError {
    pub session_id: String,
}
