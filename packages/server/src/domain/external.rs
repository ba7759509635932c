//! Contracts for the external services the chat core depends on.
//!
//! The production implementation talks to the Spotify Web API
//! (`infrastructure::spotify`). Tests substitute mocks.

use std::{fmt, str::FromStr};

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use super::{
    entity::Identity,
    error::{AuthError, TransientExternalError, ValueObjectError},
    value_object::{AccessToken, MAX_ROOM_ID_LENGTH, RoomId},
};

/// Verifies a client credential and resolves the listener behind it.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify_identity(&self, credential: &AccessToken) -> Result<Identity, AuthError>;
}

/// Reports what a listener is currently playing.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TrackSource: Send + Sync {
    async fn current_track(
        &self,
        credential: &AccessToken,
    ) -> Result<NowPlaying, TransientExternalError>;
}

/// The track a listener is playing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    /// Primary artist name
    pub artist: String,
    /// Track title
    pub track: String,
}

impl NowPlaying {
    pub fn new(artist: impl Into<String>, track: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            track: track.into(),
        }
    }

    /// Derive the room this track belongs to.
    ///
    /// Derived ids longer than [`MAX_ROOM_ID_LENGTH`] are cut to that many
    /// characters, so every track with an artist maps to some room.
    pub fn room_id(&self, keying: RoomKeying) -> Result<RoomId, ValueObjectError> {
        let id = match keying {
            RoomKeying::Artist => self.artist.trim().to_string(),
            RoomKeying::Track => format!("{} - {}", self.artist.trim(), self.track.trim()),
        };
        let id: String = id.chars().take(MAX_ROOM_ID_LENGTH).collect();
        RoomId::new(id)
    }
}

/// How a now-playing report maps to a room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoomKeying {
    /// One room per artist
    #[default]
    Artist,
    /// One room per artist and track title
    Track,
}

impl FromStr for RoomKeying {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "artist" => Ok(Self::Artist),
            "track" => Ok(Self::Track),
            other => Err(format!("unknown room keying '{other}' (expected artist or track)")),
        }
    }
}

impl fmt::Display for RoomKeying {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Artist => f.write_str("artist"),
            Self::Track => f.write_str("track"),
        }
    }
}
