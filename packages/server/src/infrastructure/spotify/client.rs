//! Spotify Web API client.
//!
//! Implements [`IdentityProvider`] with `GET /me` and [`TrackSource`] with
//! `GET /me/player`, using the listener's own access token.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::domain::{
    AccessToken, AuthError, DisplayName, Identity, IdentityProvider, NowPlaying, TrackSource,
    TransientExternalError,
};

/// Default base URL of the Spotify Web API.
pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";

#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: reqwest::Client,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    id: String,
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaybackResponse {
    item: Option<PlaybackItem>,
}

#[derive(Debug, Deserialize)]
struct PlaybackItem {
    name: String,
    #[serde(default)]
    artists: Vec<PlaybackArtist>,
}

#[derive(Debug, Deserialize)]
struct PlaybackArtist {
    name: String,
}

impl SpotifyClient {
    pub fn new(http: reqwest::Client, api_base: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }
}

impl MeResponse {
    fn into_identity(self) -> Result<Identity, AuthError> {
        // Spotify leaves display_name null for some accounts
        let name = self
            .display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.id.clone());
        let display_name =
            DisplayName::new(name).map_err(|e| AuthError::Unavailable(e.to_string()))?;
        Ok(Identity::new(self.id, display_name))
    }
}

impl PlaybackResponse {
    fn into_now_playing(self) -> Result<NowPlaying, TransientExternalError> {
        let item = self.item.ok_or(TransientExternalError::NothingPlaying)?;
        let artist = item
            .artists
            .into_iter()
            .next()
            .ok_or(TransientExternalError::NothingPlaying)?;
        Ok(NowPlaying::new(artist.name, item.name))
    }
}

#[async_trait]
impl IdentityProvider for SpotifyClient {
    async fn verify_identity(&self, credential: &AccessToken) -> Result<Identity, AuthError> {
        let response = self
            .http
            .get(self.url("/me"))
            .bearer_auth(credential.secret())
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(AuthError::InvalidCredential(format!(
                    "token rejected with status {}",
                    response.status().as_u16()
                )));
            }
            status if !status.is_success() => {
                return Err(AuthError::Unavailable(format!(
                    "unexpected status {}",
                    status.as_u16()
                )));
            }
            _ => {}
        }

        response
            .json::<MeResponse>()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?
            .into_identity()
    }
}

#[async_trait]
impl TrackSource for SpotifyClient {
    async fn current_track(
        &self,
        credential: &AccessToken,
    ) -> Result<NowPlaying, TransientExternalError> {
        let response = self
            .http
            .get(self.url("/me/player"))
            .bearer_auth(credential.secret())
            .send()
            .await
            .map_err(|e| TransientExternalError::Request(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Err(TransientExternalError::NothingPlaying);
        }
        if !status.is_success() {
            return Err(TransientExternalError::Status(status.as_u16()));
        }

        response
            .json::<PlaybackResponse>()
            .await
            .map_err(|e| TransientExternalError::Request(e.to_string()))?
            .into_now_playing()
    }
}
