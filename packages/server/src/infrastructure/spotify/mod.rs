//! Spotify integration: Web API client and OAuth code exchange.

pub mod client;
pub mod oauth;

pub use client::{DEFAULT_API_BASE, SpotifyClient};
pub use oauth::{DEFAULT_ACCOUNTS_BASE, OAuthConfig, OAuthError, SpotifyOAuth};
