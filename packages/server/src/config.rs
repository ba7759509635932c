//! Server configuration, read from the command line or the environment.

use std::{num::NonZeroUsize, time::Duration};

use clap::Parser;

use crate::{
    domain::{DEFAULT_HISTORY_CAPACITY, RoomKeying},
    infrastructure::spotify::{DEFAULT_ACCOUNTS_BASE, DEFAULT_API_BASE, OAuthConfig},
    usecase::SessionSettings,
};

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Now-playing chat server")]
pub struct ServerConfig {
    /// Address to bind.
    #[arg(long, env = "ENCORE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, short = 'p', env = "PORT", default_value_t = 4000)]
    pub port: u16,

    #[arg(long, env = "SPOTIFY_CLIENT_ID", default_value = "")]
    pub spotify_client_id: String,

    #[arg(long, env = "SPOTIFY_CLIENT_SECRET", default_value = "", hide_env_values = true)]
    pub spotify_client_secret: String,

    /// Redirect URI registered with the Spotify application.
    #[arg(
        long,
        env = "SPOTIFY_REDIRECT_URI",
        default_value = "http://localhost:4000/callback"
    )]
    pub spotify_redirect_uri: String,

    /// Where `/callback` sends the browser with the access token.
    #[arg(long, env = "FRONTEND_URL", default_value = "http://localhost:3000")]
    pub frontend_url: String,

    #[arg(long, env = "SPOTIFY_API_BASE", default_value = DEFAULT_API_BASE)]
    pub spotify_api_base: String,

    #[arg(long, env = "SPOTIFY_ACCOUNTS_BASE", default_value = DEFAULT_ACCOUNTS_BASE)]
    pub spotify_accounts_base: String,

    /// Seconds between now-playing lookups.
    #[arg(long, env = "ENCORE_POLL_INTERVAL_SECS", default_value_t = 5)]
    pub poll_interval_secs: u64,

    /// Messages retained per room for late joiners.
    #[arg(long, env = "ENCORE_HISTORY_CAPACITY", default_value_t = DEFAULT_HISTORY_CAPACITY)]
    pub history_capacity: NonZeroUsize,

    /// How a track maps to a room: `artist` or `track`.
    #[arg(long, env = "ENCORE_ROOM_KEYING", default_value_t = RoomKeying::Artist)]
    pub room_keying: RoomKeying,

    /// Default log level when RUST_LOG is unset.
    #[arg(long, env = "ENCORE_LOG_LEVEL", default_value = "debug")]
    pub log_level: String,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            poll_interval: Duration::from_secs(self.poll_interval_secs.max(1)),
            room_keying: self.room_keying,
        }
    }

    pub fn oauth_config(&self) -> OAuthConfig {
        OAuthConfig {
            client_id: self.spotify_client_id.clone(),
            client_secret: self.spotify_client_secret.clone(),
            redirect_uri: self.spotify_redirect_uri.clone(),
            accounts_base: self.spotify_accounts_base.clone(),
        }
    }
}
