//! Spotify authorization-code flow.
//!
//! `/login` sends the browser to Spotify's consent page; Spotify then
//! calls `/callback` with a code, which is exchanged here for an access
//! token that the frontend passes back over the WebSocket.

use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope,
    TokenResponse, TokenUrl, basic::BasicClient, reqwest::async_http_client, url::Url,
};
use thiserror::Error;

/// Default base URL of the Spotify accounts service.
pub const DEFAULT_ACCOUNTS_BASE: &str = "https://accounts.spotify.com";

/// Permissions requested from the listener.
pub const SCOPES: [&str; 3] = [
    "user-read-private",
    "user-read-playback-state",
    "user-read-currently-playing",
];

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("invalid OAuth configuration: {0}")]
    InvalidConfig(String),

    #[error("token exchange failed: {0}")]
    TokenExchangeFailed(String),
}

/// Client credentials of the registered Spotify application.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub accounts_base: String,
}

#[derive(Debug, Clone)]
pub struct SpotifyOAuth {
    client: BasicClient,
}

impl SpotifyOAuth {
    pub fn new(config: OAuthConfig) -> Result<Self, OAuthError> {
        let accounts_base = config.accounts_base.trim_end_matches('/');
        let client = BasicClient::new(
            ClientId::new(config.client_id),
            Some(ClientSecret::new(config.client_secret)),
            AuthUrl::new(format!("{accounts_base}/authorize"))
                .map_err(|e| OAuthError::InvalidConfig(e.to_string()))?,
            Some(
                TokenUrl::new(format!("{accounts_base}/api/token"))
                    .map_err(|e| OAuthError::InvalidConfig(e.to_string()))?,
            ),
        )
        .set_redirect_uri(
            RedirectUrl::new(config.redirect_uri)
                .map_err(|e| OAuthError::InvalidConfig(e.to_string()))?,
        );

        Ok(Self { client })
    }

    /// URL of Spotify's consent page for this application.
    pub fn authorize_url(&self) -> Url {
        let (url, _state) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(SCOPES.iter().map(|scope| Scope::new(scope.to_string())))
            .url();
        url
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))?;

        Ok(token.access_token().secret().to_string())
    }
}
