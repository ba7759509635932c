//! UI 層のエラー定義

use thiserror::Error;

use crate::infrastructure::spotify::OAuthError;

/// Failures that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("invalid OAuth settings: {0}")]
    OAuth(#[from] OAuthError),

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}
