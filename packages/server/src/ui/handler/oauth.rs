//! Spotify login and OAuth callback handlers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Redirect,
};
use serde::Deserialize;

use crate::ui::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
}

/// Send the browser to Spotify's consent page
pub async fn login(State(state): State<Arc<AppState>>) -> Redirect {
    Redirect::to(state.oauth.authorize_url().as_str())
}

/// Exchange the authorization code and hand the token to the frontend
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    let Some(code) = query.code.filter(|code| !code.is_empty()) else {
        tracing::warn!("OAuth callback without code");
        return Redirect::to(&format!("{}/#/error/invalid code", state.frontend_url));
    };

    match state.oauth.exchange_code(&code).await {
        Ok(access_token) => {
            tracing::info!("OAuth code exchanged");
            Redirect::to(&format!(
                "{}/#access_token={}",
                state.frontend_url, access_token
            ))
        }
        Err(e) => {
            tracing::warn!("OAuth code exchange failed: {}", e);
            Redirect::to(&format!("{}/#/error/invalid token", state.frontend_url))
        }
    }
}
