//! Server startup.

use std::{sync::Arc, time::Duration};

use tokio::net::TcpListener;

use crate::{
    config::ServerConfig,
    infrastructure::{
        repository::InMemoryRoomRepository,
        spotify::{SpotifyClient, SpotifyOAuth},
    },
};

use super::{ServerError, router::build_router, signal::shutdown_signal, state::AppState};

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Run the chat server until a shutdown signal arrives.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
    let spotify = Arc::new(SpotifyClient::new(http, &config.spotify_api_base));
    let oauth = SpotifyOAuth::new(config.oauth_config())?;

    // Repository（DI: trait 経由で UseCase 層に渡す）
    let rooms = Arc::new(InMemoryRoomRepository::new(config.history_capacity));

    let state = Arc::new(AppState::new(
        rooms,
        spotify.clone(),
        spotify,
        oauth,
        config.frontend_url.clone(),
        config.session_settings(),
    ));
    let app = build_router(state);

    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| ServerError::Bind {
            address: address.clone(),
            source,
        })?;
    tracing::info!(
        "Listening on {} (room keying: {}, history capacity: {})",
        address,
        config.room_keying,
        config.history_capacity
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    tracing::info!("Server stopped");
    Ok(())
}
