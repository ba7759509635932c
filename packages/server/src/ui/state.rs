//! Shared application state.

use std::sync::Arc;

use crate::{
    domain::{IdentityProvider, RoomRepository, TrackSource},
    infrastructure::spotify::SpotifyOAuth,
    usecase::{BroadcastRouter, SessionManager, SessionSettings},
};

/// Shared application state
pub struct AppState {
    /// セッション管理（WebSocket ハンドラから利用）
    pub session_manager: SessionManager,
    /// Repository（診断用エンドポイントから参照）
    pub rooms: Arc<dyn RoomRepository>,
    /// OAuth コード交換
    pub oauth: SpotifyOAuth,
    /// `/callback` のリダイレクト先
    pub frontend_url: String,
}

impl AppState {
    /// 依存関係を組み立てて AppState を作成
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        identity_provider: Arc<dyn IdentityProvider>,
        track_source: Arc<dyn TrackSource>,
        oauth: SpotifyOAuth,
        frontend_url: impl Into<String>,
        settings: SessionSettings,
    ) -> Self {
        let router = Arc::new(BroadcastRouter::new(rooms.clone()));
        Self {
            session_manager: SessionManager::new(router, identity_provider, track_source, settings),
            rooms,
            oauth,
            frontend_url: frontend_url.into().trim_end_matches('/').to_string(),
        }
    }
}
