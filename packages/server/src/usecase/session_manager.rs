//! UseCase: セッション管理
//!
//! 接続ごとの状態遷移（未認証 → 認証済み → ルーム参加中 → 切断）を管理し、
//! ルームの参加・切り替え・退出を BroadcastRouter に依頼します。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - authenticate / request_room / post_message / disconnect の各操作
//! - 再生中の曲に応じたルームの自動切り替え（ポーリング）
//!
//! ### なぜこのテストが必要か
//! - 認証失敗後も再試行できること、エラーが本人にのみ通知されることを保証
//! - ルームの切り替えが原子的で、切り替え後は旧ルームの配信を受けないことを確認
//! - 切断後にポーリングが止まり、メンバーから確実に外れることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：明示的なルーム指定、曲からのルーム導出
//! - 異常系：不正なトークン、曲の取得失敗、未参加での投稿
//! - エッジケース：二重切断、同じルームの再要求

use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::Mutex;

use crate::domain::{
    AccessToken, AuthError, ChatMessage, Identity, IdentityProvider, MessageContent, RoomId,
    RoomKeying, Session, SessionEvent, SessionId, SessionIdFactory, SessionSender, SessionState,
    TrackSource,
};

use super::{
    broadcast_router::BroadcastRouter,
    error::SessionError,
    track_watcher::{PollHandle, TrackWatcher},
};

/// Interval between now-playing lookups.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Tunables for session handling.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub poll_interval: Duration,
    pub room_keying: RoomKeying,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            room_keying: RoomKeying::default(),
        }
    }
}

/// A session together with its poll task.
#[derive(Debug)]
pub(crate) struct SessionEntry {
    pub(crate) session: Session,
    poll: Option<PollHandle>,
    poll_generation: u64,
}

impl SessionEntry {
    fn new(session: Session) -> Self {
        Self {
            session,
            poll: None,
            poll_generation: 0,
        }
    }

    /// Stop the running poll, if any. Ticks already in flight become no-ops.
    fn cancel_poll(&mut self) {
        self.poll = None;
        self.poll_generation += 1;
    }

    pub(crate) fn is_current_poll(&self, generation: u64) -> bool {
        self.poll_generation == generation && !self.session.is_disconnected()
    }
}

type SharedSessionEntry = Arc<Mutex<SessionEntry>>;

/// セッション管理のユースケース
pub struct SessionManager {
    /// session_id → セッション
    sessions: Mutex<HashMap<SessionId, SharedSessionEntry>>,
    router: Arc<BroadcastRouter>,
    identity_provider: Arc<dyn IdentityProvider>,
    track_source: Arc<dyn TrackSource>,
    settings: SessionSettings,
}

impl SessionManager {
    /// 新しい SessionManager を作成
    pub fn new(
        router: Arc<BroadcastRouter>,
        identity_provider: Arc<dyn IdentityProvider>,
        track_source: Arc<dyn TrackSource>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            router,
            identity_provider,
            track_source,
            settings,
        }
    }

    /// 新しい接続を未認証セッションとして登録
    pub async fn connect(&self, outbound: SessionSender) -> SessionId {
        let session_id = SessionIdFactory::generate();
        let entry = SessionEntry::new(Session::new(session_id, outbound));
        self.sessions
            .lock()
            .await
            .insert(session_id, Arc::new(Mutex::new(entry)));
        tracing::info!("Session {} connected", session_id);
        session_id
    }

    /// 認証を実行
    ///
    /// 成功時は `Authenticated`、失敗時は `AuthenticationFailed` を本人に送ります。
    /// 失敗してもセッションは維持され、再試行できます。
    pub async fn authenticate(
        &self,
        session_id: SessionId,
        credential: String,
    ) -> Result<Identity, SessionError> {
        let shared = self.entry(session_id).await?;
        let mut entry = shared.lock().await;
        if entry.session.is_disconnected() {
            return Err(SessionError::Disconnected);
        }

        let verified = match AccessToken::new(credential) {
            Ok(token) => self
                .identity_provider
                .verify_identity(&token)
                .await
                .map(|identity| (identity, token)),
            Err(e) => Err(AuthError::InvalidCredential(e.to_string())),
        };

        match verified {
            Ok((identity, token)) => {
                entry.session.authenticated(identity.clone(), token);
                notify(&entry.session, SessionEvent::Authenticated(identity.clone()));
                tracing::info!(
                    "Session {} authenticated as '{}'",
                    session_id,
                    identity.display_name
                );
                Ok(identity)
            }
            Err(e) => {
                notify(
                    &entry.session,
                    SessionEvent::AuthenticationFailed {
                        reason: e.to_string(),
                    },
                );
                tracing::warn!("Session {} failed to authenticate: {}", session_id, e);
                Err(SessionError::Authentication(e))
            }
        }
    }

    /// ルームへの参加を要求
    ///
    /// `room` を指定した場合はそのルームに参加し、ポーリングは止めます。
    /// 省略した場合は再生中の曲からルームを導出して参加し、ポーリングを開始します。
    /// 曲の取得に失敗した場合はルームに入らずにポーリングだけを開始し、`Ok(None)` を返します。
    pub async fn request_room(
        &self,
        session_id: SessionId,
        room: Option<String>,
    ) -> Result<Option<RoomId>, SessionError> {
        let shared = self.entry(session_id).await?;

        if let Some(room) = room {
            let mut entry = shared.lock().await;
            ensure_authenticated(&entry.session)?;
            let room_id = RoomId::new(room).map_err(SessionError::InvalidRoom)?;
            entry.cancel_poll();
            move_to_room(&self.router, &mut entry.session, room_id.clone()).await?;
            return Ok(Some(room_id));
        }

        let credential = {
            let mut entry = shared.lock().await;
            ensure_authenticated(&entry.session)?;
            entry.cancel_poll();
            entry
                .session
                .credential()
                .cloned()
                .ok_or(SessionError::NotAuthenticated)?
        };

        let derived = match self.track_source.current_track(&credential).await {
            Ok(now_playing) => match now_playing.room_id(self.settings.room_keying) {
                Ok(room_id) => Some(room_id),
                Err(e) => {
                    tracing::warn!("No room for {:?}: {}", now_playing, e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Session {} initial track lookup failed: {}", session_id, e);
                None
            }
        };

        let mut entry = shared.lock().await;
        ensure_authenticated(&entry.session)?;
        if let Some(room_id) = &derived {
            move_to_room(&self.router, &mut entry.session, room_id.clone()).await?;
        }

        entry.cancel_poll();
        let watcher = TrackWatcher {
            entry: Arc::downgrade(&shared),
            generation: entry.poll_generation,
            router: self.router.clone(),
            source: self.track_source.clone(),
            interval: self.settings.poll_interval,
            keying: self.settings.room_keying,
        };
        entry.poll = Some(watcher.spawn());

        Ok(derived)
    }

    /// メッセージ送信を実行
    ///
    /// 送信先は呼び出し時点のセッションのルームです。
    pub async fn post_message(
        &self,
        session_id: SessionId,
        text: String,
    ) -> Result<ChatMessage, SessionError> {
        let shared = self.entry(session_id).await?;
        let entry = shared.lock().await;

        let room_id = entry
            .session
            .current_room()
            .cloned()
            .ok_or(SessionError::NotInRoom)?;
        let author = entry
            .session
            .identity()
            .map(|identity| identity.display_name.clone())
            .ok_or(SessionError::NotAuthenticated)?;
        let content = MessageContent::new(text).map_err(SessionError::InvalidMessage)?;

        Ok(self.router.post(&room_id, author, content).await)
    }

    /// 切断を実行
    ///
    /// ポーリングを止め、ルームから退出します。ルームに参加していた場合のみ
    /// 残りのメンバーに `MemberLeft` が通知されます。二度目以降の呼び出しは何もしません。
    pub async fn disconnect(&self, session_id: SessionId) {
        let Some(shared) = self.sessions.lock().await.remove(&session_id) else {
            tracing::debug!("Session {} already disconnected", session_id);
            return;
        };

        let mut entry = shared.lock().await;
        entry.cancel_poll();
        if let Some(room_id) = entry.session.disconnect() {
            self.router.leave(&room_id, session_id).await;
        }
        tracing::info!("Session {} disconnected", session_id);
    }

    /// セッションの現在の状態
    pub async fn session_state(&self, session_id: SessionId) -> Option<SessionState> {
        let shared = self.sessions.lock().await.get(&session_id).cloned()?;
        let entry = shared.lock().await;
        Some(entry.session.state().clone())
    }

    /// 接続中のセッション数
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    async fn entry(&self, session_id: SessionId) -> Result<SharedSessionEntry, SessionError> {
        self.sessions
            .lock()
            .await
            .get(&session_id)
            .cloned()
            .ok_or(SessionError::SessionNotFound(session_id))
    }
}

/// Move `session` into `target`, leaving its current room first.
///
/// Returns `Ok(false)` when the session is already in `target`.
pub(crate) async fn move_to_room(
    router: &BroadcastRouter,
    session: &mut Session,
    target: RoomId,
) -> Result<bool, SessionError> {
    if session.current_room() == Some(&target) {
        return Ok(false);
    }
    let member = session.member().ok_or(SessionError::NotAuthenticated)?;
    let previous = session.enter_room(target.clone())?;

    if let Some(previous) = previous {
        router.leave(&previous, session.id()).await;
    }
    router.join(&target, session.id(), member).await;
    Ok(true)
}

fn ensure_authenticated(session: &Session) -> Result<(), SessionError> {
    if session.is_disconnected() {
        return Err(SessionError::Disconnected);
    }
    if !session.is_authenticated() {
        return Err(SessionError::NotAuthenticated);
    }
    Ok(())
}

fn notify(session: &Session, event: SessionEvent) {
    if session.outbound().send(event).is_err() {
        tracing::debug!("Session {} outbound channel closed", session.id());
    }
}
