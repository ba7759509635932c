//! Test server and clients shared by the integration tests.
//!
//! The server runs in-process on an ephemeral port. Spotify is replaced by
//! fakes: the token `token-<name>` authenticates as `<name>` (`token-bad` is
//! rejected), and each listener plays whatever [`TestServer::play`] set for
//! their token.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    num::NonZeroUsize,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use encore_server::{
    domain::{
        AccessToken, AuthError, DisplayName, Identity, IdentityProvider, NowPlaying, RoomKeying,
        TrackSource, TransientExternalError,
    },
    infrastructure::{
        repository::InMemoryRoomRepository,
        spotify::{OAuthConfig, SpotifyOAuth},
    },
    ui::{AppState, build_router},
    usecase::SessionSettings,
};
use futures_util::{SinkExt, StreamExt};
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub const FRONTEND_URL: &str = "http://frontend.test";
pub const HISTORY_CAPACITY: NonZeroUsize = match NonZeroUsize::new(3) {
    Some(capacity) => capacity,
    None => unreachable!(),
};
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);
const RECV_TIMEOUT: Duration = Duration::from_secs(3);

type NowPlayingTable = Arc<Mutex<HashMap<String, NowPlaying>>>;

struct FakeIdentityProvider;

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn verify_identity(&self, credential: &AccessToken) -> Result<Identity, AuthError> {
        match credential.secret().strip_prefix("token-") {
            Some("bad") | None => Err(AuthError::InvalidCredential(
                "The access token expired".to_string(),
            )),
            Some(name) => Ok(Identity::new(
                format!("id-{name}"),
                DisplayName::new(name.to_string()).expect("valid name"),
            )),
        }
    }
}

struct FakeTrackSource {
    playing: NowPlayingTable,
}

#[async_trait]
impl TrackSource for FakeTrackSource {
    async fn current_track(
        &self,
        credential: &AccessToken,
    ) -> Result<NowPlaying, TransientExternalError> {
        self.playing
            .lock()
            .unwrap()
            .get(credential.secret())
            .cloned()
            .ok_or(TransientExternalError::NothingPlaying)
    }
}

pub struct TestServer {
    address: SocketAddr,
    playing: NowPlayingTable,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with_accounts("http://127.0.0.1:9").await
    }

    /// Start with the OAuth token endpoint served from `accounts_base`.
    pub async fn start_with_accounts(accounts_base: &str) -> Self {
        let playing = NowPlayingTable::default();
        let oauth = SpotifyOAuth::new(OAuthConfig {
            client_id: "test-client".to_string(),
            client_secret: "test-secret".to_string(),
            redirect_uri: "http://localhost:4000/callback".to_string(),
            accounts_base: accounts_base.to_string(),
        })
        .expect("test OAuth config should be valid");
        let state = Arc::new(AppState::new(
            Arc::new(InMemoryRoomRepository::new(HISTORY_CAPACITY)),
            Arc::new(FakeIdentityProvider),
            Arc::new(FakeTrackSource {
                playing: playing.clone(),
            }),
            oauth,
            FRONTEND_URL,
            SessionSettings {
                poll_interval: POLL_INTERVAL,
                room_keying: RoomKeying::Artist,
            },
        ));

        let (address, handle) = serve(build_router(state)).await;
        Self {
            address,
            playing,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.address)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.address)
    }

    /// Make `name`'s player report `artist`.
    pub fn play(&self, name: &str, artist: &str) {
        self.playing.lock().unwrap().insert(
            format!("token-{name}"),
            NowPlaying::new(artist, format!("{artist} song")),
        );
    }

    pub async fn connect(&self) -> WsClient {
        WsClient::connect(&self.ws_url()).await
    }

    /// Connect and authenticate as `name`.
    pub async fn login(&self, name: &str) -> WsClient {
        let mut client = self.connect().await;
        client
            .send(serde_json::json!({"type": "authenticate", "access_token": format!("token-{name}")}))
            .await;
        let frame = client.recv().await;
        assert_eq!(frame["type"], "authenticated", "unexpected frame {frame}");
        client
    }

    /// Connect, authenticate and enter `room`, consuming the join frames.
    pub async fn join(&self, name: &str, room: &str) -> WsClient {
        let mut client = self.login(name).await;
        client.request_room(room).await;
        client
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Serve `router` on an ephemeral local port.
pub async fn serve(router: axum::Router) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let address = listener.local_addr().expect("Failed to get address");
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });
    (address, handle)
}

pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
}

impl WsClient {
    pub async fn connect(url: &str) -> Self {
        let (stream, _) = connect_async(url).await.expect("Failed to connect");
        Self { stream }
    }

    pub async fn send(&mut self, frame: serde_json::Value) {
        self.send_raw(&frame.to_string()).await;
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.stream
            .send(Message::text(text))
            .await
            .expect("Failed to send");
    }

    pub async fn chat(&mut self, message: &str) {
        self.send(serde_json::json!({"type": "chat", "message": message}))
            .await;
    }

    /// Request `room` and wait for `room-joined`.
    pub async fn request_room(&mut self, room: &str) {
        self.send(serde_json::json!({"type": "request-room", "room": room}))
            .await;
        let frame = self.recv_type("room-joined").await;
        assert_eq!(frame["room"], room);
    }

    /// Next JSON frame from the server.
    pub async fn recv(&mut self) -> serde_json::Value {
        tokio::time::timeout(RECV_TIMEOUT, async {
            loop {
                match self.stream.next().await {
                    Some(Ok(message @ Message::Text(_))) => {
                        let text = message.to_text().expect("text frame");
                        return serde_json::from_str(text).expect("Failed to parse JSON");
                    }
                    Some(Ok(_)) => continue,
                    other => panic!("connection ended: {other:?}"),
                }
            }
        })
        .await
        .expect("Timed out waiting for a frame")
    }

    /// Skip frames until one of type `kind` arrives.
    pub async fn recv_type(&mut self, kind: &str) -> serde_json::Value {
        loop {
            let frame = self.recv().await;
            if frame["type"] == kind {
                return frame;
            }
        }
    }

    /// Assert that nothing arrives for `duration`.
    pub async fn expect_silence(&mut self, duration: Duration) {
        if let Ok(Some(Ok(message))) = tokio::time::timeout(duration, self.stream.next()).await {
            panic!("unexpected frame {message:?}");
        }
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}
