//! Per-connection session state machine.
//!
//! ```text
//! Unauthenticated ──authenticate──▶ Authenticated ──enter_room──▶ InRoom(room)
//!        │                               │                         │   ▲
//!        │                               │                         └───┘ enter_room (switch)
//!        └───────────────────────────────┴─────────────────────────┴──▶ Disconnected
//! ```

use super::{
    entity::{Identity, Member},
    event::SessionSender,
    value_object::{AccessToken, RoomId, SessionId},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    InRoom(RoomId),
    Disconnected,
}

/// One live connection.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    outbound: SessionSender,
    state: SessionState,
    identity: Option<Identity>,
    credential: Option<AccessToken>,
}

impl Session {
    pub fn new(id: SessionId, outbound: SessionSender) -> Self {
        Self {
            id,
            outbound,
            state: SessionState::Unauthenticated,
            identity: None,
            credential: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn outbound(&self) -> &SessionSender {
        &self.outbound
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn credential(&self) -> Option<&AccessToken> {
        self.credential.as_ref()
    }

    pub fn current_room(&self) -> Option<&RoomId> {
        match &self.state {
            SessionState::InRoom(room_id) => Some(room_id),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(
            self.state,
            SessionState::Authenticated | SessionState::InRoom(_)
        )
    }

    pub fn is_disconnected(&self) -> bool {
        self.state == SessionState::Disconnected
    }

    /// Bind a verified identity. A session already in a room stays there.
    pub fn authenticated(&mut self, identity: Identity, credential: AccessToken) {
        if self.is_disconnected() {
            return;
        }
        self.identity = Some(identity);
        self.credential = Some(credential);
        if self.state == SessionState::Unauthenticated {
            self.state = SessionState::Authenticated;
        }
    }

    /// Record entry into `room_id`, returning the room that was left, if any.
    pub fn enter_room(&mut self, room_id: RoomId) -> Result<Option<RoomId>, SessionStateError> {
        match std::mem::replace(&mut self.state, SessionState::InRoom(room_id)) {
            SessionState::Authenticated => Ok(None),
            SessionState::InRoom(previous) => Ok(Some(previous)),
            other => {
                let error = match other {
                    SessionState::Disconnected => SessionStateError::Disconnected,
                    _ => SessionStateError::NotAuthenticated,
                };
                self.state = other;
                Err(error)
            }
        }
    }

    /// Membership entry for the room this session is entering.
    pub fn member(&self) -> Option<Member> {
        self.identity
            .as_ref()
            .map(|identity| Member::new(identity.display_name.clone(), self.outbound.clone()))
    }

    /// Move to `Disconnected`, returning the room the session was in.
    pub fn disconnect(&mut self) -> Option<RoomId> {
        match std::mem::replace(&mut self.state, SessionState::Disconnected) {
            SessionState::InRoom(room_id) => Some(room_id),
            _ => None,
        }
    }
}

/// Transition rejected by the state machine.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum SessionStateError {
    #[error("session is not authenticated")]
    NotAuthenticated,
    #[error("session is disconnected")]
    Disconnected,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{factory::SessionIdFactory, value_object::DisplayName};
    use tokio::sync::mpsc;

    fn session() -> Session {
        let (tx, _rx) = mpsc::unbounded_channel();
        Session::new(SessionIdFactory::generate(), tx)
    }

    fn identity(name: &str) -> Identity {
        Identity::new(name.to_string(), DisplayName::new(name.to_string()).unwrap())
    }

    fn token() -> AccessToken {
        AccessToken::new("token".to_string()).unwrap()
    }

    fn room(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    #[test]
    fn test_new_session_is_unauthenticated() {
        // テスト項目: 新しいセッションは未認証状態で始まる
        let session = session();
        assert_eq!(session.state(), &SessionState::Unauthenticated);
        assert!(!session.is_authenticated());
        assert!(session.member().is_none());
    }

    #[test]
    fn test_enter_room_requires_authentication() {
        // テスト項目: 未認証のセッションはルームに入れない
        // given (前提条件):
        let mut session = session();

        // when (操作):
        let result = session.enter_room(room("artist1"));

        // then (期待する結果):
        assert_eq!(result, Err(SessionStateError::NotAuthenticated));
        assert_eq!(session.state(), &SessionState::Unauthenticated);
    }

    #[test]
    fn test_enter_room_switch_returns_previous_room() {
        // テスト項目: ルームの切り替えで以前のルームが返される
        // given (前提条件):
        let mut session = session();
        session.authenticated(identity("alice"), token());

        // when (操作):
        let first = session.enter_room(room("artist1"));
        let second = session.enter_room(room("artist2"));

        // then (期待する結果):
        assert_eq!(first, Ok(None));
        assert_eq!(second, Ok(Some(room("artist1"))));
        assert_eq!(session.current_room(), Some(&room("artist2")));
    }

    #[test]
    fn test_reauthentication_keeps_room() {
        // テスト項目: ルーム参加中に再認証してもルームは維持される
        // given (前提条件):
        let mut session = session();
        session.authenticated(identity("alice"), token());
        session.enter_room(room("artist1")).unwrap();

        // when (操作):
        session.authenticated(identity("alice2"), token());

        // then (期待する結果):
        assert_eq!(session.state(), &SessionState::InRoom(room("artist1")));
        assert_eq!(
            session.identity().unwrap().display_name.as_str(),
            "alice2"
        );
    }

    #[test]
    fn test_disconnect_is_terminal() {
        // テスト項目: 切断後はどの遷移も受け付けない
        // given (前提条件):
        let mut session = session();
        session.authenticated(identity("alice"), token());
        session.enter_room(room("artist1")).unwrap();

        // when (操作):
        let left = session.disconnect();

        // then (期待する結果):
        assert_eq!(left, Some(room("artist1")));
        assert!(session.is_disconnected());
        assert_eq!(session.disconnect(), None);
        assert_eq!(
            session.enter_room(room("artist2")),
            Err(SessionStateError::Disconnected)
        );
        session.authenticated(identity("alice"), token());
        assert!(session.is_disconnected());
    }
}
