//! UseCase 層のエラー定義
//!
//! いずれもセッション単位のエラーで、発生させたセッションにのみ通知されます。

use thiserror::Error;

use crate::domain::{AuthError, SessionId, SessionStateError, ValueObjectError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// 認証前に認証が必要な操作を行った
    #[error("not authenticated")]
    NotAuthenticated,

    /// ルーム参加前にメッセージを送信した
    #[error("not in a room")]
    NotInRoom,

    /// 存在しない（切断済みの）セッション
    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    /// 処理中にセッションが切断された
    #[error("session is disconnected")]
    Disconnected,

    /// 不正なルーム ID
    #[error("invalid room: {0}")]
    InvalidRoom(ValueObjectError),

    /// 不正なメッセージ内容
    #[error("invalid message: {0}")]
    InvalidMessage(ValueObjectError),

    /// 認証失敗（再試行可能）
    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthError),
}

impl From<SessionStateError> for SessionError {
    fn from(error: SessionStateError) -> Self {
        match error {
            SessionStateError::NotAuthenticated => Self::NotAuthenticated,
            SessionStateError::Disconnected => Self::Disconnected,
        }
    }
}
