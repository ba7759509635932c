//! UseCase 層
//!
//! ビジネスロジックを実装するレイヤー。
//! UI 層から呼び出され、Domain 層を操作します。
//!
//! - [`SessionManager`]: 接続ごとの認証・ルーム参加の状態遷移
//! - [`BroadcastRouter`]: ルーム単位の配信と履歴のリプレイ
//! - [`TrackWatcher`]: 再生中の曲のポーリング

pub mod broadcast_router;
pub mod error;
pub mod session_manager;
pub mod track_watcher;

pub use broadcast_router::BroadcastRouter;
pub use error::SessionError;
pub use session_manager::{DEFAULT_POLL_INTERVAL, SessionManager, SessionSettings};
