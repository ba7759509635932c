//! UI 層
//!
//! axum のルーティングと WebSocket / HTTP ハンドラ、サーバーの起動処理。

mod error;
mod handler;
mod router;
mod runner;
mod signal;
pub mod state;

pub use error::ServerError;
pub use router::build_router;
pub use runner::run;
pub use state::AppState;
