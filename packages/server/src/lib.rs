//! Now-playing chat server.
//!
//! Listeners authenticate with Spotify, are placed in a room named after what
//! they are currently playing, and chat with everyone else in that room. Late
//! joiners receive the room's recent history first.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub use config::ServerConfig;
pub use ui::run;
