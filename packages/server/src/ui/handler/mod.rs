//! Handler modules for HTTP and WebSocket endpoints.

pub mod http;
pub mod oauth;
pub mod websocket;

// Re-export HTTP handlers
pub use http::{get_room_detail, get_rooms, health_check};

// Re-export OAuth handlers
pub use oauth::{callback, login};

// Re-export WebSocket handlers
pub use websocket::websocket_handler;
