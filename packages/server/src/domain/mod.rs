//! Domain layer for the chat application.
//!
//! This module contains business logic that is independent of
//! data transfer objects (DTOs) and infrastructure concerns.

pub mod entity;
pub mod error;
pub mod event;
pub mod external;
pub mod factory;
pub mod history;
pub mod repository;
pub mod session;
pub mod value_object;

pub use entity::{ChatMessage, Identity, Member, Room};
pub use error::{AuthError, DeliveryError, TransientExternalError, ValueObjectError};
pub use event::{SessionEvent, SessionReceiver, SessionSender};
pub use external::{IdentityProvider, NowPlaying, RoomKeying, TrackSource};
pub use factory::SessionIdFactory;
pub use history::{BoundedHistory, DEFAULT_HISTORY_CAPACITY};
pub use repository::{RoomRepository, RoomSummary, SharedRoom};
pub use session::{Session, SessionState, SessionStateError};
pub use value_object::{AccessToken, DisplayName, MessageContent, RoomId, SessionId, Timestamp};
