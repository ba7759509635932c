//! Repository trait for rooms.
//!
//! Implemented by the infrastructure layer; the use case layer only depends
//! on this trait.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;

use super::{
    entity::Room,
    value_object::{RoomId, Timestamp},
};

/// A room shared between the sessions that reference it.
///
/// All history and membership changes for one room go through this lock.
pub type SharedRoom = Arc<Mutex<Room>>;

/// Diagnostic view of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomSummary {
    pub id: RoomId,
    pub members: Vec<String>,
    pub history_len: usize,
    pub created_at: Timestamp,
}

#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Return the room for `room_id`, creating it on first use.
    ///
    /// Repeated calls with the same id return the same room.
    async fn get_or_create(&self, room_id: &RoomId) -> SharedRoom;

    /// Return the room for `room_id` if it has ever been referenced.
    async fn find(&self, room_id: &RoomId) -> Option<SharedRoom>;

    /// Summaries of every room, sorted by id.
    async fn snapshot(&self) -> Vec<RoomSummary>;
}
