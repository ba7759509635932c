//! Domain factories for creating domain entities and value objects.

use super::SessionId;

/// Factory for generating SessionId instances.
///
/// Keeps id generation out of the SessionId value object itself.
pub struct SessionIdFactory;

impl SessionIdFactory {
    /// Generate a new SessionId backed by a random UUID v4.
    pub fn generate() -> SessionId {
        SessionId::from_uuid(uuid::Uuid::new_v4())
    }
}
