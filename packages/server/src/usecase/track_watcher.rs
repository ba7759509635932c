//! Recurring now-playing poll for one session.
//!
//! Each tick asks the [`TrackSource`] what the listener is playing and moves
//! the session to the matching room when it changed. Failed lookups are
//! logged and skipped.

use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};

use crate::domain::{RoomKeying, TrackSource};

use super::{
    broadcast_router::BroadcastRouter,
    session_manager::{SessionEntry, move_to_room},
};

/// Owned handle of a running poll task. Dropping it stops the task.
#[derive(Debug)]
pub struct PollHandle(JoinHandle<()>);

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

pub struct TrackWatcher {
    pub(crate) entry: Weak<Mutex<SessionEntry>>,
    pub(crate) generation: u64,
    pub(crate) router: Arc<BroadcastRouter>,
    pub(crate) source: Arc<dyn TrackSource>,
    pub(crate) interval: Duration,
    pub(crate) keying: RoomKeying,
}

impl TrackWatcher {
    /// Start polling. The first tick fires one `interval` from now.
    pub fn spawn(self) -> PollHandle {
        PollHandle(tokio::spawn(self.run()))
    }

    async fn run(self) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if !self.tick().await {
                break;
            }
        }
    }

    /// One poll cycle. Returns `false` once the session is gone or this
    /// watcher has been superseded.
    async fn tick(&self) -> bool {
        let Some(entry) = self.entry.upgrade() else {
            return false;
        };

        let credential = {
            let entry = entry.lock().await;
            if !entry.is_current_poll(self.generation) {
                return false;
            }
            match entry.session.credential() {
                Some(credential) => credential.clone(),
                None => return false,
            }
        };

        // No lock is held during the lookup
        let now_playing = match self.source.current_track(&credential).await {
            Ok(now_playing) => now_playing,
            Err(e) => {
                tracing::warn!("Track poll skipped: {}", e);
                return true;
            }
        };
        let room_id = match now_playing.room_id(self.keying) {
            Ok(room_id) => room_id,
            Err(e) => {
                tracing::warn!("Track poll skipped, no room for {:?}: {}", now_playing, e);
                return true;
            }
        };

        let mut entry = entry.lock().await;
        if !entry.is_current_poll(self.generation) {
            return false;
        }
        let session_id = entry.session.id();
        match move_to_room(&self.router, &mut entry.session, room_id.clone()).await {
            Ok(true) => tracing::info!("Session {} followed track to room '{}'", session_id, room_id),
            Ok(false) => {}
            Err(e) => tracing::warn!("Session {} could not follow track: {}", session_id, e),
        }
        true
    }
}
