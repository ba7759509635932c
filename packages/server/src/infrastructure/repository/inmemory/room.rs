//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! Room は一度作られるとプロセス終了まで残ります（削除ポリシーは未実装）。
//! マップのロックはエントリの取得・作成の間だけ保持し、ルーム単位の操作は
//! 各ルームの Mutex で直列化されます。

use std::{collections::HashMap, num::NonZeroUsize, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Room, RoomId, RoomRepository, RoomSummary, SharedRoom, Timestamp};

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository {
    /// room_id → Room
    rooms: Mutex<HashMap<RoomId, SharedRoom>>,
    /// 新しく作る Room の履歴容量
    history_capacity: NonZeroUsize,
}

impl InMemoryRoomRepository {
    /// 新しい InMemoryRoomRepository を作成
    pub fn new(history_capacity: NonZeroUsize) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            history_capacity,
        }
    }

    /// 作成済みの Room 数
    pub async fn count_rooms(&self) -> usize {
        self.rooms.lock().await.len()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn get_or_create(&self, room_id: &RoomId) -> SharedRoom {
        let mut rooms = self.rooms.lock().await;
        rooms
            .entry(room_id.clone())
            .or_insert_with(|| {
                tracing::info!("Creating room '{}'", room_id);
                Arc::new(Mutex::new(Room::new(
                    room_id.clone(),
                    Timestamp::now(),
                    self.history_capacity,
                )))
            })
            .clone()
    }

    async fn find(&self, room_id: &RoomId) -> Option<SharedRoom> {
        self.rooms.lock().await.get(room_id).cloned()
    }

    async fn snapshot(&self) -> Vec<RoomSummary> {
        // Clone the handles first so no room lock is taken under the map lock
        let rooms: Vec<SharedRoom> = self.rooms.lock().await.values().cloned().collect();

        let mut summaries = Vec::with_capacity(rooms.len());
        for room in rooms {
            let room = room.lock().await;
            summaries.push(RoomSummary {
                id: room.id.clone(),
                members: room.member_names(),
                history_len: room.history_len(),
                created_at: room.created_at,
            });
        }
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }
}
