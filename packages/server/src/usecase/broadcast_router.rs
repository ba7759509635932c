//! UseCase: ルーム単位の配信
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - BroadcastRouter::join() / leave() / post()
//! - 参加時の履歴リプレイ、ルーム内へのブロードキャスト、退出通知
//!
//! ### なぜこのテストが必要か
//! - 途中参加者が履歴を受け取ってからライブ配信を受け取ることを保証
//! - 別ルームへの配信漏れがないこと（ルームの分離）を保証
//! - 一部メンバーへの配信失敗が他のメンバーや送信者に影響しないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加・投稿・退出
//! - 異常系：切断済みチャンネルを持つメンバーへの配信
//! - エッジケース：空のルームへの参加、非メンバーの退出

use std::sync::Arc;

use crate::domain::{
    ChatMessage, DisplayName, Member, MessageContent, Room, RoomId, RoomRepository, SessionEvent,
    SessionId, Timestamp, entity::deliver,
};

/// ルーム単位の配信を行うユースケース
pub struct BroadcastRouter {
    /// Repository（データアクセス層の抽象化）
    rooms: Arc<dyn RoomRepository>,
}

impl BroadcastRouter {
    /// 新しい BroadcastRouter を作成
    pub fn new(rooms: Arc<dyn RoomRepository>) -> Self {
        Self { rooms }
    }

    /// セッションをルームに参加させる
    ///
    /// 参加者には `RoomJoined` と履歴のリプレイを送り、その後メンバーに追加して
    /// 他のメンバーへ `MemberJoined` を通知します。ルームのロックを保持したまま
    /// 行うため、同時に投稿されたメッセージはリプレイの後に届きます。
    pub async fn join(&self, room_id: &RoomId, session_id: SessionId, member: Member) {
        let room = self.rooms.get_or_create(room_id).await;
        let mut room = room.lock().await;

        let replay = room.history();
        let replay_len = replay.len();
        std::iter::once(SessionEvent::RoomJoined(room_id.clone()))
            .chain(replay.into_iter().map(SessionEvent::Chat))
            .try_for_each(|event| deliver(&session_id, &member, event))
            .unwrap_or_else(|e| tracing::warn!("Replay to joining session failed: {}", e));

        let name = member.name.clone();
        room.add_member(session_id, member);

        let notified = fan_out(
            &room,
            &SessionEvent::MemberJoined {
                name: name.clone(),
                room: room_id.clone(),
            },
            Some(&session_id),
        );
        tracing::info!(
            "'{}' joined room '{}' (replayed {}, notified {})",
            name,
            room_id,
            replay_len,
            notified
        );
    }

    /// セッションをルームから外す
    ///
    /// メンバーだった場合は残りのメンバーへ `MemberLeft` を通知して `true` を返します。
    pub async fn leave(&self, room_id: &RoomId, session_id: SessionId) -> bool {
        let Some(room) = self.rooms.find(room_id).await else {
            return false;
        };
        let mut room = room.lock().await;

        let Some(member) = room.remove_member(&session_id) else {
            return false;
        };

        let notified = fan_out(
            &room,
            &SessionEvent::MemberLeft {
                name: member.name.clone(),
                room: room_id.clone(),
            },
            None,
        );
        tracing::info!(
            "'{}' left room '{}' (notified {})",
            member.name,
            room_id,
            notified
        );
        true
    }

    /// メッセージを履歴に追加し、ルームの全メンバー（送信者を含む）に配信する
    pub async fn post(
        &self,
        room_id: &RoomId,
        author: DisplayName,
        text: MessageContent,
    ) -> ChatMessage {
        let room = self.rooms.get_or_create(room_id).await;
        let mut room = room.lock().await;

        let message = ChatMessage::new(author, text, room_id.clone(), Timestamp::now());
        room.record_message(message.clone());

        let delivered = fan_out(&room, &SessionEvent::Chat(message.clone()), None);
        tracing::debug!(
            "Broadcast message from '{}' in room '{}' to {} member(s)",
            message.author,
            room_id,
            delivered
        );
        message
    }
}

/// Deliver `event` to every member except `exclude`, returning how many
/// deliveries succeeded. Failures are logged and skipped.
fn fan_out(room: &Room, event: &SessionEvent, exclude: Option<&SessionId>) -> usize {
    room.members()
        .filter(|(id, _)| Some(*id) != exclude)
        .filter(|(id, member)| match deliver(id, member, event.clone()) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to deliver to room '{}': {}", room.id, e);
                false
            }
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{DEFAULT_HISTORY_CAPACITY, SessionIdFactory, SessionReceiver},
        infrastructure::repository::InMemoryRoomRepository,
    };
    use std::num::NonZeroUsize;
    use tokio::sync::mpsc;

    fn create_test_router() -> (BroadcastRouter, Arc<InMemoryRoomRepository>) {
        create_test_router_with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    fn create_test_router_with_capacity(
        capacity: NonZeroUsize,
    ) -> (BroadcastRouter, Arc<InMemoryRoomRepository>) {
        let repository = Arc::new(InMemoryRoomRepository::new(capacity));
        (BroadcastRouter::new(repository.clone()), repository)
    }

    fn member(name: &str) -> (SessionId, Member, SessionReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            SessionIdFactory::generate(),
            Member::new(DisplayName::new(name.to_string()).unwrap(), tx),
            rx,
        )
    }

    fn room(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    fn name(name: &str) -> DisplayName {
        DisplayName::new(name.to_string()).unwrap()
    }

    fn text(text: &str) -> MessageContent {
        MessageContent::new(text.to_string()).unwrap()
    }

    fn drain(rx: &mut SessionReceiver) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn chat_texts(events: &[SessionEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|event| match event {
                SessionEvent::Chat(message) => Some(message.text.as_str().to_string()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_join_empty_room_sends_room_joined_only() {
        // テスト項目: 空のルームに参加すると RoomJoined のみが届く
        // given (前提条件):
        let (router, repository) = create_test_router();
        let (alice_id, alice, mut alice_rx) = member("alice");

        // when (操作):
        router.join(&room("artist1"), alice_id, alice).await;

        // then (期待する結果):
        assert_eq!(
            drain(&mut alice_rx),
            vec![SessionEvent::RoomJoined(room("artist1"))]
        );
        let snapshot = repository.snapshot().await;
        assert_eq!(snapshot[0].members, vec!["alice"]);
    }

    #[tokio::test]
    async fn test_post_reaches_all_members_including_sender() {
        // テスト項目: 投稿はルームの全メンバー（送信者を含む）に届く
        // given (前提条件):
        let (router, _repository) = create_test_router();
        let (alice_id, alice, mut alice_rx) = member("alice");
        let (bob_id, bob, mut bob_rx) = member("bob");
        router.join(&room("artist1"), alice_id, alice).await;
        router.join(&room("artist1"), bob_id, bob).await;
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        // when (操作):
        let message = router.post(&room("artist1"), name("alice"), text("hi")).await;

        // then (期待する結果):
        assert_eq!(drain(&mut alice_rx), vec![SessionEvent::Chat(message.clone())]);
        assert_eq!(drain(&mut bob_rx), vec![SessionEvent::Chat(message)]);
    }

    #[tokio::test]
    async fn test_late_joiner_receives_replay_before_live_messages() {
        // テスト項目: 途中参加者は履歴のリプレイを受け取ってからライブ配信を受け取る
        // given (前提条件):
        let (router, _repository) = create_test_router();
        let (alice_id, alice, _alice_rx) = member("alice");
        router.join(&room("artist1"), alice_id, alice).await;
        router.post(&room("artist1"), name("alice"), text("hi")).await;

        // when (操作):
        let (carol_id, carol, mut carol_rx) = member("carol");
        router.join(&room("artist1"), carol_id, carol).await;
        router.post(&room("artist1"), name("alice"), text("welcome")).await;

        // then (期待する結果):
        let events = drain(&mut carol_rx);
        assert_eq!(events[0], SessionEvent::RoomJoined(room("artist1")));
        assert_eq!(chat_texts(&events), vec!["hi", "welcome"]);
    }

    #[tokio::test]
    async fn test_joiner_does_not_receive_own_member_joined() {
        // テスト項目: 参加者自身には MemberJoined が届かず、既存メンバーには届く
        // given (前提条件):
        let (router, _repository) = create_test_router();
        let (alice_id, alice, mut alice_rx) = member("alice");
        router.join(&room("artist1"), alice_id, alice).await;
        drain(&mut alice_rx);

        // when (操作):
        let (bob_id, bob, mut bob_rx) = member("bob");
        router.join(&room("artist1"), bob_id, bob).await;

        // then (期待する結果):
        assert_eq!(
            drain(&mut alice_rx),
            vec![SessionEvent::MemberJoined {
                name: name("bob"),
                room: room("artist1")
            }]
        );
        assert!(
            drain(&mut bob_rx)
                .iter()
                .all(|event| !matches!(event, SessionEvent::MemberJoined { .. }))
        );
    }

    #[tokio::test]
    async fn test_room_isolation() {
        // テスト項目: 別ルームのメッセージは届かない
        // given (前提条件):
        let (router, _repository) = create_test_router();
        let (alice_id, alice, mut alice_rx) = member("alice");
        let (bob_id, bob, mut bob_rx) = member("bob");
        router.join(&room("artist1"), alice_id, alice).await;
        router.join(&room("artist2"), bob_id, bob).await;
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        // when (操作):
        router.post(&room("artist1"), name("alice"), text("hello")).await;
        router.post(&room("artist2"), name("bob"), text("world")).await;

        // then (期待する結果):
        assert_eq!(chat_texts(&drain(&mut alice_rx)), vec!["hello"]);
        assert_eq!(chat_texts(&drain(&mut bob_rx)), vec!["world"]);
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_affect_others() {
        // テスト項目: 切断済みメンバーへの配信失敗は他のメンバーへの配信を妨げない
        // given (前提条件):
        let (router, repository) = create_test_router();
        let (alice_id, alice, mut alice_rx) = member("alice");
        let (ghost_id, ghost, ghost_rx) = member("ghost");
        let (bob_id, bob, mut bob_rx) = member("bob");
        router.join(&room("artist1"), alice_id, alice).await;
        router.join(&room("artist1"), ghost_id, ghost).await;
        router.join(&room("artist1"), bob_id, bob).await;
        drop(ghost_rx);
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        // when (操作):
        let message = router.post(&room("artist1"), name("alice"), text("still here")).await;

        // then (期待する結果):
        assert_eq!(drain(&mut alice_rx), vec![SessionEvent::Chat(message.clone())]);
        assert_eq!(drain(&mut bob_rx), vec![SessionEvent::Chat(message)]);
        assert_eq!(repository.snapshot().await[0].history_len, 1);
    }

    #[tokio::test]
    async fn test_leave_notifies_remaining_members() {
        // テスト項目: 退出すると残りのメンバーに MemberLeft が届き、人数が 1 減る
        // given (前提条件):
        let (router, repository) = create_test_router();
        let (alice_id, alice, mut alice_rx) = member("alice");
        let (bob_id, bob, mut bob_rx) = member("bob");
        router.join(&room("artist1"), alice_id, alice).await;
        router.join(&room("artist1"), bob_id, bob).await;
        drain(&mut alice_rx);

        // when (操作):
        let left = router.leave(&room("artist1"), bob_id).await;
        router.post(&room("artist1"), name("alice"), text("bye")).await;

        // then (期待する結果):
        assert!(left);
        assert_eq!(
            drain(&mut alice_rx)[0],
            SessionEvent::MemberLeft {
                name: name("bob"),
                room: room("artist1")
            }
        );
        assert!(chat_texts(&drain(&mut bob_rx)).is_empty());
        assert_eq!(repository.snapshot().await[0].members, vec!["alice"]);
    }

    #[tokio::test]
    async fn test_leave_non_member_is_noop() {
        // テスト項目: メンバーでないセッションの退出は何もしない
        let (router, _repository) = create_test_router();
        let stranger = SessionIdFactory::generate();
        assert!(!router.leave(&room("unknown"), stranger).await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_join_during_concurrent_posts_sees_every_message_once() {
        // テスト項目: 投稿と同時に参加しても、リプレイとライブ配信を合わせて
        //             全メッセージが履歴順に重複・欠落なく届く
        // given (前提条件):
        const POSTS: usize = 100;
        let (router, repository) =
            create_test_router_with_capacity(NonZeroUsize::new(POSTS * 2).unwrap());
        let router = Arc::new(router);
        let (carol_id, carol, mut carol_rx) = member("carol");
        let start = Arc::new(tokio::sync::Barrier::new(POSTS + 1));

        // when (操作): 多数の投稿と参加を同時に開始する
        let posts: Vec<_> = (0..POSTS)
            .map(|i| {
                let router = router.clone();
                let start = start.clone();
                tokio::spawn(async move {
                    start.wait().await;
                    router
                        .post(&room("artist1"), name("alice"), text(&format!("m{i}")))
                        .await
                })
            })
            .collect();
        let joiner = {
            let router = router.clone();
            let start = start.clone();
            tokio::spawn(async move {
                start.wait().await;
                router.join(&room("artist1"), carol_id, carol).await;
            })
        };
        for post in posts {
            post.await.unwrap();
        }
        joiner.await.unwrap();

        // then (期待する結果):
        let events = drain(&mut carol_rx);
        assert_eq!(events[0], SessionEvent::RoomJoined(room("artist1")));
        let received: Vec<ChatMessage> = events[1..]
            .iter()
            .map(|event| match event {
                SessionEvent::Chat(message) => message.clone(),
                other => panic!("unexpected event after RoomJoined: {other:?}"),
            })
            .collect();
        let history = repository
            .find(&room("artist1"))
            .await
            .unwrap()
            .lock()
            .await
            .history();
        assert_eq!(history.len(), POSTS);
        assert_eq!(received, history);
    }

    #[tokio::test]
    async fn test_replay_is_bounded_by_history_capacity() {
        // テスト項目: リプレイされるのは履歴容量分の直近メッセージのみ
        // given (前提条件):
        let (router, _repository) = create_test_router_with_capacity(NonZeroUsize::new(3).unwrap());
        for i in 1..=5 {
            router
                .post(&room("artist1"), name("alice"), text(&format!("m{i}")))
                .await;
        }

        // when (操作):
        let (carol_id, carol, mut carol_rx) = member("carol");
        router.join(&room("artist1"), carol_id, carol).await;

        // then (期待する結果):
        assert_eq!(chat_texts(&drain(&mut carol_rx)), vec!["m3", "m4", "m5"]);
    }
}
