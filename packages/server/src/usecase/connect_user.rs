//! UseCase: ユーザー登録処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectUserUseCase::execute() / announce() メソッド
//! - ユーザー名の検証、重複チェック、参加時の一連の送信
//!
//! ### なぜこのテストが必要か
//! - 不正な名前・重複した名前で登録されないことを保証する
//! - 新規参加者に歓迎メッセージ・履歴・参加通知が正しい順番で届くことを確認する
//! - 登録と同時に配信されたメッセージが重複せず、歓迎メッセージより先に届かないことを確認する
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規ユーザーの登録
//! - 異常系：不正な形式の名前、大文字小文字違いの重複
//! - エッジケース：履歴が空の場合の通知、登録から歓迎までの間の配信

use std::sync::Arc;

use crate::{
    domain::{PushError, Session, Username},
    infrastructure::protocol::notice,
};

use super::{
    dispatcher::{Admission, BroadcastDispatcher},
    error::ConnectError,
};

/// 登録済みで、まだ歓迎されていない参加者
///
/// 保持している間、このセッションへの配信は待機する。
pub struct Joined {
    username: Username,
    admission: Admission,
}

impl Joined {
    pub fn username(&self) -> &Username {
        &self.username
    }
}

/// ユーザー登録のユースケース
pub struct ConnectUserUseCase {
    /// Dispatcher（登録、履歴のコピー、参加通知の配信）
    dispatcher: Arc<BroadcastDispatcher>,
}

impl ConnectUserUseCase {
    /// 新しい ConnectUserUseCase を作成
    pub fn new(dispatcher: Arc<BroadcastDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// ユーザー登録を実行
    ///
    /// # Arguments
    ///
    /// * `session` - 登録するセッション
    /// * `candidate` - クライアントが送ってきた名前（前後の空白は除去済み）
    ///
    /// # Returns
    ///
    /// * `Ok(Joined)` - 登録成功（セッションにも名前が設定される）。
    ///   [`ConnectUserUseCase::announce`] に渡すまで、このセッションへの配信は待機する
    /// * `Err(ConnectError)` - 形式不正または重複
    pub async fn execute(
        &self,
        session: &Arc<Session>,
        candidate: &str,
    ) -> Result<Joined, ConnectError> {
        // 1. 形式チェック
        let username = Username::new(candidate.to_string())?;

        // 2. 重複チェックと登録、同時に履歴のコピー
        let admission = self.dispatcher.admit(username.clone(), session).await?;

        Ok(Joined {
            username,
            admission,
        })
    }

    /// 登録直後の一連の送信を行う
    ///
    /// 1. 歓迎メッセージ（本人のみ）
    /// 2. 登録時点の履歴（開始・終了マーカー付き、本人のみ）
    /// 3. 保留していた配信の再開
    /// 4. 参加通知（全員）とユーザー一覧の更新（全員）
    ///
    /// 本人への送信に失敗した場合はそこで中断し、参加通知は行わない。
    pub async fn announce(&self, session: &Session, joined: Joined) -> Result<Username, PushError> {
        let Joined {
            username,
            admission,
        } = joined;
        let dispatcher = &self.dispatcher;

        let welcome = dispatcher.system_message(&notice::welcome(&username));
        dispatcher.broadcast_to_one(&welcome, session).await?;

        self.send_history(session, admission.history()).await?;
        drop(admission);

        dispatcher.broadcast_system(&notice::joined(&username)).await;

        Ok(username)
    }

    async fn send_history(&self, session: &Session, lines: &[String]) -> Result<(), PushError> {
        let dispatcher = &self.dispatcher;

        let start = dispatcher.system_message(notice::HISTORY_START);
        dispatcher.broadcast_to_one(&start, session).await?;

        if lines.is_empty() {
            let empty = dispatcher.system_message(notice::HISTORY_EMPTY);
            dispatcher.broadcast_to_one(&empty, session).await?;
        } else {
            for line in lines {
                dispatcher.send_line_to_one(line, session).await?;
            }
        }

        let end = dispatcher.system_message(notice::HISTORY_END);
        dispatcher.broadcast_to_one(&end, session).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{
        domain::{Message, MockLinePusher, UsernameError},
        infrastructure::repository::{InMemoryClientRegistry, InMemoryMessageHistory},
        domain::repository::{ClientRegistry, MessageHistory},
        usecase::dispatcher::DispatchPolicy,
    };
    use tertulia_shared::time::FixedClock;

    struct Fixture {
        registry: Arc<InMemoryClientRegistry>,
        history: Arc<InMemoryMessageHistory>,
        dispatcher: Arc<BroadcastDispatcher>,
        usecase: ConnectUserUseCase,
    }

    fn create_fixture() -> Fixture {
        let registry = Arc::new(InMemoryClientRegistry::new());
        let history = Arc::new(InMemoryMessageHistory::default());
        let clock = Arc::new(FixedClock::from_hms(9, 0, 0).unwrap());
        let dispatcher = Arc::new(BroadcastDispatcher::new(
            registry.clone(),
            history.clone(),
            clock,
            DispatchPolicy::default(),
        ));
        let usecase = ConnectUserUseCase::new(dispatcher.clone());
        Fixture {
            registry,
            history,
            dispatcher,
            usecase,
        }
    }

    /// 受信した行を記録するセッション
    fn recording_session() -> (Arc<Session>, Arc<Mutex<Vec<String>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        let mut pusher = MockLinePusher::new();
        pusher.expect_push_line().returning(move |line: &str| {
            sink.lock().unwrap().push(line.to_string());
            Ok(())
        });
        let session = Arc::new(Session::new("127.0.0.1:41000".to_string(), Arc::new(pusher)));
        (session, received)
    }

    #[tokio::test]
    async fn test_connect_user_success() {
        // テスト項目: 正しい形式の新しい名前で登録できる
        // given (前提条件):
        let fixture = create_fixture();
        let (session, _received) = recording_session();

        // when (操作):
        let result = fixture.usecase.execute(&session, "alice").await;

        // then (期待する結果):
        assert_eq!(result.unwrap().username().as_str(), "alice");
        assert!(session.is_registered());
        assert_eq!(fixture.registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_connect_user_invalid_format() {
        // テスト項目: 形式の不正な名前は登録されない
        // given (前提条件):
        let fixture = create_fixture();
        let (session, _received) = recording_session();

        // when (操作):
        let result = fixture.usecase.execute(&session, "a b").await;

        // then (期待する結果):
        assert_eq!(
            result.err(),
            Some(ConnectError::InvalidUsername(UsernameError::InvalidCharacter(' ')))
        );
        assert!(!session.is_registered());
        assert_eq!(fixture.registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_connect_user_duplicate_case_insensitive() {
        // テスト項目: 大文字小文字だけが違う名前は重複として拒否される
        // given (前提条件):
        let fixture = create_fixture();
        let (alice, _a) = recording_session();
        let _joined = fixture.usecase.execute(&alice, "alice").await.unwrap();
        let (other, _o) = recording_session();

        // when (操作):
        let result = fixture.usecase.execute(&other, "Alice").await;

        // then (期待する結果):
        assert_eq!(
            result.err(),
            Some(ConnectError::Duplicate("Alice".to_string()))
        );
        assert!(!other.is_registered());
        assert_eq!(fixture.registry.usernames().await, vec!["alice"]);
    }

    #[tokio::test]
    async fn test_announce_with_empty_history() {
        // テスト項目: 履歴が空の場合、開始・終了マーカーの間に「履歴なし」の通知が送られる
        // given (前提条件):
        let fixture = create_fixture();
        let (session, received) = recording_session();
        let joined = fixture.usecase.execute(&session, "carol").await.unwrap();

        // when (操作):
        fixture.usecase.announce(&session, joined).await.unwrap();

        // then (期待する結果):
        let lines = received.lock().unwrap().clone();
        assert_eq!(
            lines,
            vec![
                "[09:00:00] [Sistema] ¡Bienvenido al chat, carol!",
                "[09:00:00] [Sistema] --- Inicio del Historial Reciente ---",
                "[09:00:00] [Sistema] No hay mensajes previos en el historial.",
                "[09:00:00] [Sistema] --- Fin del Historial Reciente ---",
                "[09:00:00] [Sistema] carol se ha unido al chat.",
                "[09:00:00] Usuarios conectados (1): carol",
            ]
        );
    }

    #[tokio::test]
    async fn test_announce_replays_history_in_order() {
        // テスト項目: 過去の K 件のメッセージが元の順番のまま再送される
        // given (前提条件):
        let fixture = create_fixture();
        for i in 0..5 {
            fixture
                .history
                .append(format!("[08:00:0{}] [bob]: msg {}", i, i))
                .await;
        }
        let (session, received) = recording_session();
        let joined = fixture.usecase.execute(&session, "dave").await.unwrap();

        // when (操作):
        fixture.usecase.announce(&session, joined).await.unwrap();

        // then (期待する結果):
        let lines = received.lock().unwrap().clone();
        assert_eq!(lines[1], "[09:00:00] [Sistema] --- Inicio del Historial Reciente ---");
        let replayed: Vec<String> = (0..5)
            .map(|i| format!("[08:00:0{}] [bob]: msg {}", i, i))
            .collect();
        assert_eq!(lines[2..7].to_vec(), replayed);
        assert_eq!(lines[7], "[09:00:00] [Sistema] --- Fin del Historial Reciente ---");
        // 参加通知は履歴に追加される
        assert_eq!(fixture.history.len().await, 6);
    }

    #[tokio::test]
    async fn test_announce_stops_when_welcome_fails() {
        // テスト項目: 本人への送信に失敗した場合、参加通知は配信されない
        // given (前提条件):
        let fixture = create_fixture();
        let mut pusher = MockLinePusher::new();
        pusher
            .expect_push_line()
            .times(1)
            .returning(|_| Err(PushError::Closed));
        let session = Arc::new(Session::new("127.0.0.1:41001".to_string(), Arc::new(pusher)));
        let joined = fixture.usecase.execute(&session, "erin").await.unwrap();

        // when (操作):
        let result = fixture.usecase.announce(&session, joined).await;

        // then (期待する結果):
        assert!(matches!(result, Err(PushError::Closed)));
        assert!(fixture.history.is_empty().await);
    }

    #[tokio::test]
    async fn test_broadcast_between_registration_and_welcome() {
        // テスト項目: 登録から歓迎までの間に配信されたメッセージは、歓迎と履歴の後にちょうど 1 回だけ届く
        // given (前提条件):
        let fixture = create_fixture();
        let (bob, _bob_received) = recording_session();
        let bob_joined = fixture.usecase.execute(&bob, "bob").await.unwrap();
        fixture.usecase.announce(&bob, bob_joined).await.unwrap();
        let (carol, received) = recording_session();

        // when (操作):
        let joined = fixture.usecase.execute(&carol, "carol").await.unwrap();
        let mid_join = Message::chat(
            fixture.dispatcher.now(),
            Username::new("bob".to_string()).unwrap(),
            "mid-join",
        );
        let broadcast = tokio::spawn({
            let dispatcher = fixture.dispatcher.clone();
            let bob_id = bob.id();
            async move { dispatcher.broadcast(&mid_join, Some(bob_id)).await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        fixture.usecase.announce(&carol, joined).await.unwrap();
        let delivered = broadcast.await.unwrap();

        // then (期待する結果):
        let lines = received.lock().unwrap().clone();
        let mid_join_line = "[09:00:00] [bob]: mid-join";
        assert_eq!(delivered, 1);
        assert_eq!(
            lines.iter().filter(|line| line.as_str() == mid_join_line).count(),
            1
        );
        assert_eq!(
            lines[..4].to_vec(),
            vec![
                "[09:00:00] [Sistema] ¡Bienvenido al chat, carol!",
                "[09:00:00] [Sistema] --- Inicio del Historial Reciente ---",
                "[09:00:00] [Sistema] bob se ha unido al chat.",
                "[09:00:00] [Sistema] --- Fin del Historial Reciente ---",
            ]
        );
        assert_eq!(lines[4], mid_join_line);
    }
}
