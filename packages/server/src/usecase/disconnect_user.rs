//! UseCase: 切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectUserUseCase::execute() メソッド
//! - 登録解除、退出通知、送信側リソースの解放
//!
//! ### なぜこのテストが必要か
//! - 登録済みのセッションが切断した場合のみ退出通知が配信されることを確認する
//! - 未登録のセッションでもリソースが必ず解放されることを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：登録済みユーザーの切断と通知
//! - エッジケース：登録前の切断（通知なし）
//! - エッジケース：切断処理の二重呼び出し

use std::sync::Arc;

use crate::{
    domain::{ClientRegistry, Session},
    infrastructure::protocol::notice,
};

use super::dispatcher::BroadcastDispatcher;

/// 切断のユースケース
pub struct DisconnectUserUseCase {
    /// Registry（登録解除）
    registry: Arc<dyn ClientRegistry>,
    /// Dispatcher（退出通知の配信）
    dispatcher: Arc<BroadcastDispatcher>,
}

impl DisconnectUserUseCase {
    /// 新しい DisconnectUserUseCase を作成
    pub fn new(registry: Arc<dyn ClientRegistry>, dispatcher: Arc<BroadcastDispatcher>) -> Self {
        Self {
            registry,
            dispatcher,
        }
    }

    /// 切断を実行
    ///
    /// 1. 登録済みであれば Registry から削除
    /// 2. 削除できた場合のみ退出通知を配信し、ユーザー一覧を更新
    /// 3. 送信側のリソースを解放（登録の有無に関わらず必ず行う）
    ///
    /// # Returns
    ///
    /// Registry から削除した場合は `true`
    pub async fn execute(&self, session: &Session) -> bool {
        let removed = self.registry.unregister(session).await;

        if removed && let Some(username) = session.username() {
            tracing::info!("'{}' left the chat, notifying the others", session.label());
            self.dispatcher
                .broadcast_system(&notice::left(username))
                .await;
        } else {
            tracing::info!(
                "'{}' disconnected without an active registration",
                session.label()
            );
        }

        session.close().await;

        removed
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{
        domain::{MessageHistory, MockLinePusher, Username},
        infrastructure::repository::{InMemoryClientRegistry, InMemoryMessageHistory},
        usecase::dispatcher::DispatchPolicy,
    };
    use tertulia_shared::time::FixedClock;

    struct Fixture {
        registry: Arc<InMemoryClientRegistry>,
        history: Arc<InMemoryMessageHistory>,
        usecase: DisconnectUserUseCase,
    }

    fn create_fixture() -> Fixture {
        let registry = Arc::new(InMemoryClientRegistry::new());
        let history = Arc::new(InMemoryMessageHistory::default());
        let clock = Arc::new(FixedClock::from_hms(23, 0, 0).unwrap());
        let dispatcher = Arc::new(BroadcastDispatcher::new(
            registry.clone(),
            history.clone(),
            clock,
            DispatchPolicy::default(),
        ));
        Fixture {
            registry: registry.clone(),
            history,
            usecase: DisconnectUserUseCase::new(registry, dispatcher),
        }
    }

    fn closing_session(closes: usize) -> (Arc<Session>, Arc<Mutex<Vec<String>>>) {
        let inbox = Arc::new(Mutex::new(Vec::new()));
        let sink = inbox.clone();
        let mut pusher = MockLinePusher::new();
        pusher.expect_push_line().returning(move |line: &str| {
            sink.lock().unwrap().push(line.to_string());
            Ok(())
        });
        pusher.expect_close().times(closes).returning(|| ());
        (
            Arc::new(Session::new("127.0.0.1:43000".to_string(), Arc::new(pusher))),
            inbox,
        )
    }

    #[tokio::test]
    async fn test_disconnect_registered_user_notifies_others() {
        // テスト項目: 登録済みユーザーの切断で退出通知とユーザー一覧が残りの参加者に届く
        // given (前提条件):
        let fixture = create_fixture();
        let (alice, _) = closing_session(1);
        let (bob, bob_inbox) = closing_session(0);
        fixture
            .registry
            .register(Username::new("alice".to_string()).unwrap(), alice.clone())
            .await
            .unwrap();
        fixture
            .registry
            .register(Username::new("bob".to_string()).unwrap(), bob.clone())
            .await
            .unwrap();

        // when (操作):
        let removed = fixture.usecase.execute(&alice).await;

        // then (期待する結果):
        assert!(removed);
        assert_eq!(fixture.registry.usernames().await, vec!["bob"]);
        assert_eq!(
            *bob_inbox.lock().unwrap(),
            vec![
                "[23:00:00] [Sistema] alice ha abandonado el chat.",
                "[23:00:00] Usuarios conectados (1): bob",
            ]
        );
        assert_eq!(
            fixture.history.snapshot().await,
            vec!["[23:00:00] [Sistema] alice ha abandonado el chat."]
        );
    }

    #[tokio::test]
    async fn test_disconnect_unregistered_session_still_closes() {
        // テスト項目: 未登録のセッションは通知なしで、リソースだけが解放される
        // given (前提条件):
        let fixture = create_fixture();
        let (stranger, _) = closing_session(1);
        let (bob, bob_inbox) = closing_session(0);
        fixture
            .registry
            .register(Username::new("bob".to_string()).unwrap(), bob.clone())
            .await
            .unwrap();

        // when (操作):
        let removed = fixture.usecase.execute(&stranger).await;

        // then (期待する結果):
        assert!(!removed);
        assert!(bob_inbox.lock().unwrap().is_empty());
        assert!(fixture.history.is_empty().await);
    }

    #[tokio::test]
    async fn test_disconnect_twice_notifies_once() {
        // テスト項目: 切断処理を 2 回呼んでも退出通知は 1 回だけで、解放は安全に繰り返される
        // given (前提条件):
        let fixture = create_fixture();
        let (alice, _) = closing_session(2);
        fixture
            .registry
            .register(Username::new("alice".to_string()).unwrap(), alice.clone())
            .await
            .unwrap();

        // when (操作):
        let first = fixture.usecase.execute(&alice).await;
        let second = fixture.usecase.execute(&alice).await;

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert_eq!(fixture.history.len().await, 1);
    }
}
