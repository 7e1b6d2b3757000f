//! UseCase: ブロードキャスト配信
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - BroadcastDispatcher::broadcast() / broadcast_to_one() / broadcast_system() / admit()
//! - 履歴への記録と、送信者を除いた配信
//! - 参加処理と配信の間で、各メッセージが履歴の再送か配信のどちらか一方で届くこと
//!
//! ### なぜこのテストが必要か
//! - 1 人への送信失敗が他の参加者への配信を妨げないことを保証する
//! - 個別返信（ヘルプ、ユーザー一覧）が履歴に残らないことを確認する
//! - 送信に失敗し続けるセッションが放置されないことを確認する
//!
//! ### どのような状況を想定しているか
//! - 正常系：送信者以外の N 人に N 回配信
//! - 異常系：一部の参加者への送信失敗
//! - エッジケース：参加者がいない場合のシステム通知

use std::{future::Future, sync::Arc, time::Duration};

use chrono::NaiveTime;
use futures_util::future::join_all;
use tertulia_shared::time::Clock;
use tokio::sync::Mutex;

use crate::domain::{
    ClientRegistry, DeliveryHold, Message, MessageHistory, PushError, RegistryError, Session,
    SessionId, Username, render_user_list,
};

/// デフォルトの送信タイムアウト
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);
/// デフォルトの連続送信失敗の上限
pub const DEFAULT_MAX_SEND_FAILURES: u32 = 3;

/// 配信時の失敗の扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchPolicy {
    /// 1 件の送信にかけられる最大時間
    pub send_timeout: Duration,
    /// この回数だけ連続で失敗したセッションを切断要求する（0 = 切断要求しない）
    pub max_send_failures: u32,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            send_timeout: DEFAULT_SEND_TIMEOUT,
            max_send_failures: DEFAULT_MAX_SEND_FAILURES,
        }
    }
}

/// 参加処理の結果
///
/// 登録時点の履歴のコピーを持つ。保持している間、新しいセッションへの配信は待機する。
pub struct Admission {
    history: Vec<String>,
    _hold: DeliveryHold,
}

impl Admission {
    /// 登録時点の履歴（古い順）
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

/// ブロードキャスト配信のユースケース
pub struct BroadcastDispatcher {
    /// Registry（配信先の取得）
    registry: Arc<dyn ClientRegistry>,
    /// History（配信したメッセージの記録）
    history: Arc<dyn MessageHistory>,
    /// 時刻の取得
    clock: Arc<dyn Clock>,
    /// 失敗時の扱い
    policy: DispatchPolicy,
    /// 「登録 + 履歴のコピー」と「履歴への追加 + 配信先の確定」を排他にする
    join_lock: Mutex<()>,
}

impl BroadcastDispatcher {
    /// 新しい BroadcastDispatcher を作成
    pub fn new(
        registry: Arc<dyn ClientRegistry>,
        history: Arc<dyn MessageHistory>,
        clock: Arc<dyn Clock>,
        policy: DispatchPolicy,
    ) -> Self {
        Self {
            registry,
            history,
            clock,
            policy,
            join_lock: Mutex::new(()),
        }
    }

    /// 現在時刻
    pub fn now(&self) -> NaiveTime {
        self.clock.now()
    }

    /// 現在時刻のシステムメッセージを作成
    pub fn system_message(&self, text: &str) -> Message {
        Message::system(self.now(), text)
    }

    /// メッセージを履歴に記録し、除外セッション以外の全員に配信する
    ///
    /// # Returns
    ///
    /// 配信に成功した数
    pub async fn broadcast(&self, message: &Message, exclude: Option<SessionId>) -> usize {
        let line = message.render();
        let registered = {
            let _cut = self.join_lock.lock().await;
            self.history.append(line.clone()).await;
            self.registry.snapshot().await
        };

        let recipients: Vec<Arc<Session>> = registered
            .into_iter()
            .filter(|session| Some(session.id()) != exclude)
            .collect();
        tracing::debug!("Broadcasting to {} session(s): {}", recipients.len(), line);

        self.fan_out(&recipients, &line).await
    }

    /// セッションを登録し、登録時点の履歴のコピーを返す
    ///
    /// 登録と履歴のコピーは [`BroadcastDispatcher::broadcast`] の
    /// 「履歴への追加と配信先の確定」と排他に行われる。コピーに含まれるメッセージは
    /// このセッションへ配信されず、含まれないメッセージは配信される。
    /// 配信は返り値の [`Admission`] が破棄されるまで待機する。
    pub async fn admit(
        &self,
        username: Username,
        session: &Arc<Session>,
    ) -> Result<Admission, RegistryError> {
        let hold = session.hold_deliveries().await;
        let _cut = self.join_lock.lock().await;
        self.registry.register(username, Arc::clone(session)).await?;
        let history = self.history.snapshot().await;
        Ok(Admission {
            history,
            _hold: hold,
        })
    }

    /// 1 セッションだけに送信する（履歴には記録しない）
    pub async fn broadcast_to_one(
        &self,
        message: &Message,
        session: &Session,
    ) -> Result<(), PushError> {
        self.send_line_to_one(&message.render(), session).await
    }

    /// 整形済みの 1 行を 1 セッションだけに送信する（履歴には記録しない）
    pub async fn send_line_to_one(&self, line: &str, session: &Session) -> Result<(), PushError> {
        self.within_timeout(session.send(line)).await
    }

    async fn within_timeout<F>(&self, push: F) -> Result<(), PushError>
    where
        F: Future<Output = Result<(), PushError>>,
    {
        match tokio::time::timeout(self.policy.send_timeout, push).await {
            Ok(result) => result,
            Err(_) => Err(PushError::Timeout(self.policy.send_timeout)),
        }
    }

    /// システム通知を全員に配信し、ユーザー一覧を更新する
    ///
    /// # Returns
    ///
    /// システム通知の配信に成功した数
    pub async fn broadcast_system(&self, text: &str) -> usize {
        let message = self.system_message(text);
        tracing::info!("System broadcast: {}", text);
        let delivered = self.broadcast(&message, None).await;
        self.refresh_user_list().await;
        delivered
    }

    /// 現在のユーザー一覧の行を作成
    pub async fn user_list_line(&self) -> String {
        let usernames = self.registry.usernames().await;
        render_user_list(self.now(), &usernames)
    }

    /// ユーザー一覧を全員に送信する（履歴には記録しない）
    pub async fn refresh_user_list(&self) -> usize {
        let line = self.user_list_line().await;
        let recipients = self.registry.snapshot().await;
        self.fan_out(&recipients, &line).await
    }

    async fn fan_out(&self, recipients: &[Arc<Session>], line: &str) -> usize {
        let deliveries = recipients
            .iter()
            .map(|session| self.deliver(session, line));
        join_all(deliveries)
            .await
            .into_iter()
            .filter(|delivered| *delivered)
            .count()
    }

    /// 1 人分の配信。失敗は記録するが呼び出し元には伝えない。
    async fn deliver(&self, session: &Session, line: &str) -> bool {
        match self.within_timeout(session.deliver(line)).await {
            Ok(()) => {
                session.reset_send_failures();
                true
            }
            Err(e) => {
                let failures = session.record_send_failure();
                tracing::warn!(
                    "Failed to deliver to '{}' ({} consecutive failure(s)): {}",
                    session.label(),
                    failures,
                    e
                );
                if self.policy.max_send_failures > 0 && failures >= self.policy.max_send_failures
                {
                    tracing::warn!(
                        "Session '{}' reached the send failure limit, requesting disconnect",
                        session.label()
                    );
                    session.kick();
                }
                false
            }
        }
    }
}
