//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 本文の分類（空・/help・/users・チャット）と、それぞれの送信先
//!
//! ### なぜこのテストが必要か
//! - チャットは送信者以外に配信され、履歴に記録されることを確認する
//! - /help と /users は本人だけに返され、履歴にも残らないことを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：チャットメッセージのブロードキャスト
//! - 正常系：/help, /users コマンド（大文字小文字を区別しない）
//! - エッジケース：空の本文

use std::sync::Arc;

use crate::{
    domain::{Message, PushError, Session, Username},
    infrastructure::protocol::{MessageBody, classify_body, notice},
};

use super::dispatcher::BroadcastDispatcher;

/// メッセージ送信の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// 空の本文のため何もしなかった
    Ignored,
    /// ヘルプを本人に返した
    HelpSent,
    /// ユーザー一覧を本人に返した
    UsersSent,
    /// グループに配信した（配信成功数）
    Broadcast { delivered: usize },
}

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// Dispatcher（配信と個別返信）
    dispatcher: Arc<BroadcastDispatcher>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(dispatcher: Arc<BroadcastDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `session` - 送信者のセッション
    /// * `username` - 送信者のユーザー名
    /// * `body` - `MSG:` の本文（前後の空白は除去済み）
    ///
    /// # Returns
    ///
    /// * `Ok(SendOutcome)` - 処理結果
    /// * `Err(PushError)` - 本人への返信に失敗（ブロードキャストの失敗はここには含まれない）
    pub async fn execute(
        &self,
        session: &Session,
        username: &Username,
        body: &str,
    ) -> Result<SendOutcome, PushError> {
        match classify_body(body) {
            MessageBody::Empty => {
                tracing::debug!("Ignoring empty message from '{}'", username);
                Ok(SendOutcome::Ignored)
            }
            MessageBody::Help => {
                for text in notice::HELP_LINES {
                    let line = self.dispatcher.system_message(text);
                    self.dispatcher.broadcast_to_one(&line, session).await?;
                }
                Ok(SendOutcome::HelpSent)
            }
            MessageBody::Users => {
                let line = self.dispatcher.user_list_line().await;
                self.dispatcher.send_line_to_one(&line, session).await?;
                Ok(SendOutcome::UsersSent)
            }
            MessageBody::Chat(text) => {
                let message = Message::chat(self.dispatcher.now(), username.clone(), text);
                let delivered = self.dispatcher.broadcast(&message, Some(session.id())).await;
                tracing::debug!(
                    "Message from '{}' delivered to {} session(s)",
                    username,
                    delivered
                );
                Ok(SendOutcome::Broadcast { delivered })
            }
        }
    }
}
