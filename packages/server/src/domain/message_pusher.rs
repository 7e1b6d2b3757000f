//! MessagePusher trait 定義
//!
//! セッションへの 1 行単位の送信インターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::error::PushError;

/// セッション 1 つ分の送信チャンネル
///
/// 実装は 1 セッションにつき 1 つの書き込みロックを持ち、
/// 直接返信とブロードキャストの両方がこのロックを経由して直列化されること。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinePusher: Send + Sync {
    /// 1 行を送信する（改行は実装側で付与する）
    async fn push_line(&self, line: &str) -> Result<(), PushError>;

    /// 送信側のリソースを解放する
    ///
    /// 何度呼び出しても安全であること（冪等）。
    async fn close(&self);
}
