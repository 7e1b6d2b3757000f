//! Repository trait 定義
//!
//! ドメイン層が必要とする共有状態へのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! どちらの実装も、ロックを保持したまま I/O を待ってはならない。
//! クリティカルセクションは挿入・削除・コピーのみに限定すること。

use std::sync::Arc;

use async_trait::async_trait;

use super::{entity::Session, error::RegistryError, value_object::Username};

/// Client Registry trait
///
/// 登録済みセッションを大文字小文字を区別しないユーザー名で管理する。
#[async_trait]
pub trait ClientRegistry: Send + Sync {
    /// ユーザー名を登録する
    ///
    /// 重複チェックと挿入は 1 つのアトミックな操作として行われること。
    /// 成功した場合、セッションにユーザー名が設定される。
    async fn register(&self, username: Username, session: Arc<Session>)
    -> Result<(), RegistryError>;

    /// セッションを登録解除する
    ///
    /// そのセッション自身が登録されていた場合のみ `true` を返す。
    async fn unregister(&self, session: &Session) -> bool;

    /// 登録済みセッションの一覧（小文字ユーザー名順）
    async fn snapshot(&self) -> Vec<Arc<Session>>;

    /// 登録済みユーザー名の一覧（大文字小文字を区別しないアルファベット順）
    async fn usernames(&self) -> Vec<String>;

    /// 登録済みセッション数
    async fn count(&self) -> usize;
}

/// History Buffer trait
///
/// 直近のメッセージ（整形済みの 1 行）を保持する容量付き FIFO。
#[async_trait]
pub trait MessageHistory: Send + Sync {
    /// 1 行を追加する
    ///
    /// 容量を超えた場合は最も古い行を削除する。追加と削除はアトミックに行われること。
    async fn append(&self, line: String);

    /// 現在の内容のコピーを古い順に返す
    async fn snapshot(&self) -> Vec<String>;

    /// 現在の行数
    async fn len(&self) -> usize;

    /// 空かどうか
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// 最大行数
    fn capacity(&self) -> usize;
}
