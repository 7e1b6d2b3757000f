//! InMemory Client Registry 実装
//!
//! ドメイン層が定義する ClientRegistry trait の具体的な実装。
//! 小文字化したユーザー名をキーとする BTreeMap を 1 つの Mutex で保護します。
//!
//! ## ロックの方針
//!
//! エントリ数も競合も小さいため、エントリ単位ではなく構造全体で 1 つのロックを使います。
//! ロック中に行うのは挿入・削除・クローンのみで、I/O は行いません。

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ClientRegistry, RegistryError, Session, Username, UsernameKey};

/// インメモリ Client Registry 実装
#[derive(Default)]
pub struct InMemoryClientRegistry {
    /// 小文字ユーザー名 → セッション
    sessions: Mutex<BTreeMap<UsernameKey, Arc<Session>>>,
}

impl InMemoryClientRegistry {
    /// 新しい InMemoryClientRegistry を作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClientRegistry for InMemoryClientRegistry {
    async fn register(
        &self,
        username: Username,
        session: Arc<Session>,
    ) -> Result<(), RegistryError> {
        let key = username.key();

        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(&key) {
            return Err(RegistryError::Duplicate(username.into_string()));
        }
        // 重複チェックと同じロックの中で名前を確定させる
        session.assign_username(username)?;
        sessions.insert(key, session);

        Ok(())
    }

    async fn unregister(&self, session: &Session) -> bool {
        let Some(username) = session.username() else {
            return false;
        };
        let key = username.key();

        let mut sessions = self.sessions.lock().await;
        // 同じ名前を後から登録した別のセッションは削除しない
        let owned = sessions
            .get(&key)
            .is_some_and(|registered| registered.id() == session.id());
        if owned {
            sessions.remove(&key);
        }
        owned
    }

    async fn snapshot(&self) -> Vec<Arc<Session>> {
        let sessions = self.sessions.lock().await;
        sessions.values().cloned().collect()
    }

    async fn usernames(&self) -> Vec<String> {
        let sessions = self.sessions.lock().await;
        // BTreeMap のキー順 = 大文字小文字を区別しないアルファベット順
        sessions
            .values()
            .filter_map(|session| session.username())
            .map(|name| name.as_str().to_string())
            .collect()
    }

    async fn count(&self) -> usize {
        let sessions = self.sessions.lock().await;
        sessions.len()
    }
}
