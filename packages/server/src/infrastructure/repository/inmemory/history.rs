//! InMemory Message History 実装
//!
//! ドメイン層が定義する MessageHistory trait の具体的な実装。
//! VecDeque を 1 つの Mutex で保護した容量付き FIFO です。

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::MessageHistory;

/// デフォルトの履歴容量
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// インメモリ History Buffer 実装
pub struct InMemoryMessageHistory {
    /// 古い順に並んだ整形済みメッセージ
    lines: Mutex<VecDeque<String>>,
    /// 最大行数
    capacity: usize,
}

impl InMemoryMessageHistory {
    /// 指定した容量で InMemoryMessageHistory を作成
    ///
    /// 容量 0 は設定の検証で弾かれる前提。ここでは 1 に切り上げる。
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }
}

impl Default for InMemoryMessageHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[async_trait]
impl MessageHistory for InMemoryMessageHistory {
    async fn append(&self, line: String) {
        let mut lines = self.lines.lock().await;
        lines.push_back(line);
        while lines.len() > self.capacity {
            lines.pop_front();
        }
    }

    async fn snapshot(&self) -> Vec<String> {
        let lines = self.lines.lock().await;
        lines.iter().cloned().collect()
    }

    async fn len(&self) -> usize {
        let lines = self.lines.lock().await;
        lines.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}
