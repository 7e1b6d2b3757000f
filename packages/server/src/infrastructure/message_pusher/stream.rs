//! AsyncWrite を使った LinePusher 実装
//!
//! ## 責務
//!
//! - 1 セッション分の書き込みストリームを所有する
//! - 直接返信とブロードキャストの書き込みを 1 つのロックで直列化する
//! - 書き込み失敗時・close 時にストリームを手放し、以降の送信を `PushError::Closed` にする
//!
//! ## 設計ノート
//!
//! TCP 接続の分割（読み込み側と書き込み側）は UI 層（`src/ui/server.rs`）で行われます。
//! この実装は書き込み側だけを受け取り、送信に使用します。

use async_trait::async_trait;
use tokio::{
    io::{AsyncWrite, AsyncWriteExt, BufWriter},
    sync::Mutex,
};

use crate::domain::{LinePusher, PushError};

/// AsyncWrite を使った LinePusher 実装
///
/// ## 使用例
///
/// ```ignore
/// let (reader, writer) = tcp_stream.into_split();
/// let pusher = StreamLinePusher::new(writer);
///
/// pusher.push_line("[12:00:00] [Sistema] hola").await?;
/// ```
pub struct StreamLinePusher<W> {
    /// 書き込みストリーム（close 後・書き込み失敗後は None）
    writer: Mutex<Option<BufWriter<W>>>,
}

impl<W> StreamLinePusher<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// 新しい StreamLinePusher を作成
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(Some(BufWriter::new(writer))),
        }
    }
}

async fn write_line<W>(writer: &mut BufWriter<W>, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}

#[async_trait]
impl<W> LinePusher for StreamLinePusher<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn push_line(&self, line: &str) -> Result<(), PushError> {
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(PushError::Closed)?;

        let written = write_line(writer, line).await;
        if let Err(e) = written {
            // 壊れたストリームは再利用しない
            guard.take();
            return Err(PushError::Io(e));
        }

        Ok(())
    }

    async fn close(&self) {
        let mut guard = self.writer.lock().await;
        if let Some(mut writer) = guard.take()
            && let Err(e) = writer.shutdown().await
        {
            tracing::debug!("Failed to shut down outbound stream: {}", e);
        }
    }
}
