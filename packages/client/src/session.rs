//! One connection to the chat server.

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    sync::mpsc,
};

use super::{
    error::ClientError,
    input::{InputAction, to_action},
    ui::show_server_line,
};

/// Run one client session over an already connected stream.
///
/// Registers with `USER:<username>`, prints every server line and forwards
/// typed lines until the user quits (`Ok`) or the connection ends (`Err`).
/// A name picked with `/name` replaces `username`, so the caller reconnects
/// under the latest one.
pub async fn run_client_session<R, W>(
    reader: R,
    mut writer: W,
    username: &mut String,
    input: &mut mpsc::UnboundedReceiver<String>,
) -> Result<(), ClientError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    send_line(&mut writer, &format!("USER:{}", username)).await?;
    println!(
        "\nConnecting as '{}'. Type messages and press Enter to send. /quit or Ctrl+C to exit.\n",
        username
    );

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => show_server_line(&line),
                None => return Err(ClientError::ConnectionLost),
            },
            typed = input.recv() => {
                let action = match typed {
                    Some(typed) => to_action(&typed),
                    // 入力スレッドの終了（Ctrl+C / Ctrl+D）
                    None => InputAction::Quit,
                };
                match action {
                    InputAction::Send(line) => send_line(&mut writer, &line).await?,
                    InputAction::Rename(name) => {
                        send_line(&mut writer, &format!("USER:{}", name)).await?;
                        *username = name;
                    }
                    InputAction::Skip => {}
                    InputAction::Quit => {
                        if let Err(e) = writer.shutdown().await {
                            tracing::debug!("Failed to close connection: {}", e);
                        }
                        return Ok(());
                    }
                }
            }
        }
    }
}

async fn send_line<W>(writer: &mut W, line: &str) -> Result<(), ClientError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
