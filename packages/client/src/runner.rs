//! Client execution logic with reconnection support.

use std::time::Duration;

use tokio::net::TcpStream;

use super::{error::ClientError, input::spawn_input_thread, session::run_client_session};

const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_INTERVAL_SECS: u64 = 5;

/// Run the chat client with reconnection logic.
///
/// Reconnects register under the last name picked with `/name`.
pub async fn run_client(host: String, port: u16, mut username: String) -> Result<(), ClientError> {
    let addr = format!("{}:{}", host, port);
    // 再接続しても入力スレッドは 1 つだけ
    let mut input = spawn_input_thread();
    let mut reconnect_count = 0;

    loop {
        tracing::info!(
            "Attempting to connect to {} as '{}' (attempt {}/{})",
            addr,
            username,
            reconnect_count + 1,
            MAX_RECONNECT_ATTEMPTS
        );

        let result = match TcpStream::connect((host.as_str(), port)).await {
            Ok(stream) => {
                tracing::info!("Connected to chat server!");
                let (reader, writer) = stream.into_split();
                run_client_session(reader, writer, &mut username, &mut input).await
            }
            Err(source) => Err(ClientError::Connect {
                addr: addr.clone(),
                source,
            }),
        };

        match result {
            Ok(()) => {
                tracing::info!("Client session ended normally");
                // If connection ended normally (user exit), don't reconnect
                return Ok(());
            }
            Err(e) => {
                tracing::warn!("Connection lost: {}", e);
                reconnect_count += 1;

                if reconnect_count >= MAX_RECONNECT_ATTEMPTS {
                    tracing::error!(
                        "Failed to reconnect after {} attempts. Exiting.",
                        MAX_RECONNECT_ATTEMPTS
                    );
                    return Err(e);
                }

                tracing::info!(
                    "Reconnecting in {} seconds... (attempt {}/{})",
                    RECONNECT_INTERVAL_SECS,
                    reconnect_count + 1,
                    MAX_RECONNECT_ATTEMPTS
                );

                tokio::time::sleep(Duration::from_secs(RECONNECT_INTERVAL_SECS)).await;
            }
        }
    }
}
