//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use tertulia_server::{
    config::ServerConfig,
    ui::{ChatServer, state::AppState},
};
use tertulia_shared::time::FixedClock;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::oneshot,
    task::JoinHandle,
};

/// Timestamp every line carries, from the fixed test clock
pub const TS: &str = "[10:15:00]";

/// A server running on an ephemeral port
pub struct TestServer {
    pub addr: SocketAddr,
    pub admin_addr: Option<SocketAddr>,
    pub state: Arc<AppState>,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(ServerConfig::default()).await
    }

    pub async fn start_with(config: ServerConfig) -> Self {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..config
        };
        let clock = Arc::new(FixedClock::from_hms(10, 15, 0).unwrap());
        let state = AppState::in_memory(&config, clock);
        let server = ChatServer::bind_with_state(config, state.clone())
            .await
            .expect("Failed to bind test server");
        let addr = server.local_addr().unwrap();
        let admin_addr = server.admin_addr();

        let (stop, stopped) = oneshot::channel();
        let handle = tokio::spawn(async move {
            server
                .run_until(async {
                    let _ = stopped.await;
                })
                .await
                .expect("Server failed");
        });

        Self {
            addr,
            admin_addr,
            state,
            stop: Some(stop),
            handle,
        }
    }

    /// Signal shutdown and wait for the server to finish
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        tokio::time::timeout(Duration::from_secs(10), &mut self.handle)
            .await
            .expect("Server did not shut down")
            .unwrap();
    }

    pub async fn connect(&self) -> TestClient {
        TestClient::connect(self.addr).await
    }

    /// Connect, read the greeting, register and drain the join sequence
    pub async fn join(&self, name: &str) -> TestClient {
        let mut client = self.connect().await;
        client.expect_system("Bienvenido al servidor de chat. Por favor, identifíquese con USER:suNombre").await;
        client.send(&format!("USER:{}", name)).await;
        client.expect_system(&format!("¡Bienvenido al chat, {}!", name)).await;
        client.expect_system("--- Inicio del Historial Reciente ---").await;
        loop {
            let line = client.recv().await;
            if line == format!("{} [Sistema] --- Fin del Historial Reciente ---", TS) {
                break;
            }
        }
        client.expect_system(&format!("{} se ha unido al chat.", name)).await;
        let users = client.recv().await;
        assert!(users.starts_with(&format!("{} Usuarios conectados", TS)), "{}", users);
        client
    }
}

pub struct TestClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr)
            .await
            .expect("Failed to connect to test server");
        let (reader, writer) = stream.into_split();
        Self {
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    pub async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .unwrap();
    }

    pub async fn recv(&mut self) -> String {
        tokio::time::timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .expect("Timed out waiting for a line")
            .unwrap()
            .expect("Connection closed by server")
    }

    /// Next line, or None when the server closed the connection
    pub async fn recv_or_eof(&mut self) -> Option<String> {
        tokio::time::timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .expect("Timed out waiting for a line")
            .ok()
            .flatten()
    }

    pub async fn expect_system(&mut self, text: &str) {
        assert_eq!(self.recv().await, format!("{} [Sistema] {}", TS, text));
    }

    /// Assert nothing arrives for a short while
    pub async fn expect_silence(&mut self) {
        let result =
            tokio::time::timeout(Duration::from_millis(200), self.lines.next_line()).await;
        assert!(result.is_err(), "Unexpected line: {:?}", result);
    }

    pub async fn close(mut self) {
        let _ = self.writer.shutdown().await;
    }
}
