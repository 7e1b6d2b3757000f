//! Server execution logic.

use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};

use axum::{Router, routing::get};
use tertulia_shared::time::SystemClock;
use tokio::{
    net::{TcpListener, TcpStream},
    sync::{Semaphore, watch},
    task::JoinSet,
};
use tower_http::trace::TraceLayer;

use crate::{
    config::ServerConfig,
    domain::LinePusher,
    error::{Result, ServerError},
    infrastructure::{message_pusher::StreamLinePusher, protocol::notice},
};

use super::{
    handler::{get_history, get_users, handle_connection, health_check},
    state::AppState,
};

/// Pause after a failed accept so a full fd table does not spin the loop
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Line-protocol chat server
///
/// Binding happens in [`ChatServer::bind`], so the address is known (and
/// port 0 resolved) before the accept loop starts.
///
/// # Example
///
/// ```ignore
/// let server = ChatServer::bind(ServerConfig::default()).await?;
/// tracing::info!("listening on {}", server.local_addr()?);
/// server.run_until(shutdown_signal()).await?;
/// ```
pub struct ChatServer {
    listener: TcpListener,
    admin_listener: Option<TcpListener>,
    config: ServerConfig,
    state: Arc<AppState>,
    connection_limit: Option<Arc<Semaphore>>,
}

impl ChatServer {
    /// Bind the chat port (and the admin port, if configured) with in-memory state
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        let state = AppState::in_memory(&config, Arc::new(SystemClock));
        Self::bind_with_state(config, state).await
    }

    /// Bind using a prepared state
    pub async fn bind_with_state(config: ServerConfig, state: Arc<AppState>) -> Result<Self> {
        config.validate()?;

        let listener = bind_listener(&config.bind_addr()).await?;
        let admin_listener = match config.admin_bind_addr() {
            Some(addr) => Some(bind_listener(&addr).await?),
            None => None,
        };

        let connection_limit = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Ok(Self {
            listener,
            admin_listener,
            config,
            state,
            connection_limit,
        })
    }

    /// Address the chat listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Address of the admin API, when enabled
    pub fn admin_addr(&self) -> Option<SocketAddr> {
        self.admin_listener
            .as_ref()
            .and_then(|listener| listener.local_addr().ok())
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Run the accept loop until `shutdown` resolves.
    ///
    /// On shutdown the listener is dropped, every connection handler is told
    /// to stop, and handlers still running after the grace period are aborted.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let Self {
            listener,
            admin_listener,
            config,
            state,
            connection_limit,
        } = self;

        tracing::info!("Chat server listening on {}", listener.local_addr()?);

        let (stop_tx, stop_rx) = watch::channel(false);

        let admin_task = match admin_listener {
            Some(admin_listener) => {
                tracing::info!(
                    "Admin API listening on http://{}/api",
                    admin_listener.local_addr()?
                );
                let app = admin_router(state.clone());
                let mut admin_stop = stop_rx.clone();
                Some(tokio::spawn(async move {
                    axum::serve(admin_listener, app)
                        .with_graceful_shutdown(async move {
                            let _ = admin_stop.changed().await;
                        })
                        .await
                }))
            }
            None => None,
        };

        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown signal received");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((socket, peer)) => {
                        accept_connection(
                            &mut connections,
                            socket,
                            peer,
                            &state,
                            connection_limit.as_ref(),
                            &stop_rx,
                        );
                    }
                    Err(e) => {
                        tracing::error!("Failed to accept connection: {}", e);
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    log_join_error(joined);
                }
            }
        }

        // 1. Stop accepting
        drop(listener);

        // 2. Tell every handler to stop
        let _ = stop_tx.send(true);

        // 3. Wait for handlers within the grace period
        let drain = async {
            while let Some(joined) = connections.join_next().await {
                log_join_error(joined);
            }
        };
        if tokio::time::timeout(config.shutdown_grace, drain).await.is_err() {
            // 4. Abort the rest
            tracing::warn!(
                "{} connection(s) still open after {:?}, aborting",
                connections.len(),
                config.shutdown_grace
            );
            connections.abort_all();
            while connections.join_next().await.is_some() {}
        }

        if let Some(admin_task) = admin_task {
            match admin_task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!("Admin API stopped with error: {}", e),
                Err(e) => tracing::warn!("Admin API task failed: {}", e),
            }
        }

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

async fn bind_listener(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })
}

fn admin_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/users", get(get_users))
        .route("/api/history", get(get_history))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn accept_connection(
    connections: &mut JoinSet<()>,
    socket: TcpStream,
    peer: SocketAddr,
    state: &Arc<AppState>,
    connection_limit: Option<&Arc<Semaphore>>,
    stop_rx: &watch::Receiver<bool>,
) {
    let permit = match connection_limit {
        Some(limit) => match limit.clone().try_acquire_owned() {
            Ok(permit) => Some(permit),
            Err(_) => {
                tracing::warn!("Connection from {} rejected: limit reached", peer);
                connections.spawn(reject_full(socket, state.clone()));
                return;
            }
        },
        None => None,
    };

    if let Err(e) = socket.set_nodelay(true) {
        tracing::warn!("Failed to set TCP_NODELAY for {}: {}", peer, e);
    }

    let (reader, writer) = socket.into_split();
    let state = state.clone();
    let stop_rx = stop_rx.clone();
    connections.spawn(async move {
        let _permit = permit;
        handle_connection(reader, writer, peer.to_string(), state, stop_rx).await;
    });
}

/// Tell the peer the server is full, then hang up
async fn reject_full(socket: TcpStream, state: Arc<AppState>) {
    let line = state.dispatcher.system_message(notice::SERVER_FULL).render();
    let pusher = StreamLinePusher::new(socket);
    if let Err(e) = pusher.push_line(&line).await {
        tracing::debug!("Failed to send server-full notice: {}", e);
    }
    pusher.close().await;
}

fn log_join_error(joined: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined
        && e.is_panic()
    {
        tracing::error!("Connection handler panicked: {}", e);
    }
}
