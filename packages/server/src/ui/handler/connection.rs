//! Per-connection handler.
//!
//! Each accepted connection runs one `handle_connection` task. The task owns
//! the read half and drives the `AwaitingUsername → Active → Closed` state
//! machine; the write half lives in the session's `StreamLinePusher` so
//! broadcasts from other tasks and direct replies share one write lock.

use std::sync::Arc;

use tokio::{
    io::{AsyncRead, AsyncWrite},
    sync::watch,
};

use crate::{
    domain::{PushError, Session, Username},
    infrastructure::{
        message_pusher::StreamLinePusher,
        protocol::{Directive, LineReader, ReadLine, notice},
    },
    ui::state::AppState,
    usecase::ConnectError,
};

/// Where a connection is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Connected, waiting for a valid `USER:<name>`
    AwaitingUsername,
    /// Registered under this name
    Active(Username),
    /// Terminal
    Closed,
}

/// Serve one connection until the peer leaves, the session is kicked or the
/// server stops. Cleanup always runs through `DisconnectUserUseCase`.
pub async fn handle_connection<R, W>(
    reader: R,
    writer: W,
    peer: String,
    state: Arc<AppState>,
    mut shutdown: watch::Receiver<bool>,
) where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let pusher = Arc::new(StreamLinePusher::new(writer));
    let session = Arc::new(Session::new(peer, pusher));
    let mut lines = LineReader::new(reader);
    tracing::info!("Accepted connection from {}", session.peer());

    let mut current = match reply(&state, &session, notice::GREETING).await {
        Ok(()) => ConnectionState::AwaitingUsername,
        Err(e) => {
            tracing::warn!("Failed to greet {}: {}", session.peer(), e);
            ConnectionState::Closed
        }
    };

    while current != ConnectionState::Closed {
        if *shutdown.borrow_and_update() {
            tracing::debug!("Server stopping, closing '{}'", session.label());
            break;
        }

        let next = tokio::select! {
            next = lines.next_line() => next,
            _ = session.kicked() => {
                tracing::warn!("Dropping '{}' after repeated send failures", session.label());
                break;
            }
            _ = shutdown.changed() => {
                tracing::debug!("Server stopping, closing '{}'", session.label());
                break;
            }
        };

        current = match next {
            Ok(ReadLine::Line(line)) => {
                tracing::debug!("<- '{}': {}", session.label(), line);
                handle_line(&state, &session, current, &line).await
            }
            Ok(ReadLine::TooLong) => {
                tracing::warn!("Line too long from '{}', dropping", session.label());
                stay(&state, &session, notice::LINE_TOO_LONG, current).await
            }
            Ok(ReadLine::Eof) => {
                tracing::debug!("'{}' closed the connection", session.label());
                ConnectionState::Closed
            }
            Err(e) => {
                tracing::warn!("Read error from '{}': {}", session.label(), e);
                ConnectionState::Closed
            }
        };
    }

    state.disconnect_user_usecase.execute(&session).await;
    tracing::info!("Connection from {} closed", session.peer());
}

async fn handle_line(
    state: &AppState,
    session: &Arc<Session>,
    current: ConnectionState,
    line: &str,
) -> ConnectionState {
    let directive = Directive::parse(line);
    match current {
        ConnectionState::AwaitingUsername => awaiting_username(state, session, directive).await,
        ConnectionState::Active(username) => active(state, session, username, directive).await,
        ConnectionState::Closed => ConnectionState::Closed,
    }
}

async fn awaiting_username(
    state: &AppState,
    session: &Arc<Session>,
    directive: Directive,
) -> ConnectionState {
    let candidate = match directive {
        Directive::User(candidate) => candidate,
        Directive::Msg(_) | Directive::Unknown(_) => {
            tracing::warn!("'{}' sent a line before registering", session.label());
            return stay(
                state,
                session,
                notice::REGISTRATION_REQUIRED,
                ConnectionState::AwaitingUsername,
            )
            .await;
        }
    };

    match state.connect_user_usecase.execute(session, &candidate).await {
        Ok(joined) => {
            tracing::info!("'{}' registered as '{}'", session.peer(), joined.username());
            match state.connect_user_usecase.announce(session, joined).await {
                Ok(username) => ConnectionState::Active(username),
                Err(e) => {
                    tracing::warn!("Failed to welcome '{}': {}", session.label(), e);
                    ConnectionState::Closed
                }
            }
        }
        Err(ConnectError::InvalidUsername(e)) => {
            tracing::warn!(
                "{} tried invalid username '{}': {}",
                session.peer(),
                candidate,
                e
            );
            stay(
                state,
                session,
                notice::INVALID_USERNAME,
                ConnectionState::AwaitingUsername,
            )
            .await
        }
        Err(ConnectError::Duplicate(_)) => {
            tracing::warn!("{} tried taken username '{}'", session.peer(), candidate);
            let text = notice::duplicate_username(&candidate);
            stay(state, session, &text, ConnectionState::AwaitingUsername).await
        }
        Err(ConnectError::AlreadyRegistered(_)) => match session.username() {
            Some(username) => {
                let text = notice::already_registered(username);
                stay(state, session, &text, ConnectionState::Active(username.clone())).await
            }
            None => ConnectionState::AwaitingUsername,
        },
    }
}

async fn active(
    state: &AppState,
    session: &Arc<Session>,
    username: Username,
    directive: Directive,
) -> ConnectionState {
    match directive {
        Directive::Msg(body) => {
            match state
                .send_message_usecase
                .execute(session, &username, &body)
                .await
            {
                Ok(_) => ConnectionState::Active(username),
                Err(e) => {
                    tracing::warn!("Failed to reply to '{}': {}", session.label(), e);
                    ConnectionState::Closed
                }
            }
        }
        Directive::User(_) => {
            tracing::warn!("'{}' tried to change username", session.label());
            let text = notice::already_registered(&username);
            stay(state, session, &text, ConnectionState::Active(username)).await
        }
        Directive::Unknown(_) => {
            tracing::warn!("'{}' sent an unknown directive", session.label());
            stay(
                state,
                session,
                notice::UNKNOWN_DIRECTIVE,
                ConnectionState::Active(username),
            )
            .await
        }
    }
}

/// Send a corrective notice and keep the state, or close if the reply fails
async fn stay(
    state: &AppState,
    session: &Session,
    text: &str,
    next: ConnectionState,
) -> ConnectionState {
    match reply(state, session, text).await {
        Ok(()) => next,
        Err(e) => {
            tracing::warn!("Failed to reply to '{}': {}", session.label(), e);
            ConnectionState::Closed
        }
    }
}

async fn reply(state: &AppState, session: &Session, text: &str) -> Result<(), PushError> {
    let message = state.dispatcher.system_message(text);
    state.dispatcher.broadcast_to_one(&message, session).await
}
