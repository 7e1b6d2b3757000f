//! Session entity.

use std::{
    fmt,
    sync::{
        Arc, OnceLock,
        atomic::{AtomicU32, Ordering},
    },
};

use tokio::sync::{Mutex, Notify, OwnedMutexGuard};

use super::{
    error::{PushError, RegistryError},
    message_pusher::LinePusher,
    value_object::{SessionId, Username},
};

/// One accepted connection.
///
/// The username is empty until registration and can be assigned only once.
/// All outbound writes go through the session's [`LinePusher`].
/// Broadcast deliveries additionally pass the delivery gate, which is held
/// closed while the session is being introduced (welcome and history replay).
pub struct Session {
    id: SessionId,
    peer: String,
    username: OnceLock<Username>,
    pusher: Arc<dyn LinePusher>,
    delivery_gate: Arc<Mutex<()>>,
    send_failures: AtomicU32,
    kicked: Notify,
}

/// Keeps broadcast deliveries to one session waiting until dropped.
#[must_use = "deliveries resume as soon as the hold is dropped"]
pub struct DeliveryHold {
    _guard: OwnedMutexGuard<()>,
}

impl Session {
    pub fn new(peer: String, pusher: Arc<dyn LinePusher>) -> Self {
        Self {
            id: SessionId::generate(),
            peer,
            username: OnceLock::new(),
            pusher,
            delivery_gate: Arc::new(Mutex::new(())),
            send_failures: AtomicU32::new(0),
            kicked: Notify::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Remote address, for logging
    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn username(&self) -> Option<&Username> {
        self.username.get()
    }

    pub fn is_registered(&self) -> bool {
        self.username.get().is_some()
    }

    /// `username@peer`, or `unregistered@peer` before registration
    pub fn label(&self) -> String {
        match self.username() {
            Some(name) => format!("{}@{}", name, self.peer),
            None => format!("unregistered@{}", self.peer),
        }
    }

    /// Only the registry assigns names, under its own lock.
    pub(crate) fn assign_username(&self, username: Username) -> Result<(), RegistryError> {
        self.username.set(username).map_err(|_| {
            let current = self
                .username()
                .map(|name| name.as_str().to_string())
                .unwrap_or_default();
            RegistryError::AlreadyRegistered(current)
        })
    }

    /// Direct write, not subject to the delivery gate
    pub async fn send(&self, line: &str) -> Result<(), PushError> {
        self.pusher.push_line(line).await
    }

    /// Broadcast write. Waits while a [`DeliveryHold`] is alive.
    pub async fn deliver(&self, line: &str) -> Result<(), PushError> {
        let _open = self.delivery_gate.lock().await;
        self.pusher.push_line(line).await
    }

    /// Hold back broadcast deliveries until the returned hold is dropped.
    ///
    /// Deliveries queued meanwhile go out in arrival order afterwards.
    pub async fn hold_deliveries(&self) -> DeliveryHold {
        DeliveryHold {
            _guard: self.delivery_gate.clone().lock_owned().await,
        }
    }

    /// Release the outbound stream. Idempotent.
    pub async fn close(&self) {
        self.pusher.close().await;
    }

    /// Returns the number of consecutive failures including this one.
    pub fn record_send_failure(&self) -> u32 {
        self.send_failures.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn reset_send_failures(&self) {
        self.send_failures.store(0, Ordering::Release);
    }

    pub fn send_failures(&self) -> u32 {
        self.send_failures.load(Ordering::Acquire)
    }

    /// Ask the session's handler to close the connection.
    ///
    /// The request is remembered if the handler is not waiting yet.
    pub fn kick(&self) {
        self.kicked.notify_one();
    }

    /// Resolves once [`Session::kick`] has been called.
    pub async fn kicked(&self) {
        self.kicked.notified().await;
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .field("username", &self.username.get())
            .field("send_failures", &self.send_failures())
            .finish_non_exhaustive()
    }
}
