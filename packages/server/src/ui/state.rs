//! Server state shared by every connection handler.

use std::sync::Arc;

use tertulia_shared::time::Clock;

use crate::{
    config::ServerConfig,
    domain::{ClientRegistry, MessageHistory},
    infrastructure::repository::{InMemoryClientRegistry, InMemoryMessageHistory},
    usecase::{
        BroadcastDispatcher, ConnectUserUseCase, DisconnectUserUseCase, SendMessageUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// Registry（登録済みセッションの管理）
    pub registry: Arc<dyn ClientRegistry>,
    /// History（直近のメッセージ）
    pub history: Arc<dyn MessageHistory>,
    /// Dispatcher（配信と個別返信）
    pub dispatcher: Arc<BroadcastDispatcher>,
    /// ConnectUserUseCase（ユーザー登録のユースケース）
    pub connect_user_usecase: Arc<ConnectUserUseCase>,
    /// SendMessageUseCase（メッセージ送信のユースケース）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// DisconnectUserUseCase（切断のユースケース）
    pub disconnect_user_usecase: Arc<DisconnectUserUseCase>,
}

impl AppState {
    /// Build the state with in-memory registry and history
    pub fn in_memory(config: &ServerConfig, clock: Arc<dyn Clock>) -> Arc<Self> {
        // Initialize dependencies in order:
        // 1. Repositories
        // 2. Dispatcher
        // 3. UseCases

        // 1. Create Repositories (in-memory)
        let registry: Arc<dyn ClientRegistry> = Arc::new(InMemoryClientRegistry::new());
        let history: Arc<dyn MessageHistory> =
            Arc::new(InMemoryMessageHistory::new(config.history_capacity));

        // 2. Create Dispatcher
        let dispatcher = Arc::new(BroadcastDispatcher::new(
            registry.clone(),
            history.clone(),
            clock,
            config.dispatch_policy(),
        ));

        // 3. Create UseCases
        let connect_user_usecase = Arc::new(ConnectUserUseCase::new(dispatcher.clone()));
        let send_message_usecase = Arc::new(SendMessageUseCase::new(dispatcher.clone()));
        let disconnect_user_usecase = Arc::new(DisconnectUserUseCase::new(
            registry.clone(),
            dispatcher.clone(),
        ));

        Arc::new(Self {
            registry,
            history,
            dispatcher,
            connect_user_usecase,
            send_message_usecase,
            disconnect_user_usecase,
        })
    }
}
