//! Line-protocol chat server implementation.

mod handler;
mod server;
mod signal;
pub mod state; // 結合テストから AppState を参照するため public

pub use server::ChatServer;
pub use signal::shutdown_signal;
