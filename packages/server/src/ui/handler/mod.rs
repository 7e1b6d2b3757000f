//! Connection and HTTP handlers.

mod connection;
mod http;

pub use connection::handle_connection;
pub use http::{get_history, get_users, health_check};
