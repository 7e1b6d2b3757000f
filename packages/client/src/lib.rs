//! Terminal client for the Tertulia line-protocol chat server.

pub mod error;
pub mod input;
pub mod runner;
pub mod session;
mod ui;

pub use runner::run_client;
