//! Shared utilities for the Tertulia server and client.

pub mod logger;
pub mod time;
