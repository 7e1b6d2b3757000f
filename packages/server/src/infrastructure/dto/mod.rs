//! Data Transfer Objects (DTOs) for the chat server.
//!
//! - `http`: admin HTTP API response DTOs

pub mod http;
