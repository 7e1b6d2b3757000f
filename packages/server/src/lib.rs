//! Line-oriented TCP chat server library.
//!
//! Accepts concurrent connections, assigns each one a unique display name,
//! fans out chat lines to the group and replays recent history to newcomers.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// server-wide configuration and errors
pub mod config;
pub mod error;
