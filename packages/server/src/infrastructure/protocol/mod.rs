//! Line protocol spoken over each connection.
//!
//! - `line_reader`: bounded, lossy framing of inbound lines
//! - `directive`: client → server lines (`USER:<name>`, `MSG:<text>`)
//! - `notice`: server → client system notice texts

pub mod directive;
pub mod line_reader;
pub mod notice;

pub use directive::{Directive, MessageBody, classify_body};
pub use line_reader::{LineReader, MAX_LINE_LEN, ReadLine};

/// Registration directive prefix
pub const USER_PREFIX: &str = "USER:";
/// Message/command directive prefix
pub const MSG_PREFIX: &str = "MSG:";
/// Help command (case-insensitive)
pub const HELP_COMMAND: &str = "/help";
/// Users command (case-insensitive)
pub const USERS_COMMAND: &str = "/users";
