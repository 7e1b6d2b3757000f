//! Domain error types.

use std::time::Duration;

use thiserror::Error;

/// Username validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsernameError {
    /// Username is empty
    #[error("username is empty")]
    Empty,

    /// Username is too short or too long (character count)
    #[error("username must be between 3 and 15 characters (got {0})")]
    Length(usize),

    /// Username contains a character outside `[A-Za-z0-9_-]`
    #[error("username contains invalid character '{0}'")]
    InvalidCharacter(char),
}

/// Client registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Another session already holds this name (case-insensitive)
    #[error("username '{0}' is already in use")]
    Duplicate(String),

    /// The session already registered a name
    #[error("session is already registered as '{0}'")]
    AlreadyRegistered(String),
}

/// Outbound line delivery errors
#[derive(Debug, Error)]
pub enum PushError {
    /// The outbound stream was closed earlier
    #[error("outbound stream is closed")]
    Closed,

    /// The write did not complete in time
    #[error("write timed out after {0:?}")]
    Timeout(Duration),

    /// The write failed
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}
