//! Client → server directive parsing.

use super::{HELP_COMMAND, MSG_PREFIX, USER_PREFIX, USERS_COMMAND};

/// One parsed client line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `USER:<name>`, name trimmed
    User(String),
    /// `MSG:<text>`, text trimmed
    Msg(String),
    /// Anything else, kept for logging
    Unknown(String),
}

impl Directive {
    /// Parse one line. Prefixes are case-sensitive; a trailing `\r` is ignored.
    pub fn parse(line: &str) -> Self {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if let Some(name) = line.strip_prefix(USER_PREFIX) {
            Self::User(name.trim().to_string())
        } else if let Some(text) = line.strip_prefix(MSG_PREFIX) {
            Self::Msg(text.trim().to_string())
        } else {
            Self::Unknown(line.to_string())
        }
    }
}

/// What a `MSG:` body asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageBody<'a> {
    /// Nothing to do
    Empty,
    /// `/help`
    Help,
    /// `/users`
    Users,
    /// Plain chat text for the group
    Chat(&'a str),
}

/// Classify a trimmed `MSG:` body
pub fn classify_body(body: &str) -> MessageBody<'_> {
    if body.is_empty() {
        MessageBody::Empty
    } else if body.eq_ignore_ascii_case(HELP_COMMAND) {
        MessageBody::Help
    } else if body.eq_ignore_ascii_case(USERS_COMMAND) {
        MessageBody::Users
    } else {
        MessageBody::Chat(body)
    }
}
