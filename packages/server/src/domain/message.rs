//! Chat message model and its single-line rendering.

use chrono::NaiveTime;
use tertulia_shared::time::bracketed_timestamp;

use super::value_object::Username;

/// Originator tag shown for server-generated notices
pub const SYSTEM_TAG: &str = "Sistema";

/// Who a message comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    System,
    User(Username),
}

/// Logical unit of broadcast: timestamp, originator and body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub time: NaiveTime,
    pub origin: Origin,
    pub body: String,
}

impl Message {
    pub fn system(time: NaiveTime, body: impl Into<String>) -> Self {
        Self {
            time,
            origin: Origin::System,
            body: body.into(),
        }
    }

    pub fn chat(time: NaiveTime, from: Username, body: impl Into<String>) -> Self {
        Self {
            time,
            origin: Origin::User(from),
            body: body.into(),
        }
    }

    /// Render to exactly one wire line (no terminator).
    ///
    /// - system: `[HH:MM:SS] [Sistema] <body>`
    /// - chat:   `[HH:MM:SS] [<username>]: <body>`
    pub fn render(&self) -> String {
        let timestamp = bracketed_timestamp(self.time);
        let body = single_line(&self.body);
        match &self.origin {
            Origin::System => format!("{} [{}] {}", timestamp, SYSTEM_TAG, body),
            Origin::User(name) => format!("{} [{}]: {}", timestamp, name, body),
        }
    }
}

/// Render the user-list notice.
///
/// `[HH:MM:SS] Usuarios conectados (<n>): <a, b, ...>`, or `(ninguno)` when
/// nobody is registered. `usernames` is expected to be sorted already.
pub fn render_user_list(time: NaiveTime, usernames: &[String]) -> String {
    let names = if usernames.is_empty() {
        "(ninguno)".to_string()
    } else {
        usernames.join(", ")
    };
    format!(
        "{} Usuarios conectados ({}): {}",
        bracketed_timestamp(time),
        usernames.len(),
        names
    )
}

fn single_line(body: &str) -> String {
    body.replace(['\r', '\n'], " ")
}
