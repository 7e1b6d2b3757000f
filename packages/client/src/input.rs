//! Keyboard input: readline thread and mapping of typed lines to protocol lines.

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

use super::ui::PROMPT;

/// Leave the chat
pub const QUIT_COMMAND: &str = "/quit";
/// Pick another name (after the server rejected the first one)
pub const NAME_COMMAND: &str = "/name";

/// What to do with one typed line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    /// Send this protocol line to the server
    Send(String),
    /// Register under another name (`USER:<name>`)
    Rename(String),
    /// Disconnect
    Quit,
    /// Nothing to send
    Skip,
}

/// Map a typed line to an action.
///
/// - `/quit` disconnects
/// - `/name <newname>` registers as `<newname>`
/// - anything else non-empty is sent as `MSG:<line>`
pub fn to_action(line: &str) -> InputAction {
    let line = line.trim();
    if line.is_empty() {
        return InputAction::Skip;
    }
    if line == QUIT_COMMAND {
        return InputAction::Quit;
    }
    if let Some(rest) = line.strip_prefix(NAME_COMMAND)
        && (rest.is_empty() || rest.starts_with(char::is_whitespace))
    {
        let name = rest.trim();
        if name.is_empty() {
            return InputAction::Skip;
        }
        return InputAction::Rename(name.to_string());
    }
    InputAction::Send(format!("MSG:{}", line))
}

/// Spawn a blocking thread for rustyline (synchronous readline).
///
/// The returned receiver closes when the user presses Ctrl+C / Ctrl+D or
/// readline fails.
pub fn spawn_input_thread() -> mpsc::UnboundedReceiver<String> {
    let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            // Channel closed, exit thread
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    input_rx
}
