//! Server → client system notice texts.
//!
//! The texts are part of the wire contract with existing clients, so they are
//! kept verbatim. Each one is wrapped by `Message::system` before sending.

use crate::domain::Username;

/// Sent right after a connection is accepted
pub const GREETING: &str =
    "Bienvenido al servidor de chat. Por favor, identifíquese con USER:suNombre";

/// Any non-`USER:` line before registration
pub const REGISTRATION_REQUIRED: &str =
    "Comando inválido. Use USER:suNombre para identificarse.";

/// Candidate name failed format validation
pub const INVALID_USERNAME: &str =
    "Nombre de usuario no válido (vacío, muy largo o caracteres inválidos). Intente con otro.";

/// Unrecognized line after registration
pub const UNKNOWN_DIRECTIVE: &str = "Comando desconocido. Usa MSG:mensaje o comandos como /help";

/// A line longer than the read limit was discarded
pub const LINE_TOO_LONG: &str = "Línea demasiado larga. El mensaje fue descartado.";

/// Connection refused because the server is at its connection limit
pub const SERVER_FULL: &str = "El servidor está lleno. Inténtelo más tarde.";

pub const HISTORY_START: &str = "--- Inicio del Historial Reciente ---";
pub const HISTORY_EMPTY: &str = "No hay mensajes previos en el historial.";
pub const HISTORY_END: &str = "--- Fin del Historial Reciente ---";

/// `/help` reply, one system line each
pub const HELP_LINES: [&str; 6] = [
    "--- Ayuda ---",
    "Envía mensajes usando: MSG:tu mensaje",
    "Comandos disponibles:",
    "  /users - Muestra la lista de usuarios conectados.",
    "  /help - Muestra esta ayuda.",
    "--- Fin Ayuda ---",
];

pub fn duplicate_username(candidate: &str) -> String {
    format!(
        "El nombre de usuario '{}' ya está en uso. Intente con otro.",
        candidate
    )
}

pub fn welcome(username: &Username) -> String {
    format!("¡Bienvenido al chat, {}!", username)
}

pub fn joined(username: &Username) -> String {
    format!("{} se ha unido al chat.", username)
}

pub fn left(username: &Username) -> String {
    format!("{} ha abandonado el chat.", username)
}

pub fn already_registered(username: &Username) -> String {
    format!(
        "Ya estás identificado como {}. No puedes cambiar el nombre.",
        username
    )
}
