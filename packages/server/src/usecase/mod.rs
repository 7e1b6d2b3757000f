//! UseCase layer: application operations built on the domain interfaces.

pub mod connect_user;
pub mod disconnect_user;
pub mod dispatcher;
pub mod error;
pub mod send_message;

pub use connect_user::{ConnectUserUseCase, Joined};
pub use disconnect_user::DisconnectUserUseCase;
pub use dispatcher::{Admission, BroadcastDispatcher, DispatchPolicy};
pub use error::ConnectError;
pub use send_message::{SendMessageUseCase, SendOutcome};
