//! Domain layer: value objects, entities and the interfaces the upper layers depend on.

pub mod entity;
pub mod error;
pub mod message;
pub mod message_pusher;
pub mod repository;
pub mod value_object;

pub use entity::{DeliveryHold, Session};
pub use error::{PushError, RegistryError, UsernameError};
pub use message::{Message, Origin, render_user_list};
pub use message_pusher::LinePusher;
pub use repository::{ClientRegistry, MessageHistory};
pub use value_object::{SessionId, Username, UsernameKey};

#[cfg(test)]
pub use message_pusher::MockLinePusher;
