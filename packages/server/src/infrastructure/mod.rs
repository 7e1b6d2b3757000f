//! Infrastructure layer: concrete implementations of the domain interfaces and the wire protocol.

pub mod dto;
pub mod message_pusher;
pub mod protocol;
pub mod repository;
