//! インメモリ実装

pub mod history;
pub mod registry;

pub use history::{DEFAULT_HISTORY_CAPACITY, InMemoryMessageHistory};
pub use registry::InMemoryClientRegistry;
