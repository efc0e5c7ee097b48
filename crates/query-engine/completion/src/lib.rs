//! Invocation of a hosted language-model completion capability.

pub mod capability;
pub mod error;
pub mod http;
pub mod invoker;
pub mod sql_function;

pub use capability::CompletionCapability;
pub use error::{Error, TransportError};
pub use invoker::invoke;
