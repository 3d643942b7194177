//! Domain layer - Core cache logic and the store capability it depends on

pub mod error;
pub mod store;
pub mod typed_cache;

pub use error::DomainError;
pub use store::{KeyType, RemoteStore};
pub use typed_cache::{Shape, TypedCache};
