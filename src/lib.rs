//! Typed Cache
//!
//! A local, in-process write-through cache in front of a remote multi-type
//! key-value store (scalars, sets and hashes):
//! - One shape per key, enforced locally the way the remote store enforces it
//! - Lazy read-through with whole-key population on a miss
//! - Whole-key and partial (member / field) deletion
//! - Redis and in-process store backends

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::{DomainError, KeyType, RemoteStore, Shape, TypedCache};
pub use infrastructure::store::{InMemoryStore, RedisStore, RedisStoreConfig, StoreFactory};
