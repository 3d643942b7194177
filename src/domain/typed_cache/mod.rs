//! Typed cache domain - a local mirror of a remote multi-type store
//!
//! The cache records which shape (scalar, set or hash) each key holds and
//! keeps one mirror per shape, reading through to the remote store on a
//! miss and writing through on every write.

mod cache;
mod shape;

pub use cache::TypedCache;
pub use shape::Shape;
