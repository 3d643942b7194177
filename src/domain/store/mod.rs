//! Store domain - the remote key-value store the cache fronts

mod key_type;
mod remote;

pub use key_type::KeyType;
pub use remote::RemoteStore;

#[cfg(test)]
pub use remote::MockRemoteStore;
