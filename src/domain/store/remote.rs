//! Remote store capability trait

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::KeyType;
use crate::domain::DomainError;

/// Operations the typed cache needs from a remote multi-type key-value store
///
/// Counts are the values the store itself reports; the cache treats them as
/// ground truth when updating its mirrors.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RemoteStore: Send + Sync + Debug {
    /// Gets a scalar value
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Atomically replaces a scalar value, returning the previous one
    async fn get_and_replace(&self, key: &str, value: &str)
        -> Result<Option<String>, DomainError>;

    /// Deletes whole keys, returning how many existed
    async fn delete(&self, keys: &[String]) -> Result<usize, DomainError>;

    /// Adds members to a set, returning how many were newly inserted
    async fn add_set_members(&self, key: &str, members: &[String]) -> Result<usize, DomainError>;

    /// Gets all members of a set
    async fn set_members(&self, key: &str) -> Result<HashSet<String>, DomainError>;

    /// Removes members from a set, returning how many were present
    async fn remove_set_members(
        &self,
        key: &str,
        members: &[String],
    ) -> Result<usize, DomainError>;

    /// Sets a hash field, returning 1 if the field was created and 0 if overwritten
    async fn set_hash_field(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> Result<usize, DomainError>;

    /// Gets a single hash field
    async fn get_hash_field(&self, key: &str, field: &str)
        -> Result<Option<String>, DomainError>;

    /// Gets every field of a hash
    async fn get_hash(&self, key: &str) -> Result<HashMap<String, String>, DomainError>;

    /// Removes hash fields, returning how many were present
    async fn remove_hash_fields(&self, key: &str, fields: &[String])
        -> Result<usize, DomainError>;

    /// Reports the type currently stored at a key
    async fn key_type(&self, key: &str) -> Result<KeyType, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_remote_store_key_type() {
        let mut mock = MockRemoteStore::new();
        mock.expect_key_type()
            .withf(|key| key == "session:1")
            .times(1)
            .returning(|_| Ok(KeyType::Hash));

        let result = mock.key_type("session:1").await.unwrap();
        assert_eq!(result, KeyType::Hash);
    }

    #[tokio::test]
    async fn test_mock_remote_store_error() {
        let mut mock = MockRemoteStore::new();
        mock.expect_get()
            .returning(|_| Err(DomainError::store("connection reset")));

        let result = mock.get("key").await;
        assert!(matches!(result, Err(DomainError::Store { .. })));
    }
}
