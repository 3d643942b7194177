//! In-process remote store implementation

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::store::{KeyType, RemoteStore};
use crate::domain::DomainError;

#[derive(Debug, Clone)]
enum StoredValue {
    String(String),
    Set(HashSet<String>),
    Hash(HashMap<String, String>),
}

impl StoredValue {
    fn key_type(&self) -> KeyType {
        match self {
            StoredValue::String(_) => KeyType::String,
            StoredValue::Set(_) => KeyType::Set,
            StoredValue::Hash(_) => KeyType::Hash,
        }
    }
}

/// Remote store kept in process memory
///
/// Follows the remote store's typing rules: operations on a key holding
/// another type fail with `DomainError::WrongType`, and a set or hash is
/// removed as soon as its last member or field is.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, StoredValue>>,
}

impl InMemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored
    pub fn len(&self) -> Result<usize, DomainError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, DomainError> {
        Ok(self.read()?.is_empty())
    }

    /// Removes every key
    pub fn flush(&self) -> Result<(), DomainError> {
        self.write()?.clear();
        Ok(())
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, StoredValue>>, DomainError> {
        self.entries
            .read()
            .map_err(|_| DomainError::internal("Failed to acquire lock"))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, StoredValue>>, DomainError> {
        self.entries
            .write()
            .map_err(|_| DomainError::internal("Failed to acquire lock"))
    }
}

#[async_trait]
impl RemoteStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        match self.read()?.get(key) {
            Some(StoredValue::String(value)) => Ok(Some(value.clone())),
            Some(_) => Err(DomainError::wrong_type(key)),
            None => Ok(None),
        }
    }

    async fn get_and_replace(
        &self,
        key: &str,
        value: &str,
    ) -> Result<Option<String>, DomainError> {
        let mut entries = self.write()?;

        let previous = match entries.get(key) {
            Some(StoredValue::String(previous)) => Some(previous.clone()),
            Some(_) => return Err(DomainError::wrong_type(key)),
            None => None,
        };

        entries.insert(key.to_string(), StoredValue::String(value.to_string()));
        Ok(previous)
    }

    async fn delete(&self, keys: &[String]) -> Result<usize, DomainError> {
        let mut entries = self.write()?;

        Ok(keys
            .iter()
            .filter(|key| entries.remove(key.as_str()).is_some())
            .count())
    }

    async fn add_set_members(&self, key: &str, members: &[String]) -> Result<usize, DomainError> {
        if members.is_empty() {
            return Err(DomainError::store(format!(
                "No members given to add to set '{}'",
                key
            )));
        }

        let mut entries = self.write()?;

        let set = match entries
            .entry(key.to_string())
            .or_insert_with(|| StoredValue::Set(HashSet::new()))
        {
            StoredValue::Set(set) => set,
            _ => return Err(DomainError::wrong_type(key)),
        };

        Ok(members
            .iter()
            .filter(|member| set.insert((*member).clone()))
            .count())
    }

    async fn set_members(&self, key: &str) -> Result<HashSet<String>, DomainError> {
        match self.read()?.get(key) {
            Some(StoredValue::Set(set)) => Ok(set.clone()),
            Some(_) => Err(DomainError::wrong_type(key)),
            None => Ok(HashSet::new()),
        }
    }

    async fn remove_set_members(
        &self,
        key: &str,
        members: &[String],
    ) -> Result<usize, DomainError> {
        let mut entries = self.write()?;

        let (removed, now_empty) = match entries.get_mut(key) {
            Some(StoredValue::Set(set)) => {
                let removed = members.iter().filter(|member| set.remove(*member)).count();
                (removed, set.is_empty())
            }
            Some(_) => return Err(DomainError::wrong_type(key)),
            None => return Ok(0),
        };

        if now_empty {
            entries.remove(key);
        }

        Ok(removed)
    }

    async fn set_hash_field(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> Result<usize, DomainError> {
        let mut entries = self.write()?;

        let hash = match entries
            .entry(key.to_string())
            .or_insert_with(|| StoredValue::Hash(HashMap::new()))
        {
            StoredValue::Hash(hash) => hash,
            _ => return Err(DomainError::wrong_type(key)),
        };

        let created = hash
            .insert(field.to_string(), value.to_string())
            .is_none();

        Ok(usize::from(created))
    }

    async fn get_hash_field(
        &self,
        key: &str,
        field: &str,
    ) -> Result<Option<String>, DomainError> {
        match self.read()?.get(key) {
            Some(StoredValue::Hash(hash)) => Ok(hash.get(field).cloned()),
            Some(_) => Err(DomainError::wrong_type(key)),
            None => Ok(None),
        }
    }

    async fn get_hash(&self, key: &str) -> Result<HashMap<String, String>, DomainError> {
        match self.read()?.get(key) {
            Some(StoredValue::Hash(hash)) => Ok(hash.clone()),
            Some(_) => Err(DomainError::wrong_type(key)),
            None => Ok(HashMap::new()),
        }
    }

    async fn remove_hash_fields(
        &self,
        key: &str,
        fields: &[String],
    ) -> Result<usize, DomainError> {
        let mut entries = self.write()?;

        let (removed, now_empty) = match entries.get_mut(key) {
            Some(StoredValue::Hash(hash)) => {
                let removed = fields
                    .iter()
                    .filter(|field| hash.remove(field.as_str()).is_some())
                    .count();
                (removed, hash.is_empty())
            }
            Some(_) => return Err(DomainError::wrong_type(key)),
            None => return Ok(0),
        };

        if now_empty {
            entries.remove(key);
        }

        Ok(removed)
    }

    async fn key_type(&self, key: &str) -> Result<KeyType, DomainError> {
        Ok(self
            .read()?
            .get(key)
            .map(StoredValue::key_type)
            .unwrap_or(KeyType::None))
    }
}
