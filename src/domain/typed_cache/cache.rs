//! Write-through typed cache

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use metrics::counter;
use tracing::debug;

use super::shape::{HashShape, MirrorEntry, Mirrors, ScalarShape, SetShape, Shape, ShapeMirror};
use crate::domain::store::{KeyType, RemoteStore};
use crate::domain::DomainError;

/// Local write-through mirror of a remote multi-type key-value store
///
/// Keeps one registry entry per key naming the shape it holds (scalar, set or
/// hash) and one mirror per shape. A mirror entry is only served while the
/// registry names its shape. Writes of a different shape to a registered key
/// are rejected locally, returning `None` or `0` the way the remote store
/// would refuse them, without a remote call. A write the store itself refuses
/// with a type error is rejected the same way and changes no local state.
///
/// Operations take `&mut self`, so one instance never runs two operations at
/// once. Share it between tasks behind a `tokio::sync::Mutex`.
pub struct TypedCache {
    store: Arc<dyn RemoteStore>,
    registry: HashMap<String, Shape>,
    mirrors: Mirrors,
}

impl fmt::Debug for TypedCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedCache")
            .field("store", &self.store)
            .field("registered_keys", &self.registry.len())
            .finish()
    }
}

impl TypedCache {
    /// Creates an empty cache in front of the given store
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            registry: HashMap::new(),
            mirrors: Mirrors::default(),
        }
    }

    /// Returns the store this cache writes through to
    pub fn store(&self) -> &Arc<dyn RemoteStore> {
        &self.store
    }

    /// Returns the shape the registry currently records for a key
    pub fn shape_of(&self, key: &str) -> Option<Shape> {
        self.registry.get(key).copied()
    }

    /// Writes a scalar, returning the previous scalar value
    ///
    /// Returns `None` without contacting the store if the key is registered
    /// as a set or hash, and `None` if the store holds another type.
    pub async fn set_scalar(
        &mut self,
        key: &str,
        value: &str,
    ) -> Result<Option<String>, DomainError> {
        if self.rejects(key, Shape::Scalar) {
            return Ok(None);
        }

        let previous = match self.store.get_and_replace(key, value).await {
            Err(DomainError::WrongType { .. }) => {
                rejected(Shape::Scalar, key, "store");
                return Ok(None);
            }
            result => result?,
        };

        self.registry.insert(key.to_string(), Shape::Scalar);
        self.mirrors
            .scalars
            .insert(key.to_string(), MirrorEntry::complete(value.to_string()));

        Ok(previous)
    }

    /// Adds members to a set, returning how many the store newly inserted
    pub async fn add_set_members<I, V>(&mut self, key: &str, values: I) -> Result<usize, DomainError>
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        if self.rejects(key, Shape::Set) {
            return Ok(0);
        }

        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Ok(0);
        }

        let added = match self.store.add_set_members(key, &values).await {
            Err(DomainError::WrongType { .. }) => {
                rejected(Shape::Set, key, "store");
                return Ok(0);
            }
            result => result?,
        };
        self.registry.insert(key.to_string(), Shape::Set);

        if added == 0 {
            return Ok(0);
        }

        self.mirrors
            .sets
            .entry(key.to_string())
            .or_insert_with(|| MirrorEntry::partial(HashSet::new()))
            .value
            .extend(values);

        Ok(added)
    }

    /// Sets a hash field, returning 1 if the store created it and 0 if it overwrote it
    pub async fn set_hash_field(
        &mut self,
        key: &str,
        field: &str,
        value: &str,
    ) -> Result<usize, DomainError> {
        if self.rejects(key, Shape::Hash) {
            return Ok(0);
        }

        let created = match self.store.set_hash_field(key, field, value).await {
            Err(DomainError::WrongType { .. }) => {
                rejected(Shape::Hash, key, "store");
                return Ok(0);
            }
            result => result?,
        };
        self.registry.insert(key.to_string(), Shape::Hash);

        self.mirrors
            .hashes
            .entry(key.to_string())
            .or_insert_with(|| MirrorEntry::partial(HashMap::new()))
            .value
            .insert(field.to_string(), value.to_string());

        Ok(created)
    }

    /// Reads a scalar, serving it locally when mirrored
    pub async fn get_scalar(&mut self, key: &str) -> Result<Option<String>, DomainError> {
        self.read_through::<ScalarShape>(key).await
    }

    /// Reads all members of a set, serving them locally when fully mirrored
    pub async fn get_set(&mut self, key: &str) -> Result<Option<HashSet<String>>, DomainError> {
        self.read_through::<SetShape>(key).await
    }

    /// Reads one hash field
    ///
    /// A miss fetches and mirrors the whole hash, not just the field.
    pub async fn get_hash_field(
        &mut self,
        key: &str,
        field: &str,
    ) -> Result<Option<String>, DomainError> {
        if let Some(value) = self
            .cached::<HashShape>(key)
            .and_then(|entry| entry.value.get(field))
        {
            hit(Shape::Hash, key);
            return Ok(Some(value.clone()));
        }

        miss(Shape::Hash, key);
        let hash = self.populate::<HashShape>(key).await?;

        Ok(hash.and_then(|mut fields| fields.remove(field)))
    }

    /// Reads every field of a hash, serving it locally when fully mirrored
    pub async fn get_hash(
        &mut self,
        key: &str,
    ) -> Result<Option<HashMap<String, String>>, DomainError> {
        self.read_through::<HashShape>(key).await
    }

    /// Deletes a whole key, or only some members/fields of a set or hash
    ///
    /// With values and a remote set or hash, removes just those members or
    /// fields. With no values, or a remote string, deletes the whole key and
    /// purges every mirror. Anything else is left alone and returns 0.
    ///
    /// The registry entry is dropped before the store is consulted, even when
    /// the outcome is a partial removal; the shape is learned again on the
    /// next read.
    pub async fn delete<I, V>(&mut self, key: &str, values: I) -> Result<usize, DomainError>
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.registry.remove(key);

        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        let key_type = self.store.key_type(key).await?;

        match key_type {
            KeyType::Set if !values.is_empty() => {
                let removed = self.store.remove_set_members(key, &values).await?;
                remove_from(&mut self.mirrors.sets, key, |members| {
                    for value in &values {
                        members.remove(value);
                    }
                    members.is_empty()
                });
                debug!(key, removed, "Removed set members");
                Ok(removed)
            }
            KeyType::Hash if !values.is_empty() => {
                let removed = self.store.remove_hash_fields(key, &values).await?;
                remove_from(&mut self.mirrors.hashes, key, |fields| {
                    for field in &values {
                        fields.remove(field);
                    }
                    fields.is_empty()
                });
                debug!(key, removed, "Removed hash fields");
                Ok(removed)
            }
            _ if key_type == KeyType::String || values.is_empty() => {
                let removed = self.store.delete(&[key.to_string()]).await?;
                self.mirrors.purge(key);
                debug!(key, removed, "Deleted key");
                Ok(removed)
            }
            _ => {
                debug!(key, key_type = %key_type, "Nothing to delete for key");
                Ok(0)
            }
        }
    }

    /// Deletes a whole key regardless of its type
    pub async fn delete_key(&mut self, key: &str) -> Result<usize, DomainError> {
        self.delete(key, std::iter::empty::<String>()).await
    }

    fn rejects(&self, key: &str, shape: Shape) -> bool {
        match self.registry.get(key) {
            Some(registered) if *registered != shape => {
                debug!(key, registered = %registered, "Key registered with another shape");
                rejected(shape, key, "registry");
                true
            }
            _ => false,
        }
    }

    /// Mirror entry for a key, if the registry currently names this shape for it
    fn cached<M: ShapeMirror>(&self, key: &str) -> Option<&MirrorEntry<M::Value>> {
        match self.registry.get(key) {
            Some(shape) if *shape == M::SHAPE => M::entries(&self.mirrors).get(key),
            _ => None,
        }
    }

    async fn read_through<M: ShapeMirror>(
        &mut self,
        key: &str,
    ) -> Result<Option<M::Value>, DomainError> {
        if let Some(entry) = self.cached::<M>(key).filter(|entry| entry.complete) {
            hit(M::SHAPE, key);
            return Ok(Some(entry.value.clone()));
        }

        miss(M::SHAPE, key);
        self.populate::<M>(key).await
    }

    /// Checks the remote type and, if it matches, fetches and mirrors the whole value
    async fn populate<M: ShapeMirror>(
        &mut self,
        key: &str,
    ) -> Result<Option<M::Value>, DomainError> {
        let key_type = self.store.key_type(key).await?;
        if key_type != M::SHAPE.key_type() {
            debug!(key, key_type = %key_type, shape = %M::SHAPE, "Remote key has another type");
            return Ok(None);
        }

        let Some(value) = M::fetch(self.store.as_ref(), key).await? else {
            return Ok(None);
        };

        self.registry.insert(key.to_string(), M::SHAPE);
        M::entries_mut(&mut self.mirrors)
            .insert(key.to_string(), MirrorEntry::complete(value.clone()));
        debug!(key, shape = %M::SHAPE, "Populated mirror from store");

        Ok(Some(value))
    }
}

fn hit(shape: Shape, key: &str) {
    debug!(key, shape = %shape, "Cache hit");
    counter!("typed_cache_hits_total", "shape" => shape.as_str()).increment(1);
}

fn miss(shape: Shape, key: &str) {
    debug!(key, shape = %shape, "Cache miss");
    counter!("typed_cache_misses_total", "shape" => shape.as_str()).increment(1);
}

fn rejected(shape: Shape, key: &str, by: &'static str) {
    debug!(key, shape = %shape, by, "Rejected write");
    counter!("typed_cache_rejected_writes_total", "shape" => shape.as_str()).increment(1);
}

/// Applies a removal to a mirror entry, dropping the entry once it is empty
fn remove_from<V>(
    entries: &mut HashMap<String, MirrorEntry<V>>,
    key: &str,
    remove: impl FnOnce(&mut V) -> bool,
) {
    if let Some(entry) = entries.get_mut(key) {
        if remove(&mut entry.value) {
            entries.remove(key);
        }
    }
}
