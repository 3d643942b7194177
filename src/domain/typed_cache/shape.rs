//! Data shapes the cache mirrors and their per-shape fetch logic

use std::collections::{HashMap, HashSet};
use std::fmt;

use futures::future::BoxFuture;

use crate::domain::store::{KeyType, RemoteStore};
use crate::domain::DomainError;

/// Shape a key holds, as recorded in the type registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Scalar,
    Set,
    Hash,
}

impl Shape {
    /// Remote key type that corresponds to this shape
    pub fn key_type(&self) -> KeyType {
        match self {
            Shape::Scalar => KeyType::String,
            Shape::Set => KeyType::Set,
            Shape::Hash => KeyType::Hash,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Scalar => "scalar",
            Shape::Set => "set",
            Shape::Hash => "hash",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local copy of one key's data
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MirrorEntry<V> {
    pub value: V,
    /// True when `value` came from a whole-key fetch (or a scalar write) and
    /// therefore equals the remote value, false when it only holds what this
    /// instance wrote to a key it had not fetched.
    pub complete: bool,
}

impl<V> MirrorEntry<V> {
    pub fn complete(value: V) -> Self {
        Self {
            value,
            complete: true,
        }
    }

    pub fn partial(value: V) -> Self {
        Self {
            value,
            complete: false,
        }
    }
}

/// The three per-shape mirrors
#[derive(Debug, Default)]
pub(crate) struct Mirrors {
    pub scalars: HashMap<String, MirrorEntry<String>>,
    pub sets: HashMap<String, MirrorEntry<HashSet<String>>>,
    pub hashes: HashMap<String, MirrorEntry<HashMap<String, String>>>,
}

impl Mirrors {
    /// Drops every local copy of a key
    pub fn purge(&mut self, key: &str) {
        self.scalars.remove(key);
        self.sets.remove(key);
        self.hashes.remove(key);
    }
}

/// Binds a shape to its mirror map and its whole-key remote fetch
pub(crate) trait ShapeMirror {
    type Value: Clone + Send;

    const SHAPE: Shape;

    fn entries(mirrors: &Mirrors) -> &HashMap<String, MirrorEntry<Self::Value>>;

    fn entries_mut(mirrors: &mut Mirrors) -> &mut HashMap<String, MirrorEntry<Self::Value>>;

    /// Fetches the whole value; `None` if the key vanished since its type was checked
    fn fetch<'a>(
        store: &'a dyn RemoteStore,
        key: &'a str,
    ) -> BoxFuture<'a, Result<Option<Self::Value>, DomainError>>;
}

pub(crate) struct ScalarShape;
pub(crate) struct SetShape;
pub(crate) struct HashShape;

impl ShapeMirror for ScalarShape {
    type Value = String;

    const SHAPE: Shape = Shape::Scalar;

    fn entries(mirrors: &Mirrors) -> &HashMap<String, MirrorEntry<String>> {
        &mirrors.scalars
    }

    fn entries_mut(mirrors: &mut Mirrors) -> &mut HashMap<String, MirrorEntry<String>> {
        &mut mirrors.scalars
    }

    fn fetch<'a>(
        store: &'a dyn RemoteStore,
        key: &'a str,
    ) -> BoxFuture<'a, Result<Option<String>, DomainError>> {
        Box::pin(async move { store.get(key).await })
    }
}

impl ShapeMirror for SetShape {
    type Value = HashSet<String>;

    const SHAPE: Shape = Shape::Set;

    fn entries(mirrors: &Mirrors) -> &HashMap<String, MirrorEntry<HashSet<String>>> {
        &mirrors.sets
    }

    fn entries_mut(mirrors: &mut Mirrors) -> &mut HashMap<String, MirrorEntry<HashSet<String>>> {
        &mut mirrors.sets
    }

    fn fetch<'a>(
        store: &'a dyn RemoteStore,
        key: &'a str,
    ) -> BoxFuture<'a, Result<Option<HashSet<String>>, DomainError>> {
        Box::pin(async move {
            let members = store.set_members(key).await?;
            // The store never keeps an empty set, so empty means the key is gone
            Ok((!members.is_empty()).then_some(members))
        })
    }
}

impl ShapeMirror for HashShape {
    type Value = HashMap<String, String>;

    const SHAPE: Shape = Shape::Hash;

    fn entries(mirrors: &Mirrors) -> &HashMap<String, MirrorEntry<HashMap<String, String>>> {
        &mirrors.hashes
    }

    fn entries_mut(
        mirrors: &mut Mirrors,
    ) -> &mut HashMap<String, MirrorEntry<HashMap<String, String>>> {
        &mut mirrors.hashes
    }

    fn fetch<'a>(
        store: &'a dyn RemoteStore,
        key: &'a str,
    ) -> BoxFuture<'a, Result<Option<HashMap<String, String>>, DomainError>> {
        Box::pin(async move {
            let fields = store.get_hash(key).await?;
            Ok((!fields.is_empty()).then_some(fields))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_key_type() {
        assert_eq!(Shape::Scalar.key_type(), KeyType::String);
        assert_eq!(Shape::Set.key_type(), KeyType::Set);
        assert_eq!(Shape::Hash.key_type(), KeyType::Hash);
    }

    #[test]
    fn test_shape_display() {
        assert_eq!(Shape::Scalar.to_string(), "scalar");
        assert_eq!(Shape::Hash.to_string(), "hash");
    }

    #[test]
    fn test_mirrors_purge() {
        let mut mirrors = Mirrors::default();
        mirrors
            .scalars
            .insert("k".to_string(), MirrorEntry::complete("v".to_string()));
        mirrors.sets.insert(
            "k".to_string(),
            MirrorEntry::partial(HashSet::from(["m".to_string()])),
        );
        mirrors
            .hashes
            .insert("other".to_string(), MirrorEntry::complete(HashMap::new()));

        mirrors.purge("k");

        assert!(mirrors.scalars.is_empty());
        assert!(mirrors.sets.is_empty());
        assert_eq!(mirrors.hashes.len(), 1);
    }
}
