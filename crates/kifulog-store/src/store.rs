//! In-memory view of the collection files.

use crate::codec;
use crate::collection::Collection;
use crate::error::{Result, StoreError};
use prost::Message;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

type Records = HashMap<String, String>;

/// Read-only collection store.
///
/// Built once by [`Store::load`] (or [`Store::builder`]) and never mutated
/// afterwards; share it behind an `Arc` and read from any number of tasks.
#[derive(Debug)]
pub struct Store {
    root: Option<PathBuf>,
    collections: [Records; Collection::ALL.len()],
}

impl Store {
    /// Load every collection under `root`.
    ///
    /// Each collection file must exist and hold a YAML mapping of id to
    /// encoded value. An empty file is an empty collection. Any failure
    /// aborts the whole load: there is no partially loaded store.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(StoreError::InvalidRoot(root.to_path_buf()));
        }

        let mut collections: [Records; Collection::ALL.len()] = Default::default();
        for collection in Collection::ALL {
            let records = load_collection(root, collection)?;
            tracing::info!(
                collection = %collection,
                records = records.len(),
                "Loaded collection"
            );
            collections[collection.index()] = records;
        }

        tracing::info!("Store loaded from {}", root.display());
        Ok(Self {
            root: Some(root.to_path_buf()),
            collections,
        })
    }

    /// Start building an in-memory store.
    pub fn builder() -> StoreBuilder {
        StoreBuilder::default()
    }

    /// Get the encoded value stored under `id`.
    pub fn get(&self, collection: Collection, id: &str) -> Result<&str> {
        self.records(collection)
            .get(id)
            .map(String::as_str)
            .ok_or_else(|| StoreError::NotFound {
                collection,
                id: id.to_string(),
            })
    }

    /// Get and decode the value stored under `id`.
    ///
    /// A present but undecodable value yields [`StoreError::Decode`], never
    /// [`StoreError::NotFound`].
    pub fn get_decoded<M: Message + Default>(&self, collection: Collection, id: &str) -> Result<M> {
        let value = self.get(collection, id)?;
        codec::decode(value).map_err(|source| StoreError::Decode {
            collection,
            id: id.to_string(),
            source,
        })
    }

    /// Whether `id` exists in `collection`.
    pub fn contains(&self, collection: Collection, id: &str) -> bool {
        self.records(collection).contains_key(id)
    }

    /// Number of records in `collection`.
    pub fn len(&self, collection: Collection) -> usize {
        self.records(collection).len()
    }

    /// True if no collection holds any record.
    pub fn is_empty(&self) -> bool {
        self.collections.iter().all(HashMap::is_empty)
    }

    /// Directory the store was loaded from, if any.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    fn records(&self, collection: Collection) -> &Records {
        &self.collections[collection.index()]
    }
}

fn load_collection(root: &Path, collection: Collection) -> Result<Records> {
    let path = root.join(collection.file_name());
    let content = std::fs::read_to_string(&path).map_err(|source| StoreError::Io {
        collection,
        path: path.clone(),
        source,
    })?;

    if content.trim().is_empty() {
        return Ok(Records::new());
    }

    let entries: Entries = serde_yaml::from_str(&content).map_err(|source| StoreError::Malformed {
        collection,
        path: path.clone(),
        source,
    })?;

    let mut records = Records::with_capacity(entries.0.len());
    for (id, value) in entries.0 {
        match records.entry(id) {
            Entry::Occupied(mut slot) => {
                tracing::warn!(
                    collection = %collection,
                    id = %slot.key(),
                    path = %path.display(),
                    "Duplicate record id, keeping the later value"
                );
                slot.insert(value);
            }
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
        }
    }
    Ok(records)
}

/// Mapping entries in file order, repeated ids included.
struct Entries(Vec<(String, String)>);

impl<'de> Deserialize<'de> for Entries {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = Entries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of record id to encoded value")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Entries, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry()? {
                    entries.push(entry);
                }
                Ok(Entries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Builder for stores assembled in memory.
#[derive(Debug, Default)]
pub struct StoreBuilder {
    collections: [Records; Collection::ALL.len()],
}

impl StoreBuilder {
    /// Insert an already encoded value.
    pub fn insert(
        mut self,
        collection: Collection,
        id: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.collections[collection.index()].insert(id.into(), value.into());
        self
    }

    /// Encode and insert a message.
    pub fn insert_message<M: Message>(
        self,
        collection: Collection,
        id: impl Into<String>,
        message: &M,
    ) -> Self {
        self.insert(collection, id, codec::encode(message))
    }

    pub fn build(self) -> Store {
        Store {
            root: None,
            collections: self.collections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;

    #[derive(Clone, PartialEq, prost::Message)]
    struct Session {
        #[prost(string, tag = "1")]
        id: String,
        #[prost(string, tag = "2")]
        account_id: String,
    }

    #[test]
    fn test_get_returns_stored_text() {
        let store = Store::builder()
            .insert(Collection::Kifu, "abc", "CgNhYmM=")
            .build();

        assert_eq!(store.get(Collection::Kifu, "abc").unwrap(), "CgNhYmM=");
        assert!(store.contains(Collection::Kifu, "abc"));
        assert_eq!(store.len(Collection::Kifu), 1);
        assert!(store.root().is_none());
    }

    #[test]
    fn test_missing_id_is_not_found() {
        let store = Store::builder().build();
        let err = store.get(Collection::Kifu, "missing").unwrap_err();
        assert!(err.is_not_found());
        assert!(store.is_empty());
    }

    #[test]
    fn test_collections_are_independent_namespaces() {
        let session = Session {
            id: "same".to_string(),
            account_id: "alice".to_string(),
        };
        let store = Store::builder()
            .insert_message(Collection::Session, "same", &session)
            .insert(Collection::Comment, "same", "unrelated")
            .build();

        let decoded: Session = store.get_decoded(Collection::Session, "same").unwrap();
        assert_eq!(decoded, session);
        assert_eq!(store.get(Collection::Comment, "same").unwrap(), "unrelated");
        assert!(store.get(Collection::Kifu, "same").unwrap_err().is_not_found());
    }

    #[test]
    fn test_corrupt_value_is_decode_error() {
        let store = Store::builder()
            .insert(Collection::Session, "bad", "%%%")
            .build();

        let err = store
            .get_decoded::<Session>(Collection::Session, "bad")
            .unwrap_err();
        assert!(!err.is_not_found());
        match err {
            StoreError::Decode { collection, id, source } => {
                assert_eq!(collection, Collection::Session);
                assert_eq!(id, "bad");
                assert!(matches!(source, DecodeError::Text(_)));
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }
}
