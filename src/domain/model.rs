use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

/// Global map version. Version 0 is the empty map before any mutation.
pub type Version = u64;

/// One write in a key's history. `value == None` marks a delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element<V> {
    pub version: Version,
    pub value: Option<V>,
    pub recorded_at: DateTime<Utc>,
}

impl<V> Element<V> {
    pub fn new(version: Version, value: V) -> Self {
        Self {
            version,
            value: Some(value),
            recorded_at: Utc::now(),
        }
    }

    pub fn tombstone(version: Version) -> Self {
        Self {
            version,
            value: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }
}

/// Every live key/value pair of a map as of one version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<K: Eq + Hash, V> {
    version: Version,
    entries: HashMap<K, V>,
}

impl<K: Eq + Hash, V> Snapshot<K, V> {
    pub fn new(version: Version, entries: HashMap<K, V>) -> Self {
        Self { version, entries }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }

    pub fn into_inner(self) -> HashMap<K, V> {
        self.entries
    }
}
