use crate::core::{Element, Snapshot, Version, VersionedMap};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::Hash;

/// Thread-safe [`VersionedMap`].
///
/// Writers take the exclusive lock, so a version bump and the write it stands for land
/// together and versions come out dense. Readers share the lock and never see a
/// half-applied mutation.
pub struct ConcurrentVersionedMap<K, V> {
    state: RwLock<State<K, V>>,
}

struct State<K, V> {
    version: Version,
    histories: HashMap<K, Vec<Element<V>>>,
}

/// Value visible at `version` in a history ordered by ascending version.
fn value_at<V>(history: &[Element<V>], version: Version) -> Option<&V> {
    let idx = history.partition_point(|element| element.version <= version);
    if idx == 0 {
        return None;
    }
    history[idx - 1].value.as_ref()
}

impl<K, V> ConcurrentVersionedMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: RwLock::new(State {
                version: 0,
                histories: HashMap::with_capacity(capacity),
            }),
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        let state = self.state.read();
        state
            .histories
            .get(key)
            .and_then(|history| history.last())
            .is_some_and(|element| !element.is_tombstone())
    }

    /// Number of live keys in the latest version.
    pub fn len(&self) -> usize {
        let state = self.state.read();
        state
            .histories
            .values()
            .filter(|history| history.last().is_some_and(|e| !e.is_tombstone()))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<K> {
        let state = self.state.read();
        state
            .histories
            .iter()
            .filter(|(_, history)| history.last().is_some_and(|e| !e.is_tombstone()))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Every write made to `key` since the last clear, oldest first. Deletes show up as
    /// tombstones.
    pub fn history(&self, key: &K) -> Vec<Element<V>> {
        let state = self.state.read();
        state.histories.get(key).cloned().unwrap_or_default()
    }

    pub fn snapshot(&self) -> Snapshot<K, V> {
        self.snapshot_at(Version::MAX)
    }

    /// Materializes the map as of `version`, clamped to the current version.
    pub fn snapshot_at(&self, version: Version) -> Snapshot<K, V> {
        let state = self.state.read();
        let version = version.min(state.version);

        let entries = state
            .histories
            .iter()
            .filter_map(|(key, history)| {
                value_at(history, version).map(|value| (key.clone(), value.clone()))
            })
            .collect();

        Snapshot::new(version, entries)
    }
}

impl<K, V> Default for ConcurrentVersionedMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> VersionedMap<K, V> for ConcurrentVersionedMap<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn put(&self, key: K, value: V) -> Version {
        let mut state = self.state.write();
        let version = state.version + 1;

        state
            .histories
            .entry(key)
            .or_default()
            .push(Element::new(version, value));
        state.version = version;

        tracing::trace!(version, "put applied");
        version
    }

    fn get(&self, key: &K) -> Option<V> {
        let state = self.state.read();
        state
            .histories
            .get(key)
            .and_then(|history| history.last())
            .and_then(|element| element.value.clone())
    }

    fn get_by_version(&self, key: &K, version: Version) -> Option<V> {
        let state = self.state.read();
        let history = state.histories.get(key)?;
        value_at(history, version).cloned()
    }

    fn delete(&self, key: &K) -> Version {
        let mut state = self.state.write();
        let current = state.version;

        let Some(history) = state.histories.get_mut(key) else {
            tracing::debug!(version = current, "delete of unknown key ignored");
            return current;
        };

        if history.last().map_or(true, Element::is_tombstone) {
            tracing::debug!(version = current, "delete of already deleted key ignored");
            return current;
        }

        let version = current + 1;
        history.push(Element::tombstone(version));
        state.version = version;

        tracing::trace!(version, "delete applied");
        version
    }

    fn current_version(&self) -> Version {
        self.state.read().version
    }

    fn clear(&self) {
        let mut state = self.state.write();
        let dropped = state.histories.len();
        state.histories.clear();
        state.version = 0;

        tracing::info!(keys = dropped, "map cleared, version reset to 0");
    }
}
