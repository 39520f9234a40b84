use crate::domain::model::Version;

/// A map where every mutation produces a new version and older versions stay readable.
pub trait VersionedMap<K, V>: Send + Sync {
    /// Increments the map version and associates `value` with `key` in the new version.
    ///
    /// If the key already had a value, the new version sees `value` instead. Every other
    /// mapping of the previous version is still visible in the new one.
    /// Returns the new version.
    fn put(&self, key: K, value: V) -> Version;

    /// Value stored for `key` in the latest version.
    fn get(&self, key: &K) -> Option<V>;

    /// Value stored for `key` in `version`.
    ///
    /// A version above the current one is read as the current one.
    fn get_by_version(&self, key: &K, version: Version) -> Option<V>;

    /// Increments the map version and removes `key` from the new version.
    ///
    /// Returns the new version. When `key` has no live value the map is left
    /// untouched and the current version is returned.
    fn delete(&self, key: &K) -> Version;

    /// Current map version. A fresh map is at version 0.
    fn current_version(&self) -> Version;

    /// Drops all stored data and resets the version to 0.
    fn clear(&self);
}
