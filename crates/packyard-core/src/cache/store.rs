use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use thiserror::Error;

/// Failure talking to a cache backend. Never surfaced to protocol callers.
#[derive(Error, Debug)]
pub enum CacheStoreError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("cache lock poisoned")]
    Poisoned,
}

/// Key-value store with per-entry expiry, shared by every request.
pub trait CacheStore: Send + Sync {
    /// Returns the live value for `key`, or `None` when absent or expired.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheStoreError>;

    fn set_with_expiry(&self, key: &str, value: Vec<u8>, ttl: Duration)
        -> Result<(), CacheStoreError>;
}

/// In-process store backed by a hash map.
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, (Vec<u8>, Instant)>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every expired entry.
    pub fn purge_expired(&self) -> Result<usize, CacheStoreError> {
        let mut entries = self.entries.lock().map_err(|_| CacheStoreError::Poisoned)?;
        let before = entries.len();
        let now = Instant::now();
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        Ok(before - entries.len())
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheStoreError> {
        let entries = self.entries.lock().map_err(|_| CacheStoreError::Poisoned)?;
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(value, _)| value.clone()))
    }

    fn set_with_expiry(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<(), CacheStoreError> {
        let mut entries = self.entries.lock().map_err(|_| CacheStoreError::Poisoned)?;
        entries.insert(key.to_string(), (value, Instant::now() + ttl));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let store = MemoryCacheStore::new();
        store
            .set_with_expiry("pkg_user_0", b"data".to_vec(), Duration::from_secs(60))
            .unwrap();

        assert_eq!(store.get("pkg_user_0").unwrap(), Some(b"data".to_vec()));
        assert_eq!(store.get("pkg_user_1").unwrap(), None);
    }

    #[test]
    fn test_expired_entry_is_absent() {
        let store = MemoryCacheStore::new();
        store
            .set_with_expiry("pkg_user_0", b"old".to_vec(), Duration::ZERO)
            .unwrap();

        assert_eq!(store.get("pkg_user_0").unwrap(), None);
        assert_eq!(store.len(), 1);
        assert_eq!(store.purge_expired().unwrap(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_overwrite_replaces_value() {
        let store = MemoryCacheStore::new();
        let ttl = Duration::from_secs(60);
        store.set_with_expiry("k", b"one".to_vec(), ttl).unwrap();
        store.set_with_expiry("k", b"two".to_vec(), ttl).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(b"two".to_vec()));
    }
}
