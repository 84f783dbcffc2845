use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use packyard_events::{EventSinkHandle, NullSink, RegistryEvent};
use tracing::{debug, trace, warn};

use crate::{
    builder::MetadataBuilder,
    cache::CacheStore,
    document::MetadataSnapshot,
    error::ErrorContext,
    scope::AccessScope,
    RegistryResult,
};

const COMPRESSION_LEVEL: i32 = 3;

/// Caches the builder's output per access scope.
///
/// Entries are never invalidated explicitly; storage mutations become
/// visible once the entry's TTL runs out or a caller bypasses the cache.
pub struct MetadataCache {
    builder: Arc<dyn MetadataBuilder>,
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    events: EventSinkHandle,
}

impl MetadataCache {
    pub fn new(
        builder: Arc<dyn MetadataBuilder>,
        store: Arc<dyn CacheStore>,
        ttl: Duration,
    ) -> Self {
        Self {
            builder,
            store,
            ttl,
            events: Arc::new(NullSink),
        }
    }

    pub fn with_events(mut self, events: EventSinkHandle) -> Self {
        self.events = events;
        self
    }

    pub fn builder(&self) -> &dyn MetadataBuilder {
        self.builder.as_ref()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the metadata graph of `scope`.
    ///
    /// With `use_cache` a live entry is returned as is. Otherwise, or on a
    /// miss, the graph is rebuilt and written back to the store. A failed
    /// rebuild leaves the stored entry untouched.
    pub fn get(&self, scope: AccessScope, use_cache: bool) -> RegistryResult<MetadataSnapshot> {
        let key = scope.cache_key();

        if use_cache {
            if let Some(snapshot) = self.read(&key) {
                trace!(key, "metadata cache hit");
                return Ok(snapshot);
            }
            trace!(key, "metadata cache miss");
        }

        let started = Instant::now();
        let snapshot = self.builder.dump(scope)?;
        debug!(
            scope = %scope,
            packages = snapshot.packages.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "rebuilt metadata graph"
        );

        self.events.emit(RegistryEvent::MetadataRebuilt {
            scope_id: scope.id(),
            packages: snapshot.packages.len(),
        });
        self.write(&key, &snapshot);

        Ok(snapshot)
    }

    fn read(&self, key: &str) -> Option<MetadataSnapshot> {
        let bytes = match self.store.get(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(err) => {
                warn!(key, "failed to read metadata cache: {err}");
                return None;
            }
        };

        match decode(&bytes) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!(key, "discarding undecodable metadata cache entry: {err}");
                None
            }
        }
    }

    fn write(&self, key: &str, snapshot: &MetadataSnapshot) {
        let bytes = match encode(snapshot) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(key, "failed to encode metadata cache entry: {err}");
                return;
            }
        };

        if let Err(err) = self.store.set_with_expiry(key, bytes, self.ttl) {
            warn!(key, "failed to write metadata cache: {err}");
        }
    }
}

fn encode(snapshot: &MetadataSnapshot) -> RegistryResult<Vec<u8>> {
    let json = serde_json::to_vec(snapshot)?;
    zstd::encode_all(json.as_slice(), COMPRESSION_LEVEL)
        .with_context(|| "compressing metadata cache entry".to_string())
}

fn decode(bytes: &[u8]) -> RegistryResult<MetadataSnapshot> {
    let json =
        zstd::decode_all(bytes).with_context(|| "decompressing metadata cache entry".to_string())?;
    Ok(serde_json::from_slice(&json)?)
}
