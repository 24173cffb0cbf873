//! Decryption-key store.
//!
//! Keys are small fixed-size payloads addressed by an opaque caller-supplied
//! identifier; the store reuses the disk cache's LRU/TTL machinery with much
//! smaller default capacity than the playlist cache.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use lyra_cache::{CacheOptions, CacheStatistics, DiskCache, SweepStats};
use tracing::debug;

use crate::error::{HlsError, HlsResult};

/// Context handed to a [`KeyProcessor`] alongside the raw key bytes.
#[derive(Debug, Clone)]
pub struct KeyContext {
    /// The identifier the key is stored under.
    pub identifier: String,
}

/// Callback for transforming raw key bytes before they are persisted
/// (e.g. stripping a server-side wrapping).
pub type KeyProcessor = Arc<dyn Fn(Bytes, &KeyContext) -> HlsResult<Bytes> + Send + Sync>;

/// Identifier-keyed store for decryption keys.
pub struct KeyStore {
    cache: DiskCache,
    processor: Option<KeyProcessor>,
}

impl KeyStore {
    /// Open a key store with the given cache options.
    pub fn open(options: CacheOptions) -> HlsResult<Self> {
        Ok(KeyStore {
            cache: DiskCache::open(options)?,
            processor: None,
        })
    }

    /// Default limits for key payloads: few entries, tiny size budget,
    /// long TTL (keys outlive the playlists they unlock).
    pub fn default_options() -> CacheOptions {
        CacheOptions::default()
            .with_max_entries(256)
            .with_max_total_bytes(1024 * 1024)
            .with_ttl(Duration::from_secs(12 * 60 * 60))
    }

    /// Install a key-processing hook applied before persisting.
    pub fn with_processor(mut self, processor: KeyProcessor) -> Self {
        self.processor = Some(processor);
        self
    }

    /// Persist key bytes under `identifier`, applying the processor hook
    /// if one is installed.
    pub fn store_key(&self, identifier: &str, key: &[u8]) -> HlsResult<()> {
        let bytes = match &self.processor {
            Some(processor) => {
                let context = KeyContext {
                    identifier: identifier.to_string(),
                };
                processor(Bytes::copy_from_slice(key), &context)?
            }
            None => Bytes::copy_from_slice(key),
        };

        self.cache.put(identifier, &bytes)?;
        debug!(identifier, len = bytes.len(), "stored decryption key");
        Ok(())
    }

    /// Load the key stored under `identifier`, if present and fresh.
    pub fn load_key(&self, identifier: &str) -> HlsResult<Option<Bytes>> {
        Ok(self.cache.get(identifier)?.map(Bytes::from))
    }

    /// True iff a fresh key exists for `identifier`.
    pub fn is_valid(&self, identifier: &str) -> bool {
        self.cache.is_valid(identifier)
    }

    /// Remove expired keys.
    pub fn invalidate_expired(&self) -> HlsResult<SweepStats> {
        Ok(self.cache.invalidate_expired()?)
    }

    /// Remove all keys and reset statistics.
    pub fn clear(&self) -> HlsResult<()> {
        Ok(self.cache.clear()?)
    }

    /// Usage and accounting snapshot.
    pub fn statistics(&self) -> CacheStatistics {
        self.cache.statistics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> KeyStore {
        let dir = std::env::temp_dir().join(format!("lyra-keys-test-{}", uuid::Uuid::new_v4()));
        KeyStore::open(KeyStore::default_options().with_root_dir(dir)).unwrap()
    }

    #[test]
    fn store_and_load_round_trip() {
        let store = temp_store();

        store.store_key("asset-1/key-0", &[0x11; 16]).unwrap();
        let loaded = store.load_key("asset-1/key-0").unwrap().unwrap();

        assert_eq!(loaded.as_ref(), &[0x11; 16]);
        assert_eq!(store.statistics().hit_count, 1);

        store.clear().unwrap();
    }

    #[test]
    fn missing_identifier_is_a_miss() {
        let store = temp_store();

        assert!(store.load_key("nope").unwrap().is_none());
        assert_eq!(store.statistics().miss_count, 1);

        store.clear().unwrap();
    }

    #[test]
    fn processor_transforms_key_before_persisting() {
        let store = temp_store().with_processor(Arc::new(|bytes, context| {
            assert_eq!(context.identifier, "id");
            let flipped: Vec<u8> = bytes.iter().map(|b| b ^ 0xFF).collect();
            Ok(Bytes::from(flipped))
        }));

        store.store_key("id", &[0x0F; 4]).unwrap();
        let loaded = store.load_key("id").unwrap().unwrap();

        assert_eq!(loaded.as_ref(), &[0xF0; 4]);

        store.clear().unwrap();
    }

    #[test]
    fn processor_failure_stores_nothing() {
        let store = temp_store().with_processor(Arc::new(|_, _| {
            Err(HlsError::KeyProcessing("bad wrapping".to_string()))
        }));

        assert!(store.store_key("id", &[1, 2, 3]).is_err());
        assert_eq!(store.statistics().entry_count, 0);

        store.clear().unwrap();
    }
}
