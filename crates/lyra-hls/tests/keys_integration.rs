//! Key-store integration: persistence, TTL, and capacity behavior.

use std::time::Duration;

use lyra_hls::{CacheOptions, KeyStore};

fn temp_dir() -> std::path::PathBuf {
    std::env::temp_dir().join(format!("lyra-keys-it-{}", uuid::Uuid::new_v4()))
}

#[test]
fn keys_survive_a_reopen() {
    let dir = temp_dir();

    {
        let store = KeyStore::open(KeyStore::default_options().with_root_dir(&dir)).unwrap();
        store.store_key("asset/key-0", &[0xAA; 16]).unwrap();
    }

    let reopened = KeyStore::open(KeyStore::default_options().with_root_dir(&dir)).unwrap();
    let key = reopened.load_key("asset/key-0").unwrap().unwrap();
    assert_eq!(key.as_ref(), &[0xAA; 16]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn expired_keys_are_swept() {
    let dir = temp_dir();
    let options = KeyStore::default_options()
        .with_root_dir(&dir)
        .with_ttl(Duration::from_millis(60));
    let store = KeyStore::open(options).unwrap();

    store.store_key("short-lived", &[1; 16]).unwrap();
    assert!(store.is_valid("short-lived"));

    std::thread::sleep(Duration::from_millis(100));
    assert!(!store.is_valid("short-lived"));

    let sweep = store.invalidate_expired().unwrap();
    assert_eq!(sweep.removed, 1);
    assert_eq!(sweep.failed, 0);
    assert!(store.load_key("short-lived").unwrap().is_none());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn key_capacity_evicts_least_recently_used() {
    let dir = temp_dir();
    let options = KeyStore::default_options()
        .with_root_dir(&dir)
        .with_max_entries(2);
    let store = KeyStore::open(options).unwrap();

    store.store_key("first", &[1; 16]).unwrap();
    std::thread::sleep(Duration::from_millis(10));
    store.store_key("second", &[2; 16]).unwrap();
    std::thread::sleep(Duration::from_millis(10));

    // Refresh "first" so "second" is the LRU victim.
    store.load_key("first").unwrap();
    std::thread::sleep(Duration::from_millis(10));
    store.store_key("third", &[3; 16]).unwrap();

    assert_eq!(store.statistics().entry_count, 2);
    assert!(store.load_key("first").unwrap().is_some());
    assert!(store.load_key("second").unwrap().is_none());
    assert!(store.load_key("third").unwrap().is_some());

    let _ = std::fs::remove_dir_all(&dir);
}
