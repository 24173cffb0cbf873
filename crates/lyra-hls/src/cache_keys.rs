#![forbid(unsafe_code)]

//! Deterministic cache-key derivation for playlist payloads.
//!
//! The key is a function of both the playlist URL and the caller's auth
//! token: the same URL under different tokens must never collide and never
//! surface another tenant's cached content. This module only derives keys;
//! it performs no I/O.

use sha2::{Digest, Sha256};

/// Derive the cache key for a playlist fetched as `url` under `auth_token`.
///
/// Fields are length-prefixed before hashing so distinct `(url, token)`
/// pairs can never produce the same digest input.
pub fn playlist_cache_key(url: &str, auth_token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update((url.len() as u64).to_be_bytes());
    hasher.update(url.as_bytes());
    hasher.update((auth_token.len() as u64).to_be_bytes());
    hasher.update(auth_token.as_bytes());
    hex::encode(hasher.finalize())
}
