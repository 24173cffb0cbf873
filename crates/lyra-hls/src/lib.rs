#![forbid(unsafe_code)]

//! Encrypted-HLS core: playlist parsing, quality selection, and
//! playlist/key caching.
//!
//! The crate is transport-agnostic: callers fetch playlist text and key
//! bytes themselves and hand them in; this crate parses, selects, and
//! caches. See [`parsing`] for the M3U8 grammar, [`quality`] for stream
//! selection, and [`keys`] plus [`lyra_cache`] for persistence.

pub mod auth;
pub mod cache_keys;
pub mod error;
pub mod keys;
pub mod parsing;
pub mod playlist;
pub mod quality;

pub use auth::AuthConfig;
pub use cache_keys::playlist_cache_key;
pub use error::{HlsError, HlsResult, ParseError};
pub use keys::{KeyContext, KeyProcessor, KeyStore};
pub use parsing::{
    parse_master_playlist, parse_master_playlist_async, parse_media_playlist,
    parse_media_playlist_async,
};
pub use playlist::{
    EncryptionInfo, MasterPlaylist, MediaPlaylist, PlaylistType, SegmentInfo, StreamInfo,
};
pub use quality::{
    BANDWIDTH_SAFETY_MARGIN, QualityLevel, available_quality_levels, is_quality_available,
    select_for_quality, select_optimal,
};

// Re-export the cache crate so downstream users configure one stack.
pub use lyra_cache::{CacheOptions, CacheStatistics, DiskCache, SweepStats};
