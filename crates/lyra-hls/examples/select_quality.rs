//! Parse a master + media playlist, pick a variant, and cache the results.
//!
//! Run with `RUST_LOG=lyra_hls=debug,lyra_cache=debug` to watch cache
//! hit/miss and eviction decisions.

use std::error::Error;

use lyra_hls::{
    AuthConfig, CacheOptions, DiskCache, KeyStore, QualityLevel, available_quality_levels,
    parse_master_playlist, parse_media_playlist, playlist_cache_key, select_for_quality,
    select_optimal,
};
use tracing_subscriber::EnvFilter;
use url::Url;

const MASTER: &str = "#EXTM3U\n\
                      #EXT-X-VERSION:4\n\
                      #EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=1280x720\n\
                      720p.m3u8\n\
                      #EXT-X-STREAM-INF:BANDWIDTH=3000000,RESOLUTION=1920x1080\n\
                      1080p.m3u8\n";

const MEDIA: &str = "#EXTM3U\n\
                     #EXT-X-TARGETDURATION:10\n\
                     #EXT-X-PLAYLIST-TYPE:VOD\n\
                     #EXT-X-KEY:METHOD=AES-128,URI=\"keys/k1.bin\",IV=0x9c7db8778570d05c3177c349fd9236aa\n\
                     #EXTINF:9.009,\n\
                     seg0.ts\n\
                     #EXTINF:8.341,\n\
                     seg1.ts\n\
                     #EXT-X-ENDLIST\n";

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("lyra_hls=debug,lyra_cache=debug")),
        )
        .init();

    let base_url = Url::parse("https://cdn.example.com/vod/master.m3u8")?;
    let auth = AuthConfig::new("demo-token");

    let master = parse_master_playlist(MASTER, &base_url)?;
    println!("available tiers: {:?}", available_quality_levels(&master));

    let hd = select_for_quality(QualityLevel::Hd, &master).expect("non-empty playlist");
    println!("HD pick: {} ({} bit/s)", hd.url, hd.bandwidth);

    let fitted = select_optimal(2_500_000, None, &master).expect("non-empty playlist");
    println!("2.5 Mbit/s pick: {} ({} bit/s)", fitted.url, fitted.bandwidth);

    let media_url = Url::parse(&fitted.url)?;
    let media = parse_media_playlist(MEDIA, &media_url)?;
    println!(
        "{} segments, {:.3}s total, key uri: {:?}",
        media.segments.len(),
        media.total_duration().as_secs_f64(),
        media.encryption.as_ref().map(|k| k.uri.as_str())
    );

    // Cache the playlist body under (url, token) and the key under its URI.
    let cache_root = std::env::temp_dir().join("lyra-demo-cache");
    let cache = DiskCache::open(CacheOptions::default().with_root_dir(&cache_root))?;
    cache.put(
        &playlist_cache_key(base_url.as_str(), &auth.encrypt_token),
        MASTER.as_bytes(),
    )?;

    let keys = KeyStore::open(
        KeyStore::default_options().with_root_dir(cache_root.join("keys")),
    )?;
    if let Some(key) = &media.encryption {
        keys.store_key(&key.uri, &[0u8; 16])?;
    }

    println!("cache stats: {:?}", cache.statistics());
    println!("key store stats: {:?}", keys.statistics());
    Ok(())
}
