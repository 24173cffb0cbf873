//! End-to-end scenarios: parse -> select -> cache.

use std::time::Duration;

use lyra_hls::{
    CacheOptions, DiskCache, ParseError, QualityLevel, parse_master_playlist,
    parse_master_playlist_async, parse_media_playlist, parse_media_playlist_async,
    playlist_cache_key, select_for_quality, select_optimal,
};
use tokio_util::sync::CancellationToken;
use url::Url;

fn base_url() -> Url {
    Url::parse("https://cdn.example.com/vod/master.m3u8").unwrap()
}

const TWO_VARIANT_MASTER: &str = "#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=1280x720\n\
                                  low.m3u8\n\
                                  #EXT-X-STREAM-INF:BANDWIDTH=3000000,RESOLUTION=1920x1080\n\
                                  high.m3u8\n";

#[test]
fn two_variant_scenario_selects_the_720p_stream() {
    let master = parse_master_playlist(TWO_VARIANT_MASTER, &base_url()).unwrap();

    assert_eq!(master.streams.len(), 2);
    assert_eq!(master.streams[0].height, 720);
    assert_eq!(master.streams[1].height, 1080);

    let for_hd = select_for_quality(QualityLevel::Hd, &master).unwrap();
    assert_eq!(for_hd.bandwidth, 800_000);
    assert_eq!(for_hd.resolution, "1280x720");

    // 1080p exceeds the safety-margin budget at 2.5 Mbit/s.
    let optimal = select_optimal(2_500_000, None, &master).unwrap();
    assert_eq!(optimal.bandwidth, 800_000);
}

#[test]
fn stream_count_matches_stream_inf_count_in_source_order() {
    let bandwidths = [400_000u64, 800_000, 1_600_000, 3_200_000, 6_400_000];
    let mut content = String::from("#EXTM3U\n");
    for bandwidth in bandwidths {
        content.push_str(&format!(
            "#EXT-X-STREAM-INF:BANDWIDTH={bandwidth}\nv{bandwidth}.m3u8\n"
        ));
    }

    let master = parse_master_playlist(&content, &base_url()).unwrap();

    assert_eq!(master.streams.len(), bandwidths.len());
    for (stream, bandwidth) in master.streams.iter().zip(bandwidths) {
        assert_eq!(stream.bandwidth, bandwidth);
    }
}

#[test]
fn media_total_duration_is_exact_segment_sum() {
    let durations = [9.009, 9.009, 8.342, 4.75];
    let mut content = String::from("#EXTM3U\n#EXT-X-TARGETDURATION:10\n");
    for (idx, duration) in durations.iter().enumerate() {
        content.push_str(&format!("#EXTINF:{duration},\nseg{idx}.ts\n"));
    }
    content.push_str("#EXT-X-ENDLIST\n");

    let media = parse_media_playlist(&content, &base_url()).unwrap();

    assert_eq!(media.segments.len(), durations.len());
    assert!(media.end_list);
    let expected: f64 = durations.iter().sum();
    assert!((media.total_duration().as_secs_f64() - expected).abs() < 1e-6);
}

#[test]
fn parse_errors_carry_line_and_text() {
    let content = "#EXTM3U\n#EXT-X-STREAM-INF:CODECS=\"oops\nv.m3u8\n";
    match parse_master_playlist(content, &base_url()) {
        Err(ParseError::MalformedAttributeList { line, text }) => {
            assert_eq!(line, 2);
            assert!(text.starts_with("#EXT-X-STREAM-INF:"));
        }
        other => panic!("expected MalformedAttributeList, got {other:?}"),
    }
}

#[test]
fn cached_playlists_are_isolated_per_auth_token() {
    let dir = std::env::temp_dir().join(format!("lyra-hls-test-{}", uuid::Uuid::new_v4()));
    let cache = DiskCache::open(CacheOptions::default().with_root_dir(&dir)).unwrap();

    let url = "https://cdn.example.com/vod/master.m3u8";
    cache
        .put(&playlist_cache_key(url, "token-a"), TWO_VARIANT_MASTER.as_bytes())
        .unwrap();

    // Same URL under a different token must be a miss.
    assert!(
        cache
            .get(&playlist_cache_key(url, "token-b"))
            .unwrap()
            .is_none()
    );

    let hit = cache
        .get(&playlist_cache_key(url, "token-a"))
        .unwrap()
        .unwrap();
    assert_eq!(hit, TWO_VARIANT_MASTER.as_bytes());

    let stats = cache.statistics();
    assert_eq!(stats.hit_count, 1);
    assert_eq!(stats.miss_count, 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn put_then_get_scenario_counts_one_hit() {
    let dir = std::env::temp_dir().join(format!("lyra-hls-test-{}", uuid::Uuid::new_v4()));
    let cache = DiskCache::open(CacheOptions::default().with_root_dir(&dir)).unwrap();

    let key = playlist_cache_key("u", "t");
    cache.put(&key, b"#EXTM3U\n").unwrap();

    assert_eq!(cache.get(&key).unwrap().unwrap(), b"#EXTM3U\n");
    assert_eq!(cache.statistics().hit_count, 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn async_parse_delivers_the_sync_result() {
    let master = parse_master_playlist_async(
        TWO_VARIANT_MASTER.to_string(),
        base_url(),
        None,
    )
    .await
    .unwrap();

    assert_eq!(master.streams.len(), 2);

    let media = parse_media_playlist_async(
        "#EXTINF:4.0,\nseg0.ts\n".to_string(),
        base_url(),
        Some(CancellationToken::new()),
    )
    .await
    .unwrap();

    assert_eq!(media.segments.len(), 1);
    assert_eq!(media.segments[0].duration, Duration::from_secs(4));
}

#[tokio::test]
async fn cancelled_parse_is_not_delivered() {
    let token = CancellationToken::new();
    token.cancel();

    let result = parse_master_playlist_async(
        TWO_VARIANT_MASTER.to_string(),
        base_url(),
        Some(token),
    )
    .await;

    assert!(matches!(result, Err(lyra_hls::HlsError::Cancelled)));
}

#[tokio::test]
async fn async_parse_propagates_parse_errors() {
    let result = parse_master_playlist_async(String::new(), base_url(), None).await;

    assert!(matches!(
        result,
        Err(lyra_hls::HlsError::Parse(ParseError::EmptyContent))
    ));
}
