//! Parsed playlist value types.
//!
//! These are pure data, immutable after parsing completes; the parser in
//! [`crate::parsing`] is the only producer.

use std::collections::HashMap;
use std::time::Duration;

use crate::quality::QualityLevel;

/// Decryption parameters from an `#EXT-X-KEY` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionInfo {
    /// The encryption method, e.g. `"AES-128"` or `"NONE"`.
    pub method: String,
    /// Key URI, resolved against the playlist's base URL.
    pub uri: String,
    /// Initialization vector as a hex string, if specified.
    pub iv: Option<String>,
    /// Key format, e.g. `"identity"`.
    pub key_format: String,
}

/// One media segment entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentInfo {
    /// Duration from the `#EXTINF` tag.
    pub duration: Duration,
    /// Absolute segment URL, resolved against the base URL.
    pub url: String,
    /// Media sequence number (declared sequence + emission index).
    pub sequence: u64,
}

/// Declared playlist type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaylistType {
    Vod,
    Live,
    #[default]
    Unspecified,
}

/// Parsed media playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaPlaylist {
    pub version: u32,
    pub target_duration: Duration,
    pub playlist_type: PlaylistType,
    /// Encryption context for the playlist's segments.
    ///
    /// A single context per playlist: when `#EXT-X-KEY` appears more than
    /// once, the last one wins. Mid-stream key rotation is intentionally
    /// not representable; key-request handling assumes one key context
    /// per playlist.
    pub encryption: Option<EncryptionInfo>,
    /// Segments in source order.
    pub segments: Vec<SegmentInfo>,
    /// True iff `#EXT-X-ENDLIST` was seen.
    pub end_list: bool,
}

impl MediaPlaylist {
    /// Sum of all segment durations. Recomputed on every call.
    pub fn total_duration(&self) -> Duration {
        self.segments.iter().map(|s| s.duration).sum()
    }
}

/// One variant stream entry from a master playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    /// Peak bandwidth in bits per second.
    pub bandwidth: u64,
    /// Average bandwidth in bits per second (0 when absent).
    pub average_bandwidth: u64,
    /// Raw `CODECS` attribute value.
    pub codecs: String,
    /// Raw `RESOLUTION` attribute value, e.g. `"1920x1080"`.
    pub resolution: String,
    /// Width parsed from `resolution`; 0 when absent or malformed.
    pub width: u32,
    /// Height parsed from `resolution`; 0 when absent or malformed.
    pub height: u32,
    /// Frame rate (0.0 when absent).
    pub frame_rate: f64,
    /// Raw `CLOSED-CAPTIONS` attribute value.
    pub closed_captions: String,
    /// Absolute media-playlist URL for this variant.
    pub url: String,
}

impl StreamInfo {
    /// Quality tier derived from the stream's height.
    ///
    /// Unknown height (0) maps to the lowest tier as a conservative
    /// default rather than erroring.
    pub fn quality_level(&self) -> QualityLevel {
        QualityLevel::from_height(self.height)
    }
}

/// Parse a `WxH` resolution attribute into `(width, height)`.
///
/// Returns `(0, 0)` for absent or malformed input; selection logic treats
/// that as "unknown".
pub(crate) fn parse_resolution(resolution: &str) -> (u32, u32) {
    let mut parts = resolution.splitn(2, ['x', 'X']);
    let width = parts.next().and_then(|w| w.trim().parse::<u32>().ok());
    let height = parts.next().and_then(|h| h.trim().parse::<u32>().ok());
    match (width, height) {
        (Some(w), Some(h)) => (w, h),
        _ => (0, 0),
    }
}

/// Parsed master playlist.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MasterPlaylist {
    pub version: u32,
    /// Variant streams in appearance order.
    pub streams: Vec<StreamInfo>,
    /// Unrecognized master-level `#EXT-X-<NAME>:<value>` tags, keyed by
    /// `<NAME>`. Open extension point with no fixed schema.
    pub metadata: HashMap<String, String>,
    /// True iff `#EXT-X-INDEPENDENT-SEGMENTS` was seen.
    pub has_independent_segments: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_resolution_handles_well_formed_input() {
        assert_eq!(parse_resolution("1920x1080"), (1920, 1080));
        assert_eq!(parse_resolution("1280X720"), (1280, 720));
    }

    #[test]
    fn parse_resolution_is_zero_for_malformed_input() {
        assert_eq!(parse_resolution(""), (0, 0));
        assert_eq!(parse_resolution("1920"), (0, 0));
        assert_eq!(parse_resolution("widexhigh"), (0, 0));
        assert_eq!(parse_resolution("1920x"), (0, 0));
    }

    #[test]
    fn total_duration_is_sum_of_segments() {
        let playlist = MediaPlaylist {
            version: 3,
            target_duration: Duration::from_secs(10),
            playlist_type: PlaylistType::Vod,
            encryption: None,
            segments: vec![
                SegmentInfo {
                    duration: Duration::from_secs_f64(9.009),
                    url: "a.ts".into(),
                    sequence: 0,
                },
                SegmentInfo {
                    duration: Duration::from_secs_f64(8.341),
                    url: "b.ts".into(),
                    sequence: 1,
                },
            ],
            end_list: true,
        };

        let total = playlist.total_duration().as_secs_f64();
        assert!((total - 17.35).abs() < 1e-9);
    }

    #[test]
    fn total_duration_is_zero_for_empty_playlist() {
        let playlist = MediaPlaylist {
            version: 3,
            target_duration: Duration::ZERO,
            playlist_type: PlaylistType::Unspecified,
            encryption: None,
            segments: Vec::new(),
            end_list: false,
        };
        assert_eq!(playlist.total_duration(), Duration::ZERO);
    }
}
