#![forbid(unsafe_code)]

//! Dual-grammar M3U8 parsing.
//!
//! Line-oriented scan over playlist text. The grammar is tag-driven:
//! `#EXT-X-STREAM-INF` entries make a master playlist, `#EXTINF` entries a
//! media playlist. A directive's attributes associate with the next
//! non-blank, non-comment URI line. Unrecognized tags are ignored for
//! forward compatibility.
//!
//! Parsing never exposes a partially built playlist: each entry point
//! returns either a complete value or a [`ParseError`].

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{HlsError, HlsResult, ParseError};
use crate::playlist::{
    EncryptionInfo, MasterPlaylist, MediaPlaylist, PlaylistType, SegmentInfo, StreamInfo,
    parse_resolution,
};

const TAG_STREAM_INF: &str = "#EXT-X-STREAM-INF:";
const TAG_EXTINF: &str = "#EXTINF:";
const TAG_VERSION: &str = "#EXT-X-VERSION:";
const TAG_TARGET_DURATION: &str = "#EXT-X-TARGETDURATION:";
const TAG_MEDIA_SEQUENCE: &str = "#EXT-X-MEDIA-SEQUENCE:";
const TAG_PLAYLIST_TYPE: &str = "#EXT-X-PLAYLIST-TYPE:";
const TAG_KEY: &str = "#EXT-X-KEY:";
const TAG_END_LIST: &str = "#EXT-X-ENDLIST";
const TAG_INDEPENDENT_SEGMENTS: &str = "#EXT-X-INDEPENDENT-SEGMENTS";

/// Parse master playlist text into a [`MasterPlaylist`].
///
/// Relative stream URIs are resolved against `base_url`.
pub fn parse_master_playlist(content: &str, base_url: &Url) -> Result<MasterPlaylist, ParseError> {
    if content.trim().is_empty() {
        return Err(ParseError::EmptyContent);
    }

    let mut master = MasterPlaylist::default();
    // Attributes of an #EXT-X-STREAM-INF waiting for its URI line.
    let mut pending: Option<PendingTag> = None;

    for (idx, raw_line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix(TAG_STREAM_INF) {
            if let Some(tag) = pending.take() {
                return Err(tag.missing_uri());
            }
            let attrs = parse_attribute_list(rest, line_no, line)?;
            pending = Some(PendingTag::new(attrs, line_no, line));
            continue;
        }

        if line.starts_with("#EXT") {
            // The URI must be the next non-blank, non-comment line; another
            // directive in its place means the URI is missing.
            if let Some(tag) = pending.take() {
                return Err(tag.missing_uri());
            }
            if let Some(rest) = line.strip_prefix(TAG_VERSION) {
                master.version = rest.trim().parse().unwrap_or(0);
            } else if line == TAG_INDEPENDENT_SEGMENTS {
                master.has_independent_segments = true;
            } else if let Some(rest) = line.strip_prefix("#EXT-X-")
                && let Some((name, value)) = rest.split_once(':')
            {
                master.metadata.insert(name.to_string(), value.to_string());
            }
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        if let Some(tag) = pending.take() {
            master
                .streams
                .push(stream_from_attrs(&tag.attrs, line, base_url));
        }
        // URI lines without a preceding directive are ignored.
    }

    if let Some(tag) = pending {
        return Err(tag.missing_uri());
    }

    if master.streams.is_empty() {
        let (line, text) = first_nonblank_line(content);
        return Err(ParseError::UnsupportedGrammar { line, text });
    }

    Ok(master)
}

/// Parse media playlist text into a [`MediaPlaylist`].
///
/// Segment URIs and the key URI are resolved against `base_url`. Segment
/// sequence numbers start at the declared `#EXT-X-MEDIA-SEQUENCE`
/// (default 0) and increment per emitted segment.
pub fn parse_media_playlist(content: &str, base_url: &Url) -> Result<MediaPlaylist, ParseError> {
    if content.trim().is_empty() {
        return Err(ParseError::EmptyContent);
    }

    let mut version = 0u32;
    let mut target_duration = Duration::ZERO;
    let mut playlist_type = PlaylistType::Unspecified;
    let mut encryption: Option<EncryptionInfo> = None;
    let mut segments: Vec<SegmentInfo> = Vec::new();
    let mut end_list = false;
    let mut media_sequence = 0u64;
    let mut saw_extinf = false;
    // Duration of an #EXTINF waiting for its URI line.
    let mut pending: Option<(Duration, usize, String)> = None;

    for (idx, raw_line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix(TAG_EXTINF) {
            if let Some((_, tag_line, tag_text)) = pending.take() {
                return Err(ParseError::MissingUriAfterTag {
                    line: tag_line,
                    text: tag_text,
                });
            }
            saw_extinf = true;
            let duration_field = rest.split(',').next().unwrap_or("").trim();
            let seconds = duration_field.parse::<f64>().unwrap_or(0.0);
            pending = Some((
                Duration::from_secs_f64(seconds.max(0.0)),
                line_no,
                line.to_string(),
            ));
            continue;
        }

        if line.starts_with("#EXT") {
            if let Some(rest) = line.strip_prefix(TAG_VERSION) {
                version = rest.trim().parse().unwrap_or(0);
            } else if let Some(rest) = line.strip_prefix(TAG_TARGET_DURATION) {
                let seconds = rest.trim().parse::<f64>().unwrap_or(0.0);
                target_duration = Duration::from_secs_f64(seconds.max(0.0));
            } else if let Some(rest) = line.strip_prefix(TAG_MEDIA_SEQUENCE) {
                media_sequence = rest.trim().parse().unwrap_or(0);
            } else if let Some(rest) = line.strip_prefix(TAG_PLAYLIST_TYPE) {
                playlist_type = match rest.trim() {
                    "VOD" => PlaylistType::Vod,
                    "LIVE" => PlaylistType::Live,
                    _ => PlaylistType::Unspecified,
                };
            } else if let Some(rest) = line.strip_prefix(TAG_KEY) {
                let attrs = parse_attribute_list(rest, line_no, line)?;
                // A single encryption context per playlist: the last
                // #EXT-X-KEY wins for the whole playlist.
                encryption = Some(encryption_from_attrs(&attrs, base_url));
            } else if line == TAG_END_LIST {
                end_list = true;
            }
            // Other directives are ignored, including ones appearing
            // between an #EXTINF and its URI line.
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        if let Some((duration, _, _)) = pending.take() {
            let sequence = media_sequence + segments.len() as u64;
            segments.push(SegmentInfo {
                duration,
                url: resolve_reference(base_url, line),
                sequence,
            });
        }
    }

    if let Some((_, tag_line, tag_text)) = pending {
        return Err(ParseError::MissingUriAfterTag {
            line: tag_line,
            text: tag_text,
        });
    }

    if !saw_extinf {
        let (line, text) = first_nonblank_line(content);
        return Err(ParseError::UnsupportedGrammar { line, text });
    }

    Ok(MediaPlaylist {
        version,
        target_duration,
        playlist_type,
        encryption,
        segments,
        end_list,
    })
}

/// Async master-playlist parse. The synchronous algorithm runs on a
/// blocking worker; the result is delivered exactly once.
///
/// Cancellation is cooperative: once the token fires, `Cancelled` is
/// returned and the in-flight computation's result is discarded; the
/// computation itself is not interrupted.
pub async fn parse_master_playlist_async(
    content: String,
    base_url: Url,
    cancel: Option<CancellationToken>,
) -> HlsResult<MasterPlaylist> {
    let task = tokio::task::spawn_blocking(move || parse_master_playlist(&content, &base_url));
    run_parse_task(task, cancel).await
}

/// Async media-playlist parse; same semantics as
/// [`parse_master_playlist_async`].
pub async fn parse_media_playlist_async(
    content: String,
    base_url: Url,
    cancel: Option<CancellationToken>,
) -> HlsResult<MediaPlaylist> {
    let task = tokio::task::spawn_blocking(move || parse_media_playlist(&content, &base_url));
    run_parse_task(task, cancel).await
}

async fn run_parse_task<T: Send + 'static>(
    task: tokio::task::JoinHandle<Result<T, ParseError>>,
    cancel: Option<CancellationToken>,
) -> HlsResult<T> {
    match cancel {
        Some(token) => tokio::select! {
            // Acknowledged cancellation always wins over a ready result.
            biased;
            _ = token.cancelled() => Err(HlsError::Cancelled),
            joined = task => finish_parse_task(joined),
        },
        None => finish_parse_task(task.await),
    }
}

fn finish_parse_task<T>(
    joined: Result<Result<T, ParseError>, tokio::task::JoinError>,
) -> HlsResult<T> {
    match joined {
        Ok(result) => result.map_err(HlsError::from),
        Err(join_error) => Err(HlsError::Task(join_error.to_string())),
    }
}

struct PendingTag {
    attrs: Vec<(String, String)>,
    line: usize,
    text: String,
}

impl PendingTag {
    fn new(attrs: Vec<(String, String)>, line: usize, text: &str) -> Self {
        PendingTag {
            attrs,
            line,
            text: text.to_string(),
        }
    }

    fn missing_uri(self) -> ParseError {
        ParseError::MissingUriAfterTag {
            line: self.line,
            text: self.text,
        }
    }
}

/// Parse a `KEY=value,KEY="quoted,value"` attribute list.
///
/// Commas inside quoted values are not delimiters. An unterminated quote
/// is a [`ParseError::MalformedAttributeList`].
fn parse_attribute_list(
    input: &str,
    line: usize,
    raw: &str,
) -> Result<Vec<(String, String)>, ParseError> {
    let malformed = || ParseError::MalformedAttributeList {
        line,
        text: raw.to_string(),
    };

    let mut attrs = Vec::new();
    let mut rest = input.trim();

    while !rest.is_empty() {
        let Some(eq) = rest.find('=') else {
            return Err(malformed());
        };
        let key = rest[..eq].trim().to_string();
        let after = &rest[eq + 1..];

        let (value, remaining) = if let Some(quoted) = after.strip_prefix('"') {
            let Some(close) = quoted.find('"') else {
                return Err(malformed());
            };
            let tail = quoted[close + 1..].trim_start();
            let tail = tail.strip_prefix(',').unwrap_or(tail);
            (quoted[..close].to_string(), tail)
        } else {
            match after.find(',') {
                Some(comma) => (after[..comma].trim().to_string(), &after[comma + 1..]),
                None => (after.trim().to_string(), ""),
            }
        };

        attrs.push((key, value));
        rest = remaining.trim_start();
    }

    Ok(attrs)
}

fn attr<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

fn stream_from_attrs(attrs: &[(String, String)], uri: &str, base_url: &Url) -> StreamInfo {
    let resolution = attr(attrs, "RESOLUTION").unwrap_or_default().to_string();
    let (width, height) = parse_resolution(&resolution);

    StreamInfo {
        bandwidth: attr(attrs, "BANDWIDTH")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0),
        average_bandwidth: attr(attrs, "AVERAGE-BANDWIDTH")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0),
        codecs: attr(attrs, "CODECS").unwrap_or_default().to_string(),
        resolution,
        width,
        height,
        frame_rate: attr(attrs, "FRAME-RATE")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0),
        closed_captions: attr(attrs, "CLOSED-CAPTIONS")
            .unwrap_or_default()
            .to_string(),
        url: resolve_reference(base_url, uri),
    }
}

fn encryption_from_attrs(attrs: &[(String, String)], base_url: &Url) -> EncryptionInfo {
    EncryptionInfo {
        method: attr(attrs, "METHOD").unwrap_or("NONE").to_string(),
        uri: attr(attrs, "URI")
            .map(|uri| resolve_reference(base_url, uri))
            .unwrap_or_default(),
        iv: attr(attrs, "IV").map(str::to_string),
        key_format: attr(attrs, "KEYFORMAT").unwrap_or("identity").to_string(),
    }
}

/// Resolve a playlist reference against the base URL. Absolute references
/// pass through; unresolvable ones are kept verbatim.
fn resolve_reference(base: &Url, reference: &str) -> String {
    match base.join(reference) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => reference.to_string(),
    }
}

fn first_nonblank_line(content: &str) -> (usize, String) {
    content
        .lines()
        .enumerate()
        .find(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| (idx + 1, line.trim().to_string()))
        .unwrap_or((1, String::new()))
}
