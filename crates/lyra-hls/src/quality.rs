//! Quality tiers and stream selection over a parsed master playlist.

use crate::playlist::{MasterPlaylist, StreamInfo};

/// Fraction of the measured bandwidth a stream may consume; the headroom
/// avoids immediate rebuffering after selection.
pub const BANDWIDTH_SAFETY_MARGIN: f64 = 0.8;

/// Quality tiers in ascending order.
///
/// Streams map to a tier by their derived height; unknown height maps to
/// [`QualityLevel::Sd`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QualityLevel {
    /// Below 720p.
    Sd,
    /// 720p up to (excluding) 1080p.
    Hd,
    /// 1080p up to (excluding) 2160p.
    Fhd,
    /// 2160p and above.
    Uhd,
}

impl QualityLevel {
    /// All tiers, ascending.
    pub const ALL: [QualityLevel; 4] = [
        QualityLevel::Sd,
        QualityLevel::Hd,
        QualityLevel::Fhd,
        QualityLevel::Uhd,
    ];

    /// Tier for a stream height in pixels.
    pub fn from_height(height: u32) -> Self {
        match height {
            0..720 => QualityLevel::Sd,
            720..1080 => QualityLevel::Hd,
            1080..2160 => QualityLevel::Fhd,
            _ => QualityLevel::Uhd,
        }
    }
}

impl std::fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            QualityLevel::Sd => "SD",
            QualityLevel::Hd => "HD",
            QualityLevel::Fhd => "FHD",
            QualityLevel::Uhd => "UHD",
        };
        f.write_str(label)
    }
}

/// Pick a stream for the preferred tier.
///
/// Falls back by walking tiers outward from the requested one: exact tier
/// first, then lower tiers nearest-first, then higher tiers nearest-first.
/// Within a tier the highest bandwidth wins. Returns `None` only when the
/// playlist has no streams at all.
pub fn select_for_quality<'a>(
    preferred: QualityLevel,
    master: &'a MasterPlaylist,
) -> Option<&'a StreamInfo> {
    let preferred_idx = QualityLevel::ALL
        .iter()
        .position(|tier| *tier == preferred)
        .unwrap_or(0);

    let best_in_tier = |tier: QualityLevel| {
        master
            .streams
            .iter()
            .filter(|stream| stream.quality_level() == tier)
            .max_by_key(|stream| stream.bandwidth)
    };

    if let Some(stream) = best_in_tier(preferred) {
        return Some(stream);
    }
    for idx in (0..preferred_idx).rev() {
        if let Some(stream) = best_in_tier(QualityLevel::ALL[idx]) {
            return Some(stream);
        }
    }
    for tier in &QualityLevel::ALL[preferred_idx + 1..] {
        if let Some(stream) = best_in_tier(*tier) {
            return Some(stream);
        }
    }
    None
}

/// Pick the best stream for the measured bandwidth.
///
/// Candidates must fit within `available_bandwidth * 0.8`; among those a
/// match on `preferred_resolution` beats pure bandwidth ranking, otherwise
/// the highest bandwidth wins. When nothing fits the budget the
/// lowest-bandwidth stream is returned rather than failing playback.
pub fn select_optimal<'a>(
    available_bandwidth: u64,
    preferred_resolution: Option<&str>,
    master: &'a MasterPlaylist,
) -> Option<&'a StreamInfo> {
    if master.streams.is_empty() {
        return None;
    }

    let budget = (available_bandwidth as f64 * BANDWIDTH_SAFETY_MARGIN) as u64;
    let survivors: Vec<&StreamInfo> = master
        .streams
        .iter()
        .filter(|stream| stream.bandwidth <= budget)
        .collect();

    if survivors.is_empty() {
        return master.streams.iter().min_by_key(|stream| stream.bandwidth);
    }

    if let Some(resolution) = preferred_resolution
        && let Some(stream) = survivors
            .iter()
            .copied()
            .filter(|stream| stream.resolution == resolution)
            .max_by_key(|stream| stream.bandwidth)
    {
        return Some(stream);
    }

    survivors.into_iter().max_by_key(|stream| stream.bandwidth)
}

/// Tiers actually present in the playlist, ascending and deduplicated.
pub fn available_quality_levels(master: &MasterPlaylist) -> Vec<QualityLevel> {
    let mut levels: Vec<QualityLevel> = master
        .streams
        .iter()
        .map(StreamInfo::quality_level)
        .collect();
    levels.sort();
    levels.dedup();
    levels
}

/// True iff at least one stream maps to the given tier.
pub fn is_quality_available(level: QualityLevel, master: &MasterPlaylist) -> bool {
    master
        .streams
        .iter()
        .any(|stream| stream.quality_level() == level)
}
