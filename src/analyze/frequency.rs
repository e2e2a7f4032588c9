//! Segment frequency map (§4.3.2).

use std::collections::HashMap;

use crate::model::{Playlist, SegmentKey};

/// Minimum duration (seconds) for a playlist to count towards the positional
/// (first/last/second-to-last item) frequency maps, which feed OP/ED labeling.
pub const EPISODE_LENGTH_MIN_S: f64 = 600.0;

/// How often each segment key occurs across the working playlist set, plus
/// how often it occurs as a playlist's first, last, or second-to-last play
/// item among playlists at least [`EPISODE_LENGTH_MIN_S`] long.
#[derive(Debug, Clone, Default)]
pub struct SegmentFrequency {
    pub freq: HashMap<SegmentKey, usize>,
    pub first_item: HashMap<SegmentKey, usize>,
    pub last_item: HashMap<SegmentKey, usize>,
    pub second_last_item: HashMap<SegmentKey, usize>,
}

pub fn build_segment_frequency(playlists: &[Playlist], quant_ms: f64) -> SegmentFrequency {
    let mut sf = SegmentFrequency::default();

    for pl in playlists {
        for pi in &pl.play_items {
            *sf.freq.entry(pi.segment_key(quant_ms)).or_insert(0) += 1;
        }
    }

    for pl in playlists {
        if pl.duration_s() < EPISODE_LENGTH_MIN_S {
            continue;
        }
        if let Some(first) = pl.play_items.first() {
            *sf.first_item.entry(first.segment_key(quant_ms)).or_insert(0) += 1;
        }
        if let Some(last) = pl.play_items.last() {
            *sf.last_item.entry(last.segment_key(quant_ms)).or_insert(0) += 1;
        }
        if pl.play_items.len() >= 2 {
            let second_last = &pl.play_items[pl.play_items.len() - 2];
            *sf.second_last_item.entry(second_last.segment_key(quant_ms)).or_insert(0) += 1;
        }
    }

    sf
}
