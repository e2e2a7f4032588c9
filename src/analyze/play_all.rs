//! Play-All playlist detection (§4.3.3).

use std::collections::HashSet;

use crate::model::{Playlist, SegmentKey};

const LONG_ITEM_MIN_S: f64 = 600.0;

/// A playlist is a Play-All candidate when it has at least two play items
/// and any of:
///
/// (a) its segment-key set is a strict superset of another playlist's
///     non-empty segment-key set,
/// (b) it contains at least two play items that, taken alone, are the sole
///     play item of some other playlist,
/// (c) it contains at least two play items longer than ten minutes.
pub fn detect_play_all(playlists: &[Playlist], quant_ms: f64) -> Vec<String> {
    if playlists.len() < 2 {
        return Vec::new();
    }

    let single_item_segments: HashSet<SegmentKey> = playlists
        .iter()
        .filter(|p| p.play_items.len() == 1)
        .map(|p| p.play_items[0].segment_key(quant_ms))
        .collect();

    let mut result = Vec::new();
    for pl in playlists {
        if pl.play_items.len() < 2 {
            continue;
        }
        let my_keys: HashSet<SegmentKey> =
            pl.play_items.iter().map(|pi| pi.segment_key(quant_ms)).collect();

        let is_superset = playlists.iter().any(|other| {
            if other.mpls == pl.mpls || other.play_items.is_empty() {
                return false;
            }
            let other_keys: HashSet<SegmentKey> =
                other.play_items.iter().map(|pi| pi.segment_key(quant_ms)).collect();
            other_keys.is_subset(&my_keys) && other_keys != my_keys
        });

        let contained_singles = pl
            .play_items
            .iter()
            .filter(|pi| single_item_segments.contains(&pi.segment_key(quant_ms)))
            .count();

        let long_items = pl.play_items.iter().filter(|pi| pi.duration_s() > LONG_ITEM_MIN_S).count();

        if is_superset || contained_singles >= 2 || long_items >= 2 {
            result.push(pl.mpls.clone());
        }
    }

    result
}
