//! Confidence refinement (§4.3.8): nudges episode confidence upward when
//! independent navigation evidence (index-title hints, IG chapter marks)
//! corroborates the ordering strategy's output.

use crate::hints::DiscHints;
use crate::model::{playlist_number_from_name, Episode, Playlist};

const HINT_BOOST: f64 = 0.1;
const IG_ALIGNMENT_BOOST: f64 = 0.1;
const CHAPTER_ALIGNMENT_TOLERANCE_MS: f64 = 500.0;

pub fn refine_confidence(episodes: &mut [Episode], playlists: &[Playlist], hints: &DiscHints) {
    if episodes.is_empty() {
        return;
    }

    let hinted = hints.hinted_playlist_numbers();
    for ep in episodes.iter_mut() {
        if let Some(num) = playlist_number_from_name(&ep.playlist) {
            if hinted.contains(&num) {
                ep.confidence = (ep.confidence + HINT_BOOST).min(1.0);
            }
        }
    }

    let Some(ig) = &hints.ig_menu else { return };
    if ig.register2_writes.len() < 2 {
        return;
    }

    let n = episodes.len();
    let mut leading: Vec<u32> = ig.register2_writes.clone();
    leading.sort_unstable();
    leading.truncate(n);

    let mut matched_indices = Vec::with_capacity(n);
    for ep in episodes.iter() {
        let Some(pl) = playlists.iter().find(|p| p.mpls == ep.playlist) else { return };
        let Some(start_ms) = ep.segments.first().map(|s| s.in_ms) else { return };
        match pl
            .marks
            .iter()
            .position(|m| (m.timestamp_ms() - start_ms).abs() <= CHAPTER_ALIGNMENT_TOLERANCE_MS)
        {
            Some(idx) => matched_indices.push(idx as u32),
            None => return,
        }
    }

    if matched_indices == leading {
        for ep in episodes.iter_mut() {
            ep.confidence = (ep.confidence + IG_ALIGNMENT_BOOST).min(1.0);
        }
    }
}
