//! Single-title-collapse guard (§4.3.7).
//!
//! Chapter splitting can over-segment a disc that really has exactly one
//! feature title plus a separately-titled digital archive: guard against
//! that by collapsing back to one whole-playlist episode when every
//! inferred episode came from the same playlist, that playlist is the only
//! one reachable from its index title, and some other title on the disc
//! points at a digital-archive playlist.

use std::collections::BTreeMap;

use crate::hints::DiscHints;
use crate::model::{playlist_number_from_name, Category, Episode, Playlist, SegmentRef};

pub fn apply_single_title_collapse(
    episodes: Vec<Episode>,
    playlists: &[Playlist],
    classifications: &BTreeMap<String, Category>,
    hints: &DiscHints,
    quant_ms: f64,
) -> Vec<Episode> {
    if episodes.len() < 2 {
        return episodes;
    }

    let first_playlist = episodes[0].playlist.clone();
    if !episodes.iter().all(|e| e.playlist == first_playlist) {
        return episodes;
    }

    let Some(playlist_num) = playlist_number_from_name(&first_playlist) else {
        return episodes;
    };

    let titles_for_playlist: Vec<u16> = hints
        .title_playlists
        .iter()
        .filter(|(_, nums)| nums.contains(&playlist_num))
        .map(|(title, _)| *title)
        .collect();
    if titles_for_playlist.len() != 1 {
        return episodes;
    }

    let has_other_title_pointing_at_archive = hints.title_playlists.iter().any(|(title, nums)| {
        if titles_for_playlist.contains(title) {
            return false;
        }
        nums.iter().any(|n| {
            classifications.iter().any(|(name, cat)| {
                *cat == Category::DigitalArchive && playlist_number_from_name(name) == Some(*n)
            })
        })
    });
    if !has_other_title_pointing_at_archive {
        return episodes;
    }

    let Some(pl) = playlists.iter().find(|p| p.mpls == first_playlist) else {
        return episodes;
    };

    let segments: Vec<SegmentRef> = pl
        .play_items
        .iter()
        .map(|pi| SegmentRef {
            key: pi.segment_key(quant_ms),
            clip_id: pi.clip_id.clone(),
            in_ms: pi.in_ms(),
            out_ms: pi.out_ms(),
            label: pi.label,
        })
        .collect();

    vec![Episode {
        episode: 1,
        playlist: pl.mpls.clone(),
        duration_ms: pl.duration_ms(),
        confidence: 0.85,
        segments,
        scenes: Vec::new(),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Label, PlayItem, SegmentRef};

    fn item(clip_id: &str, in_time: u32, out_time: u32) -> PlayItem {
        PlayItem {
            clip_id: clip_id.to_string(),
            in_time,
            out_time,
            connection_condition: 1,
            streams: Vec::new(),
            label: Label::Body,
        }
    }

    fn playlist(mpls: &str, items: Vec<PlayItem>) -> Playlist {
        Playlist {
            mpls: mpls.to_string(),
            play_items: items,
            marks: Vec::new(),
            multi_angle: false,
        }
    }

    fn fake_segment(clip_id: &str) -> SegmentRef {
        SegmentRef {
            key: crate::model::SegmentKey::Clip { clip_id: clip_id.to_string(), in_ms: 0, out_ms: 1000 },
            clip_id: clip_id.to_string(),
            in_ms: 0.0,
            out_ms: 1000.0,
            label: Label::Body,
        }
    }

    #[test]
    fn collapses_when_single_title_and_sibling_archive_title_exist() {
        let pls = vec![
            playlist("1.mpls", vec![item("main", 0, 45_000 * 3000)]),
            playlist("2.mpls", vec![item("archive", 0, 45_000 * 200)]),
        ];
        let episodes = vec![
            Episode { episode: 1, playlist: "1.mpls".to_string(), duration_ms: 1000.0, confidence: 0.6, segments: vec![fake_segment("main")], scenes: vec![] },
            Episode { episode: 2, playlist: "1.mpls".to_string(), duration_ms: 1000.0, confidence: 0.6, segments: vec![fake_segment("main")], scenes: vec![] },
        ];
        let mut classifications = BTreeMap::new();
        classifications.insert("1.mpls".to_string(), Category::Episode);
        classifications.insert("2.mpls".to_string(), Category::DigitalArchive);

        let mut hints = DiscHints::default();
        hints.title_playlists.insert(0, vec![1]);
        hints.title_playlists.insert(1, vec![2]);

        let result = apply_single_title_collapse(episodes, &pls, &classifications, &hints, 250.0);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].episode, 1);
        assert_eq!(result[0].playlist, "1.mpls");
    }

    #[test]
    fn leaves_multi_title_discs_untouched() {
        let pls = vec![playlist("1.mpls", vec![item("main", 0, 45_000 * 3000)])];
        let episodes = vec![
            Episode { episode: 1, playlist: "1.mpls".to_string(), duration_ms: 1000.0, confidence: 0.6, segments: vec![fake_segment("main")], scenes: vec![] },
            Episode { episode: 2, playlist: "1.mpls".to_string(), duration_ms: 1000.0, confidence: 0.6, segments: vec![fake_segment("main")], scenes: vec![] },
        ];
        let classifications = BTreeMap::new();
        let hints = DiscHints::default();
        let result = apply_single_title_collapse(episodes.clone(), &pls, &classifications, &hints, 250.0);
        assert_eq!(result, episodes);
    }
}
