//! Special-feature extraction and menu-visibility inference (§4.3.9, §4.3.10).

use std::collections::{BTreeMap, HashSet};

use crate::hints::DiscHints;
use crate::model::{playlist_number_from_name, Category, Playlist, SpecialFeature};

const FALLBACK_VISIBLE_MAX_PLAYLIST: u32 = 1000;
const FALLBACK_VISIBLE_MIN_DURATION_MS: f64 = 15_000.0;

struct Candidate {
    playlist_num: u32,
    register2: Option<u32>,
    page_id: u16,
    button_id: u16,
    jump_title: u32,
}

/// Enumerate every non-episode, non-Play-All playlist reachable from a menu
/// button, in menu-visit order. Falls back to a plain classification-order
/// enumeration when the disc has no IG menu or no index title hints at all.
pub fn extract_special_features(
    playlists: &[Playlist],
    classifications: &BTreeMap<String, Category>,
    hints: &DiscHints,
) -> Vec<SpecialFeature> {
    if hints.ig_hints_raw.is_empty() || hints.title_playlists.is_empty() {
        return fallback_enumeration(playlists, classifications, hints);
    }

    let by_num: BTreeMap<u32, &Playlist> = playlists
        .iter()
        .filter_map(|pl| pl.playlist_number().map(|n| (n, pl)))
        .collect();

    let title_to_playlist = |title_1based: u32| -> Option<u32> {
        let title_0based = title_1based.checked_sub(1)?;
        hints.title_playlists.get(&(title_0based as u16)).and_then(|v| v.first().copied())
    };

    let mut candidates: Vec<Candidate> = Vec::new();
    for hint in &hints.ig_hints_raw {
        let Some(jump_title) = hint.jump_title else { continue };
        let Some(playlist_num) = title_to_playlist(jump_title) else { continue };
        let Some(pl) = by_num.get(&playlist_num) else { continue };
        let category = classifications.get(&pl.mpls).copied();
        if matches!(category, Some(Category::Episode) | Some(Category::PlayAll)) {
            continue;
        }
        candidates.push(Candidate {
            playlist_num,
            register2: hint.register(2),
            page_id: hint.page_id,
            button_id: hint.button_id,
            jump_title,
        });
    }

    let mut seen: HashSet<(u32, Option<u32>)> = HashSet::new();
    let mut deduped: Vec<Candidate> = Vec::new();
    for c in candidates {
        if seen.insert((c.playlist_num, c.register2)) {
            deduped.push(c);
        }
    }
    deduped.sort_by_key(|c| (c.page_id, c.button_id));

    let mut features = Vec::with_capacity(deduped.len());
    for (i, c) in deduped.iter().enumerate() {
        let pl = by_num[&c.playlist_num];
        let category = classifications.get(&pl.mpls).copied().unwrap_or(Category::Extra);

        let duration_ms = match c.register2 {
            None => pl.duration_ms(),
            Some(reg2) => {
                let next_chapter = deduped
                    .iter()
                    .filter(|o| o.jump_title == c.jump_title)
                    .filter_map(|o| o.register2)
                    .filter(|&r| r > reg2)
                    .min();
                let start_ms = pl.marks.get(reg2 as usize).map(|m| m.timestamp_ms()).unwrap_or(0.0);
                let end_ms = match next_chapter {
                    Some(next_idx) => {
                        pl.marks.get(next_idx as usize).map(|m| m.timestamp_ms()).unwrap_or_else(|| pl.duration_ms())
                    }
                    None => pl.duration_ms(),
                };
                (end_ms - start_ms).max(0.0)
            }
        };

        features.push(SpecialFeature {
            index: (i + 1) as u32,
            playlist: pl.mpls.clone(),
            duration_ms,
            category,
            chapter_start: c.register2,
            menu_visible: false,
        });
    }
    features
}

fn fallback_enumeration(
    playlists: &[Playlist],
    classifications: &BTreeMap<String, Category>,
    hints: &DiscHints,
) -> Vec<SpecialFeature> {
    let mut ordered_names: Vec<String> = Vec::new();
    for nums in hints.title_playlists.values() {
        for &n in nums {
            if let Some(pl) = playlists.iter().find(|p| p.playlist_number() == Some(n)) {
                if !ordered_names.contains(&pl.mpls) {
                    ordered_names.push(pl.mpls.clone());
                }
            }
        }
    }
    for pl in playlists {
        if !ordered_names.contains(&pl.mpls) {
            ordered_names.push(pl.mpls.clone());
        }
    }

    let mut features = Vec::new();
    for name in ordered_names {
        let category = classifications.get(&name).copied().unwrap_or(Category::Extra);
        if matches!(category, Category::Episode | Category::PlayAll) {
            continue;
        }
        let Some(pl) = playlists.iter().find(|p| p.mpls == name) else { continue };
        features.push(SpecialFeature {
            index: (features.len() + 1) as u32,
            playlist: name,
            duration_ms: pl.duration_ms(),
            category,
            chapter_start: None,
            menu_visible: false,
        });
    }
    features
}

fn rank_key(f: &SpecialFeature) -> (i32, i64, i64) {
    let playlist_num = playlist_number_from_name(&f.playlist).unwrap_or(u32::MAX);
    let mut score = 0;
    if playlist_num < FALLBACK_VISIBLE_MAX_PLAYLIST {
        score += 2;
    }
    if f.duration_ms >= FALLBACK_VISIBLE_MIN_DURATION_MS {
        score += 1;
    }
    (score, -(playlist_num as i64), f.duration_ms.round() as i64)
}

/// Mark the top-K highest-scoring features as menu-visible, where K is the
/// number of distinct menu buttons that jump to a title without writing
/// register 2 (a chapter-within-title marker). With no IG evidence at all,
/// fall back to a playlist-number/duration heuristic.
pub fn infer_menu_visibility(features: &mut [SpecialFeature], hints: &DiscHints) {
    for f in features.iter_mut() {
        f.menu_visible = false;
    }

    if hints.ig_hints_raw.is_empty() {
        for f in features.iter_mut() {
            let playlist_num = playlist_number_from_name(&f.playlist);
            f.menu_visible = playlist_num.map_or(false, |n| n < FALLBACK_VISIBLE_MAX_PLAYLIST)
                && f.duration_ms >= FALLBACK_VISIBLE_MIN_DURATION_MS;
        }
        return;
    }

    let k = hints
        .ig_hints_raw
        .iter()
        .filter(|h| h.jump_title.is_some() && h.register(2).is_none())
        .map(|h| (h.page_id, h.button_id))
        .collect::<HashSet<_>>()
        .len();

    let mut order: Vec<usize> = (0..features.len()).collect();
    order.sort_by(|&a, &b| rank_key(&features[b]).cmp(&rank_key(&features[a])));

    for &i in order.iter().take(k) {
        features[i].menu_visible = true;
    }
}
