//! Episode ordering (§4.3.6): three strategies — individual episode
//! playlists, Play-All decomposition, and chapter splitting — selected by
//! what evidence the disc actually offers.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::model::{Category, Episode, Label, Playlist, SegmentKey, SegmentRef};

const EPISODE_MIN_S: f64 = 600.0;
const EPISODE_ITEM_MIN_S: f64 = 300.0;
const BODY_SIGNATURE_QUANT_MS: f64 = 5000.0;
const CHAPTER_MIN_COUNT: usize = 4;
const ESTIMATED_EPISODE_DURATION_MS: f64 = 25.0 * 60.0 * 1000.0;
const TARGET_MIN_RATIO: f64 = 0.6;
const TARGET_MAX_RATIO: f64 = 1.4;
const PLAY_ALL_DOMINANCE_RATIO: f64 = 1.5;

fn make_segment_ref(pi: &crate::model::PlayItem, quant_ms: f64) -> SegmentRef {
    SegmentRef {
        key: pi.segment_key(quant_ms),
        clip_id: pi.clip_id.clone(),
        in_ms: pi.in_ms(),
        out_ms: pi.out_ms(),
        label: pi.label,
    }
}

/// The playlist's Body-labeled segments, quantized coarsely, used to detect
/// playlists that differ only in bumper/legal padding around the same body.
/// Falls back to the full (finely quantized) segment signature when the
/// playlist has no Body-labeled item at all.
fn body_signature(pl: &Playlist, quant_ms: f64) -> Vec<SegmentKey> {
    let body: Vec<SegmentKey> = pl
        .play_items
        .iter()
        .filter(|pi| pi.label == Label::Body)
        .map(|pi| pi.segment_key(BODY_SIGNATURE_QUANT_MS))
        .collect();
    if !body.is_empty() {
        body
    } else {
        pl.play_items.iter().map(|pi| pi.segment_key(quant_ms)).collect()
    }
}

/// Collapse playlists that share a body signature to the longest one (the
/// edition most likely to include its full content rather than a trimmed
/// re-release or a director's-cut variant sharing most of the same body).
fn collapse_body_equivalent_variants(playlists: &[&Playlist], quant_ms: f64) -> Vec<Playlist> {
    let mut by_sig: HashMap<Vec<SegmentKey>, Playlist> = HashMap::new();
    for &pl in playlists {
        let sig = body_signature(pl, quant_ms);
        match by_sig.get(&sig) {
            Some(current) if current.duration_ms() >= pl.duration_ms() => {}
            _ => {
                by_sig.insert(sig, pl.clone());
            }
        }
    }
    by_sig.into_values().collect()
}

fn episodes_from_individual(episode_playlists: &[&Playlist], quant_ms: f64) -> Vec<Episode> {
    let collapsed = collapse_body_equivalent_variants(episode_playlists, quant_ms);

    fn sort_key(pl: &Playlist) -> String {
        pl.play_items
            .iter()
            .find(|pi| pi.label == Label::Body)
            .or_else(|| pl.play_items.first())
            .map(|pi| pi.clip_id.clone())
            .unwrap_or_default()
    }

    let mut sorted = collapsed;
    sorted.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));

    sorted
        .into_iter()
        .enumerate()
        .map(|(idx, pl)| {
            let segments: Vec<SegmentRef> =
                pl.play_items.iter().map(|pi| make_segment_ref(pi, quant_ms)).collect();
            Episode {
                episode: (idx + 1) as u32,
                playlist: pl.mpls.clone(),
                duration_ms: pl.duration_ms(),
                confidence: 0.9,
                segments,
                scenes: Vec::new(),
            }
        })
        .collect()
}

fn episodes_from_play_all(play_all: &Playlist, quant_ms: f64) -> Vec<Episode> {
    let mut episodes = Vec::new();
    for pi in &play_all.play_items {
        if pi.duration_s() >= EPISODE_ITEM_MIN_S {
            episodes.push(Episode {
                episode: (episodes.len() + 1) as u32,
                playlist: play_all.mpls.clone(),
                duration_ms: pi.duration_ms(),
                confidence: 0.7,
                segments: vec![make_segment_ref(pi, quant_ms)],
                scenes: Vec::new(),
            });
        }
    }
    episodes
}

/// Split a single long playlist's chapter marks into plausible episode-length
/// blocks, targeting a ~25-minute episode length and accepting a block once
/// it's closer to that target than the next chapter boundary would be (or it
/// has already overshot the acceptable window).
fn episodes_from_chapters(playlist: &Playlist) -> Vec<Episode> {
    if playlist.marks.len() < CHAPTER_MIN_COUNT {
        return Vec::new();
    }
    let Some(main_item) = playlist.play_items.first() else {
        return Vec::new();
    };

    let chapter_ms: Vec<f64> = playlist.marks.iter().map(|m| m.timestamp_ms()).collect();
    let total_ms = playlist.duration_ms();
    let estimated_count = ((total_ms / ESTIMATED_EPISODE_DURATION_MS).round() as i64).max(1);
    if estimated_count <= 1 {
        return Vec::new();
    }
    let target_ms = total_ms / estimated_count as f64;
    let min_block_ms = target_ms * TARGET_MIN_RATIO;
    let max_block_ms = target_ms * TARGET_MAX_RATIO;

    let mut episodes: Vec<Episode> = Vec::new();
    let mut block_start_ms = chapter_ms[0];

    let make_episode = |episode: u32, start_ms: f64, end_ms: f64| -> Episode {
        let key = SegmentKey::Clip {
            clip_id: main_item.clip_id.clone(),
            in_ms: start_ms.round() as i64,
            out_ms: end_ms.round() as i64,
        };
        let segment = SegmentRef {
            key,
            clip_id: main_item.clip_id.clone(),
            in_ms: start_ms,
            out_ms: end_ms,
            label: Label::Body,
        };
        Episode {
            episode,
            playlist: playlist.mpls.clone(),
            duration_ms: end_ms - start_ms,
            confidence: 0.6,
            segments: vec![segment],
            scenes: Vec::new(),
        }
    };

    for i in 1..chapter_ms.len() {
        let block_ms = chapter_ms[i] - block_start_ms;
        if block_ms < min_block_ms {
            continue;
        }
        let undershoot = (block_ms - target_ms).abs();
        let overshoot = if i + 1 < chapter_ms.len() {
            (chapter_ms[i + 1] - block_start_ms - target_ms).abs()
        } else {
            f64::INFINITY
        };
        if undershoot <= overshoot || block_ms > max_block_ms {
            episodes.push(make_episode((episodes.len() + 1) as u32, block_start_ms, chapter_ms[i]));
            block_start_ms = chapter_ms[i];
        }
    }

    let remaining_ms = main_item.out_ms() - block_start_ms;
    if remaining_ms >= min_block_ms {
        episodes.push(make_episode((episodes.len() + 1) as u32, block_start_ms, main_item.out_ms()));
    }

    if (episodes.len() as i64 - estimated_count).abs() <= 1 && episodes.len() >= 2 {
        episodes
    } else {
        Vec::new()
    }
}

/// Choose the episode-ordering strategy and run it. `classifications` and
/// `play_all_names` must come from the classification/Play-All detection
/// stages run over the same `playlists` slice.
pub fn order_episodes(
    playlists: &[Playlist],
    play_all_names: &[String],
    classifications: &BTreeMap<String, Category>,
    quant_ms: f64,
) -> Vec<Episode> {
    let play_all_set: HashSet<&str> = play_all_names.iter().map(String::as_str).collect();

    let has_classified_episodes = classifications.values().any(|c| *c == Category::Episode);
    let individual_eps: Vec<&Playlist> = if has_classified_episodes {
        playlists
            .iter()
            .filter(|pl| {
                !play_all_set.contains(pl.mpls.as_str())
                    && classifications.get(&pl.mpls) == Some(&Category::Episode)
            })
            .collect()
    } else {
        playlists
            .iter()
            .filter(|pl| !play_all_set.contains(pl.mpls.as_str()) && pl.duration_s() >= EPISODE_MIN_S)
            .collect()
    };

    let mut pa_episodes: Vec<Episode> = Vec::new();
    let play_all_playlists: Vec<&Playlist> =
        playlists.iter().filter(|pl| play_all_set.contains(pl.mpls.as_str())).collect();
    if let Some(&best_pa) = play_all_playlists
        .iter()
        .max_by(|a, b| a.duration_ms().partial_cmp(&b.duration_ms()).unwrap())
    {
        pa_episodes = episodes_from_play_all(best_pa, quant_ms);
        if pa_episodes.len() <= 1 && !best_pa.marks.is_empty() {
            let chapter_episodes = episodes_from_chapters(best_pa);
            if chapter_episodes.len() > pa_episodes.len() {
                pa_episodes = chapter_episodes;
            }
        }
    }

    if !individual_eps.is_empty() && !pa_episodes.is_empty() {
        let avg_individual: f64 =
            individual_eps.iter().map(|p| p.duration_ms()).sum::<f64>() / individual_eps.len() as f64;
        let avg_pa: f64 =
            pa_episodes.iter().map(|e| e.duration_ms).sum::<f64>() / pa_episodes.len() as f64;
        if pa_episodes.len() > individual_eps.len() && avg_pa > avg_individual * PLAY_ALL_DOMINANCE_RATIO {
            return pa_episodes;
        }
        return episodes_from_individual(&individual_eps, quant_ms);
    }

    if !individual_eps.is_empty() {
        if individual_eps.len() == 1 {
            let chapter_episodes = episodes_from_chapters(individual_eps[0]);
            if chapter_episodes.len() >= 2 {
                return chapter_episodes;
            }
        }
        return episodes_from_individual(&individual_eps, quant_ms);
    }

    pa_episodes
}
