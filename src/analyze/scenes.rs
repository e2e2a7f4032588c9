//! Scene reconstruction (§4.3.11): recovers intra-episode scene breaks from
//! whatever IG chapter evidence the disc exposes, downsampled to at most
//! four anchors per episode.

use crate::hints::DiscHints;
use crate::model::{Episode, Label, Playlist, SegmentKey, SegmentRef};

const MAX_ANCHORS: usize = 4;
const CREDITS_TRIM_S: f64 = 120.0;
const FIRST_ANCHOR_THRESHOLD_MS: f64 = 250.0;

pub fn reconstruct_scenes(episodes: &mut [Episode], playlists: &[Playlist], hints: &DiscHints) {
    for ep in episodes.iter_mut() {
        let starts = collect_anchors(ep, playlists, hints);
        ep.scenes = build_scene_segments(ep, starts);
    }
}

fn collect_anchors(ep: &Episode, playlists: &[Playlist], hints: &DiscHints) -> Vec<f64> {
    let Some(pl) = playlists.iter().find(|p| p.mpls == ep.playlist) else {
        return vec![0.0];
    };

    let mut raw: Vec<f64> = Vec::new();

    let ep_title: Option<u16> = pl.playlist_number().and_then(|num| {
        hints
            .title_playlists
            .iter()
            .find(|(_, nums)| nums.contains(&num))
            .map(|(title, _)| *title)
    });

    // (a) direct episode-playlist chapter marks named by an IG register-2
    // write targeting this episode's own title.
    if let Some(title) = ep_title {
        let jump_title = title as u32 + 1;
        let reg2_for_title: std::collections::HashSet<u32> = hints
            .ig_hints_raw
            .iter()
            .filter(|h| h.jump_title == Some(jump_title))
            .filter_map(|h| h.register(2))
            .collect();
        for (idx, mark) in pl.marks.iter().enumerate() {
            if reg2_for_title.contains(&(idx as u32)) {
                raw.push(mark.timestamp_ms());
            }
        }
    }

    // (b) Play-All chapter marks named by any IG register-2 write whose
    // referenced play item's clip id matches this episode's first segment,
    // remapped onto the episode's local timeline.
    let ep_first_clip = ep.segments.first().map(|s| s.clip_id.as_str());
    let ep_first_in_ms = ep.segments.first().map(|s| s.in_ms).unwrap_or(0.0);
    if let Some(first_clip) = ep_first_clip {
        let all_reg2: std::collections::HashSet<u32> =
            hints.ig_hints_raw.iter().filter_map(|h| h.register(2)).collect();
        for other_pl in playlists {
            if other_pl.mpls == pl.mpls {
                continue;
            }
            for (idx, mark) in other_pl.marks.iter().enumerate() {
                if !all_reg2.contains(&(idx as u32)) {
                    continue;
                }
                if let Some(pi) = other_pl.play_items.get(mark.play_item_ref as usize) {
                    if pi.clip_id == first_clip {
                        raw.push(mark.timestamp_ms() - ep_first_in_ms);
                    }
                }
            }
        }
    }

    if raw.is_empty() {
        if let Some(first_seg) = ep.segments.first() {
            for mark in &pl.marks {
                let ms = mark.timestamp_ms();
                if ms >= first_seg.in_ms {
                    raw.push(ms - first_seg.in_ms);
                }
            }
        }
    }

    sanitize_anchors(raw, ep.duration_ms)
}

fn sanitize_anchors(mut anchors: Vec<f64>, duration_ms: f64) -> Vec<f64> {
    anchors.retain(|&ms| ms >= 0.0 && ms < duration_ms);
    anchors.sort_by(|a, b| a.partial_cmp(b).unwrap());
    anchors.dedup();

    let credits_cutoff_ms = duration_ms - CREDITS_TRIM_S * 1000.0;
    let before_cutoff = anchors.iter().filter(|&&ms| ms < credits_cutoff_ms).count();
    if before_cutoff >= MAX_ANCHORS {
        anchors.retain(|&ms| ms < credits_cutoff_ms);
    }

    let downsampled = downsample(anchors);
    finalize(downsampled)
}

fn downsample(anchors: Vec<f64>) -> Vec<f64> {
    if anchors.len() <= MAX_ANCHORS {
        return anchors;
    }
    let n = anchors.len();
    (0..MAX_ANCHORS)
        .map(|i| {
            let idx = ((i as f64) * ((n - 1) as f64) / 3.0).round() as usize;
            anchors[idx.min(n - 1)]
        })
        .collect()
}

/// If the leading anchor starts meaningfully into the episode, prepend a
/// synthetic 0-ms scene-zero. This does not re-run the downsample step, so a
/// disc whose evidence already yields four anchors that start late will end
/// up with five; that latent asymmetry is intentional (see design notes).
fn finalize(mut anchors: Vec<f64>) -> Vec<f64> {
    match anchors.first() {
        Some(&first) if first > FIRST_ANCHOR_THRESHOLD_MS => anchors.insert(0, 0.0),
        Some(_) => {}
        None => anchors.push(0.0),
    }
    anchors
}

fn build_scene_segments(ep: &Episode, starts: Vec<f64>) -> Vec<SegmentRef> {
    let clip_id = ep.segments.first().map(|s| s.clip_id.clone()).unwrap_or_default();
    let mut scenes = Vec::with_capacity(starts.len());

    for (idx, window) in starts.windows(2).enumerate() {
        scenes.push(SegmentRef {
            key: SegmentKey::Scene { playlist: ep.playlist.clone(), idx },
            clip_id: clip_id.clone(),
            in_ms: window[0],
            out_ms: window[1],
            label: Label::Unknown,
        });
    }

    if let Some(&last_start) = starts.last() {
        scenes.push(SegmentRef {
            key: SegmentKey::Scene { playlist: ep.playlist.clone(), idx: starts.len() - 1 },
            clip_id,
            in_ms: last_start,
            out_ms: ep.duration_ms,
            label: Label::Unknown,
        });
    }

    scenes
}
