//! L3: the deterministic multi-stage analysis pipeline (§4.3), entered
//! through [`scan_disc`].

pub mod classify;
pub mod collapse;
pub mod confidence;
pub mod dedup;
pub mod frequency;
pub mod labeling;
pub mod ordering;
pub mod play_all;
pub mod scenes;
pub mod specials;

use std::collections::{BTreeMap, HashSet};

use crate::error::ErrorCode;
use crate::hints::DiscHints;
use crate::logging::Logger;
use crate::model::{AnalysisNotes, Category, ClipInfo, DiscAnalysis, Playlist, Warning};

/// Run the full L3 pipeline over an already-parsed playlist/clip set and an
/// optional navigation hint bag, producing the frozen [`DiscAnalysis`]. Never
/// fails outright: when evidence is too thin to identify any episodes, the
/// result carries an empty episode list and a `NO_EPISODES` warning rather
/// than an error.
pub fn scan_disc(
    bdmv_path: &str,
    playlists: Vec<Playlist>,
    clips: BTreeMap<String, ClipInfo>,
    hints: DiscHints,
    quant_ms: f64,
    logger: &dyn Logger,
) -> DiscAnalysis {
    let mut warnings = Vec::new();

    let (unique_playlists, dup_groups) = dedup::dedup_playlists(&playlists, &clips, quant_ms);
    if !dup_groups.is_empty() {
        let groups_str = dup_groups.iter().map(|g| g.join(",")).collect::<Vec<_>>().join("; ");
        warnings.push(
            Warning::new(
                ErrorCode::Duplicates.as_str(),
                format!("found {} group(s) of duplicate playlists", dup_groups.len()),
            )
            .with_context("groups", groups_str),
        );
        logger.debug(ErrorCode::Duplicates.as_str(), &format!("{} duplicate cluster(s)", dup_groups.len()));
    }

    let freq = frequency::build_segment_frequency(&unique_playlists, quant_ms);
    let play_all_names = play_all::detect_play_all(&unique_playlists, quant_ms);

    let mut working = unique_playlists;
    labeling::label_segments(&mut working, &freq, quant_ms);

    let mut classifications = classify::classify_playlists(&working, &play_all_names);
    let mut episodes = ordering::order_episodes(&working, &play_all_names, &classifications, quant_ms);

    let play_all_set: HashSet<&str> = play_all_names.iter().map(String::as_str).collect();
    reclassify_play_all_only_episodes(&mut classifications, &episodes, &working, &play_all_set);

    episodes = collapse::apply_single_title_collapse(episodes, &working, &classifications, &hints, quant_ms);
    confidence::refine_confidence(&mut episodes, &working, &hints);

    if episodes.is_empty() {
        warnings.push(Warning::new(
            ErrorCode::NoEpisodes.as_str(),
            "could not identify any episodes on this disc",
        ));
    } else if !play_all_names.is_empty()
        && episodes.iter().all(|e| play_all_set.contains(e.playlist.as_str()))
    {
        warnings.push(
            Warning::new(
                ErrorCode::PlayAllOnly.as_str(),
                "episodes were inferred by decomposing a Play All playlist; no individual episode playlists were found",
            )
            .with_context("play_all", play_all_names.join(",")),
        );
    }

    let mut special_features = specials::extract_special_features(&working, &classifications, &hints);
    specials::infer_menu_visibility(&mut special_features, &hints);

    scenes::reconstruct_scenes(&mut episodes, &working, &hints);

    let notes = AnalysisNotes {
        classifications,
        play_all: play_all_names,
        duplicate_groups: dup_groups,
        segment_freq_keys: freq.freq.len(),
        disc_hints: Some(hints),
    };

    DiscAnalysis {
        path: bdmv_path.to_string(),
        playlists,
        clips,
        episodes,
        special_features,
        warnings,
        notes,
    }
}

/// If every inferred episode came out of Play-All decomposition, a playlist
/// classified `episode` whose clips aren't actually referenced by any
/// episode was misclassified by the duration heuristic; demote it to
/// `extra` so it surfaces as a special feature instead of a phantom episode.
fn reclassify_play_all_only_episodes(
    classifications: &mut BTreeMap<String, Category>,
    episodes: &[crate::model::Episode],
    working: &[Playlist],
    play_all_set: &HashSet<&str>,
) {
    if episodes.is_empty() || !episodes.iter().all(|e| play_all_set.contains(e.playlist.as_str())) {
        return;
    }
    let episode_clip_ids: HashSet<&str> =
        episodes.iter().flat_map(|e| e.segments.iter().map(|s| s.clip_id.as_str())).collect();

    for (mpls, category) in classifications.iter_mut() {
        if *category != Category::Episode {
            continue;
        }
        if let Some(pl) = working.iter().find(|p| &p.mpls == mpls) {
            if !pl.play_items.iter().any(|pi| episode_clip_ids.contains(pi.clip_id.as_str())) {
                *category = Category::Extra;
            }
        }
    }
}
