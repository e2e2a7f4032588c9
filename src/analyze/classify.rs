//! Playlist classification (§4.3.5).

use std::collections::{BTreeMap, HashSet};

use crate::model::{Category, Label, Playlist};

const BUMPER_MAX_S: f64 = 10.0;
const OP_ED_MIN_S: f64 = 60.0;
const OP_ED_MAX_S: f64 = 135.0;
const CREDITLESS_OP_MAX_S: f64 = 90.0;
const EXTRA_MAX_S: f64 = 180.0;
const EPISODE_MIN_S: f64 = 600.0;

const DIGITAL_ARCHIVE_MIN_ITEMS: usize = 20;
const DIGITAL_ARCHIVE_MAX_TOTAL_S: f64 = 300.0;
const DIGITAL_ARCHIVE_MAX_AVG_ITEM_S: f64 = 0.5;
const DIGITAL_ARCHIVE_MIN_UNIQUE_RATIO: f64 = 0.8;

/// A playlist made of many very short, mostly-unique clips: a disc's digital
/// still-image gallery rendered as an MPLS slideshow rather than a video.
pub fn is_digital_archive_playlist(pl: &Playlist) -> bool {
    let n = pl.play_items.len();
    if n < DIGITAL_ARCHIVE_MIN_ITEMS {
        return false;
    }
    let total_s = pl.duration_s();
    if total_s > DIGITAL_ARCHIVE_MAX_TOTAL_S {
        return false;
    }
    let avg_item_s = total_s / n as f64;
    if avg_item_s > DIGITAL_ARCHIVE_MAX_AVG_ITEM_S {
        return false;
    }
    let unique: HashSet<&str> = pl.play_items.iter().map(|pi| pi.clip_id.as_str()).collect();
    (unique.len() as f64 / n as f64) >= DIGITAL_ARCHIVE_MIN_UNIQUE_RATIO
}

pub fn classify_playlists(playlists: &[Playlist], play_all: &[String]) -> BTreeMap<String, Category> {
    let play_all_set: HashSet<&str> = play_all.iter().map(String::as_str).collect();
    let mut result = BTreeMap::new();

    for pl in playlists {
        let dur_s = pl.duration_s();

        let category = if play_all_set.contains(pl.mpls.as_str()) {
            Category::PlayAll
        } else if is_digital_archive_playlist(pl) {
            Category::DigitalArchive
        } else if dur_s < BUMPER_MAX_S {
            Category::Bumper
        } else if pl.play_items.len() == 1 && (OP_ED_MIN_S..=OP_ED_MAX_S).contains(&dur_s) {
            if dur_s < CREDITLESS_OP_MAX_S {
                Category::CreditlessOp
            } else {
                Category::CreditlessEd
            }
        } else if dur_s < EXTRA_MAX_S {
            Category::Extra
        } else if dur_s >= EPISODE_MIN_S {
            let has_body = pl.play_items.iter().any(|pi| pi.label == Label::Body);
            if has_body {
                Category::Episode
            } else {
                Category::Extra
            }
        } else {
            Category::Extra
        };

        result.insert(pl.mpls.clone(), category);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlayItem;

    fn item(clip_id: &str, in_time: u32, out_time: u32, label: Label) -> PlayItem {
        PlayItem {
            clip_id: clip_id.to_string(),
            in_time,
            out_time,
            connection_condition: 1,
            streams: Vec::new(),
            label,
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

    #[test]
    fn classifies_episode_with_body_segment() {
        let pls = vec![playlist(
            "1.mpls",
            vec![item("a", 0, 45_000 * 1300, Label::Body)],
        )];
        let cats = classify_playlists(&pls, &[]);
        assert_eq!(cats["1.mpls"], Category::Episode);
    }

    #[test]
    fn long_playlist_without_body_is_extra() {
        let pls = vec![playlist(
            "1.mpls",
            vec![item("a", 0, 45_000 * 1300, Label::Unknown)],
        )];
        let cats = classify_playlists(&pls, &[]);
        assert_eq!(cats["1.mpls"], Category::Extra);
    }

    #[test]
    fn play_all_overrides_everything_else() {
        let pls = vec![playlist(
            "1.mpls",
            vec![item("a", 0, 45_000 * 1300, Label::Body)],
        )];
        let cats = classify_playlists(&pls, &["1.mpls".to_string()]);
        assert_eq!(cats["1.mpls"], Category::PlayAll);
    }

    #[test]
    fn detects_digital_archive_slideshow() {
        let items: Vec<PlayItem> = (0..30)
            .map(|i| item(&format!("clip{i}"), 0, 45_000 / 10, Label::Unknown))
            .collect();
        let pl = playlist("1.mpls", items);
        assert!(is_digital_archive_playlist(&pl));
    }

    #[test]
    fn classifies_single_short_item_as_bumper() {
        let pls = vec![playlist("1.mpls", vec![item("a", 0, 45_000 * 5, Label::Unknown)])];
        let cats = classify_playlists(&pls, &[]);
        assert_eq!(cats["1.mpls"], Category::Bumper);
    }
}
