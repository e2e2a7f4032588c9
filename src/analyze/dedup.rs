//! Duplicate clustering (§4.3.1).

use std::collections::BTreeMap;

use crate::model::{ClipInfo, Playlist};

/// Group playlists by loose signature, collapsing each cluster of two or more
/// down to a single representative. Returns the working set (one entry per
/// distinct signature, in first-seen order) and, for every cluster of size
/// two or more, the filenames that were folded into it (for warning/notes
/// reporting; the originals still appear in the full playlist list the
/// pipeline carries alongside the working set).
pub fn dedup_playlists(
    playlists: &[Playlist],
    clips: &BTreeMap<String, ClipInfo>,
    quant_ms: f64,
) -> (Vec<Playlist>, Vec<Vec<String>>) {
    let mut order: Vec<Vec<(String, i64, i64)>> = Vec::new();
    let mut groups: BTreeMap<Vec<(String, i64, i64)>, Vec<Playlist>> = BTreeMap::new();

    for pl in playlists {
        let sig = pl.signature_loose(quant_ms);
        if !groups.contains_key(&sig) {
            order.push(sig.clone());
        }
        groups.entry(sig).or_default().push(pl.clone());
    }

    let mut unique = Vec::with_capacity(order.len());
    let mut dup_groups = Vec::new();
    for sig in order {
        let group = &groups[&sig];
        if group.len() >= 2 {
            dup_groups.push(group.iter().map(|p| p.mpls.clone()).collect());
            unique.push(pick_representative(group, clips));
        } else {
            unique.push(group[0].clone());
        }
    }

    (unique, dup_groups)
}

/// Score: `(stream_count_of_first_clip, chapter_count, -filename_len)`, highest wins.
fn score(pl: &Playlist, clips: &BTreeMap<String, ClipInfo>) -> (usize, usize, i64) {
    let stream_count = pl
        .play_items
        .first()
        .map(|pi| {
            clips
                .get(&pi.clip_id)
                .map(|c| c.streams.len())
                .filter(|&n| n > 0)
                .unwrap_or_else(|| pi.streams.len())
        })
        .unwrap_or(0);
    let chapter_count = pl.marks.len();
    (stream_count, chapter_count, -(pl.mpls.len() as i64))
}

fn pick_representative(group: &[Playlist], clips: &BTreeMap<String, ClipInfo>) -> Playlist {
    group
        .iter()
        .max_by_key(|pl| score(pl, clips))
        .cloned()
        .expect("dedup groups are never empty")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Label, PlayItem};

    fn item(clip_id: &str, in_time: u32, out_time: u32) -> PlayItem {
        PlayItem {
            clip_id: clip_id.to_string(),
            in_time,
            out_time,
            connection_condition: 1,
            streams: Vec::new(),
            label: Label::Unknown,
        }
    }

    fn playlist(mpls: &str, items: Vec<PlayItem>, marks: usize) -> Playlist {
        Playlist {
            mpls: mpls.to_string(),
            play_items: items,
            marks: (0..marks)
                .map(|i| crate::model::ChapterMark {
                    id: i as u32,
                    mark_type: crate::model::MarkType::EntryPoint,
                    play_item_ref: 0,
                    timestamp: i as u32 * 45_000,
                    entry_es_pid: None,
                    duration_ms: 0.0,
                })
                .collect(),
            multi_angle: false,
        }
    }

    #[test]
    fn collapses_identical_playlists_to_the_one_with_more_chapters() {
        let pls = vec![
            playlist("00001.mpls", vec![item("00001", 0, 45_000 * 600)], 0),
            playlist("00002.mpls", vec![item("00001", 0, 45_000 * 600)], 3),
        ];
        let clips = BTreeMap::new();
        let (unique, dups) = dedup_playlists(&pls, &clips, 250.0);
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].mpls, "00002.mpls");
        assert_eq!(dups, vec![vec!["00001.mpls".to_string(), "00002.mpls".to_string()]]);
    }

    #[test]
    fn leaves_distinct_playlists_untouched() {
        let pls = vec![
            playlist("00001.mpls", vec![item("00001", 0, 45_000 * 600)], 0),
            playlist("00002.mpls", vec![item("00002", 0, 45_000 * 600)], 0),
        ];
        let clips = BTreeMap::new();
        let (unique, dups) = dedup_playlists(&pls, &clips, 250.0);
        assert_eq!(unique.len(), 2);
        assert!(dups.is_empty());
    }
}
