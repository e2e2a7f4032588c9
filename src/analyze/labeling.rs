//! Segment labeling (§4.3.4): assigns each play item's [`Label`] from its
//! duration and how often it recurs across the disc.

use crate::analyze::frequency::SegmentFrequency;
use crate::model::{Label, Playlist};

const LEGAL_MAX_S: f64 = 30.0;
const OP_ED_MIN_S: f64 = 60.0;
const OP_ED_MAX_S: f64 = 135.0;
const PREVIEW_MAX_S: f64 = 60.0;
const BODY_MIN_S: f64 = 300.0;

/// Labels every play item of every playlist in place.
pub fn label_segments(playlists: &mut [Playlist], freq: &SegmentFrequency, quant_ms: f64) {
    for pl in playlists.iter_mut() {
        let n = pl.play_items.len();
        for idx in 0..n {
            let key = pl.play_items[idx].segment_key(quant_ms);
            let dur_s = pl.play_items[idx].duration_s();
            let shared_count = *freq.freq.get(&key).unwrap_or(&1);

            let label = if dur_s < LEGAL_MAX_S && shared_count >= 2 {
                Label::Legal
            } else if (OP_ED_MIN_S..=OP_ED_MAX_S).contains(&dur_s)
                && *freq.first_item.get(&key).unwrap_or(&0) >= 2
            {
                Label::Op
            } else if (OP_ED_MIN_S..=OP_ED_MAX_S).contains(&dur_s)
                && (*freq.last_item.get(&key).unwrap_or(&0) >= 2
                    || *freq.second_last_item.get(&key).unwrap_or(&0) >= 2)
            {
                Label::Ed
            } else if idx == n - 1 && dur_s < PREVIEW_MAX_S {
                Label::Preview
            } else if dur_s > BODY_MIN_S {
                Label::Body
            } else {
                Label::Unknown
            };

            pl.play_items[idx].label = label;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::frequency::build_segment_frequency;
    use crate::model::PlayItem;

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

    fn playlist(mpls: &str, items: Vec<PlayItem>) -> Playlist {
        Playlist {
            mpls: mpls.to_string(),
            play_items: items,
            marks: Vec::new(),
            multi_angle: false,
        }
    }

    #[test]
    fn labels_shared_op_and_unique_body() {
        let op = item("op", 0, 45_000 * 90);
        let body_a = item("a", 0, 45_000 * 1200);
        let body_b = item("b", 0, 45_000 * 1200);
        let mut pls = vec![
            playlist("1.mpls", vec![op.clone(), body_a]),
            playlist("2.mpls", vec![op, body_b]),
        ];
        let freq = build_segment_frequency(&pls, 250.0);
        label_segments(&mut pls, &freq, 250.0);
        assert_eq!(pls[0].play_items[0].label, Label::Op);
        assert_eq!(pls[0].play_items[1].label, Label::Body);
        assert_eq!(pls[1].play_items[0].label, Label::Op);
    }

    #[test]
    fn labels_trailing_short_item_as_preview() {
        let body = item("a", 0, 45_000 * 1200);
        let trailer = item("trailer", 0, 45_000 * 40);
        let mut pls = vec![playlist("1.mpls", vec![body, trailer])];
        let freq = build_segment_frequency(&pls, 250.0);
        label_segments(&mut pls, &freq, 250.0);
        assert_eq!(pls[0].play_items[1].label, Label::Preview);
    }

    #[test]
    fn labels_short_shared_segment_as_legal() {
        let legal = item("legal", 0, 45_000 * 5);
        let other = item("legal", 0, 45_000 * 5);
        let mut pls = vec![
            playlist("1.mpls", vec![legal, item("a", 0, 45_000 * 1200)]),
            playlist("2.mpls", vec![other, item("b", 0, 45_000 * 1200)]),
        ];
        let freq = build_segment_frequency(&pls, 250.0);
        label_segments(&mut pls, &freq, 250.0);
        assert_eq!(pls[0].play_items[0].label, Label::Legal);
    }
}
