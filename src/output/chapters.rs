//! Matroska XML chapter builder (§4.4.1).

use crate::model::{Episode, Playlist};

const CHAPTER_SPLIT_WINDOW_MS: f64 = 100.0;
const CHAPTER_SPLIT_DURATION_RATIO: f64 = 0.95;
const SEGMENT_MATCH_TOLERANCE_MS: f64 = 1000.0;

/// Format milliseconds as Matroska's `HH:MM:SS.nnnnnnnnn` timestamp.
fn format_time(ms: f64) -> String {
    let total_ns = (ms * 1_000_000.0).round() as i64;
    let ns = total_ns.rem_euclid(1_000_000_000);
    let total_s = total_ns.div_euclid(1_000_000_000);
    let s = total_s.rem_euclid(60);
    let total_m = total_s.div_euclid(60);
    let m = total_m.rem_euclid(60);
    let h = total_m.div_euclid(60);
    format!("{h:02}:{m:02}:{s:02}.{ns:09}")
}

/// True when `episode` is a single-segment chapter-split result: its one
/// segment is a sub-range noticeably shorter than the full play item it
/// came from, rather than the whole playlist.
fn is_chapter_split(episode: &Episode, source: &Playlist) -> bool {
    if episode.segments.len() != 1 {
        return false;
    }
    let seg = &episode.segments[0];
    let Some(pi) = source.play_items.iter().find(|pi| pi.clip_id == seg.clip_id) else {
        return false;
    };
    seg.duration_ms() < pi.duration_ms() * CHAPTER_SPLIT_DURATION_RATIO
}

/// Compute the chapter timestamps (ms, relative to episode start) for one
/// episode against its source playlist.
fn chapters_for_episode(episode: &Episode, source: &Playlist) -> Vec<f64> {
    let mut chapters = Vec::new();

    if is_chapter_split(episode, source) {
        let seg = &episode.segments[0];
        let window_start = seg.in_ms - CHAPTER_SPLIT_WINDOW_MS;
        let window_end = seg.out_ms - CHAPTER_SPLIT_WINDOW_MS;
        for mark in &source.marks {
            let ts = mark.timestamp_ms();
            if ts >= window_start && ts < window_end {
                chapters.push(ts - seg.in_ms);
            }
        }
    } else {
        let mut offset_ms = 0.0;
        for seg in &episode.segments {
            if let Some(pi) = source
                .play_items
                .iter()
                .find(|pi| pi.clip_id == seg.clip_id && (pi.in_ms() - seg.in_ms).abs() <= SEGMENT_MATCH_TOLERANCE_MS)
            {
                for mark in &source.marks {
                    let ts = mark.timestamp_ms();
                    if ts >= pi.in_ms() && ts < pi.out_ms() {
                        chapters.push(offset_ms + (ts - pi.in_ms()));
                    }
                }
            }
            offset_ms += seg.duration_ms();
        }
    }

    let mut seen = std::collections::HashSet::new();
    chapters.retain(|ms| seen.insert(ms.round() as i64));
    chapters.sort_by(|a, b| a.partial_cmp(b).unwrap());

    if chapters.is_empty() || chapters[0] > 0.0 {
        chapters.insert(0, 0.0);
    }
    chapters
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Build the Matroska chapters XML document for one episode.
///
/// `playlists` should be the full (pre-dedup) set carried by the analysis so
/// the episode's source playlist can always be found, even when it was a
/// deduplication representative.
pub fn build_chapter_xml(episode: &Episode, playlists: &[Playlist]) -> String {
    let chapters = match playlists.iter().find(|p| p.mpls == episode.playlist) {
        Some(pl) => chapters_for_episode(episode, pl),
        None => vec![0.0],
    };

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<Chapters>\n");
    out.push_str("  <EditionEntry>\n");
    out.push_str("    <EditionFlagDefault>1</EditionFlagDefault>\n");
    out.push_str("    <EditionFlagOrdered>0</EditionFlagOrdered>\n");
    for ts in &chapters {
        out.push_str("    <ChapterAtom>\n");
        out.push_str(&format!("      <ChapterTimeStart>{}</ChapterTimeStart>\n", format_time(*ts)));
        out.push_str("      <ChapterDisplay>\n");
        out.push_str(&format!(
            "        <ChapterString>{}</ChapterString>\n",
            escape_xml(&format!("Episode {}", episode.episode))
        ));
        out.push_str("        <ChapterLanguage>und</ChapterLanguage>\n");
        out.push_str("      </ChapterDisplay>\n");
        out.push_str("    </ChapterAtom>\n");
    }
    out.push_str("  </EditionEntry>\n");
    out.push_str("</Chapters>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChapterMark, Label, MarkType, PlayItem, SegmentKey, SegmentRef};

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

    fn mark(id: u32, timestamp: u32) -> ChapterMark {
        ChapterMark {
            id,
            mark_type: MarkType::EntryPoint,
            play_item_ref: 0,
            timestamp,
            entry_es_pid: None,
            duration_ms: 0.0,
        }
    }

    #[test]
    fn formats_matroska_timestamp() {
        assert_eq!(format_time(0.0), "00:00:00.000000000");
        assert_eq!(format_time(3_723_456.0), "01:02:03.456000000");
    }

    #[test]
    fn emits_at_least_one_chapter_for_a_whole_playlist_episode() {
        let pl = Playlist {
            mpls: "1.mpls".to_string(),
            play_items: vec![item("main", 0, 45_000 * 600)],
            marks: Vec::new(),
            multi_angle: false,
        };
        let episode = Episode {
            episode: 1,
            playlist: "1.mpls".to_string(),
            duration_ms: pl.duration_ms(),
            confidence: 0.9,
            segments: vec![SegmentRef {
                key: SegmentKey::Clip { clip_id: "main".to_string(), in_ms: 0, out_ms: 0 },
                clip_id: "main".to_string(),
                in_ms: 0.0,
                out_ms: pl.duration_ms(),
                label: Label::Body,
            }],
            scenes: Vec::new(),
        };
        let xml = build_chapter_xml(&episode, &[pl]);
        assert!(xml.contains("<ChapterTimeStart>00:00:00.000000000</ChapterTimeStart>"));
        assert_eq!(xml.matches("<ChapterAtom>").count(), 1);
    }

    #[test]
    fn chapter_split_episode_uses_marks_relative_to_segment_start() {
        let pl = Playlist {
            mpls: "1.mpls".to_string(),
            play_items: vec![item("main", 0, 45_000 * 3000)],
            marks: vec![mark(0, 45_000 * 1500), mark(1, 45_000 * 1520)],
            multi_angle: false,
        };
        let episode = Episode {
            episode: 2,
            playlist: "1.mpls".to_string(),
            duration_ms: 45_000.0,
            confidence: 0.6,
            segments: vec![SegmentRef {
                key: SegmentKey::Clip { clip_id: "main".to_string(), in_ms: 1_500_000, out_ms: 2_000_000 },
                clip_id: "main".to_string(),
                in_ms: 1_500_000.0,
                out_ms: 2_000_000.0,
                label: Label::Body,
            }],
            scenes: Vec::new(),
        };
        let xml = build_chapter_xml(&episode, &[pl]);
        assert!(xml.contains("<ChapterTimeStart>00:00:00.000000000</ChapterTimeStart>"));
        assert!(xml.contains("<ChapterTimeStart>00:00:20.000000000</ChapterTimeStart>"));
    }
}
