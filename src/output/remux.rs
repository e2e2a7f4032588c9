//! Remuxer argument planner (§4.4.2). Produces the argument vector for an
//! external remuxer that splits one M2TS sub-range into one episode file.
//! Building the command is in scope; running it is not — the crate never
//! spawns a process.

use crate::model::{Episode, Playlist};

const SPLIT_THRESHOLD_RATIO: f64 = 0.95;

/// One remux job: the finished argument vector plus the input M2TS paths it
/// references (callers resolve clip ids to on-disk STREAM/*.m2ts paths).
#[derive(Debug, Clone, PartialEq)]
pub struct RemuxPlan {
    pub args: Vec<String>,
    pub input_clip_ids: Vec<String>,
}

fn language_track_args(pl: &Playlist, clip_id: &str) -> Vec<String> {
    let mut args = Vec::new();
    let Some(pi) = pl.play_items.iter().find(|pi| pi.clip_id == clip_id) else {
        return args;
    };
    for stream in &pi.streams {
        if let Some(lang) = &stream.attrs.language {
            args.push("--language".to_string());
            args.push(format!("{}:{}", stream.pid, lang));
        }
        args.push("--track-name".to_string());
        args.push(format!("{}:{}", stream.pid, stream.attrs.codec_name));
    }
    args
}

/// Plan a remux for `episode` given its source playlist and the chapter XML
/// path already written for it (see [`super::chapters::build_chapter_xml`]).
pub fn plan_remux(
    remuxer: &str,
    episode: &Episode,
    source: &Playlist,
    output_path: &str,
    chapter_xml_path: &str,
) -> RemuxPlan {
    let mut args = vec![remuxer.to_string(), "-o".to_string(), output_path.to_string()];

    if let Some(split) = split_range(episode, source) {
        args.push("--split".to_string());
        args.push(format!("parts:{}-{}", split.0, split.1));
    }

    args.push("--chapters".to_string());
    args.push(chapter_xml_path.to_string());
    args.push("--title".to_string());
    args.push(format!("Episode {}", episode.episode));

    let mut input_clip_ids = Vec::new();
    for seg in &episode.segments {
        if !input_clip_ids.contains(&seg.clip_id) {
            input_clip_ids.push(seg.clip_id.clone());
            args.extend(language_track_args(source, &seg.clip_id));
        }
    }

    for (i, clip_id) in input_clip_ids.iter().enumerate() {
        if i > 0 {
            args.push("+".to_string());
        }
        args.push(format!("{clip_id}.m2ts"));
    }

    RemuxPlan { args, input_clip_ids }
}

/// `Some((start, end))` PTS-relative milliseconds when the episode is a
/// single-segment sub-range of a larger backing file shared with other
/// episodes; `None` when it should be remuxed whole.
fn split_range(episode: &Episode, source: &Playlist) -> Option<(i64, i64)> {
    if episode.segments.len() != 1 {
        return None;
    }
    let seg = &episode.segments[0];

    let sharing_items: Vec<_> = source.play_items.iter().filter(|pi| pi.clip_id == seg.clip_id).collect();
    if sharing_items.is_empty() {
        return None;
    }
    let total_backing_ms: f64 = sharing_items.iter().map(|pi| pi.duration_ms()).sum();
    if seg.duration_ms() >= total_backing_ms * SPLIT_THRESHOLD_RATIO {
        return None;
    }

    let pts_base = sharing_items.iter().map(|pi| pi.in_ms()).fold(f64::INFINITY, f64::min);
    let start = (seg.in_ms - pts_base).round() as i64;
    let end = (seg.out_ms - pts_base).round() as i64;
    Some((start, end))
}
