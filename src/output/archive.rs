//! Still-frame extractor planner (§4.4.3): builds `ffmpeg` argument vectors
//! for pulling one still frame per digital-archive play item. Building the
//! command is in scope; running it is not.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::{Category, Playlist};

/// One digital-archive play item to extract: its owning playlist, its index
/// within that playlist's play items, and the frame's offset.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveItem {
    pub playlist: String,
    pub item_index: usize,
    pub clip_id: String,
    pub offset_ms: f64,
}

/// One planned extraction: the finished `ffmpeg` argument vector and the
/// output path it writes to.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractPlan {
    pub args: Vec<String>,
    pub output_path: String,
}

/// Collect every play item belonging to a playlist classified as a digital
/// archive, in playlist-then-item order.
pub fn collect_archive_items(
    playlists: &[Playlist],
    classifications: &std::collections::BTreeMap<String, Category>,
) -> Vec<ArchiveItem> {
    let mut items = Vec::new();
    for pl in playlists {
        if classifications.get(&pl.mpls).copied() != Some(Category::DigitalArchive) {
            continue;
        }
        let mut offset_ms = 0.0;
        for (idx, pi) in pl.play_items.iter().enumerate() {
            items.push(ArchiveItem {
                playlist: pl.mpls.clone(),
                item_index: idx,
                clip_id: pi.clip_id.clone(),
                offset_ms,
            });
            offset_ms += pi.duration_ms();
        }
    }
    items
}

/// Normalize a requested output format, rejecting anything but JPEG/PNG.
fn normalize_format(format: &str) -> Result<&'static str> {
    match format.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Ok("jpg"),
        "png" => Ok("png"),
        other => Err(Error::UnsupportedFormat { expected: &["jpg", "jpeg", "png"], found: other.to_string() }),
    }
}

/// A deterministic output filename for one archive item: `<playlist-stem>_<item_index>.<ext>`.
fn output_name(item: &ArchiveItem, ext: &str) -> String {
    let stem = item.playlist.split('.').next().unwrap_or(&item.playlist);
    format!("{stem}_{:03}.{ext}", item.item_index)
}

/// Resolve `name` under `dir`, rejecting any clip id or filename that would
/// let the resolved path escape `dir`.
fn resolve_output_path(dir: &Path, name: &str) -> Result<PathBuf> {
    if name.contains("..") {
        return Err(Error::PathTraversal { path: name.to_string() });
    }
    let candidate = dir.join(name);
    let mut normalized = PathBuf::new();
    for component in candidate.components() {
        match component {
            Component::ParentDir => {
                return Err(Error::PathTraversal { path: candidate.display().to_string() });
            }
            other => normalized.push(other),
        }
    }
    if !normalized.starts_with(dir) {
        return Err(Error::PathTraversal { path: normalized.display().to_string() });
    }
    Ok(normalized)
}

fn build_ffmpeg_args(source_m2ts: &str, offset_s: f64, format: &str, output_path: &str) -> Vec<String> {
    let mut args = vec![
        "ffmpeg".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-y".to_string(),
        "-ss".to_string(),
        format!("{offset_s:.3}"),
        "-i".to_string(),
        source_m2ts.to_string(),
        "-frames:v".to_string(),
        "1".to_string(),
    ];
    if format == "jpg" {
        args.push("-q:v".to_string());
        args.push("2".to_string());
    }
    args.push(output_path.to_string());
    args
}

/// Plan one still-frame extraction per item in `items`, writing into
/// `output_dir` with the given image `format` (`jpg`, `jpeg`, or `png`).
/// `clip_path` resolves a clip id to its on-disk `STREAM/*.m2ts` path.
pub fn plan_digital_archive_extraction(
    items: &[ArchiveItem],
    output_dir: &Path,
    format: &str,
    clip_path: impl Fn(&str) -> String,
) -> Result<Vec<ExtractPlan>> {
    let ext = normalize_format(format)?;
    let mut plans = Vec::with_capacity(items.len());
    for item in items {
        if item.clip_id.contains("..") {
            return Err(Error::PathTraversal { path: item.clip_id.clone() });
        }
        let name = output_name(item, ext);
        let output_path = resolve_output_path(output_dir, &name)?;
        let source = clip_path(&item.clip_id);
        let args = build_ffmpeg_args(&source, item.offset_ms / 1000.0, ext, &output_path.display().to_string());
        plans.push(ExtractPlan { args, output_path: output_path.display().to_string() });
    }
    Ok(plans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Label, PlayItem};
    use std::collections::BTreeMap;

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
        Playlist { mpls: mpls.to_string(), play_items: items, marks: Vec::new(), multi_angle: false }
    }

    #[test]
    fn plans_one_extraction_per_archive_item_with_png_extension() {
        let pl = playlist(
            "00003.mpls",
            vec![item("c1", 0, 45_000 * 1), item("c2", 0, 45_000 * 1), item("c3", 0, 45_000 * 1)],
        );
        let mut classifications = BTreeMap::new();
        classifications.insert("00003.mpls".to_string(), Category::DigitalArchive);

        let items = collect_archive_items(&[pl], &classifications);
        assert_eq!(items.len(), 3);

        let plans = plan_digital_archive_extraction(
            &items,
            Path::new("/out"),
            "png",
            |clip_id| format!("/disc/BDMV/STREAM/{clip_id}.m2ts"),
        )
        .unwrap();

        assert_eq!(plans.len(), 3);
        for plan in &plans {
            assert_eq!(plan.args[0], "ffmpeg");
            assert!(plan.output_path.ends_with(".png"));
        }
        let names: std::collections::HashSet<_> = plans.iter().map(|p| p.output_path.clone()).collect();
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn jpeg_is_normalized_to_jpg_and_adds_quality_flag() {
        let item = ArchiveItem {
            playlist: "00003.mpls".to_string(),
            item_index: 0,
            clip_id: "c1".to_string(),
            offset_ms: 0.0,
        };
        let plans =
            plan_digital_archive_extraction(&[item], Path::new("/out"), "jpeg", |c| format!("{c}.m2ts")).unwrap();
        assert!(plans[0].output_path.ends_with(".jpg"));
        assert!(plans[0].args.iter().any(|a| a == "-q:v"));
    }

    #[test]
    fn rejects_clip_id_containing_path_traversal() {
        let item = ArchiveItem {
            playlist: "00003.mpls".to_string(),
            item_index: 0,
            clip_id: "../../etc/passwd".to_string(),
            offset_ms: 0.0,
        };
        let err = plan_digital_archive_extraction(&[item], Path::new("/out"), "jpg", |c| c.to_string()).unwrap_err();
        assert!(matches!(err, Error::PathTraversal { .. }));
    }

    #[test]
    fn rejects_unsupported_image_format() {
        let err = plan_digital_archive_extraction(&[], Path::new("/out"), "bmp", |c| c.to_string()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }
}
