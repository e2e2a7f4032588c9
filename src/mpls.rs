//! MPLS (`PLAYLIST/*.mpls`) parser (§4.2).

use crate::codec::decode_attributes;
use crate::error::{tag4, Error, Result};
use crate::logging::Logger;
use crate::model::{ChapterMark, MarkType, PlayItem, Playlist, StreamDescriptor};
use crate::reader::Reader;

const ACCEPTED_VERSIONS: &[&str] = &["0100", "0200"];

/// Parse one MPLS file's bytes into a [`Playlist`].
pub fn parse_mpls(mpls: &str, data: &[u8], logger: &dyn Logger) -> Result<Playlist> {
    let mut r = Reader::new(data);

    let magic = r.read_bytes(4)?;
    if magic != b"MPLS" {
        return Err(Error::FormatMagic {
            expected: "MPLS",
            found: tag4(magic),
        });
    }
    let version = r.read_bytes(4)?;
    let version_str: String = version.iter().map(|&b| b as char).collect();
    if !ACCEPTED_VERSIONS.contains(&version_str.as_str()) {
        return Err(Error::FormatVersion {
            expected: ACCEPTED_VERSIONS,
            found: tag4(version),
        });
    }

    let playlist_start = r.u32()? as usize;
    let playlist_mark_start = r.u32()? as usize;

    let play_items = match parse_play_list_section(&r, playlist_start) {
        Ok(items) => items,
        Err(e) => {
            logger.debug("Truncated", &format!("{mpls}: PlayList section: {e}"));
            Vec::new()
        }
    };

    let marks = match parse_marks_section(&r, playlist_mark_start) {
        Ok(marks) => marks,
        Err(e) => {
            logger.debug("Truncated", &format!("{mpls}: PlayListMark section: {e}"));
            Vec::new()
        }
    };

    // multi_angle is true iff any play item carried the multi-angle flag.
    let multi_angle = play_items.iter().any(|pi| pi.0);
    let play_items: Vec<PlayItem> = play_items.into_iter().map(|(_, pi)| pi).collect();

    Ok(Playlist {
        mpls: mpls.to_string(),
        play_items,
        marks,
        multi_angle,
    })
}

fn parse_play_list_section(root: &Reader<'_>, offset: usize) -> Result<Vec<(bool, PlayItem)>> {
    let mut r = root.sub_reader(offset, root.view_len().saturating_sub(offset))?;
    let _length = r.u32()?;
    r.skip(2)?; // reserved
    let num_play_items = r.u16()?;
    let _num_sub_paths = r.u16()?; // ignored

    let mut items = Vec::with_capacity(num_play_items as usize);
    for _ in 0..num_play_items {
        items.push(parse_play_item(&mut r)?);
    }
    Ok(items)
}

fn parse_play_item(r: &mut Reader<'_>) -> Result<(bool, PlayItem)> {
    let item_start = r.tell();
    let length = r.u16()? as usize;
    let clip_id = r.read_string(5)?;
    r.skip(4)?; // codec id, ignored

    let flags = r.u16()?;
    let multi_angle = (flags >> 4) & 1 == 1;
    let connection_condition = (flags & 0x0F) as u8;
    r.skip(1)?; // reserved

    let in_time = r.u32()?;
    let out_time = r.u32()?;
    r.skip(8)?; // UO mask, ignored
    r.skip(1)?; // mixed flags
    let _still_mode = r.u8()?;
    r.skip(2)?; // still-time or reserved

    if multi_angle {
        let angle_count = r.u8()?;
        r.skip(1)?; // angle flags
        let extra = (angle_count.saturating_sub(1)) as usize * 10;
        r.skip(extra)?;
    }

    let streams = parse_stn_table(r)?;

    // Tolerate trailing bytes: seek to item_start + 2 + length (length excludes
    // the length field itself, matching the STN_table convention above).
    let target = item_start + 2 + length;
    if target >= item_start {
        let _ = r.seek(target);
    }

    Ok((
        multi_angle,
        PlayItem {
            clip_id,
            in_time,
            out_time,
            connection_condition,
            streams,
            label: Default::default(),
        },
    ))
}

fn parse_stn_table(r: &mut Reader<'_>) -> Result<Vec<StreamDescriptor>> {
    let table_start = r.tell();
    let length = r.u16()? as usize;
    if length == 0 {
        return Ok(Vec::new());
    }
    r.skip(2)?; // reserved

    let counts = [
        r.u8()?, // video
        r.u8()?, // audio
        r.u8()?, // PG
        r.u8()?, // IG
        r.u8()?, // secondary audio
        r.u8()?, // secondary video
        r.u8()?, // PiP PG
    ];
    r.skip(5)?; // reserved

    let total: u32 = counts.iter().map(|&c| c as u32).sum();
    let mut streams = Vec::with_capacity(total as usize);
    for _ in 0..total {
        streams.push(parse_stream_entry(r)?);
    }

    let target = table_start + 2 + length; // length field itself doesn't count, matches header convention
    let _ = r.seek(target);
    Ok(streams)
}

fn parse_stream_entry(r: &mut Reader<'_>) -> Result<StreamDescriptor> {
    let entry_len = r.u8()? as usize;
    let entry_start = r.tell();
    let stream_type = r.u8()?;
    let pid = match stream_type {
        0x01 => r.u16()?,
        0x02 => {
            let pid = r.u16()?;
            r.skip(2)?;
            pid
        }
        0x03 | 0x04 => {
            r.skip(1)?;
            r.u16()?
        }
        _ => {
            let remaining = entry_len.saturating_sub(r.tell() - entry_start);
            r.skip(remaining)?;
            0
        }
    };
    let _ = r.seek(entry_start + entry_len);

    let attr_len = r.u8()? as usize;
    let attr_bytes = r.read_bytes(attr_len)?;
    let attrs = decode_attributes(attr_bytes, false);

    Ok(StreamDescriptor { pid, attrs })
}

fn parse_marks_section(root: &Reader<'_>, offset: usize) -> Result<Vec<ChapterMark>> {
    let mut r = root.sub_reader(offset, root.view_len().saturating_sub(offset))?;
    let _length = r.u32()?;
    let num_marks = r.u16()?;

    let mut marks = Vec::with_capacity(num_marks as usize);
    for id in 0..num_marks as u32 {
        r.skip(1)?; // reserved
        let mark_type = MarkType::from_byte(r.u8()?);
        let play_item_ref = r.u16()?;
        let timestamp = r.u32()?;
        let entry_es_pid = r.u16()?;
        let duration_90khz = r.u32()?;
        // Open Question (preserved): divide by 45, not 90, matching reference
        // behavior even though the field is nominally 90 kHz-based.
        let duration_ms = duration_90khz as f64 / 45.0;

        marks.push(ChapterMark {
            id,
            mark_type,
            play_item_ref,
            timestamp,
            entry_es_pid: Some(entry_es_pid).filter(|&p| p != 0),
            duration_ms,
        });
    }
    Ok(marks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NullLogger;

    fn write_stream_entry(buf: &mut Vec<u8>, pid: u16, coding_type: u8) {
        // entry: len byte, stream_type(0x01), pid(2)
        let entry_body = [0x01u8, (pid >> 8) as u8, (pid & 0xFF) as u8];
        buf.push(entry_body.len() as u8);
        buf.extend_from_slice(&entry_body);
        // attrs: len byte, coding_type, format/rate nibble byte
        let attr_body = [coding_type, 0x10];
        buf.push(attr_body.len() as u8);
        buf.extend_from_slice(&attr_body);
    }

    fn build_minimal_mpls() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"MPLS");
        buf.extend_from_slice(b"0200");
        // placeholders for playlist_start / playlist_mark_start, patched below
        let header_len = buf.len();
        buf.extend_from_slice(&[0u8; 4]); // playlist start
        buf.extend_from_slice(&[0u8; 4]); // mark start
        // pad header to 40 bytes like real MPLS (not strictly required by our parser)
        buf.resize(40, 0);

        let playlist_start = buf.len();
        let mut pl_section = Vec::new();
        // placeholder length
        pl_section.extend_from_slice(&[0u8; 4]);
        pl_section.extend_from_slice(&[0u8; 2]); // reserved
        pl_section.extend_from_slice(&1u16.to_be_bytes()); // num play items
        pl_section.extend_from_slice(&0u16.to_be_bytes()); // num sub paths

        let mut item = Vec::new();
        // length placeholder (u16)
        item.extend_from_slice(&[0u8; 2]);
        item.extend_from_slice(b"00001"); // clip id
        item.extend_from_slice(&[0u8; 4]); // codec id
        item.extend_from_slice(&0u16.to_be_bytes()); // flags: no multi-angle, conn cond 0
        item.push(0); // reserved
        item.extend_from_slice(&0u32.to_be_bytes()); // in_time
        item.extend_from_slice(&(45_000u32 * 60).to_be_bytes()); // out_time = 60s
        item.extend_from_slice(&[0u8; 8]); // UO mask
        item.push(0); // mixed flags
        item.push(0); // still mode
        item.extend_from_slice(&[0u8; 2]); // still time

        let mut stn = Vec::new();
        stn.extend_from_slice(&[0u8; 2]); // length placeholder
        stn.extend_from_slice(&[0u8; 2]); // reserved
        stn.push(1); // video count
        stn.push(0); // audio
        stn.push(0); // pg
        stn.push(0); // ig
        stn.push(0); // sec audio
        stn.push(0); // sec video
        stn.push(0); // pip pg
        stn.extend_from_slice(&[0u8; 5]); // reserved
        write_stream_entry(&mut stn, 0x1011, 0x1B);
        let stn_len = (stn.len() - 2) as u16;
        stn[0..2].copy_from_slice(&stn_len.to_be_bytes());

        item.extend_from_slice(&stn);
        let item_len = (item.len() - 2) as u16;
        item[0..2].copy_from_slice(&item_len.to_be_bytes());

        pl_section.extend_from_slice(&item);
        let pl_len = (pl_section.len() - 4) as u32;
        pl_section[0..4].copy_from_slice(&pl_len.to_be_bytes());

        buf.extend_from_slice(&pl_section);

        let mark_start = buf.len();
        let mut mark_section = Vec::new();
        mark_section.extend_from_slice(&[0u8; 4]); // length placeholder
        mark_section.extend_from_slice(&1u16.to_be_bytes()); // num marks
        mark_section.push(0); // reserved
        mark_section.push(1); // mark type = entry point
        mark_section.extend_from_slice(&0u16.to_be_bytes()); // play item ref
        mark_section.extend_from_slice(&0u32.to_be_bytes()); // timestamp
        mark_section.extend_from_slice(&0u16.to_be_bytes()); // entry es pid
        mark_section.extend_from_slice(&0u32.to_be_bytes()); // duration

        buf.extend_from_slice(&mark_section);

        buf[header_len..header_len + 4].copy_from_slice(&(playlist_start as u32).to_be_bytes());
        buf[header_len + 4..header_len + 8].copy_from_slice(&(mark_start as u32).to_be_bytes());

        buf
    }

    #[test]
    fn parses_minimal_playlist() {
        let data = build_minimal_mpls();
        let logger = NullLogger;
        let pl = parse_mpls("00001.mpls", &data, &logger).unwrap();
        assert_eq!(pl.play_items.len(), 1);
        assert_eq!(pl.play_items[0].clip_id, "00001");
        assert_eq!(pl.play_items[0].duration_s(), 60.0);
        assert_eq!(pl.play_items[0].streams.len(), 1);
        assert_eq!(pl.play_items[0].streams[0].pid, 0x1011);
        assert_eq!(pl.marks.len(), 1);
        assert!(!pl.multi_angle);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = build_minimal_mpls();
        data[0] = b'X';
        let logger = NullLogger;
        assert!(matches!(
            parse_mpls("bad.mpls", &data, &logger),
            Err(Error::FormatMagic { .. })
        ));
    }

    #[test]
    fn rejects_bad_version() {
        let mut data = build_minimal_mpls();
        data[4..8].copy_from_slice(b"9999");
        let logger = NullLogger;
        assert!(matches!(
            parse_mpls("bad.mpls", &data, &logger),
            Err(Error::FormatVersion { .. })
        ));
    }

    #[test]
    fn signature_round_trip() {
        let data = build_minimal_mpls();
        let logger = NullLogger;
        let pl = parse_mpls("00001.mpls", &data, &logger).unwrap();
        let total: f64 = pl.play_items.iter().map(|pi| pi.duration_ms()).sum();
        assert!((total - pl.duration_ms()).abs() < 1.0);
    }
}
