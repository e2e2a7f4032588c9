//! CLPI (`CLIPINF/*.clpi`) parser (§4.2).

use crate::codec::decode_attributes;
use crate::error::{tag4, Error, Result};
use crate::logging::Logger;
use crate::model::{ClipInfo, StreamDescriptor};
use crate::reader::Reader;

const ACCEPTED_VERSIONS: &[&str] = &["0100", "0200"];

/// Parse one CLPI file's bytes into a [`ClipInfo`]. `clip_id` is the 5-digit id
/// derived from the filename stem (e.g. `"00007"` for `00007.clpi`).
pub fn parse_clpi(clip_id: &str, data: &[u8], logger: &dyn Logger) -> Result<ClipInfo> {
    let mut r = Reader::new(data);

    let magic = r.read_bytes(4)?;
    if magic != b"HDMV" {
        return Err(Error::FormatMagic {
            expected: "HDMV",
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

    let _seq_info_start = r.u32()?;
    let program_info_start = r.u32()? as usize;
    let _cpi_start = r.u32()?;
    let _clip_mark_start = r.u32()?;
    let _ext_data_start = r.u32()?;

    // ClipInfo section lives at a fixed offset.
    let recorded_duration_ms = match parse_clip_info_section(&r) {
        Ok(v) => v,
        Err(e) => {
            logger.debug("Truncated", &format!("{clip_id}.clpi: ClipInfo section: {e}"));
            None
        }
    };

    let streams = match parse_program_info(&r, program_info_start) {
        Ok(streams) => streams,
        Err(e) => {
            logger.debug("Truncated", &format!("{clip_id}.clpi: ProgramInfo section: {e}"));
            Vec::new()
        }
    };

    Ok(ClipInfo {
        clip_id: clip_id.to_string(),
        streams,
        recorded_duration_ms,
    })
}

fn parse_clip_info_section(root: &Reader<'_>) -> Result<Option<f64>> {
    let mut r = root.sub_reader(40, root.view_len().saturating_sub(40))?;
    let _length = r.u32()?;
    r.skip(2)?; // reserved
    let _clip_stream_type = r.u8()?;
    let _application_type = r.u8()?;
    r.skip(4)?; // reserved / flags
    let _ts_recording_rate = r.u32()?;
    let _num_source_packets = r.u32()?;
    Ok(None)
}

fn parse_program_info(root: &Reader<'_>, offset: usize) -> Result<Vec<StreamDescriptor>> {
    let mut r = root.sub_reader(offset, root.view_len().saturating_sub(offset))?;
    let length = r.u32()?;
    if length == 0 {
        return Ok(Vec::new());
    }
    r.skip(1)?; // reserved
    let num_programs = r.u8()?;

    let mut streams = Vec::new();
    for _ in 0..num_programs {
        r.skip(4)?; // SPN_program_sequence_start
        r.skip(2)?; // program_map_PID
        let num_streams = r.u8()?;
        r.skip(1)?; // num_groups
        for _ in 0..num_streams {
            let pid = r.u16()?;
            let attr_len = r.u8()? as usize;
            let attr_bytes = r.read_bytes(attr_len)?;
            let attrs = decode_attributes(attr_bytes, true);
            streams.push(StreamDescriptor { pid, attrs });
        }
    }
    Ok(streams)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NullLogger;

    fn build_minimal_clpi() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"HDMV");
        buf.extend_from_slice(b"0200");
        let header_after_magic_version = buf.len();
        buf.extend_from_slice(&[0u8; 4]); // seq info start
        let program_info_offset_pos = buf.len();
        buf.extend_from_slice(&[0u8; 4]); // program info start (patched)
        buf.extend_from_slice(&[0u8; 4]); // cpi start
        buf.extend_from_slice(&[0u8; 4]); // clip mark start
        buf.extend_from_slice(&[0u8; 4]); // ext data start
        let _ = header_after_magic_version;

        buf.resize(40, 0);
        // ClipInfo section at offset 40
        let mut ci = Vec::new();
        ci.extend_from_slice(&20u32.to_be_bytes()); // length
        ci.extend_from_slice(&[0u8; 2]); // reserved
        ci.push(1); // stream type
        ci.push(1); // application type
        ci.extend_from_slice(&[0u8; 4]); // reserved/flags
        ci.extend_from_slice(&0u32.to_be_bytes()); // ts recording rate
        ci.extend_from_slice(&1000u32.to_be_bytes()); // num source packets
        buf.extend_from_slice(&ci);

        let program_info_start = buf.len();
        let mut pi = Vec::new();
        let mut body = Vec::new();
        body.push(0u8); // reserved
        body.push(1u8); // num_programs
        body.extend_from_slice(&[0u8; 4]); // SPN
        body.extend_from_slice(&0x1011u16.to_be_bytes()); // PMT pid
        body.push(1); // num_streams
        body.push(0); // num_groups
        body.extend_from_slice(&0x1011u16.to_be_bytes()); // stream pid
        let attr = [0x1Bu8, 0x10]; // H.264, format/rate nibble
        body.push(attr.len() as u8);
        body.extend_from_slice(&attr);
        pi.extend_from_slice(&(body.len() as u32).to_be_bytes());
        pi.extend_from_slice(&body);
        buf.extend_from_slice(&pi);

        buf[program_info_offset_pos..program_info_offset_pos + 4]
            .copy_from_slice(&(program_info_start as u32).to_be_bytes());

        buf
    }

    #[test]
    fn parses_minimal_clip_info() {
        let data = build_minimal_clpi();
        let logger = NullLogger;
        let clip = parse_clpi("00007", &data, &logger).unwrap();
        assert_eq!(clip.clip_id, "00007");
        assert_eq!(clip.streams.len(), 1);
        assert_eq!(clip.streams[0].pid, 0x1011);
        assert_eq!(clip.streams[0].attrs.codec_name, "H.264/AVC");
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = build_minimal_clpi();
        data[0] = b'X';
        let logger = NullLogger;
        assert!(matches!(
            parse_clpi("00007", &data, &logger),
            Err(Error::FormatMagic { .. })
        ));
    }
}
