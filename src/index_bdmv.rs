//! `index.bdmv` parser (§4.2).

use crate::error::{tag4, Error, Result};
use crate::logging::Logger;
use crate::model::{IndexBdmv, IndexTitle, ObjectType};
use crate::reader::Reader;

const ACCEPTED_VERSIONS: &[&str] = &["0100", "0200"];

const OBJ_HDMV: u8 = 0x01;
const OBJ_BDJ: u8 = 0x02;

/// `(object_type, movie_object_id, access_type)`. `object_type` is `None` when
/// the 12-byte entry names no object at all.
struct IndexEntry {
    object_type: Option<ObjectType>,
    movie_object_id: u16,
    access_type: u8,
}

fn parse_index_entry(r: &mut Reader<'_>) -> Result<IndexEntry> {
    let flags = r.u8()?;
    let object_type_bits = (flags >> 6) & 0x03;
    let access_type = (flags >> 2) & 0x0F;
    r.skip(3)?; // remaining flag / reserved bytes

    if object_type_bits == OBJ_HDMV {
        r.skip(2)?; // hdmv_playback_type
        let movie_object_id = r.u16()?;
        r.skip(4)?; // reserved
        return Ok(IndexEntry {
            object_type: Some(ObjectType::Hdmv),
            movie_object_id,
            access_type,
        });
    }
    if object_type_bits == OBJ_BDJ {
        r.skip(5)?; // org/name id string, ignored
        r.skip(3)?; // padding
        return Ok(IndexEntry {
            object_type: Some(ObjectType::BdJ),
            movie_object_id: 0,
            access_type,
        });
    }
    // No object present: skip the remaining 8 bytes of the 12-byte entry.
    r.skip(8)?;
    Ok(IndexEntry {
        object_type: None,
        movie_object_id: 0,
        access_type: 0,
    })
}

/// Parse one `index.bdmv` file's bytes.
pub fn parse_index_bdmv(data: &[u8], logger: &dyn Logger) -> Result<IndexBdmv> {
    let mut r = Reader::new(data);

    let magic = r.read_bytes(4)?;
    if magic != b"INDX" {
        return Err(Error::FormatMagic {
            expected: "INDX",
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

    let indexes_start = r.u32()? as usize;
    let _ext_data_start = r.u32()?;

    let mut section = r.sub_reader(indexes_start, r.view_len().saturating_sub(indexes_start))?;
    let _section_length = section.u32()?;

    let fp = parse_index_entry(&mut section)?;
    let first_playback_obj = fp.object_type.filter(|t| *t == ObjectType::Hdmv).map(|_| fp.movie_object_id);

    let tm = parse_index_entry(&mut section)?;
    let top_menu_obj = tm.object_type.filter(|t| *t == ObjectType::Hdmv).map(|_| tm.movie_object_id);

    let num_titles = section.u16()?;
    let mut titles = Vec::new();
    for i in 0..num_titles {
        match parse_index_entry(&mut section) {
            Ok(entry) => {
                if let Some(object_type) = entry.object_type {
                    titles.push(IndexTitle {
                        title_num: i,
                        object_type,
                        movie_object_id: entry.movie_object_id,
                        access_type: entry.access_type,
                    });
                }
            }
            Err(e) => {
                logger.debug("Truncated", &format!("index.bdmv: title entry {i}: {e}"));
                break;
            }
        }
    }

    Ok(IndexBdmv {
        first_playback_obj,
        top_menu_obj,
        titles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NullLogger;

    fn hdmv_entry(movie_object_id: u16, access_type: u8) -> [u8; 12] {
        let mut out = [0u8; 12];
        out[0] = (OBJ_HDMV << 6) | ((access_type & 0x0F) << 2);
        out[4..6].copy_from_slice(&[0, 0]); // hdmv_playback_type
        out[6..8].copy_from_slice(&movie_object_id.to_be_bytes());
        out
    }

    fn empty_entry() -> [u8; 12] {
        [0u8; 12]
    }

    fn build_index_bdmv() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"INDX");
        buf.extend_from_slice(b"0200");
        let indexes_start_pos = buf.len();
        buf.extend_from_slice(&[0u8; 4]);
        buf.extend_from_slice(&[0u8; 4]); // ext data start

        let indexes_start = buf.len();
        let mut section = Vec::new();
        section.extend_from_slice(&[0u8; 4]); // section length placeholder
        section.extend_from_slice(&hdmv_entry(1, 3)); // first playback
        section.extend_from_slice(&empty_entry()); // top menu (none)
        section.extend_from_slice(&2u16.to_be_bytes()); // num titles
        section.extend_from_slice(&hdmv_entry(2, 0)); // title 0
        section.extend_from_slice(&hdmv_entry(3, 0)); // title 1

        buf.extend_from_slice(&section);
        buf[indexes_start_pos..indexes_start_pos + 4]
            .copy_from_slice(&(indexes_start as u32).to_be_bytes());
        buf
    }

    #[test]
    fn parses_titles_and_first_playback() {
        let data = build_index_bdmv();
        let logger = NullLogger;
        let idx = parse_index_bdmv(&data, &logger).unwrap();
        assert_eq!(idx.first_playback_obj, Some(1));
        assert_eq!(idx.top_menu_obj, None);
        assert_eq!(idx.titles.len(), 2);
        assert_eq!(idx.titles[0].movie_object_id, 2);
        assert_eq!(idx.titles[1].movie_object_id, 3);
        assert_eq!(idx.titles[0].object_type, ObjectType::Hdmv);
    }
}
