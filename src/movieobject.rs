//! `MovieObject.bdmv` parser (§4.2), built on the shared §4.2.4 nav command decode.

use crate::error::{tag4, Error, Result};
use crate::logging::Logger;
use crate::model::{MovieObject, MovieObjectBdmv};
use crate::nav::NavCommand;
use crate::reader::Reader;

/// Parse one `MovieObject.bdmv` file's bytes.
pub fn parse_movieobject_bdmv(data: &[u8], logger: &dyn Logger) -> Result<MovieObjectBdmv> {
    let mut r = Reader::new(data);

    let magic = r.read_bytes(4)?;
    if magic != b"MOBJ" {
        return Err(Error::FormatMagic {
            expected: "MOBJ",
            found: tag4(magic),
        });
    }
    let _version = r.read_bytes(4)?;

    r.seek(40)?;

    let _section_length = r.u32()?;
    r.skip(4)?; // reserved
    let num_objects = r.u16()?;

    let mut objects = Vec::with_capacity(num_objects as usize);
    for object_id in 0..num_objects {
        let flags = r.u8()?;
        let resume_intention = (flags >> 7) & 1 == 1;
        let menu_call_mask = (flags >> 6) & 1 == 1;
        let title_search_mask = (flags >> 5) & 1 == 1;
        r.skip(1)?; // reserved
        let num_commands = r.u16()?;

        let mut commands = Vec::with_capacity(num_commands as usize);
        for i in 0..num_commands {
            let raw = r.read_bytes(12)?;
            match NavCommand::decode(raw, i as usize * 12) {
                Ok(cmd) => commands.push(cmd),
                Err(_) => logger.debug(
                    "NavCommandDecode",
                    &format!("object {object_id}: command {i} malformed"),
                ),
            }
        }

        objects.push(MovieObject {
            object_id,
            resume_intention,
            menu_call_mask,
            title_search_mask,
            commands,
        });
    }

    Ok(MovieObjectBdmv { objects })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NullLogger;

    fn play_pl_command(playlist: u32) -> [u8; 12] {
        let mut out = [0u8; 12];
        out[0] = (0 << 3) | 2; // group=0, sub_group=2
        out[1] = 0; // op_code=0 (PlayPL)
        out[4..8].copy_from_slice(&playlist.to_be_bytes());
        out
    }

    fn build_movieobject() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"MOBJ");
        buf.extend_from_slice(b"0200");
        buf.resize(40, 0);
        buf.extend_from_slice(&0u32.to_be_bytes()); // section length
        buf.extend_from_slice(&[0u8; 4]); // reserved
        buf.extend_from_slice(&1u16.to_be_bytes()); // num objects

        buf.push(0b1000_0000); // resume_intention=1
        buf.push(0); // reserved
        buf.extend_from_slice(&1u16.to_be_bytes()); // num commands
        buf.extend_from_slice(&play_pl_command(7));

        buf
    }

    #[test]
    fn parses_single_object_with_play_command() {
        let data = build_movieobject();
        let logger = NullLogger;
        let mo = parse_movieobject_bdmv(&data, &logger).unwrap();
        assert_eq!(mo.objects.len(), 1);
        let obj = &mo.objects[0];
        assert!(obj.resume_intention);
        assert_eq!(obj.referenced_playlists(), vec![7]);
    }
}
