//! Shared codec-byte table (§4.2.3) and per-class attribute decoding, used by both
//! the MPLS STN_table parser and the CLPI ProgramInfo parser.

/// The stream's coarse media class, derived from the codec byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamClass {
    Video,
    Audio,
    Graphic,
}

/// Codec name lookup for a coding-type byte. CLPI additionally recognizes `0xEA`
/// (VC-1); MPLS does not.
pub fn codec_name(coding_type: u8, clpi: bool) -> &'static str {
    match coding_type {
        0x01 => "MPEG-1 Video",
        0x02 => "MPEG-2 Video",
        0x1B => "H.264/AVC",
        0x24 => "HEVC",
        0xEA if clpi => "VC-1",
        0x03 | 0x04 => "MPEG-1/2 Audio",
        0x80 => "LPCM",
        0x81 => "AC-3",
        0x82 => "DTS",
        0x83 => "TrueHD",
        0x84 => "(E-)AC-3",
        0x85 => "DTS-HD HR",
        0x86 => "DTS-HD MA",
        0xA1 | 0xA2 => "secondary audio",
        0x90 => "PGS",
        0x91 => "IG",
        0x92 => "Text Subtitle",
        _ => "unknown",
    }
}

pub fn stream_class(coding_type: u8) -> StreamClass {
    match coding_type {
        0x01 | 0x02 | 0x1B | 0x24 | 0xEA => StreamClass::Video,
        0x03 | 0x04 | 0x80..=0x86 | 0xA1 | 0xA2 => StreamClass::Audio,
        0x90 | 0x91 | 0x92 => StreamClass::Graphic,
        _ => StreamClass::Graphic,
    }
}

/// The free-form attribute bag carried by a stream descriptor (§3).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamAttributes {
    pub coding_type: u8,
    pub codec_name: &'static str,
    pub language: Option<String>,
    /// High nibble of the packed format/rate byte for video/audio classes.
    pub format_nibble: Option<u8>,
    /// Low nibble of the packed format/rate byte for video/audio classes.
    pub rate_nibble: Option<u8>,
    /// Text-subtitle character-code byte, present only for class `Graphic` with
    /// `coding_type == 0x92`.
    pub char_code: Option<u8>,
}

/// Decode an attribute block whose first byte is a coding-type and whose
/// remaining bytes follow §4.2.3's per-class layout. `body` must already exclude
/// the length prefix.
pub fn decode_attributes(body: &[u8], clpi: bool) -> StreamAttributes {
    if body.is_empty() {
        return StreamAttributes::default();
    }
    let coding_type = body[0];
    let rest = &body[1..];
    let name = codec_name(coding_type, clpi);
    let class = stream_class(coding_type);

    match class {
        StreamClass::Video => {
            let packed = rest.first().copied().unwrap_or(0);
            StreamAttributes {
                coding_type,
                codec_name: name,
                language: None,
                format_nibble: Some((packed >> 4) & 0x0F),
                rate_nibble: Some(packed & 0x0F),
                char_code: None,
            }
        }
        StreamClass::Audio => {
            let packed = rest.first().copied().unwrap_or(0);
            let language = ascii_lang(rest.get(1..4));
            StreamAttributes {
                coding_type,
                codec_name: name,
                language,
                format_nibble: Some((packed >> 4) & 0x0F),
                rate_nibble: Some(packed & 0x0F),
                char_code: None,
            }
        }
        StreamClass::Graphic => {
            if coding_type == 0x92 {
                let char_code = rest.first().copied();
                let language = ascii_lang(rest.get(1..4));
                StreamAttributes {
                    coding_type,
                    codec_name: name,
                    language,
                    format_nibble: None,
                    rate_nibble: None,
                    char_code,
                }
            } else {
                let language = ascii_lang(rest.get(0..3));
                StreamAttributes {
                    coding_type,
                    codec_name: name,
                    language,
                    format_nibble: None,
                    rate_nibble: None,
                    char_code: None,
                }
            }
        }
    }
}

fn ascii_lang(bytes: Option<&[u8]>) -> Option<String> {
    let bytes = bytes?;
    if bytes.len() < 3 {
        return None;
    }
    Some(bytes[..3].iter().map(|&b| b as char).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_codec_names() {
        assert_eq!(codec_name(0x1B, false), "H.264/AVC");
        assert_eq!(codec_name(0xEA, true), "VC-1");
        assert_eq!(codec_name(0xEA, false), "unknown");
    }

    #[test]
    fn audio_attributes_carry_language() {
        let body = [0x81, 0b0001_0011, b'e', b'n', b'g'];
        let attrs = decode_attributes(&body, false);
        assert_eq!(attrs.codec_name, "AC-3");
        assert_eq!(attrs.format_nibble, Some(0x1));
        assert_eq!(attrs.rate_nibble, Some(0x3));
        assert_eq!(attrs.language.as_deref(), Some("eng"));
    }

    #[test]
    fn text_subtitle_attributes_carry_char_code_then_language() {
        let body = [0x92, 0x01, b'j', b'p', b'n'];
        let attrs = decode_attributes(&body, false);
        assert_eq!(attrs.char_code, Some(0x01));
        assert_eq!(attrs.language.as_deref(), Some("jpn"));
    }
}
