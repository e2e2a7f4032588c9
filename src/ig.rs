//! M2TS demux + Interactive Composition Segment (ICS) parser (§4.2, §4.2.4).
//!
//! Status mirrors the original: covers the common case observed on real discs
//! (single-PID IG stream, non-multiplexed ICS at the start of the PES body);
//! BD-J overlays and multi-segment ICS streams are not handled.

use crate::model::IgButtonHint;
use crate::nav::NavCommand;

const IG_PID_MIN: u16 = 0x1400;
const IG_PID_MAX: u16 = 0x141F;
const SEG_ICS: u8 = 0x18;
const M2TS_PKT: usize = 192;
const TS_HDR: usize = 4;

/// One button in an IG menu page.
#[derive(Debug, Clone, PartialEq)]
pub struct IgButton {
    pub button_id: u16,
    pub x: u16,
    pub y: u16,
    pub auto_action: bool,
    pub commands: Vec<NavCommand>,
}

/// One page of the interactive menu.
#[derive(Debug, Clone, PartialEq)]
pub struct IgPage {
    pub page_id: u8,
    pub default_button: u16,
    pub default_activated: u16,
    pub buttons: Vec<IgButton>,
}

/// A parsed Interactive Composition Segment.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractiveComposition {
    pub width: u16,
    pub height: u16,
    pub pages: Vec<IgPage>,
}

/// Demux the IG PES payload out of an M2TS buffer. If `ig_pid` is `None`,
/// auto-detects the first PID in `0x1400..=0x141F`. Returns concatenated PES
/// payload bytes (segment headers included), scanning 192-byte packets
/// sequentially without buffering more than one packet at a time (§5).
pub fn demux_ig_stream(data: &[u8], ig_pid: Option<u16>, logger: &dyn crate::logging::Logger) -> Vec<u8> {
    let mut pes_data = Vec::new();
    let mut pos = 0usize;
    let mut found_pid = ig_pid;

    while pos + M2TS_PKT <= data.len() {
        let ts = &data[pos + TS_HDR..pos + M2TS_PKT];
        if ts[0] != 0x47 {
            pos += 1;
            continue;
        }

        let pid = (((ts[1] & 0x1F) as u16) << 8) | ts[2] as u16;
        let adapt = (ts[3] >> 4) & 3;
        let pusi = (ts[1] >> 6) & 1;

        if found_pid.is_none() && (IG_PID_MIN..=IG_PID_MAX).contains(&pid) {
            found_pid = Some(pid);
            logger.debug("ig", &format!("auto-detected IG PID 0x{pid:04X}"));
        }

        if Some(pid) == found_pid {
            let offset = if adapt == 2 || adapt == 3 { 5 + ts[4] as usize } else { 4 };
            if adapt == 1 || adapt == 3 {
                if offset <= ts.len() {
                    let payload = &ts[offset..];
                    if pusi == 1 && payload.len() >= 9 && &payload[..3] == [0x00, 0x00, 0x01] {
                        let hdr_len = payload[8] as usize;
                        if 9 + hdr_len <= payload.len() {
                            pes_data.extend_from_slice(&payload[9 + hdr_len..]);
                        }
                    } else {
                        pes_data.extend_from_slice(payload);
                    }
                }
            }
        }

        pos += M2TS_PKT;
    }

    pes_data
}

/// Return the body of the first `0x18` (ICS) segment found in `pes_data`.
pub fn extract_ics_data(pes_data: &[u8]) -> Option<&[u8]> {
    let mut pos = 0usize;
    while pos + 3 <= pes_data.len() {
        let seg_type = pes_data[pos];
        let seg_len = ((pes_data[pos + 1] as usize) << 8) | pes_data[pos + 2] as usize;
        if seg_type == SEG_ICS {
            let end = (pos + 3 + seg_len).min(pes_data.len());
            return Some(&pes_data[pos + 3..end]);
        }
        if seg_len == 0 {
            break;
        }
        pos += 3 + seg_len;
    }
    None
}

/// Parse an ICS body (the bytes *after* the 3-byte segment header). Bit layout
/// follows the libbluray `ig_decode.c` reference.
pub fn parse_ics(data: &[u8], logger: &dyn crate::logging::Logger) -> Option<InteractiveComposition> {
    let mut p = 0usize;
    let need = |p: usize, n: usize| -> bool { p + n <= data.len() };

    if !need(p, 5) {
        return None;
    }
    let width = u16::from_be_bytes([data[p], data[p + 1]]);
    let height = u16::from_be_bytes([data[p + 2], data[p + 3]]);
    p += 5;

    p += 4; // composition_descriptor (3) + sequence_descriptor (1)
    p += 3; // interactive_composition_data_length (24 bits)

    if !need(p, 1) {
        return None;
    }
    let stream_model = (data[p] >> 7) & 1;
    p += 1;

    if stream_model == 0 {
        p += 10; // composition_timeout_PTS + selection_timeout_PTS
    }
    p += 3; // user_timeout_duration (24 bits)

    if !need(p, 1) {
        return None;
    }
    let num_pages = data[p];
    p += 1;

    let mut pages = Vec::with_capacity(num_pages as usize);
    for _ in 0..num_pages {
        if !need(p, 1) {
            break;
        }
        let page_id = data[p];
        p += 1;
        p += 1; // page_version
        p += 8; // UO mask table

        for _ in 0..2 {
            // in_effects, out_effects
            if !need(p, 1) {
                return finish(width, height, pages, logger, "effects truncated");
            }
            let num_windows = data[p] as usize;
            p += 1;
            p += num_windows * 9;
            if !need(p, 1) {
                return finish(width, height, pages, logger, "effects truncated");
            }
            let num_effects = data[p] as usize;
            p += 1;
            for _ in 0..num_effects {
                p += 4; // duration(24) + palette_id_ref(8)
                if !need(p, 1) {
                    return finish(width, height, pages, logger, "effects truncated");
                }
                let num_co = data[p] as usize;
                p += 1;
                for _ in 0..num_co {
                    p += 2; // object_id
                    p += 1; // window_id
                    if !need(p, 1) {
                        return finish(width, height, pages, logger, "effects truncated");
                    }
                    let crop_flag = (data[p] >> 7) & 1;
                    p += 1; // flags
                    p += 4; // x, y
                    if crop_flag == 1 {
                        p += 8;
                    }
                }
            }
        }

        p += 1; // animation_frame_rate_code
        if !need(p, 5) {
            return finish(width, height, pages, logger, "page header truncated");
        }
        let default_button = u16::from_be_bytes([data[p], data[p + 1]]);
        p += 2;
        let default_activated = u16::from_be_bytes([data[p], data[p + 1]]);
        p += 2;
        p += 1; // palette_id_ref
        if !need(p, 1) {
            return finish(width, height, pages, logger, "page header truncated");
        }
        let num_bogs = data[p];
        p += 1;

        let mut page_buttons = Vec::new();
        for _ in 0..num_bogs {
            if !need(p, 3) {
                break;
            }
            p += 2; // bog_default_button
            let num_btns = data[p];
            p += 1;

            for _ in 0..num_btns {
                if !need(p, 2 + 2 + 1 + 2 + 2 + 8 + 5 + 6 + 5 + 2) {
                    break;
                }
                let button_id = u16::from_be_bytes([data[p], data[p + 1]]);
                p += 2;
                p += 2; // numeric_select_value
                let auto_action = (data[p] >> 7) & 1 == 1;
                p += 1;
                let x = u16::from_be_bytes([data[p], data[p + 1]]);
                p += 2;
                let y = u16::from_be_bytes([data[p], data[p + 1]]);
                p += 2;
                p += 8; // neighbor button ids
                p += 5; // normal state
                p += 6; // selected state
                p += 5; // activated state

                let num_cmds = u16::from_be_bytes([data[p], data[p + 1]]);
                p += 2;

                let mut commands = Vec::with_capacity(num_cmds as usize);
                for _ in 0..num_cmds {
                    if !need(p, 12) {
                        break;
                    }
                    match NavCommand::decode(&data[p..p + 12], p) {
                        Ok(cmd) => commands.push(cmd),
                        Err(_) => logger.debug("NavCommandDecode", "IG button command malformed"),
                    }
                    p += 12;
                }

                page_buttons.push(IgButton {
                    button_id,
                    x,
                    y,
                    auto_action,
                    commands,
                });
            }
        }

        pages.push(IgPage {
            page_id,
            default_button,
            default_activated,
            buttons: page_buttons,
        });
    }

    Some(InteractiveComposition { width, height, pages })
}

fn finish(
    width: u16,
    height: u16,
    pages: Vec<IgPage>,
    logger: &dyn crate::logging::Logger,
    why: &str,
) -> Option<InteractiveComposition> {
    logger.debug("Truncated", &format!("ICS parse stopped early: {why}"));
    Some(InteractiveComposition { width, height, pages })
}

/// Extract actionable [`IgButtonHint`]s from a parsed ICS: buttons that
/// directly play a playlist, jump to a title, or set GPR registers.
pub fn extract_menu_hints(ics: &InteractiveComposition) -> Vec<IgButtonHint> {
    let mut hints = Vec::new();

    for page in &ics.pages {
        for btn in &page.buttons {
            if btn.commands.is_empty() {
                continue;
            }

            let mut hint = IgButtonHint {
                page_id: page.page_id as u16,
                button_id: btn.button_id,
                ..Default::default()
            };
            let mut has_action = false;

            for cmd in &btn.commands {
                if cmd.is_play_playlist() {
                    hint.playlist = Some(cmd.operand1);
                    if cmd.op_code == 2 {
                        hint.chapter_mark = Some(cmd.operand2);
                    }
                    has_action = true;
                } else if cmd.is_jump_title() {
                    hint.jump_title = Some(cmd.operand1);
                    has_action = true;
                } else if let Some((reg, val)) = cmd.set_register() {
                    hint.register_writes.insert(reg, val);
                    has_action = true;
                }
            }

            if has_action {
                hints.push(hint);
            }
        }
    }

    hints
}

/// Convenience wrapper combining demux + ICS extraction, matching the shape
/// consumed by the rest of the pipeline. Returns `None` on any missing data.
pub fn parse_ig_from_m2ts(
    data: &[u8],
    ig_pid: Option<u16>,
    logger: &dyn crate::logging::Logger,
) -> Option<InteractiveComposition> {
    let pes_data = demux_ig_stream(data, ig_pid, logger);
    if pes_data.is_empty() {
        logger.debug("ig", "no IG PES data found");
        return None;
    }
    let ics_data = extract_ics_data(&pes_data)?;
    parse_ics(ics_data, logger)
}
