//! §4.2.4: HDMV navigation command decoding, shared by the `MovieObject.bdmv`
//! parser and the IG button-command parser.

use crate::error::{Error, Result};

/// One decoded 12-byte HDMV navigation command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavCommand {
    pub group: u8,
    pub sub_group: u8,
    pub op_code: u8,
    pub imm_op1: bool,
    pub imm_op2: bool,
    pub operand1: u32,
    pub operand2: u32,
}

impl NavCommand {
    /// Decode a single 12-byte record at `offset` (used only to build a
    /// [`Error::NavCommandDecode`] if the window is short).
    pub fn decode(bytes: &[u8], offset: usize) -> Result<NavCommand> {
        if bytes.len() < 12 {
            return Err(Error::NavCommandDecode { offset });
        }
        let byte0 = bytes[0];
        let byte1 = bytes[1];
        let group = (byte0 >> 3) & 0b11;
        let sub_group = byte0 & 0b111;
        let imm_op1 = (byte1 >> 7) & 1 == 1;
        let imm_op2 = (byte1 >> 6) & 1 == 1;
        let op_code = byte1 & 0xF;
        let operand1 = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let operand2 = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        Ok(NavCommand {
            group,
            sub_group,
            op_code,
            imm_op1,
            imm_op2,
            operand1,
            operand2,
        })
    }

    /// `PlayPL` / `PlayPL_PI` / `PlayPL_PM`: `group=0, sub_group=2, op_code in {0,1,2}`.
    /// `operand1` is the playlist number; `operand2` is the play-item or play-mark
    /// index where applicable.
    pub fn is_play_playlist(&self) -> bool {
        self.group == 0 && self.sub_group == 2 && matches!(self.op_code, 0 | 1 | 2)
    }

    pub fn playlist_number(&self) -> Option<u32> {
        self.is_play_playlist().then_some(self.operand1)
    }

    /// `JumpTitle`: `group=0, sub_group=1, op_code=1`. `operand1` is a 1-based
    /// title number.
    pub fn is_jump_title(&self) -> bool {
        self.group == 0 && self.sub_group == 1 && self.op_code == 1
    }

    pub fn jump_title_number(&self) -> Option<u32> {
        self.is_jump_title().then_some(self.operand1)
    }

    /// `SetRegister` with an immediate value: `group=2, sub_group=0, imm_op2=1,
    /// operand1 < 0x1000`. `operand1` is the register index; `operand2` the value.
    pub fn is_set_register(&self) -> bool {
        self.group == 2 && self.sub_group == 0 && self.imm_op2 && self.operand1 < 0x1000
    }

    pub fn set_register(&self) -> Option<(u32, u32)> {
        self.is_set_register().then_some((self.operand1, self.operand2))
    }
}

/// Decode a flat buffer of back-to-back 12-byte commands, skipping (and logging)
/// any command whose window is malformed rather than failing the whole parse
/// (§7: `NavCommandDecode` recovers locally).
pub fn decode_commands(bytes: &[u8], logger: &dyn crate::logging::Logger) -> Vec<NavCommand> {
    let mut commands = Vec::with_capacity(bytes.len() / 12);
    for (i, chunk) in bytes.chunks(12).enumerate() {
        if chunk.len() < 12 {
            logger.debug("NavCommandDecode", &format!("short trailing command at index {i}"));
            continue;
        }
        match NavCommand::decode(chunk, i * 12) {
            Ok(cmd) => commands.push(cmd),
            Err(_) => logger.debug("NavCommandDecode", &format!("malformed command at index {i}")),
        }
    }
    commands
}
