//! VC0706 serial protocol: command builders and reply parsing
//!
//! Host commands are `0x56 0x00 CMD [args]`; camera replies are
//! `0x76 0x00 CMD STATUS LEN [LEN bytes]`. Multi-byte integers on the
//! wire are big-endian. STATUS 0 means the command executed.

use crate::config::FrameSize;
use crate::error::{Error, Result};

/// First byte of every host command
pub const SIGN_TX: u8 = 0x56;
/// First byte of every camera reply
pub const SIGN_RX: u8 = 0x76;
/// Serial id; fixed at 0 for a single camera on the bus
pub const SERIAL_ID: u8 = 0x00;

pub const CMD_GEN_VERSION: u8 = 0x11;
pub const CMD_WRITE_DATA: u8 = 0x31;
pub const CMD_READ_FBUF: u8 = 0x32;
pub const CMD_GET_FBUF_LEN: u8 = 0x34;
pub const CMD_FBUF_CTRL: u8 = 0x36;

/// FBUF_CTRL: freeze the current frame for readout
pub const FBUF_STOP_CURRENT: u8 = 0x00;
/// FBUF_CTRL: resume live capture
pub const FBUF_RESUME: u8 = 0x03;

/// Request the firmware version string
pub fn gen_version() -> [u8; 4] {
    [SIGN_TX, SERIAL_ID, CMD_GEN_VERSION, 0x00]
}

/// Frame buffer control (stop / resume)
pub fn fbuf_ctrl(action: u8) -> [u8; 5] {
    [SIGN_TX, SERIAL_ID, CMD_FBUF_CTRL, 0x01, action]
}

/// Request the frozen frame's length
pub fn get_fbuf_len() -> [u8; 5] {
    [SIGN_TX, SERIAL_ID, CMD_GET_FBUF_LEN, 0x01, 0x00]
}

/// Read `len` bytes of the frozen frame starting at `start`
///
/// `delay_10us` paces the camera's transfer in 10 µs units. Uses MCU
/// transfer mode (0x0A).
pub fn read_fbuf(start: u32, len: u32, delay_10us: u16) -> [u8; 16] {
    let mut cmd = [0u8; 16];
    cmd[..6].copy_from_slice(&[SIGN_TX, SERIAL_ID, CMD_READ_FBUF, 0x0C, 0x00, 0x0A]);
    cmd[6..10].copy_from_slice(&start.to_be_bytes());
    cmd[10..14].copy_from_slice(&len.to_be_bytes());
    cmd[14..16].copy_from_slice(&delay_10us.to_be_bytes());
    cmd
}

/// Set the capture resolution (chip register 0x0019)
pub fn set_image_size(size: FrameSize) -> [u8; 9] {
    let code = match size {
        FrameSize::Vga => 0x00,
        FrameSize::Qvga => 0x11,
        FrameSize::Qqvga => 0x22,
    };
    [SIGN_TX, SERIAL_ID, CMD_WRITE_DATA, 0x05, 0x04, 0x01, 0x00, 0x19, code]
}

/// Set the JPEG compression ratio (chip register 0x1204)
pub fn set_compression(ratio: u8) -> [u8; 9] {
    [SIGN_TX, SERIAL_ID, CMD_WRITE_DATA, 0x05, 0x01, 0x01, 0x12, 0x04, ratio]
}

/// Parsed 5-byte reply header
#[derive(Debug, Clone, Copy)]
pub struct ReplyHeader {
    pub cmd: u8,
    pub status: u8,
    pub data_len: u8,
}

/// Validate the reply signature and split out the header fields
pub fn parse_reply(header: &[u8; 5]) -> Result<ReplyHeader> {
    if header[0] != SIGN_RX || header[1] != SERIAL_ID {
        return Err(Error::InvalidReply(format!(
            "bad reply signature {:02X?}",
            header
        )));
    }
    Ok(ReplyHeader {
        cmd: header[2],
        status: header[3],
        data_len: header[4],
    })
}

impl ReplyHeader {
    /// Require that this reply answers `expected_cmd` and succeeded
    pub fn check(&self, expected_cmd: u8) -> Result<()> {
        if self.cmd != expected_cmd {
            return Err(Error::InvalidReply(format!(
                "reply for command {:#04x}, expected {:#04x}",
                self.cmd, expected_cmd
            )));
        }
        if self.status != 0 {
            return Err(Error::InvalidReply(format!(
                "command {:#04x} failed with status {:#04x}",
                self.cmd, self.status
            )));
        }
        Ok(())
    }
}
