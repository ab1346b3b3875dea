//! Govee H613B wire protocol - frame types and framing
//!
//! Every message exchanged with the bulb is a fixed 20 byte frame:
//!
//! ```text
//! [type(1), command(1), payload(17, zero padded), checksum(1)]
//! ```
//!
//! The checksum is the XOR of the 19 bytes before it.

pub mod ble;
pub mod notification;
pub mod palette;
pub mod state;

pub use notification::{ColorReport, Notification};
pub use state::{ColorMode, LightState};

/// Total length of a frame on the wire
pub const FRAME_LEN: usize = 20;

/// Maximum payload carried by a single frame
pub const MAX_PAYLOAD: usize = 17;

// Message types (byte 0)
pub const MSG_COMMAND: u8 = 0x33;
pub const MSG_KEEP_ALIVE: u8 = 0xaa;
pub const MSG_DIY: u8 = 0xa1;

// Commands (byte 1). KEEP_ALIVE queries reuse the same codes.
pub const CMD_POWER: u8 = 0x01;
pub const CMD_BRIGHTNESS: u8 = 0x04;
pub const CMD_COLOR: u8 = 0x05;

/// Colour change modes, first payload byte of a COLOR command.
///
/// Only manual mode is modelled.
pub mod mode {
    pub const MANUAL: u8 = 0x0d;
    pub const MICROPHONE: u8 = 0x06;
    pub const SCENES: u8 = 0x05;
}

/// Marker following the rgb triple of a COLOR payload when white mode is used
pub const WHITE_FLAG: u8 = 0x01;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("payload too long: {0} bytes (max {MAX_PAYLOAD})")]
    PayloadTooLong(usize),
    #[error("malformed frame: expected {FRAME_LEN} bytes, got {0}")]
    MalformedFrame(usize),
}

/// XOR of all bytes
pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0, |acc, b| acc ^ b)
}

/// A single protocol frame, payload already zero padded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub msg_type: u8,
    pub command: u8,
    pub payload: [u8; MAX_PAYLOAD],
}

impl Frame {
    pub fn new(msg_type: u8, command: u8, payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() > MAX_PAYLOAD {
            return Err(FrameError::PayloadTooLong(payload.len()));
        }
        let mut padded = [0u8; MAX_PAYLOAD];
        padded[..payload.len()].copy_from_slice(payload);
        Ok(Self {
            msg_type,
            command,
            payload: padded,
        })
    }

    /// Power on/off command
    pub fn power(on: bool) -> Self {
        Self::fixed(MSG_COMMAND, CMD_POWER, &[u8::from(on)])
    }

    /// Brightness command, raw device value
    pub fn brightness(value: u8) -> Self {
        Self::fixed(MSG_COMMAND, CMD_BRIGHTNESS, &[value])
    }

    /// Manual mode colour command
    pub fn color(r: u8, g: u8, b: u8) -> Self {
        Self::fixed(MSG_COMMAND, CMD_COLOR, &[mode::MANUAL, r, g, b])
    }

    /// White mode colour command.
    ///
    /// The rgb triple is sent as full white and ignored by the bulb; the
    /// shade that follows the flag selects the white LEDs' warmth.
    pub fn white(shade: [u8; 3]) -> Self {
        Self::fixed(
            MSG_COMMAND,
            CMD_COLOR,
            &[mode::MANUAL, 0xff, 0xff, 0xff, WHITE_FLAG, shade[0], shade[1], shade[2]],
        )
    }

    /// KEEP_ALIVE state query; the bulb answers with a notification
    pub fn query(command: u8, payload: &[u8]) -> Result<Self, FrameError> {
        Self::new(MSG_KEEP_ALIVE, command, payload)
    }

    // Payloads of the builders above are compile-time short.
    fn fixed(msg_type: u8, command: u8, payload: &[u8]) -> Self {
        let mut padded = [0u8; MAX_PAYLOAD];
        padded[..payload.len()].copy_from_slice(payload);
        Self {
            msg_type,
            command,
            payload: padded,
        }
    }

    pub fn to_bytes(&self) -> [u8; FRAME_LEN] {
        let mut buf = [0u8; FRAME_LEN];
        buf[0] = self.msg_type;
        buf[1] = self.command;
        buf[2..FRAME_LEN - 1].copy_from_slice(&self.payload);
        buf[FRAME_LEN - 1] = checksum(&buf[..FRAME_LEN - 1]);
        buf
    }

    /// Parse an inbound frame.
    ///
    /// The checksum is not verified: frames originating from the device are
    /// taken as-is.
    pub fn from_bytes(data: &[u8]) -> Result<Self, FrameError> {
        if data.len() != FRAME_LEN {
            return Err(FrameError::MalformedFrame(data.len()));
        }
        let mut payload = [0u8; MAX_PAYLOAD];
        payload.copy_from_slice(&data[2..FRAME_LEN - 1]);
        Ok(Self {
            msg_type: data[0],
            command: data[1],
            payload,
        })
    }
}

/// Hex rendering used in log lines
pub fn to_hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}
