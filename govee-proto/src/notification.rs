//! Decoding of state reports sent by the bulb
//!
//! Reports are KEEP_ALIVE frames answering the queries written by the
//! session. The command byte selects what is reported:
//!
//! ```text
//! aa 01 01 00 ..        power on
//! aa 04 36 00 ..        brightness 54
//! aa 05 0d ff 00 00 ..  manual colour (255, 0, 0)
//! ```
//!
//! Unknown commands are ignored so newer firmware does not break the session.

use crate::palette;
use crate::state::LightState;
use crate::{CMD_BRIGHTNESS, CMD_COLOR, CMD_POWER, Frame, FrameError, MSG_KEEP_ALIVE, WHITE_FLAG, mode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorReport {
    Manual((u8, u8, u8)),
    /// Manual mode with the white flag and a known palette shade
    White([u8; 3]),
    /// Mode byte other than manual (scenes, microphone, ...)
    UnknownMode(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Power(bool),
    Color(ColorReport),
    Brightness(u8),
    Unknown(u8),
}

impl Notification {
    /// Classify a frame. Returns `None` for anything but KEEP_ALIVE reports.
    pub fn from_frame(frame: &Frame) -> Option<Self> {
        if frame.msg_type != MSG_KEEP_ALIVE {
            return None;
        }
        let p = &frame.payload;
        let notification = match frame.command {
            CMD_POWER => Notification::Power(p[0] == 0x01),
            CMD_BRIGHTNESS => Notification::Brightness(p[0]),
            CMD_COLOR if p[0] != mode::MANUAL => Notification::Color(ColorReport::UnknownMode(p[0])),
            CMD_COLOR => {
                let shade = [p[5], p[6], p[7]];
                if p[4] == WHITE_FLAG && palette::find_shade(shade).is_some() {
                    Notification::Color(ColorReport::White(shade))
                } else {
                    Notification::Color(ColorReport::Manual((p[1], p[2], p[3])))
                }
            }
            other => Notification::Unknown(other),
        };
        Some(notification)
    }

    pub fn parse(data: &[u8]) -> Result<Option<Self>, FrameError> {
        Ok(Self::from_frame(&Frame::from_bytes(data)?))
    }

    /// Merge this report into `state`
    pub fn apply(&self, state: LightState) -> LightState {
        match *self {
            Notification::Power(on) => state.with_power(on),
            Notification::Brightness(value) => state.with_brightness(value),
            Notification::Color(ColorReport::Manual(rgb)) => state.with_rgb(rgb),
            Notification::Color(ColorReport::White(shade)) => {
                // Neighbouring palette entries can share a shade; keep the
                // index we set if it still matches the report.
                let current = usize::from(state.white_index);
                let index = if palette::shade(current) == shade {
                    current
                } else {
                    palette::find_shade(shade).unwrap_or(current)
                };
                state.with_white(index as u8)
            }
            Notification::Color(ColorReport::UnknownMode(byte)) => {
                log::warn!("Unknown mode byte 0x{byte:02x} in COLOR report, ignoring");
                state
            }
            Notification::Unknown(_) => state,
        }
    }
}

/// Decode `data` against the current state.
///
/// `Ok(None)` means the frame was well formed but not a state report.
pub fn decode(state: LightState, data: &[u8]) -> Result<Option<LightState>, FrameError> {
    Ok(Notification::parse(data)?.map(|n| n.apply(state)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ColorMode;

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    #[test]
    fn power_reports() {
        let on = hex("aa010100000000000000000000000000000000aa");
        let off = hex("aa010000000000000000000000000000000000ab");
        let state = decode(LightState::default(), &on).unwrap().unwrap();
        assert!(state.power);
        let state = decode(state, &off).unwrap().unwrap();
        assert!(!state.power);
    }

    #[test]
    fn brightness_report() {
        let data = hex("aa04360000000000000000000000000000000098");
        let state = decode(LightState::default(), &data).unwrap().unwrap();
        assert_eq!(state.brightness, 54);
    }

    #[test]
    fn manual_color_report() {
        let data = hex("aa050d00ff000000000000000000000000000000");
        let state = decode(LightState::default().with_white(3), &data).unwrap().unwrap();
        assert_eq!(state.rgb, (0, 255, 0));
        assert_eq!(state.mode, ColorMode::Color);
        assert_eq!(state.white_index, 3);
    }

    #[test]
    fn white_report_resolves_palette_index() {
        let data = hex("aa050dffffff01d6e1ff00000000000000000094");
        let state = decode(LightState::default(), &data).unwrap().unwrap();
        assert_eq!(state.mode, ColorMode::White);
        assert_eq!(state.white_index as usize, palette::SHADES - 1);
        assert_eq!(state.rgb, (0xff, 0xff, 0xff));
    }

    fn white_report(index: usize) -> [u8; crate::FRAME_LEN] {
        let shade = palette::shade(index);
        let payload = [mode::MANUAL, 0xff, 0xff, 0xff, WHITE_FLAG, shade[0], shade[1], shade[2]];
        Frame::new(MSG_KEEP_ALIVE, CMD_COLOR, &payload).unwrap().to_bytes()
    }

    #[test]
    fn white_report_keeps_index_of_duplicate_shade() {
        // 166 and 167 land on index 92, which shares its shade with 91
        assert_eq!(palette::white_index(166), 92);
        assert_eq!(palette::shade(91), palette::shade(92));

        let mut duplicates = 0;
        for intensity in 0..=255u8 {
            let index = palette::white_index(intensity);
            if palette::find_shade(palette::shade(index)) != Some(index) {
                duplicates += 1;
            }
            let before = LightState::default().with_white(index as u8);
            let after = decode(before, &white_report(index)).unwrap().unwrap();
            assert_eq!(after.white_index as usize, index, "intensity {intensity}");
            assert_eq!(after.mode, ColorMode::White);
        }
        assert!(duplicates > 0);
    }

    #[test]
    fn white_report_for_other_shade_moves_index() {
        let before = LightState::default().with_white(92);
        let after = decode(before, &white_report(10)).unwrap().unwrap();
        assert_eq!(after.white_index, 10);
    }

    #[test]
    fn unknown_mode_is_ignored() {
        let before = LightState::default().with_rgb((1, 2, 3));
        let data = hex("aa0505ff00000000000000000000000000000000");
        assert_eq!(decode(before, &data).unwrap(), Some(before));
    }

    #[test]
    fn unknown_command_is_ignored() {
        let before = LightState::default().with_brightness(9);
        let data = hex("aa06322e30342e3030000000000000000000009a");
        assert_eq!(Notification::parse(&data).unwrap(), Some(Notification::Unknown(0x06)));
        assert_eq!(decode(before, &data).unwrap(), Some(before));
    }

    #[test]
    fn non_keep_alive_frames_are_not_reports() {
        let data = Frame::power(true).to_bytes();
        assert_eq!(decode(LightState::default(), &data).unwrap(), None);
    }

    #[test]
    fn malformed_frames_error() {
        assert_eq!(
            decode(LightState::default(), &[0xaa, 0x01]),
            Err(FrameError::MalformedFrame(2))
        );
    }
}
