//! Device state snapshot
//!
//! `LightState` is a small `Copy` value. It is never mutated in place by
//! its owners: every change derives a new value with one of the `with_*`
//! constructors and replaces the old snapshot wholesale.

/// Which set of LEDs drives the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    #[default]
    Color,
    White,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LightState {
    pub power: bool,
    /// Last known manual colour, kept while white mode is active
    pub rgb: (u8, u8, u8),
    /// Last known position in the white palette, kept while colour mode is active
    pub white_index: u8,
    /// Raw device brightness. The bulb honours 1-100.
    pub brightness: u8,
    pub mode: ColorMode,
}

impl LightState {
    pub fn with_power(self, power: bool) -> Self {
        Self { power, ..self }
    }

    pub fn with_rgb(self, rgb: (u8, u8, u8)) -> Self {
        Self {
            rgb,
            mode: ColorMode::Color,
            ..self
        }
    }

    /// White mode at palette `index`. The cached rgb becomes full white,
    /// which is also what the bulb reports back in this mode.
    pub fn with_white(self, index: u8) -> Self {
        Self {
            rgb: (0xff, 0xff, 0xff),
            white_index: index,
            mode: ColorMode::White,
            ..self
        }
    }

    pub fn with_brightness(self, brightness: u8) -> Self {
        Self { brightness, ..self }
    }

    pub fn is_white(&self) -> bool {
        self.mode == ColorMode::White
    }
}
