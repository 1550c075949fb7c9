//! 24-bit color, the fixed ANSI palette, and the blend primitive.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from loosely typed channels, rejecting anything outside
    /// 0..=255. Use this at API boundaries that accept caller integers.
    pub fn from_channels(r: i32, g: i32, b: i32) -> Result<Self> {
        let valid = |c: i32| (0..=255).contains(&c);
        if !valid(r) || !valid(g) || !valid(b) {
            return Err(Error::InvalidChannel { r, g, b });
        }
        Ok(Self::new(r as u8, g as u8, b as u8))
    }
}

pub const BLACK: Rgb = Rgb::new(0, 0, 0);
pub const WHITE: Rgb = Rgb::new(192, 192, 192);
pub const BRIGHT_WHITE: Rgb = Rgb::new(255, 255, 255);

/// The 16 standard colors, index 0 = black through 15 = bright white.
pub const ANSI_PALETTE: [Rgb; 16] = [
    Rgb::new(0, 0, 0),
    Rgb::new(128, 0, 0),
    Rgb::new(0, 128, 0),
    Rgb::new(128, 128, 0),
    Rgb::new(0, 0, 128),
    Rgb::new(128, 0, 128),
    Rgb::new(0, 128, 128),
    Rgb::new(192, 192, 192),
    Rgb::new(128, 128, 128),
    Rgb::new(255, 0, 0),
    Rgb::new(0, 255, 0),
    Rgb::new(255, 255, 0),
    Rgb::new(0, 0, 255),
    Rgb::new(255, 0, 255),
    Rgb::new(0, 255, 255),
    Rgb::new(255, 255, 255),
];

/// Palette lookup for index-based callers. Indexes wrap at 16 so a stray
/// bright bit cannot panic a draw path.
pub fn ansi_color(index: u8) -> Rgb {
    ANSI_PALETTE[(index & 0x0f) as usize]
}

/// Per-channel linear interpolation from `from` toward `to` by `pct`.
///
/// `pct` 0.0 yields `from`, 1.0 yields `to`. Values outside 0..1 extrapolate;
/// each channel rounds half-up and clamps to 0..=255.
pub fn transition(from: Rgb, to: Rgb, pct: f32) -> Rgb {
    fn channel(from: u8, to: u8, pct: f32) -> u8 {
        let blended = f32::from(from) + (f32::from(to) - f32::from(from)) * pct;
        blended.round().clamp(0.0, 255.0) as u8
    }
    Rgb::new(
        channel(from.r, to.r, pct),
        channel(from.g, to.g, pct),
        channel(from.b, to.b, pct),
    )
}
