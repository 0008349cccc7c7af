use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorChannel {
    Red,
    Green,
    Blue,
}

impl ColorChannel {
    pub const ALL: [ColorChannel; 3] = [ColorChannel::Red, ColorChannel::Green, ColorChannel::Blue];

    pub fn letter(self) -> char {
        match self {
            ColorChannel::Red => 'R',
            ColorChannel::Green => 'G',
            ColorChannel::Blue => 'B',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'R' => Some(ColorChannel::Red),
            'G' => Some(ColorChannel::Green),
            'B' => Some(ColorChannel::Blue),
            _ => None,
        }
    }
}

/// Clips a channel value into 0..=255 (300 stays 255, -5 stays 0).
pub fn clamp_channel(value: i64) -> u8 {
    value.clamp(0, 255) as u8
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(rng.gen(), rng.gen(), rng.gen())
    }

    /// Parses `#RGB`, `#RRGGBB`, `0xRRGGBB` or the bare digits, in any case.
    pub fn from_hex(input: &str) -> Result<Self> {
        let invalid = || Error::InvalidHexColor(input.to_string());

        let trimmed = input.trim();
        let digits = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return Err(invalid()),
        };

        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn channel(&self, channel: ColorChannel) -> u8 {
        match channel {
            ColorChannel::Red => self.r,
            ColorChannel::Green => self.g,
            ColorChannel::Blue => self.b,
        }
    }

    pub fn set_channel(&mut self, channel: ColorChannel, value: u8) {
        match channel {
            ColorChannel::Red => self.r = value,
            ColorChannel::Green => self.g = value,
            ColorChannel::Blue => self.b = value,
        }
    }
}

/// Parses a single-channel setting such as `R 200`, `g=15` or `b:300`.
/// The value is clamped, not wrapped.
pub fn parse_channel_setting(input: &str) -> Result<(ColorChannel, u8)> {
    let invalid = || Error::InvalidChannelSetting(input.to_string());

    let trimmed = input.trim();
    let mut chars = trimmed.chars();
    let channel = chars
        .next()
        .and_then(ColorChannel::from_letter)
        .ok_or_else(invalid)?;
    let rest = chars
        .as_str()
        .trim_start()
        .trim_start_matches(|c: char| c == '=' || c == ':')
        .trim();
    let value: i64 = rest.parse().map_err(|_| invalid())?;
    Ok((channel, clamp_channel(value)))
}
