//! CSS-style hex colors used throughout the document model.

use crate::model::ModelError;
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An 8-bit RGBA color that serializes as a CSS hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RgbaColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl RgbaColor {
    pub const WHITE: Self = Self::rgb(0xff, 0xff, 0xff);
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    /// Default text color (`#1e293b`).
    pub const SLATE: Self = Self::rgb(0x1e, 0x29, 0x3b);
    /// Default note background (`#fef3c7`).
    pub const NOTE_YELLOW: Self = Self::rgb(0xfe, 0xf3, 0xc7);
    /// Default shape fill (`#dbeafe`).
    pub const SHAPE_BLUE: Self = Self::rgb(0xdb, 0xea, 0xfe);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 0xff)
    }

    /// Parse `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa` or `transparent`.
    pub fn parse(input: &str) -> Result<Self, ModelError> {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("transparent") {
            return Ok(Self::TRANSPARENT);
        }
        let invalid = || ModelError::InvalidColor(input.to_string());
        let hex = trimmed.strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).map(|v| v * 17);
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);

        let parsed = match hex.len() {
            3 => (nibble(0), nibble(1), nibble(2), Ok(0xff)),
            4 => (nibble(0), nibble(1), nibble(2), nibble(3)),
            6 => (byte(0), byte(2), byte(4), Ok(0xff)),
            8 => (byte(0), byte(2), byte(4), byte(6)),
            _ => return Err(invalid()),
        };
        match parsed {
            (Ok(r), Ok(g), Ok(b), Ok(a)) => Ok(Self::new(r, g, b, a)),
            _ => Err(invalid()),
        }
    }

    /// Format as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 0xff {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Default for RgbaColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for RgbaColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for RgbaColor {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RgbaColor {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RgbaColor> for String {
    fn from(color: RgbaColor) -> Self {
        color.to_hex()
    }
}

impl From<RgbaColor> for Color {
    fn from(color: RgbaColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

impl From<Color> for RgbaColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self::new(rgba.r, rgba.g, rgba.b, rgba.a)
    }
}
