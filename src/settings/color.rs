use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A 24-bit sRGB color stored as `0xRRGGBB`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Color(u32);

impl Color {
    /// Pure white.
    pub const WHITE: Self = Self(0x00ff_ffff);

    /// Build a color from a `0xRRGGBB` value. Bits above 24 are discarded.
    #[must_use]
    pub const fn from_hex(hex: u32) -> Self {
        Self(hex & 0x00ff_ffff)
    }

    /// The packed `0xRRGGBB` value.
    #[must_use]
    pub const fn hex(self) -> u32 {
        self.0
    }

    /// Red channel.
    #[must_use]
    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// Green channel.
    #[must_use]
    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Blue channel.
    #[must_use]
    pub const fn b(self) -> u8 {
        self.0 as u8
    }

    /// Channels normalized to `[0, 1]` in sRGB space.
    #[must_use]
    pub fn to_srgb_f32(self) -> [f32; 3] {
        [
            f32::from(self.r()) / 255.0,
            f32::from(self.g()) / 255.0,
            f32::from(self.b()) / 255.0,
        ]
    }

    /// Channels converted to linear light, for shading and sRGB render
    /// targets.
    #[must_use]
    pub fn to_linear_f32(self) -> [f32; 3] {
        self.to_srgb_f32().map(srgb_to_linear)
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Error returned when a color string is not `#rrggbb`, `rrggbb` or `#rgb`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseColorError {
    input: String,
}

impl fmt::Display for ParseColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid color '{}': expected #rrggbb", self.input)
    }
}

impl std::error::Error for ParseColorError {}

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseColorError {
            input: s.to_owned(),
        };
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }
        let hex = match digits.len() {
            6 => u32::from_str_radix(digits, 16).map_err(|_| err())?,
            // #rgb shorthand: each nibble is doubled
            3 => {
                let short =
                    u32::from_str_radix(digits, 16).map_err(|_| err())?;
                let r = (short >> 8) & 0xf;
                let g = (short >> 4) & 0xf;
                let b = short & 0xf;
                ((r * 0x11) << 16) | ((g * 0x11) << 8) | (b * 0x11)
            }
            _ => return Err(err()),
        };
        Ok(Self(hex))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

impl TryFrom<String> for Color {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_form_with_and_without_hash() {
        assert_eq!("#00ff00".parse::<Color>().unwrap().hex(), 0x00ff00);
        assert_eq!("FF6B6B".parse::<Color>().unwrap().hex(), 0xff6b6b);
    }

    #[test]
    fn parses_shorthand() {
        assert_eq!("#f80".parse::<Color>().unwrap().hex(), 0xff8800);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!("#12345".parse::<Color>().is_err());
        assert!("#gg0000".parse::<Color>().is_err());
        assert!("".parse::<Color>().is_err());
        assert!("#+12345".parse::<Color>().is_err());
        assert!("##00ff00".parse::<Color>().is_err());
        assert!("###f80".parse::<Color>().is_err());
    }

    #[test]
    fn displays_as_lowercase_hex() {
        assert_eq!(Color::from_hex(0x1a1a2e).to_string(), "#1a1a2e");
        assert_eq!(Color::from_hex(0x0000ff).to_string(), "#0000ff");
    }

    #[test]
    fn from_hex_masks_high_bits() {
        assert_eq!(Color::from_hex(0xff12_3456).hex(), 0x12_3456);
    }

    #[test]
    fn linear_conversion_keeps_endpoints() {
        assert_eq!(Color::WHITE.to_linear_f32(), [1.0, 1.0, 1.0]);
        assert_eq!(Color::from_hex(0).to_linear_f32(), [0.0, 0.0, 0.0]);
        let mid = Color::from_hex(0x80_8080).to_linear_f32()[0];
        assert!(mid > 0.2 && mid < 0.23, "got {mid}");
    }
}
