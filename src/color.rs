/*
 *  color.rs
 *
 *  MoonRingS - every print gets a halo
 *  (c) 2023-26 Piotr Malczak
 *
 *  RGB helpers shared by the palettes, the renderer, and the idle animation
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::fmt;

pub use rgb::RGB8;

/// All channels off.
pub const BLACK: RGB8 = RGB8::new(0, 0, 0);

/// Error returned when a `"r,g,b"` color string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorParseError(pub String);

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid color triple '{}' (expected \"r,g,b\" with 0-255 components)", self.0)
    }
}

impl std::error::Error for ColorParseError {}

/// Parse a `"r,g,b"` triple as found in the configuration file.
///
/// Whitespace around the components is tolerated: `"255, 160, 0"`.
pub fn parse_color(s: &str) -> Result<RGB8, ColorParseError> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(ColorParseError(s.to_string()));
    }
    let channel = |p: &str| p.parse::<u8>().map_err(|_| ColorParseError(s.to_string()));
    Ok(RGB8::new(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?))
}

/// Per-channel `color * level` with saturation, level 0..=255.
///
/// The breathing animation drives this with unit base colors so the result
/// sweeps the full channel range.
pub fn scale(color: RGB8, level: u8) -> RGB8 {
    let mul = |c: u8| -> u8 { (c as u16 * level as u16).min(255) as u8 };
    RGB8::new(mul(color.r), mul(color.g), mul(color.b))
}

/// Global brightness applied at the hardware boundary, factor 0.0..=1.0.
pub fn dim(color: RGB8, factor: f32) -> RGB8 {
    let mul = |c: u8| -> u8 { (c as f32 * factor).round().clamp(0.0, 255.0) as u8 };
    RGB8::new(mul(color.r), mul(color.g), mul(color.b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("255,0,0").unwrap(), RGB8::new(255, 0, 0));
        assert_eq!(parse_color(" 10, 20 ,30 ").unwrap(), RGB8::new(10, 20, 30));
    }

    #[test]
    fn test_parse_color_rejects_garbage() {
        assert!(parse_color("").is_err());
        assert!(parse_color("1,2").is_err());
        assert!(parse_color("1,2,3,4").is_err());
        assert!(parse_color("256,0,0").is_err());
        assert!(parse_color("red,green,blue").is_err());
    }

    #[test]
    fn test_scale_unit_base() {
        let base = RGB8::new(1, 0, 0);
        assert_eq!(scale(base, 0), BLACK);
        assert_eq!(scale(base, 128), RGB8::new(128, 0, 0));
        assert_eq!(scale(base, 255), RGB8::new(255, 0, 0));
    }

    #[test]
    fn test_dim() {
        assert_eq!(dim(RGB8::new(255, 100, 0), 0.2), RGB8::new(51, 20, 0));
        assert_eq!(dim(RGB8::new(10, 10, 10), 1.0), RGB8::new(10, 10, 10));
    }
}
