use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::CollatzError;

/// Straight-alpha RGBA8 color, written as `#RRGGBB`, `#RRGGBBAA`, or a basic color name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Color {
    /// Opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque yellow (`#FFFF00`).
    pub const YELLOW: Self = Self::rgb(255, 255, 0);

    /// Same color with alpha scaled by `opacity` (clamped to `0..=1`).
    pub fn with_opacity(self, opacity: f64) -> Self {
        let a = (f64::from(self.a) * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }

    /// Premultiplied form.
    pub fn premul(self) -> Rgba8Premul {
        Rgba8Premul::from_straight_rgba(self.r, self.g, self.b, self.a)
    }

    /// Channel bytes in `[r, g, b, a]` order.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// `#rrggbbaa` hex text.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

impl FromStr for Color {
    type Err = CollatzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(c) = named(s) {
            return Ok(c);
        }
        parse_hex(s).map_err(CollatzError::config)
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn named(s: &str) -> Option<Color> {
    let c = match s.to_ascii_lowercase().as_str() {
        "black" => Color::rgb(0, 0, 0),
        "white" => Color::rgb(255, 255, 255),
        "red" => Color::rgb(255, 0, 0),
        "green" => Color::rgb(0, 128, 0),
        "blue" => Color::rgb(0, 0, 255),
        "yellow" => Color::YELLOW,
        "cyan" => Color::rgb(0, 255, 255),
        "magenta" => Color::rgb(255, 0, 255),
        "orange" => Color::rgb(255, 165, 0),
        _ => return None,
    };
    Some(c)
}

fn parse_hex(s: &str) -> Result<Color, String> {
    let s = s.strip_prefix('#').unwrap_or(s);

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    if !s.is_ascii() {
        return Err(format!("invalid color \"{s}\""));
    }

    match s.len() {
        6 => Ok(Color::rgb(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
        )),
        8 => Ok(Color {
            r: hex_byte(&s[0..2])?,
            g: hex_byte(&s[2..4])?,
            b: hex_byte(&s[4..6])?,
            a: hex_byte(&s[6..8])?,
        }),
        _ => Err(format!(
            "color \"{s}\" must be #RRGGBB, #RRGGBBAA, or a basic color name"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_rgb_and_rgba() {
        assert_eq!("#FFFF00".parse::<Color>().unwrap(), Color::YELLOW);
        assert_eq!(
            "#0000ff80".parse::<Color>().unwrap(),
            Color {
                r: 0,
                g: 0,
                b: 255,
                a: 128
            }
        );
        assert_eq!("00ff00".parse::<Color>().unwrap(), Color::rgb(0, 255, 0));
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("Yellow".parse::<Color>().unwrap(), Color::YELLOW);
        assert_eq!("black".parse::<Color>().unwrap(), Color::BLACK);
    }

    #[test]
    fn rejects_garbage() {
        assert!("#12345".parse::<Color>().is_err());
        assert!("#gg0000".parse::<Color>().is_err());
        assert!("chartreuse-ish".parse::<Color>().is_err());
    }

    #[test]
    fn opacity_scales_alpha_only() {
        let c = Color::YELLOW.with_opacity(0.5);
        assert_eq!(c.to_array(), [255, 255, 0, 128]);
        assert_eq!(c.premul().to_array(), [128, 128, 0, 128]);
    }

    #[test]
    fn serde_round_trips_through_hex_text() {
        let v = serde_json::to_value(Color::YELLOW).unwrap();
        assert_eq!(v, serde_json::json!("#ffff00ff"));
        let c: Color = serde_json::from_value(v).unwrap();
        assert_eq!(c, Color::YELLOW);
    }
}
