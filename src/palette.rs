//! Named colours and channel scaling shared by every map type.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const COLOR_DEEPSEA: [u8; 3] = [0x00, 0x00, 0x68];
pub const COLOR_SEA: [u8; 3] = [0x00, 0x00, 0xA0];
pub const COLOR_BLUE: [u8; 3] = [0x00, 0x00, 0xFF];
pub const COLOR_GRASSLAND: [u8; 3] = [0x4C, 0xA6, 0x4C];
pub const COLOR_HILLS: [u8; 3] = [0x8B, 0x6F, 0x47];
pub const COLOR_WHITE: [u8; 3] = [0xFF, 0xFF, 0xFF];
pub const COLOR_COBALT: [u8; 3] = [0x00, 0x47, 0xAB];
pub const COLOR_AZURE: [u8; 3] = [0x00, 0x7F, 0xFF];

/// Process-wide palette used unless a caller supplies an override.
pub static DEFAULT_PALETTE: Palette = Palette {
    deepsea: COLOR_DEEPSEA,
    sea: COLOR_SEA,
    blue: COLOR_BLUE,
    grassland: COLOR_GRASSLAND,
    hills: COLOR_HILLS,
    white: COLOR_WHITE,
    cobalt: COLOR_COBALT,
    azure: COLOR_AZURE,
};

/// The fixed colours used by the banded and river map types.
///
/// Serialized as `#rrggbb` strings; keys missing from a palette file keep
/// their default colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    #[serde(with = "hex_colour")]
    pub deepsea: [u8; 3],
    #[serde(with = "hex_colour")]
    pub sea: [u8; 3],
    #[serde(with = "hex_colour")]
    pub blue: [u8; 3],
    #[serde(with = "hex_colour")]
    pub grassland: [u8; 3],
    #[serde(with = "hex_colour")]
    pub hills: [u8; 3],
    #[serde(with = "hex_colour")]
    pub white: [u8; 3],
    #[serde(with = "hex_colour")]
    pub cobalt: [u8; 3],
    #[serde(with = "hex_colour")]
    pub azure: [u8; 3],
}

impl Default for Palette {
    fn default() -> Self {
        DEFAULT_PALETTE
    }
}

impl Palette {
    /// All entries as `(name, colour)` pairs, in file-key order.
    pub fn entries(&self) -> [(&'static str, [u8; 3]); 8] {
        [
            ("deepsea", self.deepsea),
            ("sea", self.sea),
            ("blue", self.blue),
            ("grassland", self.grassland),
            ("hills", self.hills),
            ("white", self.white),
            ("cobalt", self.cobalt),
            ("azure", self.azure),
        ]
    }

    pub fn from_json_str(json: &str) -> Result<Self, PaletteError> {
        serde_json::from_str(json).map_err(PaletteError::Parse)
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, PaletteError> {
        let contents = fs::read_to_string(path).map_err(PaletteError::Io)?;
        Self::from_json_str(&contents)
    }
}

/// Errors that can occur while loading a palette override
#[derive(Debug)]
pub enum PaletteError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl std::fmt::Display for PaletteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaletteError::Io(e) => write!(f, "I/O error: {}", e),
            PaletteError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for PaletteError {}

/// Unpack a `0xRRGGBB` integer.
pub fn hex_to_rgb(hex: u32) -> [u8; 3] {
    [
        ((hex >> 16) & 0xFF) as u8,
        ((hex >> 8) & 0xFF) as u8,
        (hex & 0xFF) as u8,
    ]
}

/// Format as `#rrggbb`.
pub fn rgb_to_hex(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

/// Parse `#rrggbb` (the leading `#` is optional).
pub fn parse_hex(s: &str) -> Option<[u8; 3]> {
    let digits = s.strip_prefix('#').unwrap_or(s);
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok().map(hex_to_rgb)
}

/// Scale a fraction to a colour channel: `value * scale`, clamped to
/// [0, 255] and truncated. NaN becomes 0.
pub fn scale_channel(value: f32, scale: f32) -> u8 {
    (value * scale).clamp(0.0, 255.0) as u8
}

/// Grey of intensity `value * 255`.
pub fn grey(value: f32) -> [u8; 3] {
    let g = scale_channel(value, 255.0);
    [g, g, g]
}

mod hex_colour {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(rgb: &[u8; 3], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::rgb_to_hex(*rgb))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 3], D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_hex(&s).ok_or_else(|| D::Error::custom(format!("invalid colour '{}', expected #rrggbb", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_conversions() {
        assert_eq!(hex_to_rgb(0x0047AB), [0x00, 0x47, 0xAB]);
        assert_eq!(rgb_to_hex([0, 127, 255]), "#007fff");
        assert_eq!(parse_hex("#4ca64c"), Some(COLOR_GRASSLAND));
        assert_eq!(parse_hex("FFFFFF"), Some(COLOR_WHITE));
        assert_eq!(parse_hex("#fff"), None);
        assert_eq!(parse_hex("#gg0000"), None);
    }

    #[test]
    fn test_scale_channel_clamps() {
        assert_eq!(scale_channel(0.5, 255.0), 127);
        assert_eq!(scale_channel(1.0, 255.0), 255);
        assert_eq!(scale_channel(1.7, 255.0), 255);
        assert_eq!(scale_channel(-0.2, 255.0), 0);
        assert_eq!(scale_channel(f32::NAN, 255.0), 0);
        assert_eq!(scale_channel(1.0, 128.0), 128);
    }

    #[test]
    fn test_grey_is_uniform() {
        assert_eq!(grey(0.2), [51, 51, 51]);
        assert_eq!(grey(0.0), [0, 0, 0]);
    }

    #[test]
    fn test_palette_colours_are_distinct() {
        let entries = DEFAULT_PALETTE.entries();
        for (i, (a_name, a)) in entries.iter().enumerate() {
            for (b_name, b) in entries.iter().skip(i + 1) {
                assert_ne!(a, b, "{} and {} share a colour", a_name, b_name);
            }
        }
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let palette = Palette::from_json_str(r##"{"cobalt": "#102030"}"##).unwrap();
        assert_eq!(palette.cobalt, [0x10, 0x20, 0x30]);
        assert_eq!(palette.azure, COLOR_AZURE);
        assert_eq!(palette.deepsea, COLOR_DEEPSEA);
    }

    #[test]
    fn test_bad_hex_is_a_parse_error() {
        assert!(matches!(
            Palette::from_json_str(r#"{"sea": "blue"}"#),
            Err(PaletteError::Parse(_))
        ));
    }

    #[test]
    fn test_palette_json_round_trip() {
        let json = serde_json::to_string(&DEFAULT_PALETTE).unwrap();
        assert!(json.contains("\"white\":\"#ffffff\""));
        assert_eq!(Palette::from_json_str(&json).unwrap(), DEFAULT_PALETTE);
    }
}
