use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::RoiError;

/// Position of a region along one of the Z/C/T axes.
///
/// `Any` is the wildcard (raw value `0`), `Index(n)` pins the region to the
/// 1-based slice `n`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AxisPosition {
    #[default]
    Any,
    Index(u32),
}

impl AxisPosition {
    /// Build from the raw encoding where `0` means wildcard
    pub fn from_raw(raw: u32) -> Self {
        if raw == 0 { Self::Any } else { Self::Index(raw) }
    }

    pub fn raw(self) -> u32 {
        match self {
            Self::Any => 0,
            Self::Index(index) => index,
        }
    }

    pub fn is_any(self) -> bool {
        self == Self::Any
    }

    /// Whether this position is visible at the given zero-based slice index
    pub fn matches(self, zero_based: usize) -> bool {
        match self {
            Self::Any => true,
            Self::Index(index) => index as usize == zero_based + 1,
        }
    }
}

impl fmt::Display for AxisPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "*"),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// (Z, C, T) position of a region in slice space
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlicePosition {
    pub z: AxisPosition,
    pub c: AxisPosition,
    pub t: AxisPosition,
}

impl SlicePosition {
    pub const ANY: SlicePosition = SlicePosition {
        z: AxisPosition::Any,
        c: AxisPosition::Any,
        t: AxisPosition::Any,
    };

    /// Build from raw 1-based indices (`0` = wildcard)
    pub fn new(z: u32, c: u32, t: u32) -> Self {
        Self {
            z: AxisPosition::from_raw(z),
            c: AxisPosition::from_raw(c),
            t: AxisPosition::from_raw(t),
        }
    }

    pub fn is_any(&self) -> bool {
        self.z.is_any() && self.c.is_any() && self.t.is_any()
    }

    /// Checks visibility at a zero-based slice index. Each axis is tested
    /// independently; an ignored axis always matches.
    pub fn is_visible_in(&self, index: SliceIndex, ignore: AxisIgnore) -> bool {
        (ignore.z || self.z.matches(index.z))
            && (ignore.c || self.c.matches(index.c))
            && (ignore.t || self.t.matches(index.t))
    }
}

impl fmt::Display for SlicePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "z={}, c={}, t={}", self.z, self.c, self.t)
    }
}

/// Zero-based index of a plane in a Z/C/T canvas
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub struct SliceIndex {
    pub z: usize,
    pub c: usize,
    pub t: usize,
}

impl SliceIndex {
    pub fn new(z: usize, c: usize, t: usize) -> Self {
        Self { z, c, t }
    }
}

/// Per-axis flags that force wildcard matching during rendering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AxisIgnore {
    pub z: bool,
    pub c: bool,
    pub t: bool,
}

impl AxisIgnore {
    pub const NONE: AxisIgnore = AxisIgnore { z: false, c: false, t: false };
    pub const ALL: AxisIgnore = AxisIgnore { z: true, c: true, t: true };
}

/// An sRGB color with alpha.
///
/// Serialized as `#RRGGBB`, or `#AARRGGBB` when not fully opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_rgb(self) -> image::Rgb<u8> {
        image::Rgb([self.r, self.g, self.b])
    }

    /// Multiplies the hue, saturation and value components by the given factors
    pub fn scale_hsv(self, hue: f32, saturation: f32, value: f32) -> Self {
        let (h, s, v) = rgb_to_hsv(self.r, self.g, self.b);
        let (r, g, b) = hsv_to_rgb(
            (h * hue).clamp(0.0, 1.0),
            (s * saturation).clamp(0.0, 1.0),
            (v * value).clamp(0.0, 1.0),
        );
        Self { r, g, b, a: self.a }
    }
}

fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        ((g - b) / delta).rem_euclid(6.0) / 6.0
    } else if max == g {
        ((b - r) / delta + 2.0) / 6.0
    } else {
        ((r - g) / delta + 4.0) / 6.0
    };
    let saturation = if max == 0.0 { 0.0 } else { delta / max };
    (hue, saturation, max)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
    let sector = (h * 6.0).rem_euclid(6.0);
    let i = sector.floor();
    let f = sector - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match i as u8 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    let to_byte = |x: f32| (x * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_byte(r), to_byte(g), to_byte(b))
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.a, self.r, self.g, self.b)
        }
    }
}

impl FromStr for Color {
    type Err = RoiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        let byte = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|part| u8::from_str_radix(part, 16).ok())
                .ok_or_else(|| RoiError::Archive(format!("Invalid color: {s}")))
        };
        match hex.len() {
            6 => Ok(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Color {
                a: byte(0)?,
                r: byte(2)?,
                g: byte(4)?,
                b: byte(6)?,
            }),
            _ => Err(RoiError::Archive(format!("Invalid color: {s}"))),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = RoiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl JsonSchema for Color {
    fn schema_name() -> String {
        "Color".to_string()
    }

    fn json_schema(generator: &mut schemars::r#gen::SchemaGenerator) -> schemars::schema::Schema {
        String::json_schema(generator)
    }
}

/// Display attributes of a region
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Style {
    pub fill_color: Option<Color>,
    pub stroke_color: Option<Color>,
    /// Stroke width in pixels; `None` or a non-positive width means "use the default"
    pub stroke_width: Option<f64>,
}

impl Style {
    /// Stroke width to draw with, falling back to `default` for unset or non-positive widths
    pub fn line_width_or(&self, default: u32) -> u32 {
        match self.stroke_width {
            Some(width) if width > 0.0 => width as u32,
            _ => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_axis_matches_every_slice() {
        let position = SlicePosition::new(0, 2, 0);
        assert!(position.is_visible_in(SliceIndex::new(0, 1, 0), AxisIgnore::NONE));
        assert!(position.is_visible_in(SliceIndex::new(7, 1, 3), AxisIgnore::NONE));
        assert!(!position.is_visible_in(SliceIndex::new(0, 0, 0), AxisIgnore::NONE));
        assert!(position.is_visible_in(SliceIndex::new(0, 0, 0), AxisIgnore { c: true, ..AxisIgnore::NONE }));
    }

    #[test]
    fn color_hex_round_trip() {
        let color: Color = "#FF8000".parse().unwrap();
        assert_eq!(color, Color::rgb(255, 128, 0));
        assert_eq!(color.to_string(), "#FF8000");

        let translucent = Color { a: 0x80, ..color };
        assert_eq!(translucent.to_string(), "#80FF8000");
        assert_eq!(translucent.to_string().parse::<Color>().unwrap(), translucent);
        assert!("#12".parse::<Color>().is_err());
    }

    #[test]
    fn dimming_halves_value() {
        let dimmed = Color::rgb(200, 100, 0).scale_hsv(0.8, 1.0, 0.5);
        assert_eq!(dimmed.r, 100);
        assert!(dimmed.g < 50);
        assert_eq!(dimmed.b, 0);
    }

    #[test]
    fn non_positive_stroke_width_uses_default() {
        let style = Style { stroke_width: Some(0.0), ..Style::default() };
        assert_eq!(style.line_width_or(3), 3);
        let style = Style { stroke_width: Some(2.0), ..Style::default() };
        assert_eq!(style.line_width_or(3), 2);
    }
}
