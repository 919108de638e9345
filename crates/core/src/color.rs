//! RGBA colors and the CSS color syntax the site's theme variables use.
//!
//! Components are stored as `f64` in [0, 1]. Parsing accepts the subset of CSS
//! color syntax that appears in the stylesheet: `#rgb`, `#rrggbb`,
//! `#rrggbbaa`, `rgb(r, g, b)` and `rgba(r, g, b, a)`. Anything else is an
//! error; callers that draw should use [`Rgba::parse_css_or`] and keep going.

use crate::error::FieldError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A straight-alpha color with components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Rgba = Rgba::rgb(0.0, 0.0, 0.0);
    pub const TRANSPARENT: Rgba = Rgba {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    /// Opaque color from components in [0, 1].
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Builds a color from 8-bit channels and a [0, 1] alpha.
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self {
            r: f64::from(r) / 255.0,
            g: f64::from(g) / 255.0,
            b: f64::from(b) / 255.0,
            a: a.clamp(0.0, 1.0),
        }
    }

    /// Parses a CSS color string.
    ///
    /// Returns `FieldError::InvalidColor` for anything outside the supported
    /// syntax, including out-of-range channel values.
    pub fn parse_css(input: &str) -> Result<Rgba, FieldError> {
        let s = input.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| FieldError::InvalidColor(input.to_string()));
        }
        let lower = s.to_ascii_lowercase();
        let args = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| FieldError::InvalidColor(input.to_string()))?;
        parse_functional(args).ok_or_else(|| FieldError::InvalidColor(input.to_string()))
    }

    /// Parses a CSS color, returning `fallback` if the input is malformed.
    pub fn parse_css_or(input: &str, fallback: Rgba) -> Rgba {
        Self::parse_css(input).unwrap_or(fallback)
    }

    /// Same color with a different alpha (clamped to [0, 1]).
    pub fn with_alpha(self, a: f64) -> Rgba {
        Rgba {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Linear interpolation between two colors, `t` clamped to [0, 1].
    pub fn lerp(self, other: Rgba, t: f64) -> Rgba {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        Rgba {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// Quantized 8-bit channels, alpha included.
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// CSS `rgba(...)` form, suitable for canvas `fillStyle`/`strokeStyle`.
    pub fn to_css(self) -> String {
        let [r, g, b, _] = self.to_rgba8();
        let a = (self.a.clamp(0.0, 1.0) * 1000.0).round() / 1000.0;
        format!("rgba({r}, {g}, {b}, {a})")
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_css())
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgba::parse_css(&s).map_err(serde::de::Error::custom)
    }
}

fn hex_pair(s: &str) -> Option<u8> {
    u8::from_str_radix(s, 16).ok()
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        3 => {
            let expand = |i: usize| hex_pair(&hex[i..=i].repeat(2));
            Some(Rgba::from_rgba8(expand(0)?, expand(1)?, expand(2)?, 1.0))
        }
        6 => Some(Rgba::from_rgba8(
            hex_pair(&hex[0..2])?,
            hex_pair(&hex[2..4])?,
            hex_pair(&hex[4..6])?,
            1.0,
        )),
        8 => Some(Rgba::from_rgba8(
            hex_pair(&hex[0..2])?,
            hex_pair(&hex[2..4])?,
            hex_pair(&hex[4..6])?,
            f64::from(hex_pair(&hex[6..8])?) / 255.0,
        )),
        _ => None,
    }
}

fn parse_functional(args: &str) -> Option<Rgba> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    let channel = |s: &str| -> Option<u8> {
        let v: f64 = s.parse().ok()?;
        (0.0..=255.0).contains(&v).then(|| v.round() as u8)
    };
    match parts.as_slice() {
        [r, g, b] => Some(Rgba::from_rgba8(channel(r)?, channel(g)?, channel(b)?, 1.0)),
        [r, g, b, a] => {
            let alpha: f64 = a.parse().ok()?;
            if !(0.0..=1.0).contains(&alpha) {
                return None;
            }
            Some(Rgba::from_rgba8(channel(r)?, channel(g)?, channel(b)?, alpha))
        }
        _ => None,
    }
}
