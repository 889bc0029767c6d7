//! RGBA colours and hex colour literals

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// An RGBA colour with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    /// Colour used when a theme defines neither the requested role nor `foreground`.
    pub const MISSING: Color = Color { r: 255, g: 0, b: 255, a: 255 };

    // Window decoration dots
    pub const DOT_RED: Color = Color { r: 0xFF, g: 0x5F, b: 0x56, a: 255 };
    pub const DOT_YELLOW: Color = Color { r: 0xFF, g: 0xBD, b: 0x2E, a: 255 };
    pub const DOT_GREEN: Color = Color { r: 0x27, g: 0xC9, b: 0x3F, a: 255 };

    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Color {
        Color { r, g, b, a: 255 }
    }

    pub const fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Color {
        Color { r, g, b, a }
    }

    pub fn with_alpha(self, a: u8) -> Color {
        Color { a, ..self }
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }

    pub fn to_u32_with_alpha(self) -> u32 {
        ((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | (self.b as u32)
    }

    pub fn from_u32_with_alpha(v: u32) -> Color {
        Color {
            a: (v >> 24) as u8,
            r: (v >> 16) as u8,
            g: (v >> 8) as u8,
            b: v as u8,
        }
    }

    /// Perceived brightness, 0..=255.
    pub fn luma(&self) -> u8 {
        ((self.r as u32 * 299 + self.g as u32 * 587 + self.b as u32 * 114) / 1000) as u8
    }

    /// Scales the colour channels by `factor`, keeping alpha.
    pub fn darken(self, factor: f32) -> Color {
        let f = factor.clamp(0.0, 1.0);
        Color {
            r: (self.r as f32 * f).round() as u8,
            g: (self.g as f32 * f).round() as u8,
            b: (self.b as f32 * f).round() as u8,
            a: self.a,
        }
    }

    /// Composites `self` over `dst` with an extra coverage factor (0..=255).
    pub fn over(self, dst: Color, coverage: u8) -> Color {
        let sa = self.a as u32 * coverage as u32 / 255;
        if sa == 0 {
            return dst;
        }
        if sa == 255 {
            return self;
        }
        let da = dst.a as u32;
        let inv = 255 - sa;
        let out_a = sa + da * inv / 255;
        if out_a == 0 {
            return Color::TRANSPARENT;
        }
        let channel = |s: u8, d: u8| -> u8 {
            let premul = s as u32 * sa + d as u32 * da * inv / 255;
            (premul / out_a).min(255) as u8
        };
        Color {
            r: channel(self.r, dst.r),
            g: channel(self.g, dst.g),
            b: channel(self.b, dst.b),
            a: out_a.min(255) as u8,
        }
    }

    /// `#rrggbb`, or `#rrggbbaa` when not opaque.
    pub fn to_hex(&self) -> String {
        if self.is_opaque() {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Parses `#rgb`, `#rrggbb` or `#rrggbbaa`.
///
/// The short form doubles each digit (`a` becomes `0xaa`). Alpha is opaque
/// unless the literal carries it.
pub fn parse_hex_color(s: &str) -> Result<Color> {
    let invalid = |why: &str| Error::Format(format!("color {s:?}: {why}"));

    let digits = s
        .strip_prefix('#')
        .ok_or_else(|| invalid("must start with '#'"))?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid("non-hex digit"));
    }
    // All-ASCII from here on, so byte slicing is safe.
    let pair = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid("non-hex digit"));
    let single = |i: usize| {
        u8::from_str_radix(&digits[i..i + 1], 16)
            .map(|v| v * 17)
            .map_err(|_| invalid("non-hex digit"))
    };

    match s.len() {
        4 => Ok(Color::from_rgb(single(0)?, single(1)?, single(2)?)),
        7 => Ok(Color::from_rgb(pair(0)?, pair(2)?, pair(4)?)),
        9 => Ok(Color::from_rgba(pair(0)?, pair(2)?, pair(4)?, pair(6)?)),
        _ => Err(invalid("length must be 4, 7 or 9")),
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_hex_color(s)
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        parse_hex_color(&s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
