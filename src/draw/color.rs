use anyhow::{anyhow, bail, Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_rgba_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_rgba_array(color: [u8; 4]) -> Self {
        Self::rgba(color[0], color[1], color[2], color[3])
    }

    /// Parses a CSS color string: hex forms, `rgb()`/`rgba()` and common names.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if let Some(hex) = trimmed.strip_prefix('#') {
            return parse_hex(hex).with_context(|| format!("parse hex color {trimmed:?}"));
        }
        let lower = trimmed.to_ascii_lowercase();
        if let Some(args) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
        {
            let args = args
                .strip_suffix(')')
                .ok_or_else(|| anyhow!("unterminated color function {trimmed:?}"))?;
            return parse_rgb_function(args)
                .with_context(|| format!("parse color function {trimmed:?}"));
        }
        NAMED_COLORS
            .get(lower.as_str())
            .copied()
            .ok_or_else(|| anyhow!("unknown color name {trimmed:?}"))
    }

    pub fn parse_or_white(input: &str) -> Self {
        match Self::parse(input) {
            Ok(color) => color,
            Err(err) => {
                tracing::warn!(color = input, error = %err, "unparseable tool color, using white");
                Self::WHITE
            }
        }
    }
}

fn parse_hex(hex: &str) -> Result<Color> {
    let expanded: String = match hex.len() {
        3 | 4 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 | 8 => hex.to_owned(),
        len => bail!("hex color must have 3, 4, 6 or 8 digits, got {len}"),
    };
    let bytes = hex::decode(&expanded).context("decode hex digits")?;
    let a = bytes.get(3).copied().unwrap_or(255);
    Ok(Color::rgba(bytes[0], bytes[1], bytes[2], a))
}

fn parse_rgb_function(args: &str) -> Result<Color> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        bail!("expected 3 or 4 components, got {}", parts.len());
    }
    let mut channels = [0u8; 3];
    for (slot, part) in channels.iter_mut().zip(&parts) {
        let value: f32 = part
            .parse()
            .with_context(|| format!("color channel {part:?}"))?;
        *slot = value.round().clamp(0.0, 255.0) as u8;
    }
    let alpha = match parts.get(3) {
        Some(part) => {
            let value: f32 = part
                .parse()
                .with_context(|| format!("alpha channel {part:?}"))?;
            (value.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        None => 255,
    };
    Ok(Color::rgba(channels[0], channels[1], channels[2], alpha))
}

static NAMED_COLORS: Lazy<HashMap<&'static str, Color>> = Lazy::new(|| {
    HashMap::from([
        ("white", Color::WHITE),
        ("black", Color::BLACK),
        ("transparent", Color::TRANSPARENT),
        ("red", Color::rgba(255, 0, 0, 255)),
        ("green", Color::rgba(0, 128, 0, 255)),
        ("lime", Color::rgba(0, 255, 0, 255)),
        ("blue", Color::rgba(0, 0, 255, 255)),
        ("yellow", Color::rgba(255, 255, 0, 255)),
        ("orange", Color::rgba(255, 165, 0, 255)),
        ("purple", Color::rgba(128, 0, 128, 255)),
        ("pink", Color::rgba(255, 192, 203, 255)),
        ("hotpink", Color::rgba(255, 105, 180, 255)),
        ("magenta", Color::rgba(255, 0, 255, 255)),
        ("fuchsia", Color::rgba(255, 0, 255, 255)),
        ("cyan", Color::rgba(0, 255, 255, 255)),
        ("aqua", Color::rgba(0, 255, 255, 255)),
        ("gold", Color::rgba(255, 215, 0, 255)),
        ("gray", Color::rgba(128, 128, 128, 255)),
        ("grey", Color::rgba(128, 128, 128, 255)),
        ("silver", Color::rgba(192, 192, 192, 255)),
        ("skyblue", Color::rgba(135, 206, 235, 255)),
        ("violet", Color::rgba(238, 130, 238, 255)),
    ])
});
