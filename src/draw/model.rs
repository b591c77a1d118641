use crate::draw::color::Color;
use serde::{Deserialize, Serialize};

/// A position in raster (internal resolution) space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Zero-length segment anchored at `point`.
    pub const fn dot(point: Point) -> Self {
        Self {
            start: point,
            end: point,
        }
    }

    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    Erase,
    Pen,
    Glow,
}

impl DrawMode {
    pub fn all() -> &'static [DrawMode] {
        &[DrawMode::Erase, DrawMode::Pen, DrawMode::Glow]
    }

    pub fn label(self) -> &'static str {
        match self {
            DrawMode::Erase => "erase",
            DrawMode::Pen => "pen",
            DrawMode::Glow => "glow",
        }
    }
}

/// Hosts that still speak the numeric tool index (0 = erase, 1 = pen, 2 = glow).
impl TryFrom<u8> for DrawMode {
    type Error = anyhow::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DrawMode::Erase),
            1 => Ok(DrawMode::Pen),
            2 => Ok(DrawMode::Glow),
            other => Err(anyhow::anyhow!("unknown draw mode index {other}")),
        }
    }
}

/// Tool settings as delivered by the host. The color stays a CSS string until a
/// stroke starts so that a bad value only affects strokes that actually use it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(default = "default_tool_color")]
    pub color: String,
    #[serde(default = "default_tool_mode")]
    pub mode: DrawMode,
    #[serde(default = "default_tool_width")]
    pub width: f32,
}

fn default_tool_color() -> String {
    "white".to_owned()
}

fn default_tool_mode() -> DrawMode {
    DrawMode::Pen
}

fn default_tool_width() -> f32 {
    3.0
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            color: default_tool_color(),
            mode: default_tool_mode(),
            width: default_tool_width(),
        }
    }
}

impl ToolSettings {
    pub fn new(color: impl Into<String>, mode: DrawMode, width: f32) -> Self {
        Self {
            color: color.into(),
            mode,
            width,
        }
    }
}

/// Tool state frozen when a stroke starts; replay always uses these values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub mode: DrawMode,
    pub width: f32,
}

impl StrokeStyle {
    pub fn from_tool(tool: &ToolSettings) -> Self {
        let width = if tool.width.is_finite() && tool.width > 0.0 {
            tool.width
        } else {
            tracing::warn!(width = tool.width, "invalid tool width, using 1.0");
            1.0
        };
        Self {
            color: Color::parse_or_white(&tool.color),
            mode: tool.mode,
            width,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub style: StrokeStyle,
    pub segments: Vec<Segment>,
}

impl Stroke {
    pub fn color(&self) -> Color {
        self.style.color
    }

    pub fn mode(&self) -> DrawMode {
        self.style.mode
    }

    pub fn width(&self) -> f32 {
        self.style.width
    }
}
