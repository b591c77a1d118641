use crate::draw::layout::DisplayMetrics;
use crate::draw::model::{Point, Segment};

/// On-screen bounding rectangle of the drawing surface, in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfaceRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl SurfaceRect {
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// A pointer position in viewport coordinates, from a mouse or the first touch.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerSample {
    pub client_x: f32,
    pub client_y: f32,
}

impl PointerSample {
    pub const fn new(client_x: f32, client_y: f32) -> Self {
        Self { client_x, client_y }
    }

    /// Multi-touch collapses to the first contact; no contacts means no sample.
    pub fn from_touches(touches: &[(f32, f32)]) -> Option<Self> {
        touches.first().map(|&(x, y)| Self::new(x, y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(PointerSample),
    Move(PointerSample),
    Up,
    /// Pointer left the surface or the gesture was aborted; treated like `Up`.
    Leave,
}

/// Maps a viewport position onto the internal raster by the ratio between the
/// raster size and the on-screen size. `None` when the surface has no area.
pub fn to_raster(sample: PointerSample, rect: SurfaceRect, internal: (u32, u32)) -> Option<Point> {
    if rect.width <= 0.0 || rect.height <= 0.0 || !rect.width.is_finite() || !rect.height.is_finite()
    {
        return None;
    }
    let (scale_x, scale_y) = DisplayMetrics {
        display_width: rect.width,
        display_height: rect.height,
    }
    .scale_to_raster(internal);
    Some(Point::new(
        (sample.client_x - rect.left) * scale_x,
        (sample.client_y - rect.top) * scale_y,
    ))
}

/// The latest raster point plus the two before it, for the active stroke.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerTrail {
    current: Point,
    previous: Point,
    before_previous: Point,
}

impl PointerTrail {
    pub fn reset(&mut self, point: Point) {
        self.current = point;
        self.previous = point;
        self.before_previous = point;
    }

    pub fn advance(&mut self, point: Point) {
        self.before_previous = self.previous;
        self.previous = self.current;
        self.current = point;
    }

    pub fn current(&self) -> Point {
        self.current
    }

    /// The segment from the previous point to the newest one.
    pub fn segment(&self) -> Segment {
        Segment::new(self.previous, self.current)
    }

    /// The segment drawn before [`PointerTrail::segment`].
    pub fn trailing_edge(&self) -> Segment {
        Segment::new(self.before_previous, self.previous)
    }
}
