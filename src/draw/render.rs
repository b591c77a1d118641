use crate::draw::color::Color;
use crate::draw::composite::{CompositeOp, Raster};
use crate::draw::model::{DrawMode, Segment, Stroke, StrokeStyle};
use crate::draw::shadow::{blur_padding, CoverageMask};

pub const DEFAULT_MIN_MOVE_DISTANCE: f32 = 4.0;
pub const DEFAULT_GLOW_BLUR_FACTOR: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    /// Segments this short (or shorter) never get a shadow.
    pub min_move_distance: f32,
    /// Glow shadow blur as a multiple of the line width.
    pub glow_blur_factor: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            min_move_distance: DEFAULT_MIN_MOVE_DISTANCE,
            glow_blur_factor: DEFAULT_GLOW_BLUR_FACTOR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Shadow {
    color: Color,
    blur: f32,
}

/// Draws single segments onto the drawing layer. Live input and history replay
/// both go through [`SegmentRenderer::draw_segment`], so a replayed stroke is
/// pixel-identical to the one drawn under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SegmentRenderer {
    settings: RenderSettings,
}

impl SegmentRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> RenderSettings {
        self.settings
    }

    /// `trailing` is the segment drawn just before this one in the same stroke
    /// (a dot at the stroke origin for the first segment). Only glow uses it.
    pub fn draw_segment(
        &self,
        layer: &mut Raster,
        style: &StrokeStyle,
        segment: Segment,
        trailing: Segment,
    ) {
        match style.mode {
            DrawMode::Erase => self.erase_segment(layer, style, segment),
            DrawMode::Pen => self.pen_segment(layer, style, segment),
            DrawMode::Glow => self.glow_segment(layer, style, segment, trailing),
        }
    }

    fn erase_segment(&self, layer: &mut Raster, style: &StrokeStyle, segment: Segment) {
        stroke_segment(
            layer,
            segment,
            style.width,
            style.color,
            CompositeOp::DestinationOut,
            None,
        );
    }

    fn pen_segment(&self, layer: &mut Raster, style: &StrokeStyle, segment: Segment) {
        stroke_segment(
            layer,
            segment,
            style.width,
            style.color,
            CompositeOp::SourceOver,
            None,
        );
    }

    fn glow_segment(
        &self,
        layer: &mut Raster,
        style: &StrokeStyle,
        segment: Segment,
        trailing: Segment,
    ) {
        let shadow = if segment.length() <= self.settings.min_move_distance {
            None
        } else {
            Some(Shadow {
                color: style.color,
                blur: self.settings.glow_blur_factor * style.width,
            })
        };
        stroke_segment(
            layer,
            segment,
            style.width,
            Color::WHITE,
            CompositeOp::SourceOver,
            shadow,
        );
        // Trailing edge again without shadow keeps the join free of a hot spot.
        stroke_segment(
            layer,
            trailing,
            style.width,
            Color::WHITE,
            CompositeOp::SourceOver,
            None,
        );
    }

    /// Restores a flat white, shadow-free core over every segment of a finished
    /// glow stroke, covering halo that later segments spilled onto earlier ones.
    pub fn normalize_glow(&self, layer: &mut Raster, stroke: &Stroke) {
        if stroke.mode() != DrawMode::Glow {
            return;
        }
        for segment in &stroke.segments {
            stroke_segment(
                layer,
                *segment,
                stroke.width(),
                Color::WHITE,
                CompositeOp::SourceOver,
                None,
            );
        }
    }

    /// Paints a whole committed stroke the same way live input did.
    pub fn paint_stroke(&self, layer: &mut Raster, stroke: &Stroke) {
        for (index, segment) in stroke.segments.iter().enumerate() {
            let trailing = trailing_segment(&stroke.segments, index);
            self.draw_segment(layer, &stroke.style, *segment, trailing);
        }
        self.normalize_glow(layer, stroke);
    }

    /// Clears the layer and redraws `strokes` oldest first with their frozen styles.
    pub fn replay<'a, I>(&self, layer: &mut Raster, strokes: I)
    where
        I: IntoIterator<Item = &'a Stroke>,
    {
        layer.clear();
        let mut count = 0usize;
        for stroke in strokes {
            self.paint_stroke(layer, stroke);
            count += 1;
        }
        tracing::debug!(strokes = count, "replayed drawing history");
    }
}

/// The segment preceding `index`, or a dot at the stroke origin for the first one.
pub fn trailing_segment(segments: &[Segment], index: usize) -> Segment {
    match index.checked_sub(1).and_then(|prev| segments.get(prev)) {
        Some(previous) => *previous,
        None => segments
            .get(index)
            .map(|segment| Segment::dot(segment.start))
            .unwrap_or(Segment::dot(Default::default())),
    }
}

fn stroke_segment(
    layer: &mut Raster,
    segment: Segment,
    width: f32,
    color: Color,
    op: CompositeOp,
    shadow: Option<Shadow>,
) {
    let pad = shadow.map(|s| blur_padding(s.blur)).unwrap_or(0);
    let mask = CoverageMask::for_segment(segment, width, pad, layer.size());
    if let Some(shadow) = shadow {
        mask.blurred(shadow.blur)
            .composite_into(layer, shadow.color, CompositeOp::SourceOver);
    }
    mask.composite_into(layer, color, op);
}
