use crate::draw::background::{decode_background, BackgroundSource};
use crate::draw::composite::{merge_layers, Raster};
use crate::draw::history::DrawHistory;
use crate::draw::input::{to_raster, PointerEvent, PointerSample, PointerTrail, SurfaceRect};
use crate::draw::layout::{fit_to_viewport, DisplayMetrics, Viewport};
use crate::draw::messages::SurfaceEvent;
use crate::draw::model::{Point, Segment, Stroke, StrokeStyle, ToolSettings};
use crate::draw::render::{trailing_segment, SegmentRenderer};
use crate::draw::save::{build_payload, SubmissionPayload};
use crate::draw::settings::DrawSettings;
use crate::draw::state::{can_transition, SurfaceLifecycle};
use anyhow::Result;
use chrono::{DateTime, Utc};
use image::RgbaImage;

/// Segments of the stroke under the pointer, with the style frozen at pointer-down.
#[derive(Debug, Clone, PartialEq)]
struct ActiveStroke {
    style: StrokeStyle,
    segments: Vec<Segment>,
}

/// One annotation surface: a background layer, an ink layer, and the stroke
/// history that can rebuild the ink layer at any time.
#[derive(Debug, Clone)]
pub struct DrawSurface {
    settings: DrawSettings,
    lifecycle: SurfaceLifecycle,
    background: Raster,
    drawing: Raster,
    viewport: Viewport,
    metrics: DisplayMetrics,
    renderer: SegmentRenderer,
    history: DrawHistory,
    tool: ToolSettings,
    active: Option<ActiveStroke>,
    trail: PointerTrail,
    load_generation: u64,
}

impl DrawSurface {
    pub fn new(settings: DrawSettings, viewport: Viewport) -> Self {
        let mut settings = settings;
        settings.sanitize();
        let (width, height) = settings.default_size();
        let metrics = fit_to_viewport((width, height), viewport, settings.viewport_margin);
        Self {
            renderer: SegmentRenderer::new(settings.render_settings()),
            tool: settings.default_tool.clone(),
            lifecycle: SurfaceLifecycle::Uninitialized,
            background: Raster::new(width, height),
            drawing: Raster::new(width, height),
            viewport,
            metrics,
            history: DrawHistory::default(),
            active: None,
            trail: PointerTrail::default(),
            load_generation: 0,
            settings,
        }
    }

    pub fn settings(&self) -> &DrawSettings {
        &self.settings
    }

    pub fn lifecycle(&self) -> SurfaceLifecycle {
        self.lifecycle
    }

    pub fn is_ready(&self) -> bool {
        self.lifecycle.is_ready()
    }

    pub fn internal_size(&self) -> (u32, u32) {
        self.drawing.size()
    }

    pub fn display_metrics(&self) -> DisplayMetrics {
        self.metrics
    }

    pub fn background(&self) -> &Raster {
        &self.background
    }

    pub fn drawing(&self) -> &Raster {
        &self.drawing
    }

    pub fn history(&self) -> &DrawHistory {
        &self.history
    }

    pub fn tool(&self) -> &ToolSettings {
        &self.tool
    }

    pub fn is_drawing(&self) -> bool {
        self.active.is_some()
    }

    /// Takes effect at the next stroke start; strokes already begun keep their style.
    pub fn set_tool(&mut self, tool: ToolSettings) {
        self.tool = tool;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.metrics = fit_to_viewport(
            self.internal_size(),
            viewport,
            self.settings.viewport_margin,
        );
    }

    fn transition(&mut self, to: SurfaceLifecycle) {
        if !can_transition(self.lifecycle, to) {
            tracing::warn!(from = ?self.lifecycle, ?to, "ignored invalid surface transition");
            return;
        }
        if self.lifecycle != to {
            tracing::debug!(from = ?self.lifecycle, ?to, "surface lifecycle transition");
        }
        self.lifecycle = to;
    }

    /// Enters `Loading` and returns the generation a decode result must carry
    /// to be accepted. Earlier outstanding loads become stale.
    pub fn begin_loading(&mut self) -> u64 {
        self.abandon_stroke();
        self.transition(SurfaceLifecycle::Loading);
        self.load_generation += 1;
        self.load_generation
    }

    pub fn loading_generation(&self) -> u64 {
        self.load_generation
    }

    /// Completes a load started by [`DrawSurface::begin_loading`]. Returns `None`
    /// for stale generations. A failed decode still reaches `Ready`, with a blank
    /// background at the current internal size.
    pub fn finish_loading(
        &mut self,
        generation: u64,
        decoded: Result<RgbaImage>,
    ) -> Option<SurfaceEvent> {
        if generation != self.load_generation || self.lifecycle != SurfaceLifecycle::Loading {
            tracing::debug!(
                generation,
                current = self.load_generation,
                "dropping superseded background decode"
            );
            return None;
        }

        let event = match decoded {
            Ok(image) => {
                let (width, height) = image.dimensions();
                self.background = Raster::from_rgba_image(image);
                self.drawing = Raster::new(width, height);
                tracing::debug!(width, height, "background loaded");
                SurfaceEvent::BackgroundLoaded { width, height }
            }
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "failed to load background image");
                let (width, height) = self.internal_size();
                self.background = Raster::new(width, height);
                SurfaceEvent::BackgroundFailed {
                    error: format!("{err:#}"),
                }
            }
        };

        self.set_viewport(self.viewport);
        self.transition(SurfaceLifecycle::Ready);
        self.clear_unchecked();
        Some(event)
    }

    /// Decodes on the calling thread. Hosts that must not block use
    /// [`crate::draw::controller::SurfaceController::load_background`].
    pub fn load_background_blocking(&mut self, source: &BackgroundSource) -> SurfaceEvent {
        let generation = self.begin_loading();
        let decoded = decode_background(source);
        match self.finish_loading(generation, decoded) {
            Some(event) => event,
            None => SurfaceEvent::BackgroundFailed {
                error: "background load superseded".to_owned(),
            },
        }
    }

    pub fn handle_pointer(&mut self, event: PointerEvent, rect: SurfaceRect) {
        match event {
            PointerEvent::Down(sample) => {
                if let Some(point) = self.raster_point(sample, rect) {
                    self.begin_stroke(point);
                }
            }
            PointerEvent::Move(sample) => {
                if self.active.is_none() {
                    return;
                }
                if let Some(point) = self.raster_point(sample, rect) {
                    self.extend_stroke(point);
                }
            }
            PointerEvent::Up | PointerEvent::Leave => {
                let _ = self.end_stroke();
            }
        }
    }

    pub fn raster_point(&self, sample: PointerSample, rect: SurfaceRect) -> Option<Point> {
        to_raster(sample, rect, self.internal_size())
    }

    /// Pointer-down: drops the redo stack and freezes the current tool settings.
    pub fn begin_stroke(&mut self, point: Point) {
        if !self.is_ready() {
            tracing::warn!(lifecycle = ?self.lifecycle, "stroke ignored before surface is ready");
            return;
        }
        if self.active.is_some() {
            let _ = self.end_stroke();
        }
        self.history.discard_redo();
        self.trail.reset(point);
        self.active = Some(ActiveStroke {
            style: StrokeStyle::from_tool(&self.tool),
            segments: Vec::new(),
        });
    }

    /// Pointer-move: the segment from the last point to `point` is drawn and buffered.
    pub fn extend_stroke(&mut self, point: Point) {
        if self.active.is_none() {
            return;
        }
        self.trail.advance(point);
        let segment = self.trail.segment();
        let trailing = self.trail.trailing_edge();
        self.record_with_trailing(segment, trailing);
    }

    /// Appends an explicit segment to the open stroke and draws it. Later
    /// pointer moves continue from `segment.end`.
    pub fn record_segment(&mut self, segment: Segment) {
        let Some(active) = self.active.as_ref() else {
            return;
        };
        let trailing = match active.segments.last() {
            Some(last) => *last,
            None => trailing_segment(&[segment], 0),
        };
        if self.trail.current() != segment.start {
            self.trail.reset(segment.start);
        }
        self.trail.advance(segment.end);
        self.record_with_trailing(segment, trailing);
    }

    fn record_with_trailing(&mut self, segment: Segment, trailing: Segment) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        self.renderer
            .draw_segment(&mut self.drawing, &active.style, segment, trailing);
        active.segments.push(segment);
    }

    /// Pointer-up (or leave): seals the stroke into history. Returns whether a
    /// stroke was committed; a press without movement commits nothing.
    pub fn end_stroke(&mut self) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };
        if active.segments.is_empty() {
            return false;
        }
        let stroke = Stroke {
            style: active.style,
            segments: active.segments,
        };
        self.renderer.normalize_glow(&mut self.drawing, &stroke);
        tracing::debug!(
            mode = stroke.mode().label(),
            segments = stroke.segments.len(),
            "stroke committed"
        );
        self.history.commit(stroke);
        true
    }

    fn abandon_stroke(&mut self) {
        if self.active.take().is_some() {
            tracing::debug!("active stroke dropped by background reload");
        }
    }

    pub fn undo(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }
        let _ = self.end_stroke();
        if self.history.undo().is_none() {
            return false;
        }
        self.replay();
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }
        let _ = self.end_stroke();
        if self.history.redo().is_none() {
            return false;
        }
        self.replay();
        true
    }

    /// Empties both history stacks and the ink layer. The background is untouched.
    pub fn clear(&mut self) {
        if !self.is_ready() {
            return;
        }
        self.clear_unchecked();
    }

    fn clear_unchecked(&mut self) {
        self.active = None;
        self.history.clear();
        self.drawing.clear();
    }

    /// Rebuilds the ink layer from the undo stack.
    pub fn replay(&mut self) {
        self.renderer
            .replay(&mut self.drawing, self.history.strokes());
    }

    /// Background with ink on top, at the internal resolution, as of right now.
    pub fn merge(&self) -> Option<Raster> {
        if !self.is_ready() {
            tracing::warn!(lifecycle = ?self.lifecycle, "merge requested before surface is ready");
            return None;
        }
        Some(merge_layers(&self.background, &self.drawing))
    }

    /// Merge and encode on the calling thread.
    pub fn export_blocking(&self, now: DateTime<Utc>) -> Option<Result<SubmissionPayload>> {
        let merged = self.merge()?;
        Some(build_payload(&merged, &self.settings.export_naming(), now))
    }
}
