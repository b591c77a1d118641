//! Anti-aliased coverage masks and the blur used for glow shadows.
//!
//! A shadow blur of `b` follows the 2D-canvas convention: a Gaussian with
//! standard deviation `b / 2`, approximated by three successive box blurs.

use crate::draw::color::Color;
use crate::draw::composite::{CompositeOp, Raster};
use crate::draw::model::{Point, Segment};

const BOX_PASSES: usize = 3;

/// Per-pixel coverage in `[0, 1]` over a rectangular window of the raster.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageMask {
    x0: i32,
    y0: i32,
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl CoverageMask {
    /// Round-capped stroke of `line_width` along `segment`, with `pad` extra
    /// pixels of empty margin around it (room for a blur to spread into).
    /// The window is clipped to a `bounds` raster grown by `pad`, so segments
    /// running far off the surface cost no more than the surface itself.
    pub fn for_segment(segment: Segment, line_width: f32, pad: u32, bounds: (u32, u32)) -> Self {
        let radius = line_width * 0.5;
        let reach = radius + 1.0 + pad as f32;
        let pad = pad as i64;
        let clip_x = |v: f32| (v as i64).clamp(-pad, bounds.0 as i64 + pad);
        let clip_y = |v: f32| (v as i64).clamp(-pad, bounds.1 as i64 + pad);
        let x0 = clip_x((segment.start.x.min(segment.end.x) - reach).floor());
        let y0 = clip_y((segment.start.y.min(segment.end.y) - reach).floor());
        let x1 = clip_x((segment.start.x.max(segment.end.x) + reach).ceil());
        let y1 = clip_y((segment.start.y.max(segment.end.y) + reach).ceil());
        let width = (x1 - x0).max(0) as usize;
        let height = (y1 - y0).max(0) as usize;
        let (x0, y0) = (x0 as i32, y0 as i32);

        let mut values = vec![0.0f32; width * height];
        for row in 0..height {
            for col in 0..width {
                let center = Point::new(
                    (x0 + col as i32) as f32 + 0.5,
                    (y0 + row as i32) as f32 + 0.5,
                );
                let distance = point_segment_distance(center, segment);
                values[row * width + col] = (radius + 0.5 - distance).clamp(0.0, 1.0);
            }
        }

        Self {
            x0,
            y0,
            width,
            height,
            values,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn value_at(&self, x: i32, y: i32) -> f32 {
        let col = x - self.x0;
        let row = y - self.y0;
        if col < 0 || row < 0 || col as usize >= self.width || row as usize >= self.height {
            return 0.0;
        }
        self.values[row as usize * self.width + col as usize]
    }

    pub fn total_coverage(&self) -> f32 {
        self.values.iter().sum()
    }

    /// Gaussian-like blur for a canvas shadow blur value (sigma = blur / 2).
    pub fn blurred(&self, shadow_blur: f32) -> Self {
        let sigma = shadow_blur * 0.5;
        let mut out = self.clone();
        if sigma <= 0.0 {
            return out;
        }
        let mut scratch = vec![0.0f32; self.width.max(self.height)];
        for size in box_sizes_for_gauss(sigma, BOX_PASSES) {
            let radius = (size.saturating_sub(1)) / 2;
            if radius == 0 {
                continue;
            }
            out.box_blur_horizontal(radius, &mut scratch);
            out.box_blur_vertical(radius, &mut scratch);
        }
        out
    }

    pub fn composite_into(&self, raster: &mut Raster, color: Color, op: CompositeOp) {
        for row in 0..self.height {
            for col in 0..self.width {
                let coverage = self.values[row * self.width + col];
                if coverage <= 0.0 {
                    continue;
                }
                raster.blend(
                    self.x0 + col as i32,
                    self.y0 + row as i32,
                    color,
                    coverage,
                    op,
                );
            }
        }
    }

    fn box_blur_horizontal(&mut self, radius: usize, scratch: &mut [f32]) {
        for row in 0..self.height {
            let line = &mut self.values[row * self.width..(row + 1) * self.width];
            box_blur_line(line, &mut scratch[..self.width], radius);
            line.copy_from_slice(&scratch[..self.width]);
        }
    }

    fn box_blur_vertical(&mut self, radius: usize, scratch: &mut [f32]) {
        let mut column = vec![0.0f32; self.height];
        for col in 0..self.width {
            for (row, slot) in column.iter_mut().enumerate() {
                *slot = self.values[row * self.width + col];
            }
            box_blur_line(&column, &mut scratch[..self.height], radius);
            for row in 0..self.height {
                self.values[row * self.width + col] = scratch[row];
            }
        }
    }
}

/// Margin a mask needs so that a blur of `shadow_blur` stays inside it.
pub fn blur_padding(shadow_blur: f32) -> u32 {
    if shadow_blur <= 0.0 {
        return 0;
    }
    (shadow_blur * 0.5 * 3.0).ceil() as u32 + 1
}

pub fn point_segment_distance(point: Point, segment: Segment) -> f32 {
    let vx = segment.end.x - segment.start.x;
    let vy = segment.end.y - segment.start.y;
    let wx = point.x - segment.start.x;
    let wy = point.y - segment.start.y;
    let len_sq = vx * vx + vy * vy;
    if len_sq <= f32::EPSILON {
        return (wx * wx + wy * wy).sqrt();
    }
    let t = ((wx * vx + wy * vy) / len_sq).clamp(0.0, 1.0);
    let dx = point.x - (segment.start.x + vx * t);
    let dy = point.y - (segment.start.y + vy * t);
    (dx * dx + dy * dy).sqrt()
}

fn box_sizes_for_gauss(sigma: f32, passes: usize) -> Vec<usize> {
    let n = passes as f32;
    let ideal = (12.0 * sigma * sigma / n + 1.0).sqrt();
    let mut lower = ideal.floor() as i64;
    if lower % 2 == 0 {
        lower -= 1;
    }
    let lower = lower.max(1);
    let upper = lower + 2;
    let lf = lower as f32;
    let m = ((12.0 * sigma * sigma - n * lf * lf - 4.0 * n * lf - 3.0 * n) / (-4.0 * lf - 4.0))
        .round() as i64;
    (0..passes as i64)
        .map(|i| if i < m { lower as usize } else { upper as usize })
        .collect()
}

/// Sliding-window box filter; samples outside the line count as zero.
fn box_blur_line(src: &[f32], dst: &mut [f32], radius: usize) {
    let n = src.len();
    if n == 0 {
        return;
    }
    let norm = 1.0 / (2 * radius + 1) as f32;
    let mut sum: f32 = src[..(radius + 1).min(n)].iter().sum();
    for i in 0..n {
        dst[i] = sum * norm;
        if i + radius + 1 < n {
            sum += src[i + radius + 1];
        }
        if i >= radius {
            sum -= src[i - radius];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn horizontal(width: f32) -> CoverageMask {
        CoverageMask::for_segment(
            Segment::new(Point::new(10.0, 10.0), Point::new(20.0, 10.0)),
            width,
            8,
            (64, 64),
        )
    }

    #[test]
    fn segment_mask_is_full_on_the_axis_and_empty_far_away() {
        let mask = horizontal(4.0);
        assert_eq!(mask.value_at(15, 9), 1.0);
        assert_eq!(mask.value_at(15, 10), 1.0);
        assert_eq!(mask.value_at(15, 20), 0.0);
        assert_eq!(mask.value_at(-100, -100), 0.0);
    }

    #[test]
    fn zero_length_segment_yields_round_dot() {
        let mask = CoverageMask::for_segment(Segment::dot(Point::new(5.5, 5.5)), 5.0, 0, (16, 16));
        assert_eq!(mask.value_at(5, 5), 1.0);
        assert_eq!(mask.value_at(5, 8), 0.0);
        assert!(mask.value_at(7, 5) > 0.0);
    }

    #[test]
    fn blur_spreads_coverage_but_roughly_conserves_mass() {
        let mask = horizontal(4.0);
        let blurred = mask.blurred(6.0);
        assert!(blurred.value_at(15, 15) > 0.0);
        assert!(blurred.value_at(15, 10) < 1.0);
        let before = mask.total_coverage();
        let after = blurred.total_coverage();
        assert!((before - after).abs() / before < 0.05, "{before} vs {after}");
    }

    #[test]
    fn mask_window_is_clipped_to_padded_bounds() {
        let far = Segment::new(Point::new(10.0, 10.0), Point::new(8000.0, 8000.0));
        let mask = CoverageMask::for_segment(far, 6.0, 0, (64, 64));
        assert!(mask.width() <= 64 && mask.height() <= 64);
        assert_eq!(mask.value_at(30, 30), 1.0);

        let padded = CoverageMask::for_segment(far, 6.0, 10, (64, 64));
        assert!(padded.width() <= 84 && padded.height() <= 84);

        let mut layer = Raster::new(64, 64);
        padded.blurred(12.0).composite_into(&mut layer, Color::WHITE, CompositeOp::SourceOver);
        assert!(layer.pixel(63, 63).a > 0);
    }

    #[test]
    fn segment_entirely_off_the_surface_yields_empty_mask() {
        let off = Segment::new(Point::new(-5000.0, -5000.0), Point::new(-4000.0, -4500.0));
        let mask = CoverageMask::for_segment(off, 8.0, 4, (64, 64));
        assert_eq!(mask.width() * mask.height(), 0);
        assert_eq!(mask.total_coverage(), 0.0);
        let mut layer = Raster::new(64, 64);
        mask.blurred(6.0).composite_into(&mut layer, Color::WHITE, CompositeOp::SourceOver);
        assert!(layer.is_fully_transparent());
    }

    #[test]
    fn zero_blur_is_identity() {
        let mask = horizontal(3.0);
        assert_eq!(mask.blurred(0.0), mask);
    }

    #[test]
    fn box_sizes_match_three_pass_gaussian_approximation() {
        assert_eq!(box_sizes_for_gauss(2.0, 3), vec![3, 3, 5]);
        assert_eq!(box_sizes_for_gauss(0.1, 3).len(), 3);
    }

    #[test]
    fn box_blur_line_averages_window() {
        let src = [0.0, 3.0, 0.0];
        let mut dst = [0.0; 3];
        box_blur_line(&src, &mut dst, 1);
        assert_eq!(dst, [1.0, 1.0, 1.0]);
    }
}
