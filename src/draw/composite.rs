use crate::draw::color::Color;
use anyhow::{bail, Result};
use image::RgbaImage;

/// Pixel compositing policy for a single draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeOp {
    SourceOver,
    /// Removes destination alpha in proportion to the source alpha; the source
    /// color itself never shows up.
    DestinationOut,
}

/// Straight-alpha RGBA8 raster. Both drawing-surface layers and the merged
/// export image are `Raster`s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Color::TRANSPARENT)
    }

    pub fn filled(width: u32, height: u32, fill: Color) -> Self {
        let mut pixels = vec![0u8; (width as usize) * (height as usize) * 4];
        for chunk in pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&fill.to_rgba_array());
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if pixels.len() != expected {
            bail!(
                "{width}x{height} raster needs {expected} bytes, got {}",
                pixels.len()
            );
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn from_rgba_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            pixels: image.into_raw(),
        }
    }

    pub fn to_rgba_image(&self) -> RgbaImage {
        // Length always matches width * height * 4, so from_raw cannot fail here.
        RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        let idx = self.index(x, y);
        Color::rgba(
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        )
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    pub fn is_fully_transparent(&self) -> bool {
        self.pixels.chunks_exact(4).all(|px| px[3] == 0)
    }

    /// Number of pixels carrying any ink at all.
    pub fn inked_pixel_count(&self) -> usize {
        self.pixels.chunks_exact(4).filter(|px| px[3] > 0).count()
    }

    /// Composites `color` into pixel (x, y) with the given coverage in `[0, 1]`.
    /// Out-of-bounds coordinates are ignored.
    pub fn blend(&mut self, x: i32, y: i32, color: Color, coverage: f32, op: CompositeOp) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        if coverage <= 0.0 {
            return;
        }
        let idx = self.index(x as u32, y as u32);
        let dst = Color::rgba(
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        );
        let out = match op {
            CompositeOp::SourceOver => source_over(dst, color, coverage),
            CompositeOp::DestinationOut => destination_out(dst, color, coverage),
        };
        self.pixels[idx..idx + 4].copy_from_slice(&out.to_rgba_array());
    }

    /// Source-over of a whole same-sized raster onto this one. A raster of
    /// another size is ignored.
    pub fn draw_over(&mut self, top: &Raster) {
        if self.size() != top.size() {
            tracing::warn!(base = ?self.size(), top = ?top.size(), "skipped compositing mismatched rasters");
            return;
        }
        for (dst, src) in self
            .pixels
            .chunks_exact_mut(4)
            .zip(top.pixels.chunks_exact(4))
        {
            if src[3] == 0 {
                continue;
            }
            let blended = source_over(
                Color::rgba(dst[0], dst[1], dst[2], dst[3]),
                Color::rgba(src[0], src[1], src[2], src[3]),
                1.0,
            );
            dst.copy_from_slice(&blended.to_rgba_array());
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + x as usize) * 4
    }
}

/// Background first, then ink on top. The output adopts the background size.
pub fn merge_layers(background: &Raster, drawing: &Raster) -> Raster {
    let mut output = Raster::new(background.width(), background.height());
    output.draw_over(background);
    output.draw_over(drawing);
    output
}

fn source_over(bottom: Color, top: Color, coverage: f32) -> Color {
    let sa = top.a as f32 / 255.0 * coverage.clamp(0.0, 1.0);
    let da = bottom.a as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    if out_a <= f32::EPSILON {
        return Color::TRANSPARENT;
    }

    let blend = |s: u8, d: u8| -> u8 {
        (((s as f32 * sa) + (d as f32 * da * (1.0 - sa))) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8
    };

    Color {
        r: blend(top.r, bottom.r),
        g: blend(top.g, bottom.g),
        b: blend(top.b, bottom.b),
        a: (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    }
}

fn destination_out(bottom: Color, mask: Color, coverage: f32) -> Color {
    let ma = mask.a as f32 / 255.0 * coverage.clamp(0.0, 1.0);
    let out_a = (bottom.a as f32 * (1.0 - ma)).round().clamp(0.0, 255.0) as u8;
    if out_a == 0 {
        return Color::TRANSPARENT;
    }
    Color { a: out_a, ..bottom }
}

#[cfg(test)]
mod tests {
    use super::{merge_layers, CompositeOp, Raster};
    use crate::draw::color::Color;

    #[test]
    fn source_over_blends_expected_pixel() {
        let mut base = Raster::from_pixels(1, 1, vec![100, 100, 100, 255]).expect("base");
        let top = Raster::from_pixels(1, 1, vec![200, 0, 0, 128]).expect("top");

        base.draw_over(&top);
        assert_eq!(base.pixel(0, 0), Color::rgba(150, 50, 50, 255));
    }

    #[test]
    fn pixel_buffer_of_wrong_length_is_rejected() {
        let err = Raster::from_pixels(2, 2, vec![0; 15]).expect_err("short buffer");
        assert!(err.to_string().contains("needs 16 bytes"));
    }

    #[test]
    fn mismatched_raster_is_not_composited() {
        let mut base = Raster::filled(2, 2, Color::BLACK);
        base.draw_over(&Raster::filled(3, 1, Color::WHITE));
        assert_eq!(base, Raster::filled(2, 2, Color::BLACK));
    }

    #[test]
    fn partial_coverage_scales_source_alpha() {
        let mut raster = Raster::new(1, 1);
        raster.blend(0, 0, Color::rgba(255, 0, 0, 255), 0.5, CompositeOp::SourceOver);
        assert_eq!(raster.pixel(0, 0), Color::rgba(255, 0, 0, 128));
    }

    #[test]
    fn destination_out_removes_alpha_and_ignores_mask_color() {
        let mut raster = Raster::filled(2, 1, Color::rgba(10, 20, 30, 255));
        raster.blend(0, 0, Color::rgba(0, 0, 255, 255), 1.0, CompositeOp::DestinationOut);
        raster.blend(1, 0, Color::rgba(0, 0, 255, 255), 0.5, CompositeOp::DestinationOut);

        assert_eq!(raster.pixel(0, 0), Color::TRANSPARENT);
        assert_eq!(raster.pixel(1, 0), Color::rgba(10, 20, 30, 128));
    }

    #[test]
    fn out_of_bounds_blend_is_ignored() {
        let mut raster = Raster::new(2, 2);
        raster.blend(-1, 0, Color::WHITE, 1.0, CompositeOp::SourceOver);
        raster.blend(0, 2, Color::WHITE, 1.0, CompositeOp::SourceOver);
        assert!(raster.is_fully_transparent());
    }

    #[test]
    fn merge_puts_ink_over_background_and_keeps_background_elsewhere() {
        let background = Raster::filled(2, 1, Color::rgba(10, 20, 30, 255));
        let mut drawing = Raster::new(2, 1);
        drawing.blend(1, 0, Color::rgba(0, 255, 0, 255), 1.0, CompositeOp::SourceOver);

        let out = merge_layers(&background, &drawing);
        assert_eq!(out.pixel(0, 0), Color::rgba(10, 20, 30, 255));
        assert_eq!(out.pixel(1, 0), Color::rgba(0, 255, 0, 255));
    }

    #[test]
    fn image_roundtrip_preserves_dimensions() {
        let raster = Raster::filled(3, 2, Color::WHITE);
        let image = raster.to_rgba_image();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(Raster::from_rgba_image(image), raster);
    }
}
