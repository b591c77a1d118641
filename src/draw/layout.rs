/// Viewport size available to the surface, in display pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// On-screen size of the surface. Presentation only: the raster keeps its own
/// resolution and stored points never depend on this.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayMetrics {
    pub display_width: f32,
    pub display_height: f32,
}

impl DisplayMetrics {
    pub fn scale_to_raster(&self, internal: (u32, u32)) -> (f32, f32) {
        (
            internal.0 as f32 / self.display_width,
            internal.1 as f32 / self.display_height,
        )
    }
}

/// Aspect-preserving fit of an image of `natural` size into the viewport minus
/// `margin`. Height is constrained first, then width; images that already fit
/// keep their natural size.
pub fn fit_to_viewport(natural: (u32, u32), viewport: Viewport, margin: f32) -> DisplayMetrics {
    let (image_w, image_h) = (natural.0.max(1) as f32, natural.1.max(1) as f32);
    let max_w = (viewport.width - margin).max(1.0);
    let max_h = (viewport.height - margin).max(1.0);

    let mut width = image_w;
    let mut height = image_h;
    if height > max_h {
        height = max_h;
        width = image_w / image_h * height;
    }
    if width > max_w {
        width = max_w;
        height = image_h / image_w * width;
    }

    DisplayMetrics {
        display_width: width,
        display_height: height,
    }
}
