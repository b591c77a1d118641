use instax_draw::draw::{
    BackgroundSource, DrawMode, DrawSettings, DrawSurface, Point, SurfaceEvent, ToolSettings,
    Viewport,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SIZE: u32 = 96;

fn loaded() -> DrawSurface {
    let mut surface = DrawSurface::new(DrawSettings::default(), Viewport::new(1280.0, 900.0));
    let image = image::RgbaImage::from_pixel(SIZE, SIZE, image::Rgba([20, 20, 20, 255]));
    let mut bytes = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, image::ImageOutputFormat::Png)
        .expect("encode png");
    let event = surface.load_background_blocking(&BackgroundSource::from_bytes(bytes.into_inner()));
    assert!(matches!(event, SurfaceEvent::BackgroundLoaded { .. }));
    surface
}

fn random_stroke(surface: &mut DrawSurface, rng: &mut StdRng) {
    let mode = DrawMode::all()[rng.gen_range(0..DrawMode::all().len())];
    let colors = ["white", "#ff0000", "#00ff00", "rgba(0, 0, 255, 0.5)", "orange"];
    let color = colors[rng.gen_range(0..colors.len())];
    surface.set_tool(ToolSettings::new(color, mode, rng.gen_range(1.0..12.0)));

    let mut point = Point::new(rng.gen_range(0.0..SIZE as f32), rng.gen_range(0.0..SIZE as f32));
    surface.begin_stroke(point);
    for _ in 0..rng.gen_range(1..8) {
        point = Point::new(
            (point.x + rng.gen_range(-20.0..20.0)).clamp(0.0, SIZE as f32),
            (point.y + rng.gen_range(-20.0..20.0)).clamp(0.0, SIZE as f32),
        );
        surface.extend_stroke(point);
    }
    assert!(surface.end_stroke());
}

#[test]
fn undo_all_then_redo_all_is_pixel_identical() {
    for seed in 0..6u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut surface = loaded();
        let count = rng.gen_range(1..7);
        for _ in 0..count {
            random_stroke(&mut surface, &mut rng);
        }
        let expected = surface.drawing().clone();

        for _ in 0..count {
            assert!(surface.undo());
        }
        assert!(surface.drawing().is_fully_transparent(), "seed {seed}");
        for _ in 0..count {
            assert!(surface.redo());
        }
        assert_eq!(surface.drawing(), &expected, "seed {seed}");
    }
}

#[test]
fn clear_empties_any_history_depth() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut surface = loaded();
    for depth in 0..4 {
        for _ in 0..depth {
            random_stroke(&mut surface, &mut rng);
        }
        if depth > 1 {
            surface.undo();
        }
        surface.clear();
        assert!(surface.drawing().is_fully_transparent());
        assert_eq!(surface.history().undo_len(), 0);
        assert_eq!(surface.history().redo_len(), 0);
    }
}

#[test]
fn new_stroke_after_undo_makes_redo_a_no_op() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut surface = loaded();
    for _ in 0..3 {
        random_stroke(&mut surface, &mut rng);
    }
    assert!(surface.undo());
    assert!(surface.undo());
    random_stroke(&mut surface, &mut rng);

    let before = surface.drawing().clone();
    assert!(!surface.redo());
    assert_eq!(surface.drawing(), &before);
    assert_eq!(surface.history().undo_len(), 2);
}

#[test]
fn undo_and_redo_on_empty_stacks_are_silent() {
    let mut surface = loaded();
    assert!(!surface.undo());
    assert!(!surface.redo());
    assert!(surface.drawing().is_fully_transparent());
}

#[test]
fn erase_never_adds_ink_and_pen_or_glow_never_removes_it() {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut surface = loaded();
    for step in 0..30 {
        let before = surface.drawing().clone();
        let mode = DrawMode::all()[step % DrawMode::all().len()];
        surface.set_tool(ToolSettings::new("#3366ff", mode, rng.gen_range(2.0..10.0)));
        surface.begin_stroke(Point::new(rng.gen_range(0.0..96.0), rng.gen_range(0.0..96.0)));
        surface.extend_stroke(Point::new(rng.gen_range(0.0..96.0), rng.gen_range(0.0..96.0)));
        surface.end_stroke();

        let after = surface.drawing();
        for (old, new) in before.pixels().chunks_exact(4).zip(after.pixels().chunks_exact(4)) {
            match mode {
                DrawMode::Erase => assert!(new[3] <= old[3]),
                DrawMode::Pen | DrawMode::Glow => assert!(new[3] >= old[3], "{mode:?}"),
            }
        }
    }
}
