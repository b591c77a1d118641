pub mod background;
pub mod color;
pub mod composite;
pub mod controller;
pub mod history;
pub mod input;
pub mod layout;
pub mod messages;
pub mod model;
pub mod render;
pub mod save;
pub mod settings;
pub mod settings_store;
pub mod shadow;
pub mod state;
pub mod surface;

pub use background::BackgroundSource;
pub use color::Color;
pub use composite::Raster;
pub use controller::{SurfaceController, TriggerSignals};
pub use input::{PointerEvent, PointerSample, SurfaceRect};
pub use layout::{DisplayMetrics, Viewport};
pub use messages::{SurfaceCommand, SurfaceEvent};
pub use model::{DrawMode, Point, Segment, Stroke, ToolSettings};
pub use save::SubmissionPayload;
pub use settings::DrawSettings;
pub use state::SurfaceLifecycle;
pub use surface::DrawSurface;
