use serde::{Deserialize, Serialize};

use crate::draw::model::ToolSettings;
use crate::draw::render::{RenderSettings, DEFAULT_GLOW_BLUR_FACTOR, DEFAULT_MIN_MOVE_DISTANCE};
use crate::draw::save::{ExportNaming, DEFAULT_EXPORT_FIELD_NAME, DEFAULT_EXPORT_FILE_PREFIX};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrawSettings {
    /// Raster size used until the first background finishes loading.
    #[serde(default = "default_width")]
    pub default_width: u32,
    #[serde(default = "default_height")]
    pub default_height: u32,
    /// Space kept free around the surface when fitting it into the viewport.
    #[serde(default = "default_viewport_margin")]
    pub viewport_margin: f32,
    #[serde(default)]
    pub default_tool: ToolSettings,
    #[serde(default = "default_min_move_distance")]
    pub min_move_distance: f32,
    #[serde(default = "default_glow_blur_factor")]
    pub glow_blur_factor: f32,
    #[serde(default = "default_export_field_name")]
    pub export_field_name: String,
    #[serde(default = "default_export_file_prefix")]
    pub export_file_prefix: String,
    /// Read by `logging::init_from_settings`; enables `debug` output.
    #[serde(default)]
    pub debug_logging: bool,
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

fn default_viewport_margin() -> f32 {
    200.0
}

fn default_min_move_distance() -> f32 {
    DEFAULT_MIN_MOVE_DISTANCE
}

fn default_glow_blur_factor() -> f32 {
    DEFAULT_GLOW_BLUR_FACTOR
}

fn default_export_field_name() -> String {
    DEFAULT_EXPORT_FIELD_NAME.to_owned()
}

fn default_export_file_prefix() -> String {
    DEFAULT_EXPORT_FILE_PREFIX.to_owned()
}

impl Default for DrawSettings {
    fn default() -> Self {
        Self {
            default_width: default_width(),
            default_height: default_height(),
            viewport_margin: default_viewport_margin(),
            default_tool: ToolSettings::default(),
            min_move_distance: default_min_move_distance(),
            glow_blur_factor: default_glow_blur_factor(),
            export_field_name: default_export_field_name(),
            export_file_prefix: default_export_file_prefix(),
            debug_logging: false,
        }
    }
}

impl DrawSettings {
    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            min_move_distance: self.min_move_distance,
            glow_blur_factor: self.glow_blur_factor,
        }
    }

    pub fn export_naming(&self) -> ExportNaming {
        ExportNaming {
            field_name: self.export_field_name.clone(),
            file_prefix: self.export_file_prefix.clone(),
        }
    }

    pub fn default_size(&self) -> (u32, u32) {
        (self.default_width, self.default_height)
    }

    /// Puts unusable values back to their defaults. Returns whether anything changed.
    pub fn sanitize(&mut self) -> bool {
        let mut changed = false;

        if self.default_width == 0 || self.default_height == 0 {
            self.default_width = default_width();
            self.default_height = default_height();
            changed = true;
        }
        if !self.viewport_margin.is_finite() || self.viewport_margin < 0.0 {
            self.viewport_margin = default_viewport_margin();
            changed = true;
        }
        if !self.min_move_distance.is_finite() || self.min_move_distance < 0.0 {
            self.min_move_distance = default_min_move_distance();
            changed = true;
        }
        if !self.glow_blur_factor.is_finite() || self.glow_blur_factor < 0.0 {
            self.glow_blur_factor = default_glow_blur_factor();
            changed = true;
        }
        if !self.default_tool.width.is_finite() || self.default_tool.width <= 0.0 {
            self.default_tool.width = ToolSettings::default().width;
            changed = true;
        }
        if self.export_field_name.trim().is_empty() {
            self.export_field_name = default_export_field_name();
            changed = true;
        }
        if self.export_file_prefix.trim().is_empty() {
            self.export_file_prefix = default_export_file_prefix();
            changed = true;
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::DrawSettings;
    use crate::draw::model::DrawMode;

    #[test]
    fn serde_roundtrip_draw_settings() {
        let settings = DrawSettings::default();
        let json = serde_json::to_string(&settings).expect("serialize draw settings");
        let decoded: DrawSettings = serde_json::from_str(&json).expect("deserialize draw settings");
        assert_eq!(decoded, settings);
    }

    #[test]
    fn defaults_match_surface_conventions() {
        let settings = DrawSettings::default();
        assert_eq!(settings.default_size(), (1280, 720));
        assert_eq!(settings.viewport_margin, 200.0);
        assert_eq!(settings.default_tool.color, "white");
        assert_eq!(settings.default_tool.mode, DrawMode::Pen);
        assert_eq!(settings.default_tool.width, 3.0);
        assert_eq!(settings.render_settings().min_move_distance, 4.0);
        assert_eq!(settings.render_settings().glow_blur_factor, 1.5);
        assert_eq!(settings.export_naming().field_name, "instax");
        assert_eq!(settings.export_naming().file_prefix, "drawing");
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let decoded: DrawSettings = serde_json::from_value(serde_json::json!({
            "viewport_margin": 64.0,
            "default_tool": { "color": "#00ff00", "mode": "glow" }
        }))
        .expect("deserialize partial settings");

        assert_eq!(decoded.viewport_margin, 64.0);
        assert_eq!(decoded.default_tool.mode, DrawMode::Glow);
        assert_eq!(decoded.default_tool.width, 3.0);
        assert_eq!(decoded.default_size(), (1280, 720));
    }

    #[test]
    fn sanitize_resets_unusable_values() {
        let mut settings = DrawSettings::default();
        settings.default_width = 0;
        settings.viewport_margin = -5.0;
        settings.glow_blur_factor = f32::NAN;
        settings.default_tool.width = 0.0;
        settings.export_field_name = "  ".into();

        assert!(settings.sanitize());
        assert_eq!(settings, DrawSettings::default());
        assert!(!settings.sanitize());
    }
}
