use std::path::PathBuf;

use scribe_engine::math::Vec3;
use scribe_engine::render::BatchConfig;
use winit::dpi::LogicalSize;

/// Environment variable naming a TTF/OTF file for text rendering.
pub const FONT_ENV: &str = "SCRIBE_FONT";

#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    pub camera: Vec3,
    pub brush_radius: f32,
    pub font_path: Option<PathBuf>,
    pub batch: BatchConfig,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            title: "scribe".to_string(),
            initial_size: LogicalSize::new(1024.0, 768.0),
            fov_y: 45.0,
            near: 0.1,
            far: 10.0,
            camera: Vec3::new(0.0, 0.0, 1.0),
            brush_radius: 0.1,
            font_path: None,
            batch: BatchConfig::default(),
        }
    }
}

impl StudioConfig {
    /// Defaults, with the font taken from the first argument or [`FONT_ENV`].
    pub fn from_env() -> Self {
        let font_path = std::env::args_os()
            .nth(1)
            .or_else(|| std::env::var_os(FONT_ENV))
            .map(PathBuf::from);
        Self { font_path, ..Self::default() }
    }
}
