//! Renderer configuration
//!
//! Uses RON (Rusty Object Notation) for a human-editable settings file.
//! Every field has a default, so a partial file is fine.

use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::rasterizer::{Color, CullMode, RasterSettings, RenderMode, Vec3, HEIGHT, WIDTH};

/// Default settings file, looked up in the working directory
pub const DEFAULT_CONFIG_PATH: &str = "softcube.ron";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: usize,
    pub height: usize,
    /// Horizontal field of view
    pub fov_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
    /// Camera units per second
    pub move_speed: f32,
    /// Radians per pixel of mouse motion per second
    pub mouse_sensitivity: f32,
    pub pitch_margin: f32,
    pub light_direction: Vec3,
    pub target_fps: u32,
    /// Packed ARGB
    pub clear_color: u32,
    pub mesh_path: PathBuf,
    pub texture_path: PathBuf,
    pub spin: bool,
    pub render_mode: RenderMode,
    pub cull_mode: CullMode,
    pub use_zbuffer: bool,
    pub show_grid: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
            fov_degrees: 90.0,
            z_near: 0.1,
            z_far: 120.0,
            move_speed: 10.0,
            mouse_sensitivity: 1.0,
            pitch_margin: 0.05,
            light_direction: Vec3::new(1.0, 0.0, 0.0),
            target_fps: 120,
            clear_color: 0xFF000000,
            mesh_path: PathBuf::from("assets/cube.obj"),
            texture_path: PathBuf::from("assets/cube.png"),
            spin: true,
            render_mode: RenderMode::Wire,
            cull_mode: CullMode::None,
            use_zbuffer: true,
            show_grid: false,
        }
    }
}

impl RenderConfig {
    pub fn fov_radians(&self) -> f32 {
        self.fov_degrees.to_radians()
    }

    pub fn clear_color(&self) -> Color {
        Color::from_argb(self.clear_color)
    }

    /// Initial rasterizer settings
    pub fn raster_settings(&self) -> RasterSettings {
        RasterSettings {
            render_mode: self.render_mode,
            cull_mode: self.cull_mode,
            use_zbuffer: self.use_zbuffer,
            light_dir: self.light_direction,
            show_grid: self.show_grid,
        }
    }

    /// Copy the live rasterizer settings back, so a save keeps them
    pub fn store_settings(&mut self, settings: &RasterSettings) {
        self.render_mode = settings.render_mode;
        self.cull_mode = settings.cull_mode;
        self.use_zbuffer = settings.use_zbuffer;
        self.light_direction = settings.light_dir;
        self.show_grid = settings.show_grid;
    }

    /// Seconds per frame at the target rate
    pub fn frame_time(&self) -> f64 {
        1.0 / self.target_fps.max(1) as f64
    }
}

/// Error type for config loading
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(ron::error::SpannedError),
    Serialize(ron::Error),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<ron::error::SpannedError> for ConfigError {
    fn from(e: ron::error::SpannedError) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<ron::Error> for ConfigError {
    fn from(e: ron::Error) -> Self {
        ConfigError::Serialize(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Serialize(e) => write!(f, "Serialize error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load config from a RON file. A missing file gives the defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RenderConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        log::info!("{} not found, using default settings", path.display());
        return Ok(RenderConfig::default());
    }
    let contents = fs::read_to_string(path)?;
    let config = load_config_from_str(&contents)?;
    log::info!("loaded settings from {}", path.display());
    Ok(config)
}

/// Parse config from a RON string
pub fn load_config_from_str(s: &str) -> Result<RenderConfig, ConfigError> {
    Ok(ron::from_str(s)?)
}

/// Save config to a RON file
pub fn save_config<P: AsRef<Path>>(config: &RenderConfig, path: P) -> Result<(), ConfigError> {
    let pretty = ron::ser::PrettyConfig::new()
        .depth_limit(2)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(config, pretty)?;
    fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = load_config_from_str("(width: 320, height: 240, render_mode: Depth)").unwrap();
        assert_eq!(config.width, 320);
        assert_eq!(config.height, 240);
        assert_eq!(config.render_mode, RenderMode::Depth);
        assert_eq!(config.z_far, 120.0);
        assert_eq!(config.cull_mode, CullMode::None);
    }

    #[test]
    fn test_bundled_settings_parse() {
        let config = load_config_from_str(include_str!("../softcube.ron")).unwrap();
        assert_eq!(config.render_mode, RenderMode::Texture);
        assert_eq!(config.cull_mode, CullMode::Backface);
        assert_eq!(config.mesh_path, PathBuf::from("assets/cube.obj"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        assert!(matches!(load_config_from_str("(width: \"wide\")"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = load_config("definitely/not/here.ron").unwrap();
        assert_eq!(config, RenderConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let mut config = RenderConfig::default();
        config.spin = false;
        config.light_direction = Vec3::new(0.0, -1.0, 1.0);
        let path = std::env::temp_dir().join(format!("softcube-test-{}.ron", std::process::id()));
        save_config(&config, &path).unwrap();
        let loaded = load_config(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_saved_settings_reload() {
        let mut config = RenderConfig::default();
        let mut settings = config.raster_settings();
        settings.render_mode = RenderMode::FillWire;
        settings.cull_mode = CullMode::Backface;
        settings.use_zbuffer = false;
        settings.show_grid = true;
        config.store_settings(&settings);

        let path = std::env::temp_dir().join(format!("softcube-store-{}.ron", std::process::id()));
        save_config(&config, &path).unwrap();
        let loaded = load_config(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        let restored = loaded.raster_settings();
        assert_eq!(restored.render_mode, RenderMode::FillWire);
        assert_eq!(restored.cull_mode, CullMode::Backface);
        assert!(!restored.use_zbuffer);
        assert!(restored.show_grid);
    }

    #[test]
    fn test_derived_values() {
        let config = RenderConfig::default();
        assert!((config.fov_radians() - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert_eq!(config.clear_color(), Color::BLACK);
        assert!((config.frame_time() - 1.0 / 120.0).abs() < 1e-12);
        assert_eq!(config.raster_settings().light_dir, Vec3::new(1.0, 0.0, 0.0));
    }
}
