//! softcube: software rasterizer viewer
//!
//! Loads one mesh and one texture, flies a free camera around it and draws
//! every frame on the CPU:
//! - Frustum clipping with triangle splitting
//! - Perspective-correct texture mapping
//! - Inverse-depth buffer or painter's algorithm
//! - Wireframe, filled, textured and depth views

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod config;
mod rasterizer;
mod world;

use std::path::{Path, PathBuf};
use anyhow::Context;
use macroquad::prelude::*;
use config::{load_config, save_config, RenderConfig, DEFAULT_CONFIG_PATH};
use rasterizer::{Color as RasterColor, Framebuffer, RenderContext, RenderMode, Texture as RasterTexture, HEIGHT, WIDTH};
use world::{load_obj, Mesh};

fn window_conf() -> Conf {
    Conf {
        window_title: format!("softcube v{}", VERSION),
        window_width: WIDTH as i32,
        window_height: HEIGHT as i32,
        window_resizable: true,
        ..Default::default()
    }
}

/// Load the mesh, or the built-in cube when the file is unusable
fn load_mesh_or_cube(path: &Path) -> anyhow::Result<Mesh> {
    let mut mesh = match load_obj(path) {
        Ok(mesh) if !mesh.faces.is_empty() => {
            log::info!(
                "loaded {}: {} vertices, {} faces",
                path.display(),
                mesh.vertices.len(),
                mesh.faces.len()
            );
            mesh
        }
        Ok(_) => {
            log::warn!("{} has no faces, using built-in cube", path.display());
            Mesh::cube().context("building fallback cube")?
        }
        Err(e) => {
            log::warn!("failed to load {}: {}, using built-in cube", path.display(), e);
            Mesh::cube().context("building fallback cube")?
        }
    };
    mesh.randomize_colors(&mut ::rand::rng());
    Ok(mesh)
}

/// Load the texture, or a checkerboard when the file is unusable
fn load_texture_or_checker(path: &Path) -> RasterTexture {
    match RasterTexture::from_file(path) {
        Ok(tex) => {
            log::info!("loaded texture {} ({}x{})", path.display(), tex.width, tex.height);
            tex
        }
        Err(e) => {
            log::warn!("{}, using checkerboard texture", e);
            RasterTexture::checkerboard(64, 64, RasterColor::WHITE, RasterColor::new(0x40, 0x40, 0x40))
        }
    }
}

/// Everything the main loop owns
struct Viewer {
    config: RenderConfig,
    config_path: PathBuf,
    ctx: RenderContext,
    fb: Framebuffer,
    mesh: Mesh,
    texture: RasterTexture,
    rgba: Vec<u8>,
    last_mouse: (f32, f32),
    screenshots: usize,
}

impl Viewer {
    fn new(config: RenderConfig, config_path: PathBuf) -> anyhow::Result<Self> {
        let mut ctx = RenderContext::new(
            config.width,
            config.height,
            config.fov_radians(),
            config.z_near,
            config.z_far,
        );
        ctx.settings = config.raster_settings();
        ctx.camera.pitch_margin = config.pitch_margin;

        let mesh = load_mesh_or_cube(&config.mesh_path)?;
        let texture = load_texture_or_checker(&config.texture_path);

        Ok(Self {
            fb: Framebuffer::new(config.width, config.height),
            ctx,
            mesh,
            texture,
            rgba: Vec::new(),
            last_mouse: mouse_position(),
            screenshots: 0,
            config,
            config_path,
        })
    }

    /// Returns false when the viewer should quit
    fn handle_input(&mut self, dt: f32) -> anyhow::Result<bool> {
        if is_key_pressed(KeyCode::Escape) {
            return Ok(false);
        }

        if is_key_pressed(KeyCode::C) {
            self.ctx.settings.cull_mode = self.ctx.settings.cull_mode.toggled();
            log::info!("cull mode: {:?}", self.ctx.settings.cull_mode);
        }

        let mode_keys = [
            KeyCode::Key1,
            KeyCode::Key2,
            KeyCode::Key3,
            KeyCode::Key4,
            KeyCode::Key5,
            KeyCode::Key6,
            KeyCode::Key7,
        ];
        for (i, key) in mode_keys.iter().enumerate() {
            if is_key_pressed(*key) {
                if let Some(mode) = RenderMode::from_index(i) {
                    self.ctx.settings.render_mode = mode;
                    log::info!("render mode: {}", mode.label());
                }
            }
        }

        if is_key_pressed(KeyCode::Z) {
            self.ctx.settings.use_zbuffer = !self.ctx.settings.use_zbuffer;
            log::info!("depth buffer: {}", self.ctx.settings.use_zbuffer);
        }
        if is_key_pressed(KeyCode::G) {
            self.ctx.settings.show_grid = !self.ctx.settings.show_grid;
        }

        let ctrl = is_key_down(KeyCode::LeftControl) || is_key_down(KeyCode::RightControl);
        if ctrl && is_key_pressed(KeyCode::S) {
            self.save_settings();
        }

        // Movement: x = right, y = up, z = forward
        let mut dir = rasterizer::Vec3::ZERO;
        if is_key_down(KeyCode::W) {
            dir.z += 1.0;
        }
        if is_key_down(KeyCode::S) && !ctrl {
            dir.z -= 1.0;
        }
        if is_key_down(KeyCode::D) {
            dir.x += 1.0;
        }
        if is_key_down(KeyCode::A) {
            dir.x -= 1.0;
        }
        if is_key_down(KeyCode::E) {
            dir.y += 1.0;
        }
        if is_key_down(KeyCode::Q) {
            dir.y -= 1.0;
        }
        self.ctx.camera.translate(dir, self.config.move_speed, dt);

        // Mouse look while the right button is held
        let mouse = mouse_position();
        if is_mouse_button_down(MouseButton::Right) {
            let xrel = mouse.0 - self.last_mouse.0;
            let yrel = mouse.1 - self.last_mouse.1;
            self.ctx
                .camera
                .rotate_from_mouse(xrel, yrel, dt, self.config.mouse_sensitivity);
        }
        self.last_mouse = mouse;

        if is_key_pressed(KeyCode::P) {
            self.save_screenshot();
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            if is_key_pressed(KeyCode::O) {
                self.prompt_mesh()?;
            }
            if is_key_pressed(KeyCode::T) {
                self.prompt_texture();
            }
        }

        Ok(true)
    }

    fn save_screenshot(&mut self) {
        let path = PathBuf::from(format!("screenshot-{:03}.png", self.screenshots));
        match self.fb.save_png(&path) {
            Ok(()) => {
                self.screenshots += 1;
                log::info!("saved {}", path.display());
            }
            Err(e) => log::warn!("screenshot failed: {}", e),
        }
    }

    fn save_settings(&mut self) {
        self.config.store_settings(&self.ctx.settings);
        match save_config(&self.config, &self.config_path) {
            Ok(()) => log::info!("saved settings to {}", self.config_path.display()),
            Err(e) => log::warn!("saving settings failed: {}", e),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn prompt_mesh(&mut self) -> anyhow::Result<()> {
        let dialog = rfd::FileDialog::new()
            .add_filter("Wavefront OBJ", &["obj"])
            .set_directory("assets");

        if let Some(path) = dialog.pick_file() {
            self.mesh = load_mesh_or_cube(&path)?;
            self.config.mesh_path = path;
        }
        Ok(())
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn prompt_texture(&mut self) {
        let dialog = rfd::FileDialog::new()
            .add_filter("Image", &["png", "jpg", "jpeg", "bmp"])
            .set_directory("assets");

        if let Some(path) = dialog.pick_file() {
            self.texture = load_texture_or_checker(&path);
            self.config.texture_path = path;
        }
    }

    fn update(&mut self, elapsed_ms: f64) -> anyhow::Result<()> {
        if self.config.spin {
            self.mesh.spin(elapsed_ms);
        }
        let world = self.mesh.transform();
        self.ctx
            .update(&self.mesh.vertices, &self.mesh.faces, &world)
            .context("building frame")?;
        self.ctx.render(&mut self.fb, &self.texture, self.config.clear_color());
        Ok(())
    }

    fn present(&mut self) {
        clear_background(BLACK);

        // Stored mirrored; the flip happens while copying out
        self.fb.write_rgba_flipped(&mut self.rgba);
        let texture = Texture2D::from_rgba8(self.fb.width as u16, self.fb.height as u16, &self.rgba);
        texture.set_filter(FilterMode::Nearest);

        // Scale to fit the window, keeping the aspect ratio
        let scale = (screen_width() / self.fb.width as f32).min(screen_height() / self.fb.height as f32);
        let draw_w = self.fb.width as f32 * scale;
        let draw_h = self.fb.height as f32 * scale;
        let draw_x = (screen_width() - draw_w) / 2.0;
        let draw_y = (screen_height() - draw_h) / 2.0;

        draw_texture_ex(
            &texture,
            draw_x,
            draw_y,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(draw_w, draw_h)),
                ..Default::default()
            },
        );

        let s = &self.ctx.stats;
        draw_text(
            &format!(
                "{} | cull {:?} | faces {} tris {} split {} clipped {} culled {} | {} fps",
                self.ctx.settings.render_mode.label(),
                self.ctx.settings.cull_mode,
                s.faces,
                s.triangles,
                s.splits,
                s.clipped_away,
                s.culled,
                get_fps()
            ),
            draw_x + 5.0,
            draw_y + 16.0,
            16.0,
            Color::from_rgba(200, 200, 200, 255),
        );
    }
}

async fn run() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = load_config(&config_path)
        .with_context(|| format!("reading settings from {}", config_path.display()))?;

    let frame_time = config.frame_time();
    let mut viewer = Viewer::new(config, config_path)?;
    let mut prev_frame = get_time();

    loop {
        let now = get_time();
        let dt = (now - prev_frame) as f32;
        prev_frame = now;

        if !viewer.handle_input(dt)? {
            break;
        }
        viewer.update(now * 1000.0)?;
        viewer.present();

        // Frame pacing
        #[cfg(not(target_arch = "wasm32"))]
        {
            let spent = get_time() - now;
            if spent < frame_time {
                std::thread::sleep(std::time::Duration::from_secs_f64(frame_time - spent));
            }
        }

        next_frame().await;
    }

    Ok(())
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}
