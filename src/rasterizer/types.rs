//! Core types for the rasterizer

use serde::{Deserialize, Serialize};
use super::error::RenderError;
use super::math::{TexCoord, Vec2, Vec3};

/// RGBA color (0-255 per channel), stored in buffers as packed ARGB
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_argb(c: u32) -> Self {
        Self {
            a: (c >> 24) as u8,
            r: (c >> 16) as u8,
            g: (c >> 8) as u8,
            b: c as u8,
        }
    }

    pub fn to_argb(self) -> u32 {
        ((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | (self.b as u32)
    }

    /// Scale RGB by intensity (0.0-1.0), alpha untouched
    pub fn shade(self, intensity: f32) -> Self {
        let i = intensity.clamp(0.0, 1.0);
        Self {
            r: (self.r as f32 * i) as u8,
            g: (self.g as f32 * i) as u8,
            b: (self.b as f32 * i) as u8,
            a: self.a,
        }
    }

    /// Gray level for the depth view; inverse depth 1.0 is white
    pub fn depth_gray(inv_depth: f32) -> Self {
        let v = (255.0 * inv_depth.clamp(0.0, 1.0)) as u8;
        Self::new(v, v, v)
    }

    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Frustum plane ids, in the order they are tested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaneId {
    Right = 0,
    Bottom = 1,
    Left = 2,
    Top = 3,
    Far = 4,
    Near = 5,
}

impl PlaneId {
    pub const COUNT: usize = 6;

    pub const ALL: [PlaneId; 6] = [
        PlaneId::Right,
        PlaneId::Bottom,
        PlaneId::Left,
        PlaneId::Top,
        PlaneId::Far,
        PlaneId::Near,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// A triangle face: indices into the vertex buffer plus per-corner texture
/// coordinates (`tex_coords[0]` belongs to `a`)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Face {
    pub a: usize,
    pub b: usize,
    pub c: usize,
    pub tex_coords: [TexCoord; 3],
    pub color: Color,
    /// Plane that produced this face by splitting; `None` for mesh faces
    pub clipped_plane: Option<PlaneId>,
}

impl Face {
    pub fn new(a: usize, b: usize, c: usize, tex_coords: [TexCoord; 3], color: Color) -> Self {
        Self {
            a,
            b,
            c,
            tex_coords,
            color,
            clipped_plane: None,
        }
    }

    pub fn indices(&self) -> [usize; 3] {
        [self.a, self.b, self.c]
    }
}

/// Projected triangle, ready for rasterization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenTriangle {
    pub points: [Vec2; 3],
    pub tex_coords: [TexCoord; 3],
    pub inv_depth: [f32; 3],
    pub color: Color,
}

impl Default for ScreenTriangle {
    fn default() -> Self {
        Self {
            points: [Vec2::default(); 3],
            tex_coords: [TexCoord::default(); 3],
            inv_depth: [1.0 / f32::MAX; 3],
            color: Color::default(),
        }
    }
}

impl ScreenTriangle {
    /// Snap vertices to whole pixels
    pub fn round(&mut self) {
        for p in &mut self.points {
            *p = p.round();
        }
    }

    pub fn average_inv_depth(&self) -> f32 {
        (self.inv_depth[0] + self.inv_depth[1] + self.inv_depth[2]) / 3.0
    }

    /// Unsigned-area barycentric weights of `p`. Independent of winding;
    /// outside points get weights that sum past 1.
    pub fn barycentric_weights(&self, p: Vec2) -> Vec3 {
        let [a, b, c] = self.points;
        let ab = b - a;
        let ac = c - a;
        let pa = a - p;
        let pb = b - p;
        let pc = c - p;

        let area = ac.cross(ab).abs();
        if area == 0.0 {
            let third = 1.0 / 3.0;
            return Vec3::new(third, third, third);
        }

        Vec3::new(
            pc.cross(pb).abs() / area,
            pa.cross(pc).abs() / area,
            pb.cross(pa).abs() / area,
        )
    }
}

/// Simple texture (array of colors)
#[derive(Debug, Clone)]
pub struct Texture {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Color>,
    pub name: String,
}

impl Texture {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::WHITE; width * height],
            name: String::new(),
        }
    }

    /// Load texture from an image file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, RenderError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| RenderError::Image(format!("{}: {}", path.display(), e)))?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        Self::from_bytes(&bytes, name)
    }

    /// Decode texture from encoded image bytes
    pub fn from_bytes(bytes: &[u8], name: String) -> Result<Self, RenderError> {
        use image::GenericImageView;

        let img = image::load_from_memory(bytes)
            .map_err(|e| RenderError::Image(format!("failed to decode {}: {}", name, e)))?;

        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(RenderError::Image(format!("{} is empty", name)));
        }
        let rgba = img.to_rgba8();

        let pixels: Vec<Color> = rgba
            .pixels()
            .map(|p| Color::with_alpha(p[0], p[1], p[2], p[3]))
            .collect();

        Ok(Self {
            width: width as usize,
            height: height as usize,
            pixels,
            name,
        })
    }

    /// Create a checkerboard test texture
    pub fn checkerboard(width: usize, height: usize, color1: Color, color2: Color) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let checker = ((x / 8) + (y / 8)) % 2 == 0;
                pixels.push(if checker { color1 } else { color2 });
            }
        }
        Self { width, height, pixels, name: "checkerboard".to_string() }
    }

    /// Nearest texel, tiling outside [0, 1)
    pub fn sample(&self, u: f32, v: f32) -> Color {
        let (w, h) = (self.width as i64, self.height as i64);
        if w == 0 || h == 0 {
            return Color::BLACK;
        }
        let tx = ((u * self.width as f32) as i64).rem_euclid(w) as usize;
        let ty = ((v * self.height as f32) as i64).rem_euclid(h) as usize;
        self.pixels[ty * self.width + tx]
    }
}

/// What the rasterizer draws for each triangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RenderMode {
    #[default]
    Wire,
    WireVertex,
    Fill,
    FillWire,
    Texture,
    TextureWire,
    Depth,
}

impl RenderMode {
    pub const ALL: [RenderMode; 7] = [
        RenderMode::Wire,
        RenderMode::WireVertex,
        RenderMode::Fill,
        RenderMode::FillWire,
        RenderMode::Texture,
        RenderMode::TextureWire,
        RenderMode::Depth,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RenderMode::Wire => "wireframe",
            RenderMode::WireVertex => "wireframe + vertices",
            RenderMode::Fill => "filled",
            RenderMode::FillWire => "filled + wireframe",
            RenderMode::Texture => "textured",
            RenderMode::TextureWire => "textured + wireframe",
            RenderMode::Depth => "depth buffer",
        }
    }

    pub fn from_index(i: usize) -> Option<RenderMode> {
        RenderMode::ALL.get(i).copied()
    }

    /// Modes that rasterize triangle interiors
    pub fn fills(&self) -> bool {
        !matches!(self, RenderMode::Wire | RenderMode::WireVertex)
    }

    /// Modes that overlay triangle edges
    pub fn draws_edges(&self) -> bool {
        matches!(
            self,
            RenderMode::Wire | RenderMode::WireVertex | RenderMode::FillWire | RenderMode::TextureWire
        )
    }

    pub fn textured(&self) -> bool {
        matches!(self, RenderMode::Texture | RenderMode::TextureWire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CullMode {
    #[default]
    None,
    Backface,
}

impl CullMode {
    pub fn toggled(self) -> Self {
        match self {
            CullMode::None => CullMode::Backface,
            CullMode::Backface => CullMode::None,
        }
    }
}

/// Rasterizer settings
#[derive(Debug, Clone)]
pub struct RasterSettings {
    pub render_mode: RenderMode,
    pub cull_mode: CullMode,
    /// Use the inverse-depth buffer (false = painter's algorithm)
    pub use_zbuffer: bool,
    /// Directional light (for flat shading)
    pub light_dir: Vec3,
    /// Overlay a 10 px grid
    pub show_grid: bool,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            render_mode: RenderMode::Wire,
            cull_mode: CullMode::None,
            use_zbuffer: true,
            light_dir: Vec3::new(1.0, 0.0, 0.0),
            show_grid: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argb_roundtrip_channels() {
        let c = Color::from_argb(0x80112233);
        assert_eq!(c, Color::with_alpha(0x11, 0x22, 0x33, 0x80));
        assert_eq!(c.to_argb(), 0x80112233);
    }

    #[test]
    fn test_shade_keeps_alpha() {
        let c = Color::with_alpha(200, 100, 50, 7).shade(0.5);
        assert_eq!(c, Color::with_alpha(100, 50, 25, 7));
    }

    #[test]
    fn test_sample_wraps() {
        let mut tex = Texture::new(4, 4);
        tex.pixels[1 * 4 + 2] = Color::GREEN;
        assert_eq!(tex.sample(0.5, 0.25), Color::GREEN);
        assert_eq!(tex.sample(1.5, 1.25), Color::GREEN);
        assert_eq!(tex.sample(-0.5, -0.75), Color::GREEN);
    }

    #[test]
    fn test_barycentric_at_corners() {
        let tri = ScreenTriangle {
            points: [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(0.0, 10.0)],
            ..Default::default()
        };
        let w = tri.barycentric_weights(Vec2::new(10.0, 0.0));
        assert!((w.y - 1.0).abs() < 1e-6 && w.x.abs() < 1e-6 && w.z.abs() < 1e-6);

        let center = tri.barycentric_weights(Vec2::new(10.0 / 3.0, 10.0 / 3.0));
        assert!((center.x + center.y + center.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_render_mode_flags() {
        assert!(!RenderMode::Wire.fills());
        assert!(RenderMode::FillWire.draws_edges());
        assert!(!RenderMode::Depth.draws_edges());
        assert!(RenderMode::TextureWire.textured());
        assert_eq!(RenderMode::from_index(6), Some(RenderMode::Depth));
        assert_eq!(RenderMode::from_index(7), None);
    }
}
