//! Per-frame render pipeline
//!
//! `update` turns a mesh into a list of screen triangles:
//! world transform, frustum clip, view transform, back-face cull, flat
//! shading, projection. `render` rasterizes that list into a framebuffer
//! according to the current render mode.

use super::camera::Camera;
use super::clip::{ClipTriangle, Clipper};
use super::darray::GrowBuffer;
use super::error::RenderError;
use super::frustum::Frustum;
use super::math::{Mat4, Vec2, Vec3, Vec4};
use super::render::{Fill, Framebuffer};
use super::types::{Color, CullMode, Face, RasterSettings, RenderMode, ScreenTriangle, Texture};

/// Grid overlay color
const GRID_COLOR: Color = Color { r: 0x33, g: 0x33, b: 0x33, a: 0xFF };

/// Counters for the last `update`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Mesh faces submitted
    pub faces: usize,
    /// Screen triangles produced
    pub triangles: usize,
    pub splits: usize,
    /// Triangles removed entirely by the frustum
    pub clipped_away: usize,
    pub culled: usize,
    pub degenerate: usize,
}

/// Face normal in the space of `vertices`, `(v1 - v0) x (v2 - v0)`
pub fn face_normal(vertices: &[Vec4; 3]) -> Result<Vec3, RenderError> {
    let [a, b, c] = vertices.map(|v| v.xyz());
    if !(a.is_finite() && b.is_finite() && c.is_finite()) {
        return Err(RenderError::DegenerateGeometry);
    }
    (b - a).cross(c - a).try_normalize().ok_or(RenderError::DegenerateGeometry)
}

/// Back-face test in view space (camera at the origin).
///
/// Each split reverses the corner order of the piece it creates; `reversed`
/// is that parity, and inverts the test so every piece of a face agrees.
pub fn is_back_facing(normal: Vec3, first_vertex: Vec3, reversed: bool) -> bool {
    let d = normal.dot(first_vertex.normalize());
    if reversed {
        d < 0.0
    } else {
        d > 0.0
    }
}

/// Flat shading factor in [0, 1]
pub fn light_factor(normal: Vec3, light_dir: Vec3) -> f32 {
    (normal.dot(light_dir.normalize()) + 1.0) / 2.0
}

/// All state a frame needs: camera, frustum, matrices and scratch buffers
pub struct RenderContext {
    pub camera: Camera,
    pub frustum: Frustum,
    pub projection: Mat4,
    pub view: Mat4,
    pub settings: RasterSettings,
    pub width: usize,
    pub height: usize,
    pub stats: FrameStats,
    /// World-space vertices; clip splits append past the mesh's own
    vertices: GrowBuffer<Vec4>,
    triangles: GrowBuffer<ScreenTriangle>,
    clipper: Clipper,
}

impl RenderContext {
    /// `fov` is the horizontal field of view in radians
    pub fn new(width: usize, height: usize, fov: f32, z_near: f32, z_far: f32) -> Self {
        let aspect = width as f32 / height.max(1) as f32;
        Self {
            camera: Camera::new(),
            frustum: Frustum::new(fov, aspect, z_near, z_far),
            projection: Mat4::perspective(aspect, fov, z_near, z_far),
            view: Mat4::IDENTITY,
            settings: RasterSettings::default(),
            width,
            height,
            stats: FrameStats::default(),
            vertices: GrowBuffer::new(),
            triangles: GrowBuffer::new(),
            clipper: Clipper::new(),
        }
    }

    /// Triangles produced by the last `update`
    pub fn triangles(&self) -> &[ScreenTriangle] {
        &self.triangles
    }

    /// Project a view-space point to screen coordinates and inverse depth
    pub fn project_vertex(&self, v: Vec4) -> (Vec2, f32) {
        let mut p = self.projection * v;
        let inv_depth = if p.w != 0.0 {
            p.x /= p.w;
            p.y /= p.w;
            p.z /= p.w;
            1.0 / p.w
        } else {
            1.0 / f32::MAX
        };

        let half_w = self.width as f32 / 2.0;
        let half_h = self.height as f32 / 2.0;
        (Vec2::new(p.x * half_w + half_w, p.y * half_h + half_h), inv_depth)
    }

    /// Build this frame's triangle list from a mesh placed by `world`
    pub fn update(&mut self, vertices: &[Vec3], faces: &[Face], world: &Mat4) -> Result<(), RenderError> {
        self.triangles.clear();
        self.stats = FrameStats {
            faces: faces.len(),
            ..FrameStats::default()
        };

        self.camera.update_basis();
        self.frustum.update(&self.camera);
        self.view = self.camera.view_matrix();

        self.vertices.clear();
        self.vertices.reserve(faces.len() * 2)?;
        for v in vertices {
            self.vertices.push(*world * v.to_point())?;
        }
        let mesh_vertex_count = self.vertices.len();

        for face in faces {
            let corners = match face.indices().map(|i| self.vertices.get(i).copied()) {
                [Some(a), Some(b), Some(c)] => [a, b, c],
                _ => {
                    log::trace!("face {:?} references a missing vertex", face.indices());
                    self.stats.degenerate += 1;
                    continue;
                }
            };

            let report = self
                .clipper
                .clip(ClipTriangle::new(*face, corners), &self.frustum, &mut self.vertices)?;
            self.stats.splits += report.splits;
            self.stats.clipped_away += report.dropped;

            for i in 0..self.clipper.output().len() {
                let tri = self.clipper.output()[i];
                self.emit(&tri)?;
            }
        }

        self.vertices.reset_size(mesh_vertex_count);
        self.stats.triangles = self.triangles.len();
        log::trace!("{:?}", self.stats);
        Ok(())
    }

    /// View transform, cull, shade and project one clipped triangle
    fn emit(&mut self, tri: &ClipTriangle) -> Result<(), RenderError> {
        let view = tri.vertices.map(|v| self.view * v);

        let normal = match face_normal(&view) {
            Ok(n) => n,
            Err(e) => {
                log::trace!("skipping triangle: {}", e);
                self.stats.degenerate += 1;
                return Ok(());
            }
        };

        if self.settings.cull_mode == CullMode::Backface
            && is_back_facing(normal, view[0].xyz(), tri.reversed)
        {
            self.stats.culled += 1;
            return Ok(());
        }

        // shade split pieces the same as their source face
        let oriented = if tri.reversed { -normal } else { normal };
        let color = tri.face.color.shade(light_factor(oriented, self.settings.light_dir));

        let mut screen = ScreenTriangle {
            tex_coords: tri.face.tex_coords,
            color,
            ..ScreenTriangle::default()
        };
        for (i, v) in view.iter().enumerate() {
            let (p, inv_depth) = self.project_vertex(*v);
            screen.points[i] = p;
            screen.inv_depth[i] = inv_depth;
        }

        self.triangles.push(screen)
    }

    /// Rasterize the current triangle list
    pub fn render(&mut self, fb: &mut Framebuffer, texture: &Texture, clear_color: Color) {
        fb.clear(clear_color);
        fb.clear_depth();

        if self.settings.show_grid {
            fb.draw_grid(GRID_COLOR);
        }

        let mode = self.settings.render_mode;
        let use_zbuffer = self.settings.use_zbuffer;

        // painter's algorithm: far to near
        if !use_zbuffer {
            self.triangles
                .sort_by(|a, b| a.average_inv_depth().total_cmp(&b.average_inv_depth()));
        }

        for tri in self.triangles.iter_mut() {
            tri.round();
        }

        for tri in self.triangles.iter() {
            if mode.fills() {
                let fill = match mode {
                    RenderMode::Depth => Fill::Depth,
                    m if m.textured() => Fill::Texture(texture),
                    _ => Fill::Flat,
                };
                if !use_zbuffer && matches!(fill, Fill::Flat) {
                    fb.fill_triangle(tri.points, tri.color);
                } else {
                    fb.draw_textured_triangle(tri, fill, use_zbuffer);
                }
            }

            if mode.draws_edges() {
                fb.draw_triangle_edges(tri, Color::WHITE);
            }
            if mode == RenderMode::WireVertex {
                fb.draw_triangle_vertices(tri, Color::GREEN);
            }
        }
    }
}
