//! Mesh storage and placement

use std::f32::consts::PI;
use rand::Rng;
use crate::rasterizer::{Color, Face, GrowBuffer, Mat4, RenderError, TexCoord, Vec3};

/// A single triangle mesh with its world placement
#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: GrowBuffer<Vec3>,
    pub faces: GrowBuffer<Face>,
    pub scale: Vec3,
    /// Euler angles (x, y, z) in radians
    pub rotation: Vec3,
    pub translation: Vec3,
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            vertices: GrowBuffer::new(),
            faces: GrowBuffer::new(),
            scale: Vec3::ONE,
            rotation: Vec3::ZERO,
            translation: Vec3::ZERO,
        }
    }

    /// Model-to-world: scale, then rotate, then translate
    pub fn transform(&self) -> Mat4 {
        Mat4::translation(self.translation) * Mat4::rotation(self.rotation) * Mat4::scale(self.scale)
    }

    /// Slow tumble in front of the camera, driven by elapsed milliseconds
    pub fn spin(&mut self, elapsed_ms: f64) {
        let angle = PI * (0.0001 * elapsed_ms).sin() as f32;
        self.scale = Vec3::new(0.5, 0.5, 0.5);
        self.rotation.x = angle;
        self.rotation.y = angle;
        self.translation.z = 3.0;
    }

    /// Give every face an opaque random base color
    pub fn randomize_colors<R: Rng>(&mut self, rng: &mut R) {
        for face in self.faces.iter_mut() {
            face.color = Color::new(rng.random(), rng.random(), rng.random());
        }
    }

    /// Built-in textured cube, two triangles per side, outward winding
    pub fn cube() -> Result<Self, RenderError> {
        let mut mesh = Self::new();

        let positions = [
            // Front
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
            // Back
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            // Top
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(-1.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, -1.0),
            // Bottom
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            // Right
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            // Left
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
            Vec3::new(-1.0, 1.0, -1.0),
        ];

        let uvs = [
            TexCoord::new(0.0, 1.0),
            TexCoord::new(1.0, 1.0),
            TexCoord::new(1.0, 0.0),
            TexCoord::new(0.0, 0.0),
        ];

        for p in positions {
            mesh.vertices.push(p)?;
        }

        for side in 0..6 {
            let base = side * 4;
            mesh.faces.push(Face::new(base, base + 1, base + 2, [uvs[0], uvs[1], uvs[2]], Color::WHITE))?;
            mesh.faces.push(Face::new(base, base + 2, base + 3, [uvs[0], uvs[2], uvs[3]], Color::WHITE))?;
        }

        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::{CullMode, RenderContext, Vec4};
    use rand::SeedableRng;

    #[test]
    fn test_cube_counts() {
        let cube = Mesh::cube().unwrap();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.faces.len(), 12);
        assert!(cube.faces.iter().all(|f| f.indices().iter().all(|&i| i < 24)));
    }

    #[test]
    fn test_transform_order() {
        let mut mesh = Mesh::new();
        mesh.scale = Vec3::new(2.0, 2.0, 2.0);
        mesh.rotation = Vec3::new(0.0, 0.0, 0.0);
        mesh.translation = Vec3::new(0.0, 0.0, 3.0);
        let p = mesh.transform() * Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert!((p.x - 2.0).abs() < 1e-6);
        assert!((p.z - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_spin_places_mesh_in_view() {
        let mut mesh = Mesh::new();
        mesh.spin(0.0);
        assert_eq!(mesh.translation.z, 3.0);
        assert_eq!(mesh.rotation, Vec3::ZERO);
        mesh.spin(5000.0 * PI as f64);
        assert!((mesh.rotation.x - PI).abs() < 1e-4);
    }

    #[test]
    fn test_random_colors_are_opaque() {
        let mut cube = Mesh::cube().unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        cube.randomize_colors(&mut rng);
        assert!(cube.faces.iter().all(|f| f.color.a == 255));
    }

    #[test]
    fn test_cube_shows_one_side_head_on() {
        let mut cube = Mesh::cube().unwrap();
        cube.scale = Vec3::new(0.5, 0.5, 0.5);
        cube.translation = Vec3::new(0.0, 0.0, 3.0);

        let mut ctx = RenderContext::new(800, 600, std::f32::consts::FRAC_PI_2, 0.1, 120.0);
        ctx.settings.cull_mode = CullMode::Backface;
        ctx.update(&cube.vertices, &cube.faces, &cube.transform()).unwrap();
        assert_eq!(ctx.stats.triangles, 2);
        assert_eq!(ctx.stats.culled, 10);
    }
}
