//! Vector and matrix math for the software pipeline
//!
//! Matrices are row-major and applied to column vectors: `v' = M * v`.

use std::ops::{Add, Mul, Neg, Sub};
use serde::{Serialize, Deserialize};

/// 3D Vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
    pub const ONE: Vec3 = Vec3 { x: 1.0, y: 1.0, z: 1.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn len(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Unit vector, or `None` for zero-length and non-finite input
    pub fn try_normalize(self) -> Option<Vec3> {
        let l = self.len();
        if l == 0.0 || !l.is_finite() {
            return None;
        }
        Some(self.scale(1.0 / l))
    }

    pub fn normalize(self) -> Vec3 {
        self.try_normalize().unwrap_or(Vec3::ZERO)
    }

    pub fn scale(self, s: f32) -> Vec3 {
        Vec3 {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }

    pub fn to_point(self) -> Vec4 {
        Vec4::new(self.x, self.y, self.z, 1.0)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Rotate `self` around axis `k` by `angle` radians (Rodrigues).
    ///
    /// The cross term is `self × k`, so a positive angle turns the vector
    /// clockwise when looking down `k`. Frustum plane normals are built with
    /// this handedness.
    pub fn rotate_around(self, k: Vec3, angle: f32) -> Vec3 {
        let (sin, cos) = angle.sin_cos();
        self.scale(cos) + self.cross(k).scale(sin) + k.scale(k.dot(self) * (1.0 - cos))
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, s: f32) -> Vec3 {
        self.scale(s)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        self.scale(-1.0)
    }
}

/// 2D Vector (screen positions)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// z component of the 3D cross product
    pub fn cross(self, other: Vec2) -> f32 {
        self.x * other.y - self.y * other.x
    }

    pub fn round(self) -> Vec2 {
        Vec2::new(self.x.round(), self.y.round())
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }
}

/// Homogeneous 4D vector. Arithmetic works on xyz only, the way the
/// clipper treats world-space points.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub fn xyz(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Point on the segment `self -> other` at parameter `t`
    pub fn lerp(self, other: Vec4, t: f32) -> Vec4 {
        let d = other.xyz() - self.xyz();
        let p = self.xyz() + d.scale(t);
        Vec4::new(p.x, p.y, p.z, 1.0)
    }
}

/// Texture coordinate
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TexCoord {
    pub u: f32,
    pub v: f32,
}

impl TexCoord {
    pub fn new(u: f32, v: f32) -> Self {
        Self { u, v }
    }

    pub fn lerp(self, other: TexCoord, t: f32) -> TexCoord {
        TexCoord {
            u: self.u + (other.u - self.u) * t,
            v: self.v + (other.v - self.v) * t,
        }
    }
}

/// 4x4 matrix, `m[row][col]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub m: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub fn scale(s: Vec3) -> Mat4 {
        let mut r = Self::IDENTITY;
        r.m[0][0] = s.x;
        r.m[1][1] = s.y;
        r.m[2][2] = s.z;
        r
    }

    pub fn translation(t: Vec3) -> Mat4 {
        let mut r = Self::IDENTITY;
        r.m[0][3] = t.x;
        r.m[1][3] = t.y;
        r.m[2][3] = t.z;
        r
    }

    // |  1  0  0  |
    // |  0  c  s  |
    // |  0 -s  c  |
    pub fn rotation_x(a: f32) -> Mat4 {
        let (s, c) = a.sin_cos();
        let mut r = Self::IDENTITY;
        r.m[1][1] = c;
        r.m[1][2] = s;
        r.m[2][1] = -s;
        r.m[2][2] = c;
        r
    }

    // |  c  0 -s  |
    // |  0  1  0  |
    // |  s  0  c  |
    pub fn rotation_y(a: f32) -> Mat4 {
        let (s, c) = a.sin_cos();
        let mut r = Self::IDENTITY;
        r.m[0][0] = c;
        r.m[0][2] = -s;
        r.m[2][0] = s;
        r.m[2][2] = c;
        r
    }

    // |  c  s  0  |
    // | -s  c  0  |
    // |  0  0  1  |
    pub fn rotation_z(a: f32) -> Mat4 {
        let (s, c) = a.sin_cos();
        let mut r = Self::IDENTITY;
        r.m[0][0] = c;
        r.m[0][1] = s;
        r.m[1][0] = -s;
        r.m[1][1] = c;
        r
    }

    /// Euler rotation `Rx(x) * Ry(y) * Rz(z)`
    pub fn rotation(r: Vec3) -> Mat4 {
        Self::rotation_x(r.x) * Self::rotation_y(r.y) * Self::rotation_z(r.z)
    }

    /// World-to-view matrix from an orthonormal camera basis.
    /// Rows are the basis vectors, the last column undoes the camera position.
    pub fn look_at(position: Vec3, right: Vec3, up: Vec3, forward: Vec3) -> Mat4 {
        Mat4 {
            m: [
                [right.x, right.y, right.z, -right.dot(position)],
                [up.x, up.y, up.z, -up.dot(position)],
                [forward.x, forward.y, forward.z, -forward.dot(position)],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Perspective projection. `w` receives the view-space z.
    ///
    /// Both x and y are negated; the image comes out mirrored horizontally
    /// and the presentation layer flips it back.
    pub fn perspective(aspect: f32, fov: f32, z_near: f32, z_far: f32) -> Mat4 {
        let f = 1.0 / (fov / 2.0).tan();
        let mut r = Self::IDENTITY;
        r.m[0][0] = -f;
        r.m[1][1] = -aspect * f;
        r.m[2][2] = z_far / (z_far - z_near);
        r.m[2][3] = z_far * z_near / (z_far - z_near);
        r.m[3][2] = 1.0;
        r.m[3][3] = 0.0;
        r
    }

    pub fn row(&self, i: usize) -> Vec3 {
        Vec3::new(self.m[i][0], self.m[i][1], self.m[i][2])
    }

    pub fn transform(&self, v: Vec4) -> Vec4 {
        let m = &self.m;
        Vec4 {
            x: m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z + m[0][3] * v.w,
            y: m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z + m[1][3] * v.w,
            z: m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z + m[2][3] * v.w,
            w: m[3][0] * v.x + m[3][1] * v.y + m[3][2] * v.z + m[3][3] * v.w,
        }
    }
}

impl Mul for Mat4 {
    type Output = Mat4;
    fn mul(self, other: Mat4) -> Mat4 {
        let mut r = Mat4 { m: [[0.0; 4]; 4] };
        for i in 0..4 {
            for j in 0..4 {
                r.m[i][j] = (0..4).map(|k| self.m[i][k] * other.m[k][j]).sum();
            }
        }
        r
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    fn mul(self, v: Vec4) -> Vec4 {
        self.transform(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_vec3_cross() {
        let a = Vec3::new(1.0, 0.0, 0.0);
        let b = Vec3::new(0.0, 1.0, 0.0);
        let c = a.cross(b);
        assert!(close(c.z, 1.0));
    }

    #[test]
    fn test_zero_vector_has_no_direction() {
        assert!(Vec3::ZERO.try_normalize().is_none());
        assert!(Vec3::new(f32::NAN, 0.0, 1.0).try_normalize().is_none());
        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
    }

    #[test]
    fn test_rodrigues_quarter_turn() {
        // x rotated about y with the `v × k` convention lands on +z
        let r = Vec3::new(1.0, 0.0, 0.0).rotate_around(Vec3::new(0.0, 1.0, 0.0), std::f32::consts::FRAC_PI_2);
        assert!(close(r.x, 0.0) && close(r.y, 0.0) && close(r.z, 1.0));
    }

    #[test]
    fn test_mat4_identity_mul() {
        let t = Mat4::translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(t * Mat4::IDENTITY, t);
        let p = t * Vec3::new(1.0, 1.0, 1.0).to_point();
        assert!(close(p.x, 2.0) && close(p.y, 3.0) && close(p.z, 4.0) && close(p.w, 1.0));
    }

    #[test]
    fn test_translation_ignores_directions() {
        let t = Mat4::translation(Vec3::new(5.0, 5.0, 5.0));
        let d = t * Vec4::new(0.0, 0.0, 1.0, 0.0);
        assert!(close(d.x, 0.0) && close(d.z, 1.0));
    }

    #[test]
    fn test_look_at_identity_camera() {
        let m = Mat4::look_at(
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        );
        assert_eq!(m, Mat4::IDENTITY);

        let moved = Mat4::look_at(
            Vec3::new(0.0, 0.0, -2.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        );
        let p = moved * Vec3::ZERO.to_point();
        assert!(close(p.z, 2.0));
    }

    #[test]
    fn test_perspective_puts_depth_in_w() {
        let p = Mat4::perspective(4.0 / 3.0, std::f32::consts::FRAC_PI_2, 0.1, 120.0);
        let v = p * Vec4::new(1.0, 1.0, 5.0, 1.0);
        assert!(close(v.w, 5.0));
        assert!(close(v.x, -1.0));
        assert!(close(v.y, -4.0 / 3.0));
    }

    #[test]
    fn test_texcoord_lerp() {
        let a = TexCoord::new(0.0, 1.0);
        let b = TexCoord::new(1.0, 0.0);
        let m = a.lerp(b, 0.25);
        assert!(close(m.u, 0.25) && close(m.v, 0.75));
    }
}
