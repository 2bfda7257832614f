//! View frustum built from the camera basis
//!
//! Planes live in world space. Normals point into the visible volume, so a
//! point is outside a plane when `dot(location - point, normal) > 0`.

use super::camera::Camera;
use super::math::{Vec3, Vec4};
use super::types::PlaneId;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Plane {
    pub location: Vec3,
    pub normal: Vec3,
}

impl Plane {
    pub fn new(location: Vec3, normal: Vec3) -> Self {
        Self { location, normal }
    }

    /// Positive on the outside, negative on the inside
    pub fn outside_distance(&self, v: Vec4) -> f32 {
        (self.location - v.xyz()).dot(self.normal)
    }

    pub fn is_outside(&self, v: Vec4) -> bool {
        self.outside_distance(v) > 0.0
    }
}

#[derive(Debug, Clone)]
pub struct Frustum {
    /// Horizontal field of view in radians
    pub fov: f32,
    /// Width / height
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub planes: [Plane; PlaneId::COUNT],
}

impl Frustum {
    pub fn new(fov: f32, aspect: f32, z_near: f32, z_far: f32) -> Self {
        Self {
            fov,
            aspect,
            z_near,
            z_far,
            planes: [Plane::default(); PlaneId::COUNT],
        }
    }

    pub fn plane(&self, id: PlaneId) -> &Plane {
        &self.planes[id.index()]
    }

    /// Half of the vertical field of view that matches the projection's
    /// y scale for this aspect ratio
    pub fn half_fov_vertical(&self) -> f32 {
        ((self.fov / 2.0).tan() / self.aspect).atan()
    }

    /// Rebuild all six planes from the camera
    pub fn update(&mut self, camera: &Camera) {
        let right = camera.right;
        let left = -right;
        let up = camera.up;
        let down = -up;
        let forward = camera.forward;

        let half_h = self.fov / 2.0;
        let half_v = self.half_fov_vertical();
        let eye = camera.position;

        self.planes[PlaneId::Right.index()] = Plane::new(eye, left.rotate_around(up, -half_h));
        self.planes[PlaneId::Left.index()] = Plane::new(eye, right.rotate_around(up, half_h));
        self.planes[PlaneId::Top.index()] = Plane::new(eye, up.rotate_around(left, half_v));
        self.planes[PlaneId::Bottom.index()] = Plane::new(eye, down.rotate_around(left, -half_v));
        self.planes[PlaneId::Near.index()] = Plane::new(eye + forward * self.z_near, forward);
        self.planes[PlaneId::Far.index()] = Plane::new(eye + forward * self.z_far, -forward);
    }
}
