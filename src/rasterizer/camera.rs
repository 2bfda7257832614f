//! Free-look camera

use std::f32::consts::FRAC_PI_2;
use super::math::{Mat4, Vec3};

/// Default ε for the pitch clamp
pub const PITCH_MARGIN: f32 = 0.05;

/// Camera state
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    /// Pitch stays within `±(π/2 - pitch_margin)`
    pub pitch_margin: f32,

    // Computed basis vectors
    pub right: Vec3,
    pub up: Vec3,
    pub forward: Vec3,
}

impl Camera {
    pub fn new() -> Self {
        let mut cam = Self {
            position: Vec3::ZERO,
            pitch: 0.0,
            yaw: 0.0,
            roll: 0.0,
            pitch_margin: PITCH_MARGIN,
            right: Vec3::new(1.0, 0.0, 0.0),
            up: Vec3::new(0.0, 1.0, 0.0),
            forward: Vec3::new(0.0, 0.0, 1.0),
        };
        cam.update_basis();
        cam
    }

    fn rotation_matrix(&self) -> Mat4 {
        Mat4::rotation(Vec3::new(self.pitch, self.yaw, self.roll))
    }

    /// Camera-to-world transform: translation after rotation
    pub fn transform(&self) -> Mat4 {
        Mat4::translation(self.position) * self.rotation_matrix()
    }

    /// The basis is the rows of the rotation part of `transform`
    pub fn update_basis(&mut self) {
        let t = self.transform();
        self.right = t.row(0);
        self.up = t.row(1);
        self.forward = t.row(2);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.right, self.up, self.forward)
    }

    /// Move along the local axes; `direction` is (right, up, forward)
    pub fn translate(&mut self, direction: Vec3, speed: f32, delta_time: f32) {
        let step = speed * delta_time;
        let offset = self.right * (direction.x * step)
            + self.up * (direction.y * step)
            + self.forward * (direction.z * step);
        self.position = self.position + offset;
    }

    /// Apply raw yaw/pitch deltas in radians
    pub fn rotate(&mut self, d_yaw: f32, d_pitch: f32) {
        self.yaw += d_yaw;
        let limit = FRAC_PI_2 - self.pitch_margin;
        self.pitch = (self.pitch + d_pitch).clamp(-limit, limit);
        self.update_basis();
    }

    /// Mouse motion in pixels, scaled by frame time and sensitivity
    pub fn rotate_from_mouse(&mut self, xrel: f32, yrel: f32, delta_time: f32, sensitivity: f32) {
        self.rotate(xrel * delta_time * sensitivity, yrel * delta_time * sensitivity);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
