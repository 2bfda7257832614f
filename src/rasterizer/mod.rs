//! Software rasterizer
//!
//! Features:
//! - Frustum clipping in world space, with triangle splitting
//! - Perspective-correct texture mapping
//! - Inverse-depth buffer or painter's algorithm
//! - Flat shading from one directional light
//! - Wireframe, vertex, fill, texture and depth view modes

mod camera;
mod clip;
mod darray;
mod error;
mod frustum;
mod math;
mod pipeline;
mod render;
mod types;

pub use darray::*;
pub use error::*;
pub use math::*;
pub use pipeline::*;
pub use render::*;
pub use types::*;

/// Default color buffer size
pub const WIDTH: usize = 800;
pub const HEIGHT: usize = 600;
