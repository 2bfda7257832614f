//! World module - the mesh being viewed and how it gets loaded

mod mesh;
mod obj;

pub use mesh::*;
pub use obj::*;
