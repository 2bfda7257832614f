//! Frustum clipping with triangle splitting
//!
//! Each triangle is tested against the six planes in order. Per plane a
//! 3-bit mask records which corners are outside:
//!
//! - `000`: inside, nothing to do
//! - one bit: the outside corner slides to the plane along one edge and a
//!   new triangle covers the rest of the clipped quad
//! - two bits: both outside corners slide towards the inside corner
//! - `111`: the triangle is dropped
//!
//! Split-off triangles go on a work queue and are tested against the planes
//! after the one that produced them. Earlier planes can be skipped because a
//! child only uses points of its parent's already-clipped outline.

use super::darray::GrowBuffer;
use super::error::RenderError;
use super::frustum::{Frustum, Plane};
use super::math::Vec4;
use super::types::{Face, PlaneId};

/// Mask value meaning "all three corners outside": the triangle is gone
pub const MASK_DROP: u8 = 0b111;

/// A triangle moving through the clipper
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipTriangle {
    /// Indices, working texture coordinates, color, generating plane
    pub face: Face,
    /// Working copy of the world-space corners
    pub vertices: [Vec4; 3],
    /// Corner order runs opposite to the source face
    pub reversed: bool,
    /// First plane (in `PlaneId::ALL` order) still to test
    pub next_plane: usize,
}

impl ClipTriangle {
    pub fn new(face: Face, vertices: [Vec4; 3]) -> Self {
        Self {
            face,
            vertices,
            reversed: false,
            next_plane: 0,
        }
    }
}

/// Result of clipping one triangle against one plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaneClip {
    Inside,
    /// Corners were moved onto the plane
    Trimmed,
    /// One corner moved and an extra triangle was produced
    Split(ClipTriangle),
    Dropped,
}

/// Bit `i` is set when corner `i` is outside the plane
pub fn outside_mask(vertices: &[Vec4; 3], plane: &Plane) -> u8 {
    vertices
        .iter()
        .enumerate()
        .filter(|(_, v)| plane.is_outside(**v))
        .fold(0, |mask, (i, _)| mask | (1u8 << i))
}

/// Edge parameter where `outside -> inside` crosses the plane.
/// Both distances use the same outside-positive sign convention.
pub fn crossing_factor(d_outside: f32, d_inside: f32) -> f32 {
    d_outside / (d_outside - d_inside)
}

/// Clip `tri` against a single plane, mutating it in place
pub fn clip_against_plane(tri: &mut ClipTriangle, plane: &Plane, id: PlaneId) -> PlaneClip {
    let mask = outside_mask(&tri.vertices, plane);
    match mask {
        0b000 => PlaneClip::Inside,
        0b001 | 0b010 | 0b100 => {
            let outside = mask.trailing_zeros() as usize;
            PlaneClip::Split(split_single_outside(tri, outside, plane, id))
        }
        0b011 | 0b101 | 0b110 => {
            let inside = (!mask & MASK_DROP).trailing_zeros() as usize;
            trim_two_outside(tri, inside, plane);
            PlaneClip::Trimmed
        }
        _ => PlaneClip::Dropped,
    }
}

/// One corner outside. The outside corner `o` moves to where edge
/// `o -> (o+2)%3` meets the plane; the new triangle is
/// `(crossing on o -> (o+1)%3, moved o, (o+1)%3)`, which runs the other way
/// round compared to the source.
fn split_single_outside(tri: &mut ClipTriangle, o: usize, plane: &Plane, id: PlaneId) -> ClipTriangle {
    let i0 = (o + 2) % 3;
    let i1 = (o + 1) % 3;

    let d_out = plane.outside_distance(tri.vertices[o]);
    let d_in0 = plane.outside_distance(tri.vertices[i0]);
    let d_in1 = plane.outside_distance(tri.vertices[i1]);

    let t_new = crossing_factor(d_out, d_in1);
    let new_vertex = tri.vertices[o].lerp(tri.vertices[i1], t_new);
    let new_uv = tri.face.tex_coords[o].lerp(tri.face.tex_coords[i1], t_new);

    let t_moved = crossing_factor(d_out, d_in0);
    tri.vertices[o] = tri.vertices[o].lerp(tri.vertices[i0], t_moved);
    tri.face.tex_coords[o] = tri.face.tex_coords[o].lerp(tri.face.tex_coords[i0], t_moved);

    let indices = tri.face.indices();
    let face = Face {
        // `a` is filled in once the new vertex is stored
        a: indices[o],
        b: indices[o],
        c: indices[i1],
        tex_coords: [new_uv, tri.face.tex_coords[o], tri.face.tex_coords[i1]],
        color: tri.face.color,
        clipped_plane: Some(id),
    };

    ClipTriangle {
        face,
        vertices: [new_vertex, tri.vertices[o], tri.vertices[i1]],
        reversed: !tri.reversed,
        next_plane: id.index() + 1,
    }
}

/// Two corners outside: both slide towards the single inside corner
fn trim_two_outside(tri: &mut ClipTriangle, inside: usize, plane: &Plane) {
    let d_in = plane.outside_distance(tri.vertices[inside]);

    for o in [(inside + 2) % 3, (inside + 1) % 3] {
        let d_out = plane.outside_distance(tri.vertices[o]);
        let t = crossing_factor(d_out, d_in);
        tri.vertices[o] = tri.vertices[o].lerp(tri.vertices[inside], t);
        tri.face.tex_coords[o] = tri.face.tex_coords[o].lerp(tri.face.tex_coords[inside], t);
    }
}

/// Counters for one `Clipper::clip` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClipReport {
    pub splits: usize,
    pub dropped: usize,
}

/// Clips triangles against a frustum. Keeps its queue and output list
/// between calls so a frame does not allocate per face.
#[derive(Debug, Default)]
pub struct Clipper {
    queue: Vec<ClipTriangle>,
    output: Vec<ClipTriangle>,
}

impl Clipper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Triangles that survived the last `clip` call
    pub fn output(&self) -> &[ClipTriangle] {
        &self.output
    }

    /// Clip one triangle against all planes. Corners created by splits are
    /// appended to `new_vertices` and referenced by index from the split
    /// faces.
    pub fn clip(
        &mut self,
        triangle: ClipTriangle,
        frustum: &Frustum,
        new_vertices: &mut GrowBuffer<Vec4>,
    ) -> Result<ClipReport, RenderError> {
        let mut report = ClipReport::default();
        self.output.clear();
        self.queue.clear();
        self.queue.push(triangle);

        while let Some(mut tri) = self.queue.pop() {
            let mut dropped = false;

            for &id in &PlaneId::ALL[tri.next_plane.min(PlaneId::COUNT)..] {
                if tri.face.clipped_plane == Some(id) {
                    continue;
                }

                match clip_against_plane(&mut tri, frustum.plane(id), id) {
                    PlaneClip::Inside | PlaneClip::Trimmed => {}
                    PlaneClip::Split(mut child) => {
                        child.face.a = new_vertices.len();
                        new_vertices.push(child.vertices[0])?;
                        self.queue.push(child);
                        report.splits += 1;
                    }
                    PlaneClip::Dropped => {
                        dropped = true;
                        break;
                    }
                }
            }

            if dropped {
                report.dropped += 1;
            } else {
                self.output.push(tri);
            }
        }

        Ok(report)
    }
}
