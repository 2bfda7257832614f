//! Wavefront OBJ loading
//!
//! Reads `v`, `vt` and `f` records. Face corners may be `v`, `v/t`,
//! `v//n` or `v/t/n`; normals are ignored and polygons with more than
//! three corners are fanned into triangles. Texture `v` is flipped to
//! `1 - v` so image rows run top to bottom.

use std::fs;
use std::path::Path;
use super::Mesh;
use crate::rasterizer::{Color, Face, RenderError, TexCoord, Vec3};

/// Error type for mesh loading
#[derive(Debug)]
pub enum MeshError {
    Io(std::io::Error),
    Parse { line: usize, message: String },
    IndexOutOfRange { line: usize, index: i64 },
    Buffer(RenderError),
}

impl From<std::io::Error> for MeshError {
    fn from(e: std::io::Error) -> Self {
        MeshError::Io(e)
    }
}

impl From<RenderError> for MeshError {
    fn from(e: RenderError) -> Self {
        MeshError::Buffer(e)
    }
}

impl std::fmt::Display for MeshError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeshError::Io(e) => write!(f, "IO error: {}", e),
            MeshError::Parse { line, message } => write!(f, "Parse error on line {}: {}", line, message),
            MeshError::IndexOutOfRange { line, index } => {
                write!(f, "Index {} out of range on line {}", index, line)
            }
            MeshError::Buffer(e) => write!(f, "Buffer error: {}", e),
        }
    }
}

impl std::error::Error for MeshError {}

/// Load a mesh from an OBJ file
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Mesh, MeshError> {
    let contents = fs::read_to_string(path)?;
    parse_obj_str(&contents)
}

fn parse_floats<const N: usize>(fields: &[&str], line: usize, what: &str) -> Result<[f32; N], MeshError> {
    if fields.len() < N {
        return Err(MeshError::Parse {
            line,
            message: format!("{} needs {} values, found {}", what, N, fields.len()),
        });
    }
    let mut out = [0.0; N];
    for (slot, field) in out.iter_mut().zip(fields) {
        *slot = field.parse().map_err(|_| MeshError::Parse {
            line,
            message: format!("bad number '{}' in {}", field, what),
        })?;
    }
    Ok(out)
}

/// 1-based OBJ index to 0-based, checked against `count` entries so far
fn resolve_index(field: &str, count: usize, line: usize) -> Result<usize, MeshError> {
    let index: i64 = field.parse().map_err(|_| MeshError::Parse {
        line,
        message: format!("bad index '{}'", field),
    })?;
    if index < 1 || index as usize > count {
        return Err(MeshError::IndexOutOfRange { line, index });
    }
    Ok(index as usize - 1)
}

/// One face corner: vertex index and texture coordinate
fn parse_corner(
    field: &str,
    vertex_count: usize,
    tex_coords: &[TexCoord],
    line: usize,
) -> Result<(usize, TexCoord), MeshError> {
    let mut parts = field.split('/');
    let vertex = resolve_index(parts.next().unwrap_or(""), vertex_count, line)?;
    let uv = match parts.next() {
        Some(t) if !t.is_empty() => tex_coords[resolve_index(t, tex_coords.len(), line)?],
        _ => TexCoord::default(),
    };
    Ok((vertex, uv))
}

/// Parse OBJ text. Face colors start out black.
pub fn parse_obj_str(s: &str) -> Result<Mesh, MeshError> {
    let mut mesh = Mesh::new();
    let mut tex_coords: Vec<TexCoord> = Vec::new();

    for (i, raw) in s.lines().enumerate() {
        let line = i + 1;
        let mut fields = raw.split_whitespace();
        let Some(tag) = fields.next() else {
            continue;
        };
        let rest: Vec<&str> = fields.collect();

        match tag {
            "v" => {
                let [x, y, z] = parse_floats::<3>(&rest, line, "vertex")?;
                mesh.vertices.push(Vec3::new(x, y, z))?;
            }
            "vt" => {
                let [u, v] = parse_floats::<2>(&rest, line, "texture coordinate")?;
                tex_coords.push(TexCoord::new(u, 1.0 - v));
            }
            "f" => {
                if rest.len() < 3 {
                    return Err(MeshError::Parse {
                        line,
                        message: format!("face needs 3 corners, found {}", rest.len()),
                    });
                }
                let corners = rest
                    .iter()
                    .map(|c| parse_corner(c, mesh.vertices.len(), &tex_coords, line))
                    .collect::<Result<Vec<_>, _>>()?;

                let (a, ta) = corners[0];
                for pair in corners[1..].windows(2) {
                    let (b, tb) = pair[0];
                    let (c, tc) = pair[1];
                    mesh.faces.push(Face::new(a, b, c, [ta, tb, tc], Color::BLACK))?;
                }
            }
            _ => {}
        }
    }

    log::debug!("parsed OBJ: {} vertices, {} faces", mesh.vertices.len(), mesh.faces.len());
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
# two triangles
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1
f 1/1/1 3/3/1 4/4/1
";

    #[test]
    fn test_parse_quad() {
        let mesh = parse_obj_str(QUAD).unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.faces.len(), 2);

        let f = mesh.faces[1];
        assert_eq!(f.indices(), [0, 2, 3]);
        // v flipped
        assert_eq!(f.tex_coords[0], TexCoord::new(0.0, 1.0));
        assert_eq!(f.tex_coords[1], TexCoord::new(1.0, 0.0));
        assert_eq!(f.tex_coords[2], TexCoord::new(0.0, 0.0));
        assert_eq!(f.clipped_plane, None);
    }

    #[test]
    fn test_polygon_is_fanned() {
        let src = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let mesh = parse_obj_str(src).unwrap();
        assert_eq!(mesh.faces.len(), 2);
        assert_eq!(mesh.faces[0].indices(), [0, 1, 2]);
        assert_eq!(mesh.faces[1].indices(), [0, 2, 3]);
    }

    #[test]
    fn test_corner_without_tex_coord() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1//1 2//1 3//1\n";
        let mesh = parse_obj_str(src).unwrap();
        assert_eq!(mesh.faces[0].tex_coords, [TexCoord::default(); 3]);
    }

    #[test]
    fn test_index_out_of_range() {
        let src = "v 0 0 0\nv 1 0 0\nf 1 2 3\n";
        match parse_obj_str(src) {
            Err(MeshError::IndexOutOfRange { line, index }) => {
                assert_eq!(line, 3);
                assert_eq!(index, 3);
            }
            other => panic!("unexpected {:?}", other.map(|m| m.faces.len())),
        }
    }

    #[test]
    fn test_bad_number_reports_line() {
        let src = "v 0 0 0\nv 1 zero 0\n";
        match parse_obj_str(src) {
            Err(MeshError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected {:?}", other.map(|m| m.vertices.len())),
        }
    }

    #[test]
    fn test_bundled_cube_asset() {
        let src = include_str!("../../assets/cube.obj");
        let mesh = parse_obj_str(src).unwrap();
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.faces.len(), 12);
    }
}
