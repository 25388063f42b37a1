//! Wavefront OBJ parsing (positions and faces only).

use crate::error::ResourceError;
use crate::mesh::TriangleMesh;

/// Parse OBJ text into a triangle mesh.
///
/// Only `v` and `f` statements are read; polygons are fan-triangulated and
/// negative (relative) indices are resolved. Normals are not imported.
pub fn parse_obj(name: &str, text: &str) -> Result<TriangleMesh, ResourceError> {
    let mut mesh = TriangleMesh::new();
    let err = |line: usize, reason: String| ResourceError::Model {
        name: name.to_string(),
        line,
        reason,
    };

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        let mut parts = line.split_whitespace();

        match parts.next() {
            Some("v") => {
                let coords: Vec<f32> = parts
                    .take(3)
                    .map(|p| p.parse::<f32>())
                    .collect::<Result<_, _>>()
                    .map_err(|e| err(line_no, e.to_string()))?;
                if coords.len() != 3 {
                    return Err(err(line_no, "vertex needs 3 coordinates".to_string()));
                }
                if !coords.iter().all(|c| c.is_finite()) {
                    return Err(err(line_no, "vertex coordinates must be finite".to_string()));
                }
                mesh.vertices.extend_from_slice(&coords);
            }
            Some("f") => {
                let count = mesh.num_vertices() as i64;
                let mut face = Vec::new();
                for token in parts {
                    let first = token.split('/').next().unwrap_or("");
                    let raw_index: i64 = first
                        .parse()
                        .map_err(|_| err(line_no, format!("bad face index '{token}'")))?;
                    let resolved = if raw_index < 0 {
                        count + raw_index
                    } else {
                        raw_index - 1
                    };
                    if resolved < 0 || resolved >= count {
                        return Err(err(line_no, format!("face index {raw_index} out of range")));
                    }
                    face.push(resolved as u32);
                }
                if face.len() < 3 {
                    return Err(err(line_no, "face needs at least 3 vertices".to_string()));
                }
                for i in 1..face.len() - 1 {
                    mesh.indices
                        .extend_from_slice(&[face[0], face[i], face[i + 1]]);
                }
            }
            _ => {}
        }
    }

    if mesh.is_empty() {
        return Err(err(0, "no geometry".to_string()));
    }
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quad_fan() {
        let text = "# quad\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1 4//1\n";
        let mesh = parse_obj("quad", text).unwrap();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn negative_indices_are_relative() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let mesh = parse_obj("tri", text).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn out_of_range_index_reports_line() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 9\n";
        match parse_obj("broken", text) {
            Err(ResourceError::Model { line, .. }) => assert_eq!(line, 4),
            other => panic!("expected model error, got {other:?}"),
        }
    }

    #[test]
    fn non_finite_vertex_is_rejected() {
        for text in ["v nan 0 0\n", "v 0 inf 0\n", "v 0 0 -infinity\n"] {
            match parse_obj("bad", text) {
                Err(ResourceError::Model { line, .. }) => assert_eq!(line, 1),
                other => panic!("expected model error, got {other:?}"),
            }
        }
    }

    #[test]
    fn empty_model_is_rejected() {
        assert!(parse_obj("empty", "# nothing\n").is_err());
    }
}
