//! Triangle meshes and primitive tessellation.

use std::f32::consts::PI;

use nalgebra::{Point3, Vector3};

/// A triangle mesh ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleMesh {
    /// Flat array of vertex positions: `[x0, y0, z0, x1, y1, z1, ...]`.
    pub vertices: Vec<f32>,
    /// Flat array of triangle indices: `[i0, i1, i2, ...]`.
    pub indices: Vec<u32>,
    /// Flat array of vertex normals. Same length as vertices, or empty.
    pub normals: Vec<f32>,
}

impl TriangleMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            normals: Vec::new(),
        }
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len() / 3
    }

    /// True when there is nothing to draw or collide with.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    /// Vertex positions as points.
    pub fn points(&self) -> Vec<Point3<f32>> {
        self.vertices
            .chunks_exact(3)
            .map(|v| Point3::new(v[0], v[1], v[2]))
            .collect()
    }

    /// Triangle index triples.
    pub fn triangles(&self) -> Vec<[u32; 3]> {
        self.indices
            .chunks_exact(3)
            .map(|i| [i[0], i[1], i[2]])
            .collect()
    }

    /// Scale all vertex positions uniformly.
    pub fn scaled(mut self, factor: f32) -> Self {
        for v in &mut self.vertices {
            *v *= factor;
        }
        self
    }

    fn push_vertex(&mut self, p: Point3<f32>, n: Vector3<f32>) -> u32 {
        let index = self.num_vertices() as u32;
        self.vertices.extend_from_slice(&[p.x, p.y, p.z]);
        self.normals.extend_from_slice(&[n.x, n.y, n.z]);
        index
    }

    /// UV sphere centered at the origin.
    pub fn sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut mesh = Self::new();

        for ring in 0..=rings {
            let theta = PI * ring as f32 / rings as f32;
            let (sin_t, cos_t) = theta.sin_cos();
            for seg in 0..=segments {
                let phi = 2.0 * PI * seg as f32 / segments as f32;
                let (sin_p, cos_p) = phi.sin_cos();
                let n = Vector3::new(sin_t * cos_p, cos_t, sin_t * sin_p);
                mesh.push_vertex(Point3::from(n * radius), n);
            }
        }

        let stride = segments + 1;
        for ring in 0..rings {
            for seg in 0..segments {
                let a = ring * stride + seg;
                let b = a + stride;
                mesh.indices.extend_from_slice(&[a, a + 1, b, b, a + 1, b + 1]);
            }
        }

        mesh
    }

    /// Box centered at the origin with per-face normals.
    pub fn cuboid(half_extents: Vector3<f32>) -> Self {
        let h = half_extents;
        let faces: [(Vector3<f32>, Vector3<f32>, Vector3<f32>); 6] = [
            (Vector3::x(), Vector3::y(), Vector3::z()),
            (-Vector3::x(), Vector3::z(), Vector3::y()),
            (Vector3::y(), Vector3::z(), Vector3::x()),
            (-Vector3::y(), Vector3::x(), Vector3::z()),
            (Vector3::z(), Vector3::x(), Vector3::y()),
            (-Vector3::z(), Vector3::y(), Vector3::x()),
        ];

        let mut mesh = Self::new();
        for (normal, u, v) in faces {
            let center = normal.component_mul(&h);
            let du = u.component_mul(&h);
            let dv = v.component_mul(&h);
            let corners = [
                center - du - dv,
                center + du - dv,
                center + du + dv,
                center - du + dv,
            ];
            let base = mesh.num_vertices() as u32;
            for c in corners {
                mesh.push_vertex(Point3::from(c), normal);
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        mesh
    }

    /// Unit cube, used as the placeholder for geometry that failed to load.
    pub fn unit_cube() -> Self {
        Self::cuboid(Vector3::new(0.5, 0.5, 0.5))
    }

    /// Square patch through the origin facing `normal`, drawn for infinite planes.
    pub fn plane(normal: Vector3<f32>, half_size: f32) -> Self {
        let n = normal.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::y);
        let helper = if n.x.abs() < 0.9 {
            Vector3::x()
        } else {
            Vector3::y()
        };
        let u = n.cross(&helper).normalize() * half_size;
        let v = n.cross(&u);

        let mut mesh = Self::new();
        for c in [-u - v, u - v, u + v, -u + v] {
            mesh.push_vertex(Point3::from(c), n);
        }
        mesh.indices.extend_from_slice(&[0, 2, 1, 0, 3, 2]);
        mesh
    }
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let mesh = TriangleMesh::sphere(2.0, 16, 8);
        assert_eq!(mesh.num_vertices(), 17 * 9);
        assert_eq!(mesh.num_triangles(), 16 * 8 * 2);
        for p in mesh.points() {
            assert_relative_eq!(p.coords.norm(), 2.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn cuboid_bounds_match_half_extents() {
        let mesh = TriangleMesh::cuboid(Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(mesh.num_vertices(), 24);
        assert_eq!(mesh.num_triangles(), 12);
        let max_y = mesh.points().iter().map(|p| p.y).fold(f32::MIN, f32::max);
        let min_z = mesh.points().iter().map(|p| p.z).fold(f32::MAX, f32::min);
        assert_relative_eq!(max_y, 2.0);
        assert_relative_eq!(min_z, -3.0);
    }

    #[test]
    fn plane_is_flat_along_normal() {
        let mesh = TriangleMesh::plane(Vector3::new(0.0, 2.0, 0.0), 50.0);
        for p in mesh.points() {
            assert_relative_eq!(p.y, 0.0, epsilon = 1e-5);
        }
        assert_eq!(&mesh.normals[..3], &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn scaled_mesh() {
        let mesh = TriangleMesh::unit_cube().scaled(4.0);
        let max_x = mesh.points().iter().map(|p| p.x).fold(f32::MIN, f32::max);
        assert_relative_eq!(max_x, 2.0);
    }
}
