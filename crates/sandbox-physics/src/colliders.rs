//! Collision shape and render geometry generation from body descriptors.
//!
//! The shape sum type is dispatched once here, at body construction, into a
//! parry shape. Nothing downstream inspects the variant again.

use nalgebra::{Point3, Unit, Vector3};
use parry3d::shape::{ConvexPolyhedron, SharedShape, TriMesh};
use sandbox_render::{ModelLoader, TriangleMesh};
use sandbox_scene::{BodyDescriptor, Shape};

use crate::error::PhysicsError;

/// Half size of the patch drawn for an infinite plane.
pub const PLANE_DRAW_HALF_SIZE: f32 = 50.0;

/// Strategy for generating collision shapes from model meshes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColliderStrategy {
    /// Convex hull (fast, approximate). Required for dynamic bodies.
    #[default]
    ConvexHull,
    /// Triangle mesh (accurate, static bodies only).
    TriMesh,
    /// Axis-aligned bounding box (fastest, rough).
    Aabb,
}

fn invalid(desc: &BodyDescriptor, reason: impl Into<String>) -> PhysicsError {
    PhysicsError::InvalidBody {
        name: desc.name.clone(),
        reason: reason.into(),
    }
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

/// Check mass and shape parameters without building anything.
pub fn validate_descriptor(desc: &BodyDescriptor) -> Result<(), PhysicsError> {
    if !desc.mass.is_finite() || desc.mass < 0.0 {
        return Err(invalid(desc, format!("mass must be >= 0, got {}", desc.mass)));
    }

    match &desc.shape {
        Shape::Sphere { radius } => {
            if !positive(*radius) {
                return Err(invalid(desc, format!("sphere radius must be > 0, got {radius}")));
            }
        }
        Shape::Box { half_extents: h } => {
            if !(positive(h.x) && positive(h.y) && positive(h.z)) {
                return Err(invalid(desc, "box half extents must all be > 0"));
            }
        }
        Shape::Plane { normal } => {
            let n = Vector3::new(normal.x, normal.y, normal.z);
            if !n.iter().all(|c| c.is_finite()) || n.norm() <= f32::EPSILON {
                return Err(invalid(desc, "plane normal must be non-zero"));
            }
            if desc.mass != 0.0 {
                return Err(invalid(desc, "planes are static and must have mass 0"));
            }
        }
        Shape::ObjModel { scale, .. } => {
            if !positive(*scale) {
                return Err(invalid(desc, format!("model scale must be > 0, got {scale}")));
            }
        }
    }

    Ok(())
}

/// Geometry drawn for a body, in body-local coordinates.
pub fn render_geometry<M: ModelLoader + ?Sized>(shape: &Shape, models: &mut M) -> TriangleMesh {
    match shape {
        Shape::Sphere { radius } => TriangleMesh::sphere(*radius, 32, 16),
        Shape::Box { half_extents: h } => TriangleMesh::cuboid(Vector3::new(h.x, h.y, h.z)),
        Shape::Plane { normal } => TriangleMesh::plane(
            Vector3::new(normal.x, normal.y, normal.z),
            PLANE_DRAW_HALF_SIZE,
        ),
        Shape::ObjModel { model, scale } => models.load_model(model).scaled(*scale),
    }
}

/// Build the collision shape for a validated descriptor.
///
/// `geometry` is the body's render geometry; it is only read for model shapes.
pub fn collider_shape(
    desc: &BodyDescriptor,
    geometry: &TriangleMesh,
) -> Result<SharedShape, PhysicsError> {
    validate_descriptor(desc)?;

    let shape = match &desc.shape {
        Shape::Sphere { radius } => SharedShape::ball(*radius),
        Shape::Box { half_extents: h } => SharedShape::cuboid(h.x, h.y, h.z),
        Shape::Plane { normal } => {
            let n = Unit::new_normalize(Vector3::new(normal.x, normal.y, normal.z));
            SharedShape::halfspace(n)
        }
        Shape::ObjModel { .. } => {
            let strategy = if desc.mass == 0.0 {
                ColliderStrategy::TriMesh
            } else {
                ColliderStrategy::ConvexHull
            };
            mesh_to_collider(geometry, strategy, &desc.name)?
        }
    };

    Ok(shape)
}

/// Generate a collision shape from a triangle mesh.
pub fn mesh_to_collider(
    mesh: &TriangleMesh,
    strategy: ColliderStrategy,
    name: &str,
) -> Result<SharedShape, PhysicsError> {
    if mesh.is_empty() {
        return Err(PhysicsError::CollisionShape {
            name: name.to_string(),
            reason: "Empty mesh".to_string(),
        });
    }

    match strategy {
        ColliderStrategy::ConvexHull => create_convex_hull(mesh, name),
        ColliderStrategy::TriMesh => create_trimesh(mesh, name),
        ColliderStrategy::Aabb => Ok(create_aabb(mesh)),
    }
}

fn create_convex_hull(mesh: &TriangleMesh, name: &str) -> Result<SharedShape, PhysicsError> {
    let points: Vec<Point3<f32>> = mesh.points();

    if points.len() < 4 {
        return Err(PhysicsError::CollisionShape {
            name: name.to_string(),
            reason: "Need at least 4 points for convex hull".to_string(),
        });
    }

    match ConvexPolyhedron::from_convex_hull(&points) {
        Some(hull) => Ok(SharedShape::new(hull)),
        // Degenerate (e.g. flat) geometry has no hull volume.
        None => Ok(create_aabb(mesh)),
    }
}

fn create_trimesh(mesh: &TriangleMesh, name: &str) -> Result<SharedShape, PhysicsError> {
    TriMesh::new(mesh.points(), mesh.triangles())
        .map(SharedShape::new)
        .map_err(|e| PhysicsError::CollisionShape {
            name: name.to_string(),
            reason: format!("Failed to create trimesh: {:?}", e),
        })
}

fn create_aabb(mesh: &TriangleMesh) -> SharedShape {
    let mut min = Vector3::repeat(f32::INFINITY);
    let mut max = Vector3::repeat(f32::NEG_INFINITY);

    for p in mesh.points() {
        min = min.inf(&p.coords);
        max = max.sup(&p.coords);
    }

    // Keep a sliver of thickness so flat meshes still collide.
    let half_extents = ((max - min) / 2.0).map(|e| e.max(1e-3));
    SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandbox_render::MemoryAssets;
    use sandbox_scene::{Transform, Vec3};

    fn descriptor(shape: Shape, mass: f32) -> BodyDescriptor {
        BodyDescriptor {
            name: "probe".to_string(),
            shape,
            transform: Transform::default(),
            mass,
            material: "default".to_string(),
            texture: None,
        }
    }

    #[test]
    fn negative_mass_is_rejected() {
        let desc = descriptor(Shape::Sphere { radius: 1.0 }, -1.0);
        let err = validate_descriptor(&desc).unwrap_err();
        assert!(err.to_string().contains("probe"));
    }

    #[test]
    fn zero_radius_is_rejected() {
        let desc = descriptor(Shape::Sphere { radius: 0.0 }, 1.0);
        assert!(matches!(
            validate_descriptor(&desc),
            Err(PhysicsError::InvalidBody { .. })
        ));
    }

    #[test]
    fn plane_with_mass_is_rejected() {
        let desc = descriptor(
            Shape::Plane {
                normal: Vec3::new(0.0, 1.0, 0.0),
            },
            5.0,
        );
        assert!(validate_descriptor(&desc).is_err());
    }

    #[test]
    fn primitive_shapes() {
        let mesh = TriangleMesh::new();
        let ball = collider_shape(&descriptor(Shape::Sphere { radius: 0.5 }, 1.0), &mesh).unwrap();
        assert!(ball.as_ball().is_some());

        let cuboid = collider_shape(
            &descriptor(
                Shape::Box {
                    half_extents: Vec3::new(1.0, 2.0, 3.0),
                },
                1.0,
            ),
            &mesh,
        )
        .unwrap();
        assert!(cuboid.as_cuboid().is_some());

        let plane = collider_shape(
            &descriptor(
                Shape::Plane {
                    normal: Vec3::new(0.0, 3.0, 0.0),
                },
                0.0,
            ),
            &mesh,
        )
        .unwrap();
        assert!(plane.as_halfspace().is_some());
    }

    #[test]
    fn model_strategy_follows_mass() {
        let mut assets = MemoryAssets::new();
        let shape = Shape::ObjModel {
            model: "missing".to_string(),
            scale: 2.0,
        };
        let geometry = render_geometry(&shape, &mut assets);
        assert_eq!(geometry.num_triangles(), 12);

        let dynamic = collider_shape(&descriptor(shape.clone(), 1.0), &geometry).unwrap();
        assert!(dynamic.as_convex_polyhedron().is_some());

        let fixed = collider_shape(&descriptor(shape, 0.0), &geometry).unwrap();
        assert!(fixed.as_trimesh().is_some());
    }
}
