//! Runtime rigid bodies.

use nalgebra::{Isometry3, Point3, Vector3};
use rapier3d::dynamics::{RigidBody, RigidBodyHandle};
use sandbox_render::{MeshHandle, RenderDevice, Surface, TextureHandle};

/// A simulated body paired with its render geometry.
///
/// Owns one rigid-body handle in the [`crate::PhysicsWorld`] and one mesh
/// handle in the render device's table. The pose and velocity read here are
/// refreshed by the world after every step, so they always match the last
/// committed physics state.
#[derive(Debug)]
pub struct Body {
    name: String,
    rigid_body: Option<RigidBodyHandle>,
    mesh: Option<MeshHandle>,
    surface: Surface,
    is_static: bool,
    transform: Isometry3<f32>,
    linear_velocity: Vector3<f32>,
}

impl Body {
    pub(crate) fn new(
        name: String,
        rigid_body: RigidBodyHandle,
        mesh: MeshHandle,
        surface: Surface,
        is_static: bool,
    ) -> Self {
        Self {
            name,
            rigid_body: Some(rigid_body),
            mesh: Some(mesh),
            surface,
            is_static,
            transform: Isometry3::identity(),
            linear_velocity: Vector3::zeros(),
        }
    }

    /// Body name from the scene.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// World transform.
    pub fn transform(&self) -> &Isometry3<f32> {
        &self.transform
    }

    /// World position of the body origin.
    pub fn position(&self) -> Point3<f32> {
        Point3::from(self.transform.translation.vector)
    }

    /// Linear velocity in world space.
    pub fn linear_velocity(&self) -> Vector3<f32> {
        self.linear_velocity
    }

    /// Surface color and texture.
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Texture drawn on the body, or the placeholder.
    pub fn texture(&self) -> TextureHandle {
        self.surface.texture
    }

    /// Mesh handle, `None` once released.
    pub fn mesh(&self) -> Option<MeshHandle> {
        self.mesh
    }

    /// Rigid-body handle, `None` once released.
    pub fn rigid_body(&self) -> Option<RigidBodyHandle> {
        self.rigid_body
    }

    /// True for fixed (mass 0) bodies.
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// True while the body still holds its physics or render handle.
    pub fn is_live(&self) -> bool {
        self.rigid_body.is_some() || self.mesh.is_some()
    }

    /// Draw the body at its current transform.
    pub fn render(&self, device: &mut dyn RenderDevice) {
        if let Some(mesh) = self.mesh {
            device.draw_mesh(mesh, &self.transform, &self.surface);
        }
    }

    pub(crate) fn sync(&mut self, rigid_body: &RigidBody) {
        self.transform = *rigid_body.position();
        self.linear_velocity = *rigid_body.linvel();
    }

    /// Hand out the handles for release. Subsequent calls return `None`.
    pub(crate) fn take_handles(&mut self) -> (Option<RigidBodyHandle>, Option<MeshHandle>) {
        (self.rigid_body.take(), self.mesh.take())
    }
}
