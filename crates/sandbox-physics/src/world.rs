//! Physics world management using Rapier3d.

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use rapier3d::dynamics::{
    CCDSolver, ImpulseJointSet, IntegrationParameters, IslandManager, MultibodyJointSet,
    RigidBodyBuilder, RigidBodyHandle, RigidBodySet,
};
use rapier3d::geometry::{BroadPhaseMultiSap, ColliderBuilder, ColliderSet, NarrowPhase};
use rapier3d::pipeline::{PhysicsPipeline, QueryPipeline};
use sandbox_render::{MeshHandle, RenderDevice, Surface, TextureHandle, TriangleMesh};
use sandbox_scene::{BodyDescriptor, Material};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::body::Body;
use crate::colliders::collider_shape;
use crate::error::PhysicsError;

/// Fraction of a step forgiven when counting due substeps, so that
/// `k * fixed_dt` worth of time always yields exactly `k` substeps.
const SUBSTEP_EPSILON: f32 = 1e-3;

/// Fixed-timestep policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    /// Duration of one physics substep in seconds.
    pub fixed_dt: f32,
    /// Maximum substeps per `step` call; excess time is dropped.
    pub max_substeps: u32,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_substeps: 5,
        }
    }
}

/// Physics simulation world.
///
/// Wraps the Rapier pipeline and owns the body list in insertion order.
pub struct PhysicsWorld {
    // Rapier components
    pipeline: PhysicsPipeline,
    gravity: Vector3<f32>,
    integration_params: IntegrationParameters,
    islands: IslandManager,
    broad_phase: BroadPhaseMultiSap,
    narrow_phase: NarrowPhase,
    rigid_bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,

    config: StepConfig,
    accumulator: f32,
    elapsed: f64,
    substeps: u64,
    bodies: Vec<Body>,
}

impl PhysicsWorld {
    /// Create an empty world.
    pub fn new(gravity: Vector3<f32>, config: StepConfig) -> Self {
        let mut integration_params = IntegrationParameters::default();
        integration_params.dt = config.fixed_dt;

        Self {
            pipeline: PhysicsPipeline::new(),
            gravity,
            integration_params,
            islands: IslandManager::new(),
            broad_phase: BroadPhaseMultiSap::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            config,
            accumulator: 0.0,
            elapsed: 0.0,
            substeps: 0,
            bodies: Vec::new(),
        }
    }

    /// Create a rigid body and its collider, upload its geometry, and append
    /// it to the body list.
    ///
    /// Mass and shape are checked before anything is allocated, so a failing
    /// descriptor leaves both the world and the device untouched.
    pub fn add_body(
        &mut self,
        desc: &BodyDescriptor,
        material: &Material,
        texture: TextureHandle,
        geometry: &TriangleMesh,
        device: &mut dyn RenderDevice,
    ) -> Result<&Body, PhysicsError> {
        let shape = collider_shape(desc, geometry)?;
        let is_static = desc.mass == 0.0;

        let t = &desc.transform;
        let position = Isometry3::from_parts(
            Translation3::new(t.position.x, t.position.y, t.position.z),
            UnitQuaternion::from_euler_angles(
                t.rotation.x.to_radians(),
                t.rotation.y.to_radians(),
                t.rotation.z.to_radians(),
            ),
        );

        let builder = if is_static {
            RigidBodyBuilder::fixed()
        } else {
            RigidBodyBuilder::dynamic().ccd_enabled(true)
        };
        let handle = self.rigid_bodies.insert(builder.position(position).build());

        let mut collider = ColliderBuilder::new(shape)
            .friction(material.friction)
            .restitution(material.restitution);
        if !is_static {
            collider = collider.mass(desc.mass);
        }
        self.colliders
            .insert_with_parent(collider.build(), handle, &mut self.rigid_bodies);

        let mesh = device.upload_mesh(geometry);
        let surface = Surface {
            color: material.color,
            texture,
        };
        let mut body = Body::new(desc.name.clone(), handle, mesh, surface, is_static);
        body.sync(&self.rigid_bodies[handle]);

        debug!(
            body = %desc.name,
            shape = desc.shape.kind(),
            mass = desc.mass,
            "created body"
        );

        let index = self.bodies.len();
        self.bodies.push(body);
        Ok(&self.bodies[index])
    }

    /// Advance the simulation by `dt` seconds of wall time.
    ///
    /// Time is consumed in fixed substeps. When more than `max_substeps` are
    /// due, only `max_substeps` run and the remaining time is discarded.
    /// Returns the number of substeps taken.
    pub fn step(&mut self, dt: f32) -> u32 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0;
        }

        let fixed_dt = self.config.fixed_dt;
        self.accumulator += dt;
        let due = (self.accumulator / fixed_dt + SUBSTEP_EPSILON).floor() as u32;

        let count = if due > self.config.max_substeps {
            debug!(
                due,
                max = self.config.max_substeps,
                dropped = self.accumulator - self.config.max_substeps as f32 * fixed_dt,
                "clamping physics substeps"
            );
            self.accumulator = 0.0;
            self.config.max_substeps
        } else {
            self.accumulator = (self.accumulator - due as f32 * fixed_dt).max(0.0);
            due
        };

        for _ in 0..count {
            self.step_once();
        }
        if count > 0 {
            self.sync_bodies();
        }
        count
    }

    fn step_once(&mut self) {
        self.integration_params.dt = self.config.fixed_dt;

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );

        self.substeps += 1;
        self.elapsed += self.config.fixed_dt as f64;
    }

    fn sync_bodies(&mut self) {
        for body in &mut self.bodies {
            if let Some(rb) = body.rigid_body().and_then(|h| self.rigid_bodies.get(h)) {
                body.sync(rb);
            }
        }
    }

    /// Live bodies in insertion order.
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Find a body by scene name.
    pub fn body(&self, name: &str) -> Option<&Body> {
        self.bodies.iter().find(|b| b.name() == name)
    }

    /// Index of a body by scene name.
    pub fn body_index(&self, name: &str) -> Option<usize> {
        self.bodies.iter().position(|b| b.name() == name)
    }

    /// Release one body's physics and render handles.
    ///
    /// Safe to call repeatedly; the body stays in the list but is inert.
    pub fn release_body(&mut self, index: usize, device: &mut dyn RenderDevice) {
        let Some(body) = self.bodies.get_mut(index) else {
            return;
        };
        let (rigid_body, mesh) = body.take_handles();
        release_handles(
            rigid_body,
            mesh,
            &mut self.rigid_bodies,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            device,
        );
    }

    /// Release every body and empty the body list.
    pub fn clear(&mut self, device: &mut dyn RenderDevice) {
        for index in 0..self.bodies.len() {
            self.release_body(index, device);
        }
        let released = self.bodies.len();
        self.bodies.clear();
        if released > 0 {
            debug!(released, "released bodies");
        }
    }

    /// Number of rigid bodies in the dynamics world.
    pub fn body_count(&self) -> usize {
        self.rigid_bodies.len()
    }

    /// Number of colliders in the dynamics world.
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    /// Simulated time in seconds.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Substeps taken since creation.
    pub fn substeps(&self) -> u64 {
        self.substeps
    }

    /// Stepping policy.
    pub fn config(&self) -> &StepConfig {
        &self.config
    }

    /// Current gravity.
    pub fn gravity(&self) -> Vector3<f32> {
        self.gravity
    }

    /// Set gravity vector.
    pub fn set_gravity(&mut self, gravity: Vector3<f32>) {
        self.gravity = gravity;
        for (_, rb) in self.rigid_bodies.iter_mut() {
            rb.wake_up(true);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn release_handles(
    rigid_body: Option<RigidBodyHandle>,
    mesh: Option<MeshHandle>,
    rigid_bodies: &mut RigidBodySet,
    islands: &mut IslandManager,
    colliders: &mut ColliderSet,
    impulse_joints: &mut ImpulseJointSet,
    multibody_joints: &mut MultibodyJointSet,
    device: &mut dyn RenderDevice,
) {
    if let Some(handle) = rigid_body {
        rigid_bodies.remove(
            handle,
            islands,
            colliders,
            impulse_joints,
            multibody_joints,
            true,
        );
    }
    if let Some(mesh) = mesh {
        device.release_mesh(mesh);
    }
}
