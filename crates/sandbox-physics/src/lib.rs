#![warn(missing_docs)]

//! Rigid-body simulation for the sandbox using Rapier3d.
//!
//! A [`Model`] turns a [`sandbox_scene::SceneDescription`] into a
//! [`PhysicsWorld`] of [`Body`] values, each pairing a rigid body with a mesh
//! uploaded to the render device. Stepping uses a fixed timestep with a
//! substep cap, and the scene goal is reported once, on the step where it
//! first holds.
//!
//! # Example
//!
//! ```ignore
//! use sandbox_physics::{Model, StepConfig};
//! use sandbox_render::{HeadlessDevice, MemoryAssets};
//!
//! let scene = sandbox_scene::SceneDescription::load("scenes/drop.json")?;
//! let mut device = HeadlessDevice::new(800, 600);
//! let mut model = Model::new(StepConfig::default());
//! model.reset(&scene, &mut device, &mut MemoryAssets::new())?;
//!
//! while !model.step(1.0 / 60.0) {}
//! println!("goal after {:.2}s", model.elapsed());
//! ```

mod body;
pub mod colliders;
mod error;
mod goal;
mod model;
mod world;

pub use body::Body;
pub use error::{ModelError, PhysicsError};
pub use goal::GoalPredicate;
pub use model::Model;
pub use world::{PhysicsWorld, StepConfig};
