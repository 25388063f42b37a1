//! Error types for physics simulation.

use sandbox_scene::ConfigurationError;
use thiserror::Error;

/// Errors raised while building the physics world.
#[derive(Error, Debug)]
pub enum PhysicsError {
    /// A body descriptor has an invalid mass or shape.
    #[error("invalid body '{name}': {reason}")]
    InvalidBody {
        /// Body name.
        name: String,
        /// What was wrong.
        reason: String,
    },

    /// Failed to create collision shape.
    #[error("failed to create collision shape for {name}: {reason}")]
    CollisionShape {
        /// Body name.
        name: String,
        /// Reason for failure.
        reason: String,
    },
}

/// Errors raised by [`crate::Model::reset`].
#[derive(Error, Debug)]
pub enum ModelError {
    /// Scene data is inconsistent.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A body could not be created.
    #[error(transparent)]
    Physics(#[from] PhysicsError),
}
