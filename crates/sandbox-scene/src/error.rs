//! Error types for scene loading.

use thiserror::Error;

/// Errors raised while loading or validating a scene description.
///
/// Every variant is fatal at load time and names the offending entry.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// Scene file could not be read.
    #[error("failed to read scene file {path}: {source}")]
    Io {
        /// Path that failed to load.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Scene document is malformed.
    #[error("failed to parse scene: {0}")]
    Parse(String),

    /// Scene file extension is not recognized.
    #[error("unsupported scene format: {0}")]
    UnsupportedFormat(String),

    /// A body references a material that is not defined.
    #[error("body '{body}' references undefined material '{material}'")]
    UnknownMaterial {
        /// Body name.
        body: String,
        /// Missing material name.
        material: String,
    },

    /// A body or material references a texture that is not defined.
    #[error("{owner} references undefined texture '{texture}'")]
    UnknownTexture {
        /// Description of the referencing entry (e.g. "body 'ball'").
        owner: String,
        /// Missing texture name.
        texture: String,
    },

    /// The goal references a body that is not defined.
    #[error("goal references undefined body '{0}'")]
    UnknownGoalBody(String),

    /// Camera projection parameters cannot form a perspective frustum.
    #[error("invalid camera: {reason}")]
    InvalidCamera {
        /// What is wrong with the camera block.
        reason: String,
    },

    /// Two bodies share the same name.
    #[error("duplicate body name '{0}'")]
    DuplicateBody(String),

    /// Two materials or textures share the same name.
    #[error("duplicate {kind} name '{name}'")]
    DuplicateName {
        /// "material" or "texture".
        kind: &'static str,
        /// Duplicated name.
        name: String,
    },
}

/// Result type for scene operations.
pub type Result<T> = std::result::Result<T, ConfigurationError>;
