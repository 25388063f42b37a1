//! Error types for render collaborators.

use thiserror::Error;

/// Asset or GPU resource failure.
///
/// Never fatal: callers substitute a placeholder and log.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// Asset file could not be read.
    #[error("failed to read asset {name}: {source}")]
    Io {
        /// Asset name.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Image data could not be decoded.
    #[error("failed to decode texture {name}: {reason}")]
    Decode {
        /// Asset name.
        name: String,
        /// Decoder message.
        reason: String,
    },

    /// Model file is malformed.
    #[error("invalid model {name} at line {line}: {reason}")]
    Model {
        /// Asset name.
        name: String,
        /// 1-based line number.
        line: usize,
        /// What was wrong.
        reason: String,
    },

    /// Shader program failed to compile or link.
    #[error("shader program failed to compile: {0}")]
    Shader(String),
}

/// The render surface (window, context) is gone. Fatal; not retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("render surface lost: {0}")]
pub struct RenderSurfaceError(pub String);
