//! Error types for input scripts.

use std::path::PathBuf;

use thiserror::Error;

/// Failure loading a scripted input session.
#[derive(Error, Debug)]
pub enum InputError {
    /// Script file could not be read.
    #[error("failed to read input script {path}: {source}", path = path.display())]
    Io {
        /// Script path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Script is not a JSON array of frames.
    #[error("invalid input script: {0}")]
    Parse(#[from] serde_json::Error),
}
