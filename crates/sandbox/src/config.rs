//! Application configuration loaded from TOML.

use std::path::{Path, PathBuf};

use sandbox_physics::StepConfig;
use sandbox_view::ViewConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Errors loading [`AppConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File exists but could not be read.
    #[error("failed to read config {path}: {source}", path = path.display())]
    Io {
        /// Config path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for this schema.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid config value {field}: {reason}")]
    Invalid {
        /// Dotted field path.
        field: &'static str,
        /// What was wrong.
        reason: String,
    },
}

/// Asset search roots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory holding `<name>.png` textures.
    pub texture_root: PathBuf,
    /// Directory holding `<name>.obj` models.
    pub model_root: PathBuf,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            texture_root: PathBuf::from("assets/textures"),
            model_root: PathBuf::from("assets/models"),
        }
    }
}

/// Top-level configuration. Every field has a default.
///
/// ```toml
/// [view]
/// width = 1280
/// height = 720
/// draw_axes = true
///
/// [physics]
/// fixed_dt = 0.008333
/// max_substeps = 8
///
/// [assets]
/// texture_root = "data/textures"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Window and rendering settings.
    pub view: ViewConfig,
    /// Fixed-timestep policy.
    pub physics: StepConfig,
    /// Asset roots.
    pub assets: AssetConfig,
}

impl AppConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            Some(path) => {
                info!(path = %path.display(), "config not found, using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dt = self.physics.fixed_dt;
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "physics.fixed_dt",
                reason: format!("must be > 0, got {dt}"),
            });
        }
        if self.physics.max_substeps == 0 {
            return Err(ConfigError::Invalid {
                field: "physics.max_substeps",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.view.width == 0 || self.view.height == 0 {
            return Err(ConfigError::Invalid {
                field: "view.width",
                reason: format!(
                    "viewport must be non-empty, got {}x{}",
                    self.view.width, self.view.height
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sandbox_view::{Key, KeyAction, RunState};

    #[test]
    fn empty_document_is_default() {
        assert_eq!(AppConfig::from_toml("").unwrap(), AppConfig::default());
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [view]
            width = 1280
            draw_axes = true

            [physics]
            max_substeps = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.view.width, 1280);
        assert_eq!(config.view.height, 600);
        assert!(config.view.draw_axes);
        assert_eq!(config.physics.max_substeps, 8);
        assert_relative_eq!(config.physics.fixed_dt, 1.0 / 60.0);
        assert_eq!(config.assets, AssetConfig::default());
    }

    #[test]
    fn key_bindings_are_configurable() {
        let config = AppConfig::from_toml(
            r#"
            [[view.keys]]
            key = "F1"
            action = { switch_state = "conf" }

            [[view.keys]]
            key = "Escape"
            action = "close"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.view.keys.action(Key::F1),
            Some(KeyAction::SwitchState(RunState::Conf))
        );
        assert_eq!(config.view.keys.action(Key::F2), None);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = AppConfig::from_toml("[physics]\nfixed_dt = 0.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "physics.fixed_dt", .. }));

        let err = AppConfig::from_toml("[physics]\nmax_substeps = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = AppConfig::from_toml("[view]\nwidth = \"wide\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_means_defaults() {
        let path = Path::new("/nonexistent/sandbox.toml");
        assert_eq!(AppConfig::load_or_default(Some(path)).unwrap(), AppConfig::default());
        assert!(matches!(AppConfig::load(path), Err(ConfigError::Io { .. })));
    }
}
