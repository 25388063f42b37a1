#![warn(missing_docs)]

//! Rigid-body sandbox: the controller that ties model and view together.
//!
//! A [`Controller`] owns a [`sandbox_physics::Model`], a
//! [`sandbox_view::View`], the render device and the input source, and runs
//! the RUNNING / TEST / CONF state machine one frame at a time:
//!
//! 1. step physics (RUNNING only)
//! 2. render the bodies and collect input as view events
//! 3. dispatch the events in order
//!
//! # Example
//!
//! ```ignore
//! use sandbox::{AppConfig, Controller, FixedClock, LoggingEditor};
//! use sandbox_render::{FsAssets, HeadlessDevice};
//! use sandbox_view::ScriptedInput;
//!
//! let config = AppConfig::load_or_default(None)?;
//! let scene = sandbox_scene::SceneDescription::load("scenes/drop.json")?;
//! let mut assets = FsAssets::new(&config.assets.texture_root, &config.assets.model_root);
//! let device = HeadlessDevice::new(config.view.width, config.view.height);
//!
//! let mut controller = Controller::new(
//!     &scene,
//!     &config,
//!     device,
//!     ScriptedInput::default(),
//!     LoggingEditor,
//!     &mut assets,
//! )?;
//! let summary = controller.run(&mut FixedClock(1.0 / 60.0), Some(600))?;
//! ```

mod config;
mod controller;

pub use config::{AppConfig, AssetConfig, ConfigError};
pub use controller::{
    Clock, ConfigEditor, Controller, ControllerError, FixedClock, FrameOutcome, LoggingEditor,
    RunSummary, WallClock,
};
