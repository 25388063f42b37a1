//! The run-state machine that drives model and view once per frame.

use std::time::Instant;

use sandbox_physics::{Model, ModelError};
use sandbox_render::{AssetLoader, RenderDevice, RenderSurfaceError};
use sandbox_scene::SceneDescription;
use sandbox_view::{Camera, InputSource, RunState, View, ViewEvent};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::AppConfig;

/// Fatal controller failures. The controller has already released its
/// resources when one of these is returned from a frame.
#[derive(Error, Debug)]
pub enum ControllerError {
    /// The render surface went away.
    #[error(transparent)]
    RenderSurface(#[from] RenderSurfaceError),

    /// The scene could not be instantiated.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The controller has already released its resources.
    #[error("controller is closed")]
    Closed,
}

/// Applies a property edit while the controller is in CONF.
pub trait ConfigEditor {
    /// Handle one `PropertyChangeRequested` event.
    fn edit_property(&mut self, model: &mut Model);
}

impl<F: FnMut(&mut Model)> ConfigEditor for F {
    fn edit_property(&mut self, model: &mut Model) {
        self(model)
    }
}

/// Editor that reports the current simulation state and changes nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEditor;

impl ConfigEditor for LoggingEditor {
    fn edit_property(&mut self, model: &mut Model) {
        let g = model.gravity();
        info!(
            bodies = model.bodies().len(),
            elapsed = model.elapsed(),
            gravity = ?[g.x, g.y, g.z],
            "property edit requested"
        );
        for body in model.bodies() {
            let p = body.position();
            info!(body = body.name(), position = ?[p.x, p.y, p.z], "body state");
        }
    }
}

/// Source of frame durations.
pub trait Clock {
    /// Seconds since the previous tick.
    fn tick(&mut self) -> f32;
}

/// Clock that always reports the same duration. Used for headless runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub f32);

impl Clock for FixedClock {
    fn tick(&mut self) -> f32 {
        self.0
    }
}

/// Wall-clock time between ticks.
#[derive(Debug, Clone, Copy)]
pub struct WallClock {
    last: Instant,
}

impl WallClock {
    /// Start measuring from now.
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WallClock {
    fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        dt
    }
}

/// Result of one [`Controller::frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOutcome {
    /// The goal was first achieved during this frame's physics step.
    pub goal_achieved: bool,
    /// A close was requested; resources are released.
    pub closed: bool,
    /// Run state after this frame's events were dispatched.
    pub state: RunState,
}

/// Totals for a [`Controller::run`] session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Frames rendered.
    pub frames: u64,
    /// Simulated time at which the goal was achieved.
    pub goal_achieved_at: Option<f64>,
    /// Whether the session ended by a close request.
    pub closed: bool,
}

/// Owns the model, the view and their collaborators, and holds the current
/// [`RunState`].
///
/// Acquisition order is model then view; release runs in reverse. Dropping
/// the controller releases everything that is still live.
pub struct Controller<D, I, E>
where
    D: RenderDevice,
    I: InputSource,
    E: ConfigEditor,
{
    model: Model,
    view: View,
    device: D,
    input: I,
    editor: E,
    state: RunState,
    closed: bool,
}

impl<D, I, E> Controller<D, I, E>
where
    D: RenderDevice,
    I: InputSource,
    E: ConfigEditor,
{
    /// Load `scene` into a fresh model, then create the view.
    pub fn new<A>(
        scene: &SceneDescription,
        config: &AppConfig,
        mut device: D,
        input: I,
        editor: E,
        assets: &mut A,
    ) -> Result<Self, ControllerError>
    where
        A: AssetLoader + ?Sized,
    {
        let mut model = Model::new(config.physics);
        model.reset(scene, &mut device, assets)?;

        let (width, height) = device.viewport();
        let camera = Camera::new(&scene.camera, width as f32 / height.max(1) as f32);
        let view = View::new(&config.view, camera, &mut device);

        info!(state = %RunState::Running, "controller ready");
        Ok(Self {
            model,
            view,
            device,
            input,
            editor,
            state: RunState::Running,
            closed: false,
        })
    }

    /// Run one frame: step physics when RUNNING, render, then dispatch the
    /// frame's events in order.
    ///
    /// A close request lets the rest of the frame's events dispatch, then
    /// releases all resources. A lost surface releases all resources and
    /// returns the error.
    pub fn frame(&mut self, dt: f32) -> Result<FrameOutcome, ControllerError> {
        if self.closed {
            return Ok(self.outcome(false));
        }

        let goal_achieved = self.state == RunState::Running && self.model.step(dt);
        self.view.update(dt);

        let events = match self
            .view
            .render_frame(self.model.bodies(), &mut self.device, &mut self.input)
        {
            Ok(events) => events,
            Err(e) => {
                error!(error = %e, "fatal render error, shutting down");
                self.shutdown();
                return Err(e.into());
            }
        };

        let mut close = false;
        for event in events {
            match event {
                ViewEvent::CloseRequested => close = true,
                ViewEvent::StateChangeRequested(state) => self.transition(state),
                ViewEvent::PropertyChangeRequested => {
                    if self.state == RunState::Conf {
                        self.editor.edit_property(&mut self.model);
                    }
                }
            }
        }

        if close {
            info!("close requested");
            self.shutdown();
        }
        Ok(self.outcome(goal_achieved))
    }

    /// Run frames until closed, a fatal error, or `max_frames` frames.
    ///
    /// Resources are released when this returns.
    pub fn run(
        &mut self,
        clock: &mut dyn Clock,
        max_frames: Option<u64>,
    ) -> Result<RunSummary, ControllerError> {
        let mut summary = RunSummary {
            frames: 0,
            goal_achieved_at: None,
            closed: false,
        };

        while !self.closed && max_frames.map_or(true, |max| summary.frames < max) {
            let outcome = self.frame(clock.tick())?;
            summary.frames += 1;
            if outcome.goal_achieved {
                summary.goal_achieved_at = Some(self.model.elapsed());
            }
            summary.closed = outcome.closed;
        }

        self.shutdown();
        info!(frames = summary.frames, closed = summary.closed, "session ended");
        Ok(summary)
    }

    /// Replace the scene. Returns to RUNNING.
    ///
    /// Fails with [`ControllerError::Closed`] once the controller has shut
    /// down; nothing is allocated in that case.
    pub fn reload<A>(
        &mut self,
        scene: &SceneDescription,
        assets: &mut A,
    ) -> Result<(), ControllerError>
    where
        A: AssetLoader + ?Sized,
    {
        if self.closed {
            return Err(ControllerError::Closed);
        }
        self.model.reset(scene, &mut self.device, assets)?;
        self.transition(RunState::Running);
        Ok(())
    }

    fn transition(&mut self, to: RunState) {
        let from = self.state;
        if from == to {
            debug!(state = %to, "already in requested state");
            return;
        }

        if from == RunState::Conf {
            self.view.set_conf_enabled(false);
        }
        if to == RunState::Conf {
            self.view.set_conf_enabled(true);
        }
        self.view.set_forced_debug(to == RunState::Test);

        self.state = to;
        info!(%from, %to, "run state changed");
    }

    /// Release the view, then the model. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.view.release(&mut self.device);
        self.model.teardown(&mut self.device);
        debug!("controller resources released");
    }

    fn outcome(&self, goal_achieved: bool) -> FrameOutcome {
        FrameOutcome {
            goal_achieved,
            closed: self.closed,
            state: self.state,
        }
    }

    /// Current run state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Whether resources have been released.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The model.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// The view.
    pub fn view(&self) -> &View {
        &self.view
    }

    /// The render device.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// The render device, mutably.
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// The input source, mutably.
    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    /// The configuration editor.
    pub fn editor(&self) -> &E {
        &self.editor
    }
}

impl<D, I, E> Drop for Controller<D, I, E>
where
    D: RenderDevice,
    I: InputSource,
    E: ConfigEditor,
{
    fn drop(&mut self) {
        self.shutdown();
    }
}
