//! Frame rendering and input-to-event mapping.

use std::collections::HashSet;
use std::path::PathBuf;

use nalgebra::{Point2, Point3, Vector3};
use sandbox_physics::Body;
use sandbox_render::{
    Light, Line, ProgramHandle, Quad, RenderDevice, RenderSurfaceError, ResourceError,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::camera::Camera;
use crate::events::ViewEvent;
use crate::input::{InputEvent, InputSource, Key, KeyAction, KeyMap, Movement, PointerButton};

/// Half length of the world axes drawn by the debug overlay.
const AXIS_EXTENT: f32 = 1000.0;

const RED: [f32; 3] = [1.0, 0.0, 0.0];
const GREEN: [f32; 3] = [0.0, 1.0, 0.0];
const BLUE: [f32; 3] = [0.0, 0.0, 1.0];
const YELLOW: [f32; 3] = [1.0, 1.0, 0.0];
const WHITE: [f32; 3] = [1.0, 1.0, 1.0];

/// Window and rendering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Window width in pixels.
    pub width: u32,
    /// Window height in pixels.
    pub height: u32,
    /// Window title.
    pub title: String,
    /// Use the whole screen.
    ///
    /// This and `vsync`/`resizable` are window-creation settings. A windowed
    /// device reads them when it opens its surface; the view itself only
    /// logs them.
    pub fullscreen: bool,
    /// Wait for vertical sync on present.
    pub vsync: bool,
    /// Allow window resizing.
    pub resizable: bool,
    /// Capture the pointer; pointer motion turns the camera only when set.
    pub mouse_grabbed: bool,
    /// Draw the debug axes overlay from the start.
    pub draw_axes: bool,
    /// Vertex shader source file.
    pub vertex_shader: Option<PathBuf>,
    /// Fragment shader source file.
    pub fragment_shader: Option<PathBuf>,
    /// Camera degrees per unit of pointer motion.
    pub mouse_sensitivity: f32,
    /// Camera speed in world units per second.
    pub move_speed: f32,
    /// Scene light.
    pub light: Light,
    /// Key bindings.
    pub keys: KeyMap,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "Sandbox".to_string(),
            fullscreen: false,
            vsync: true,
            resizable: false,
            mouse_grabbed: true,
            draw_axes: false,
            vertex_shader: None,
            fragment_shader: None,
            mouse_sensitivity: 0.1,
            move_speed: 5.0,
            light: Light::default(),
            keys: KeyMap::default(),
        }
    }
}

impl ViewConfig {
    /// Read both shader sources. `None` when either path is unset.
    pub fn shader_sources(&self) -> Result<Option<(String, String)>, ResourceError> {
        let (Some(vertex), Some(fragment)) = (&self.vertex_shader, &self.fragment_shader) else {
            return Ok(None);
        };
        let read = |path: &PathBuf| {
            std::fs::read_to_string(path).map_err(|source| ResourceError::Io {
                name: path.display().to_string(),
                source,
            })
        };
        Ok(Some((read(vertex)?, read(fragment)?)))
    }
}

/// Draws the simulation and turns user input into [`ViewEvent`]s.
///
/// Owns the camera and the shader program. Bodies are only ever borrowed
/// immutably.
pub struct View {
    camera: Camera,
    program: Option<ProgramHandle>,
    keys: KeyMap,
    move_speed: f32,
    mouse_grabbed: bool,
    draw_axes: bool,
    forced_debug: bool,
    conf_enabled: bool,
    held: HashSet<Movement>,
}

impl View {
    /// Configure the light and compile the shader program.
    ///
    /// Missing or broken shaders are not fatal; the fixed-function fallback
    /// program is used instead.
    pub fn new(config: &ViewConfig, camera: Camera, device: &mut dyn RenderDevice) -> Self {
        device.set_light(&config.light);

        let program = match config.shader_sources() {
            Ok(Some((vertex, fragment))) => match device.compile_program(&vertex, &fragment) {
                Ok(program) => program,
                Err(e) => {
                    warn!(error = %e, "using fallback program");
                    ProgramHandle::FALLBACK
                }
            },
            Ok(None) => ProgramHandle::FALLBACK,
            Err(e) => {
                warn!(error = %e, "using fallback program");
                ProgramHandle::FALLBACK
            }
        };

        let (width, height) = device.viewport();
        let mut camera = camera.with_sensitivity(config.mouse_sensitivity);
        camera.set_aspect(width as f32 / height.max(1) as f32);

        info!(
            width,
            height,
            title = %config.title,
            fullscreen = config.fullscreen,
            vsync = config.vsync,
            resizable = config.resizable,
            "view created"
        );

        Self {
            camera,
            program: Some(program),
            keys: config.keys.clone(),
            move_speed: config.move_speed,
            mouse_grabbed: config.mouse_grabbed,
            draw_axes: config.draw_axes,
            forced_debug: false,
            conf_enabled: false,
            held: HashSet::new(),
        }
    }

    /// Draw one frame, present it, then collect this frame's events.
    ///
    /// Events come back in arrival order, except that several state-change
    /// requests in one frame collapse to the last one.
    pub fn render_frame(
        &mut self,
        bodies: &[Body],
        device: &mut dyn RenderDevice,
        input: &mut dyn InputSource,
    ) -> Result<Vec<ViewEvent>, RenderSurfaceError> {
        if !device.surface_valid() {
            error!("render surface lost");
            return Err(RenderSurfaceError("surface invalid before frame".to_string()));
        }

        let (width, height) = device.viewport();
        self.camera.set_aspect(width as f32 / height.max(1) as f32);

        self.camera.apply_projection(device);
        device.clear();
        self.camera.apply_view(device);

        device.use_program(self.program());
        for body in bodies {
            body.render(device);
        }
        device.use_program(ProgramHandle::FALLBACK);

        if self.debug_overlay() {
            device.clear_depth();
            device.draw_lines(&debug_lines(bodies));
        }

        device.clear_depth();
        device.draw_overlay_quads(&crosshair(width, height));

        device.present().inspect_err(|e| error!(error = %e, "present failed"))?;

        Ok(self.handle_input(input.poll()))
    }

    fn handle_input(&mut self, events: Vec<InputEvent>) -> Vec<ViewEvent> {
        let mut out = Vec::new();

        for event in events {
            match event {
                InputEvent::Key { key, pressed } => self.handle_key(key, pressed, &mut out),
                InputEvent::PointerButton {
                    button: PointerButton::Primary,
                    pressed: true,
                } if self.conf_enabled => out.push(ViewEvent::PropertyChangeRequested),
                InputEvent::PointerButton { .. } => {}
                InputEvent::PointerMotion { dx, dy } => {
                    if self.mouse_grabbed {
                        self.camera.on_input_delta(dx, dy);
                    }
                }
            }
        }

        out
    }

    fn handle_key(&mut self, key: Key, pressed: bool, out: &mut Vec<ViewEvent>) {
        let Some(action) = self.keys.action(key) else {
            return;
        };

        match (action, pressed) {
            (KeyAction::Move(direction), true) => {
                self.held.insert(direction);
            }
            (KeyAction::Move(direction), false) => {
                self.held.remove(&direction);
            }
            (_, false) => {}
            (KeyAction::Close, true) => out.push(ViewEvent::CloseRequested),
            (KeyAction::ToggleAxes, true) => {
                self.draw_axes = !self.draw_axes;
                debug!(draw_axes = self.draw_axes, "toggled debug axes");
            }
            (KeyAction::SwitchState(state), true) => {
                out.retain(|e| !matches!(e, ViewEvent::StateChangeRequested(_)));
                out.push(ViewEvent::StateChangeRequested(state));
            }
        }
    }

    /// Move the camera for every held movement key.
    pub fn update(&mut self, dt: f32) {
        if self.held.is_empty() || !dt.is_finite() || dt <= 0.0 {
            return;
        }
        let step = self.move_speed * dt;
        let (mut forward, mut right, mut up) = (0.0, 0.0, 0.0);
        for direction in &self.held {
            match direction {
                Movement::Forward => forward += step,
                Movement::Back => forward -= step,
                Movement::Right => right += step,
                Movement::Left => right -= step,
                Movement::Up => up += step,
                Movement::Down => up -= step,
            }
        }
        self.camera.move_local(forward, right, up);
    }

    /// Allow or suppress `PropertyChangeRequested`.
    pub fn set_conf_enabled(&mut self, enabled: bool) {
        self.conf_enabled = enabled;
    }

    /// Whether property edits are currently reported.
    pub fn conf_enabled(&self) -> bool {
        self.conf_enabled
    }

    /// Force the debug overlay on regardless of the axes toggle.
    pub fn set_forced_debug(&mut self, forced: bool) {
        self.forced_debug = forced;
    }

    /// State of the user's axes toggle.
    pub fn debug_axes(&self) -> bool {
        self.draw_axes
    }

    /// Whether the next frame draws the debug overlay.
    pub fn debug_overlay(&self) -> bool {
        self.draw_axes || self.forced_debug
    }

    /// Whether pointer motion turns the camera.
    pub fn mouse_grabbed(&self) -> bool {
        self.mouse_grabbed
    }

    /// The camera.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Program used for body draws; the fallback once released.
    pub fn program(&self) -> ProgramHandle {
        self.program.unwrap_or(ProgramHandle::FALLBACK)
    }

    /// Delete the shader program. Safe to call more than once.
    pub fn release(&mut self, device: &mut dyn RenderDevice) {
        if let Some(program) = self.program.take() {
            device.delete_program(program);
            debug!("view released");
        }
    }
}

/// World axes plus, for each body, its projections onto the axes and its
/// velocity vector.
fn debug_lines(bodies: &[Body]) -> Vec<Line> {
    let mut lines = vec![
        Line::new(
            Point3::new(-AXIS_EXTENT, 0.0, 0.0),
            Point3::new(AXIS_EXTENT, 0.0, 0.0),
            RED,
        ),
        Line::new(
            Point3::new(0.0, -AXIS_EXTENT, 0.0),
            Point3::new(0.0, AXIS_EXTENT, 0.0),
            GREEN,
        ),
        Line::new(
            Point3::new(0.0, 0.0, -AXIS_EXTENT),
            Point3::new(0.0, 0.0, AXIS_EXTENT),
            BLUE,
        ),
    ];

    for body in bodies.iter().filter(|b| b.is_live()) {
        let c = body.position();
        let v: Vector3<f32> = body.linear_velocity();
        lines.extend([
            Line::new(c, Point3::new(c.x, 0.0, 0.0), RED),
            Line::new(c, Point3::new(0.0, c.y, 0.0), GREEN),
            Line::new(c, Point3::new(0.0, 0.0, c.z), BLUE),
            Line::new(c, c + v, YELLOW),
        ]);
    }

    lines
}

/// Two white bars crossing at the viewport center.
fn crosshair(width: u32, height: u32) -> [Quad; 2] {
    let cx = (width / 2) as f32;
    let cy = (height / 2) as f32;
    [
        Quad {
            min: Point2::new(cx - 2.0, cy - 10.0),
            max: Point2::new(cx + 2.0, cy + 10.0),
            color: WHITE,
        },
        Quad {
            min: Point2::new(cx - 10.0, cy - 2.0),
            max: Point2::new(cx + 10.0, cy + 2.0),
            color: WHITE,
        },
    ]
}
