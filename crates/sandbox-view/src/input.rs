//! Input events, the input collaborator, and key bindings.

use std::collections::VecDeque;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::InputError;
use crate::events::RunState;

/// Keyboard keys the sandbox binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Escape.
    Escape,
    /// Letter O.
    O,
    /// Letter W.
    W,
    /// Letter A.
    A,
    /// Letter S.
    S,
    /// Letter D.
    D,
    /// Space bar.
    Space,
    /// Left shift.
    LeftShift,
    /// Function key 1.
    F1,
    /// Function key 2.
    F2,
    /// Function key 3.
    F3,
}

/// Pointer buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    /// Left button.
    Primary,
    /// Right button.
    Secondary,
    /// Wheel button.
    Middle,
}

/// Raw input from the windowing layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// Key pressed or released.
    Key {
        /// Which key.
        key: Key,
        /// True on press.
        pressed: bool,
    },
    /// Pointer button pressed or released.
    PointerButton {
        /// Which button.
        button: PointerButton,
        /// True on press.
        pressed: bool,
    },
    /// Relative pointer motion in screen units.
    PointerMotion {
        /// Horizontal delta.
        dx: f32,
        /// Vertical delta, positive downwards.
        dy: f32,
    },
}

impl InputEvent {
    /// Key press.
    pub fn press(key: Key) -> Self {
        InputEvent::Key { key, pressed: true }
    }

    /// Key release.
    pub fn release(key: Key) -> Self {
        InputEvent::Key {
            key,
            pressed: false,
        }
    }

    /// Primary button press.
    pub fn click() -> Self {
        InputEvent::PointerButton {
            button: PointerButton::Primary,
            pressed: true,
        }
    }
}

/// Source of input events, drained once per frame.
pub trait InputSource {
    /// Return every event received since the last poll, in arrival order.
    fn poll(&mut self) -> Vec<InputEvent>;
}

/// Replays a fixed list of per-frame event batches.
///
/// The script is a JSON array with one array of events per frame. Once the
/// script runs out, every poll is empty.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: VecDeque<Vec<InputEvent>>,
}

impl ScriptedInput {
    /// Create a script from per-frame batches.
    pub fn new(frames: impl IntoIterator<Item = Vec<InputEvent>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Parse a JSON script.
    pub fn from_json(json: &str) -> Result<Self, InputError> {
        let frames: Vec<Vec<InputEvent>> = serde_json::from_str(json)?;
        Ok(Self::new(frames))
    }

    /// Read and parse a JSON script file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InputError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| InputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Append one frame's events.
    pub fn push_frame(&mut self, events: Vec<InputEvent>) {
        self.frames.push_back(events);
    }

    /// Frames not yet polled.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> Vec<InputEvent> {
        self.frames.pop_front().unwrap_or_default()
    }
}

/// Camera movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Movement {
    /// Along the view direction.
    Forward,
    /// Against the view direction.
    Back,
    /// Strafe left.
    Left,
    /// Strafe right.
    Right,
    /// World up.
    Up,
    /// World down.
    Down,
}

/// What a bound key does when pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyAction {
    /// Raise `CloseRequested`.
    Close,
    /// Flip the debug axes overlay. Handled inside the view.
    ToggleAxes,
    /// Raise `StateChangeRequested`.
    SwitchState(RunState),
    /// Move the camera while held.
    Move(Movement),
}

/// One key binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    /// Bound key.
    pub key: Key,
    /// Action on press.
    pub action: KeyAction,
}

/// Key bindings. Later bindings for the same key override earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyMap {
    bindings: Vec<Binding>,
}

impl KeyMap {
    /// A map with no bindings.
    pub fn empty() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Add or override a binding.
    pub fn bind(&mut self, key: Key, action: KeyAction) -> &mut Self {
        self.bindings.push(Binding { key, action });
        self
    }

    /// Action bound to `key`, if any.
    pub fn action(&self, key: Key) -> Option<KeyAction> {
        self.bindings
            .iter()
            .rev()
            .find(|b| b.key == key)
            .map(|b| b.action)
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        let mut map = Self::empty();
        map.bind(Key::Escape, KeyAction::Close)
            .bind(Key::O, KeyAction::ToggleAxes)
            .bind(Key::F1, KeyAction::SwitchState(RunState::Test))
            .bind(Key::F2, KeyAction::SwitchState(RunState::Conf))
            .bind(Key::F3, KeyAction::SwitchState(RunState::Running))
            .bind(Key::W, KeyAction::Move(Movement::Forward))
            .bind(Key::S, KeyAction::Move(Movement::Back))
            .bind(Key::A, KeyAction::Move(Movement::Left))
            .bind(Key::D, KeyAction::Move(Movement::Right))
            .bind(Key::Space, KeyAction::Move(Movement::Up))
            .bind(Key::LeftShift, KeyAction::Move(Movement::Down));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_replays_frames_in_order() {
        let json = r#"[
            [ { "type": "key", "key": "F2", "pressed": true } ],
            [],
            [ { "type": "pointer_button", "button": "primary", "pressed": true },
              { "type": "pointer_motion", "dx": 3.0, "dy": -1.5 } ]
        ]"#;
        let mut input = ScriptedInput::from_json(json).unwrap();
        assert_eq!(input.remaining(), 3);

        assert_eq!(input.poll(), vec![InputEvent::press(Key::F2)]);
        assert!(input.poll().is_empty());
        assert_eq!(
            input.poll(),
            vec![
                InputEvent::click(),
                InputEvent::PointerMotion { dx: 3.0, dy: -1.5 }
            ]
        );
        assert!(input.poll().is_empty());
    }

    #[test]
    fn malformed_script_is_rejected() {
        let err = ScriptedInput::from_json(r#"[[{ "type": "teleport" }]]"#).unwrap_err();
        assert!(matches!(err, InputError::Parse(_)));
    }

    #[test]
    fn default_bindings() {
        let keys = KeyMap::default();
        assert_eq!(keys.action(Key::Escape), Some(KeyAction::Close));
        assert_eq!(keys.action(Key::F1), Some(KeyAction::SwitchState(RunState::Test)));
        assert_eq!(keys.action(Key::F2), Some(KeyAction::SwitchState(RunState::Conf)));
        assert_eq!(keys.action(Key::O), Some(KeyAction::ToggleAxes));
    }

    #[test]
    fn later_binding_wins() {
        let mut keys = KeyMap::default();
        keys.bind(Key::Escape, KeyAction::ToggleAxes);
        assert_eq!(keys.action(Key::Escape), Some(KeyAction::ToggleAxes));
        assert_eq!(KeyMap::empty().action(Key::Escape), None);
    }

    #[test]
    fn key_map_deserializes_from_json() {
        let json = r#"[
            { "key": "F1", "action": { "switch_state": "conf" } },
            { "key": "Escape", "action": "close" }
        ]"#;
        let keys: KeyMap = serde_json::from_str(json).unwrap();
        assert_eq!(keys.action(Key::F1), Some(KeyAction::SwitchState(RunState::Conf)));
        assert_eq!(keys.action(Key::Escape), Some(KeyAction::Close));
    }
}
