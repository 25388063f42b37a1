#![warn(missing_docs)]

//! Camera, input and frame rendering for the rigid-body sandbox.
//!
//! [`View::render_frame`] draws the current bodies through a
//! [`sandbox_render::RenderDevice`], presents, then drains an
//! [`InputSource`] and maps what it finds to [`ViewEvent`]s for the
//! controller. The view never owns or mutates bodies.

mod camera;
mod error;
mod events;
mod input;
mod view;

pub use camera::{Camera, MAX_PITCH};
pub use error::InputError;
pub use events::{RunState, ViewEvent};
pub use input::{
    Binding, InputEvent, InputSource, Key, KeyAction, KeyMap, Movement, PointerButton,
    ScriptedInput,
};
pub use view::{View, ViewConfig};
