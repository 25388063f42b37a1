//! Run states and the events a view frame reports.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Simulation run state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// Physics steps every frame.
    #[default]
    Running,
    /// Physics paused, debug overlay forced on.
    Test,
    /// Physics paused, property edits enabled.
    Conf,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Running => write!(f, "RUNNING"),
            RunState::Test => write!(f, "TEST"),
            RunState::Conf => write!(f, "CONF"),
        }
    }
}

/// Request raised by user input during a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    /// The user asked to quit.
    CloseRequested,
    /// The user asked to switch run state.
    StateChangeRequested(RunState),
    /// The user asked to edit a property (only while configuration is enabled).
    PropertyChangeRequested,
}
