//! Goal predicates over body state.

use nalgebra::Point3;
use sandbox_scene::{Axis, Goal, GoalCondition};

use crate::body::Body;

/// A scene goal bound to a body index.
///
/// Stateless apart from the thresholds it was built with; edge detection is
/// the model's job.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalPredicate {
    body: usize,
    condition: GoalCondition,
}

impl GoalPredicate {
    /// Bind a scene goal to the body at `body` in the world's body list.
    pub fn new(goal: &Goal, body: usize) -> Self {
        Self {
            body,
            condition: goal.condition.clone(),
        }
    }

    /// Index of the tracked body.
    pub fn body(&self) -> usize {
        self.body
    }

    /// Evaluate against the current body states.
    ///
    /// A released or missing body never satisfies the goal.
    pub fn is_satisfied(&self, bodies: &[Body]) -> bool {
        let Some(body) = bodies.get(self.body).filter(|b| b.is_live()) else {
            return false;
        };
        let p = body.position();

        match &self.condition {
            GoalCondition::Below { axis, value } => component(&p, *axis) < *value,
            GoalCondition::Above { axis, value } => component(&p, *axis) > *value,
            GoalCondition::Region { min, max } => {
                (min.x..=max.x).contains(&p.x)
                    && (min.y..=max.y).contains(&p.y)
                    && (min.z..=max.z).contains(&p.z)
            }
        }
    }
}

fn component(p: &Point3<f32>, axis: Axis) -> f32 {
    match axis {
        Axis::X => p.x,
        Axis::Y => p.y,
        Axis::Z => p.z,
    }
}
