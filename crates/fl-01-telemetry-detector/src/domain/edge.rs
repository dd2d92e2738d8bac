//! Armed/Fired hysteresis for edge-triggered rules
//!
//! A rule fires on the tick its trigger condition is first observed and then
//! stays silent until the re-arm condition is observed. A tick where neither
//! holds, or where the rule was skipped for missing data, leaves the state
//! unchanged.

use serde::{Deserialize, Serialize};

/// Per (vessel, rule) edge state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EdgeState {
    /// Condition not yet observed; the next trigger fires
    #[default]
    Armed,
    /// Fired; waiting for the re-arm condition
    Fired,
}

impl EdgeState {
    /// Advance the state. Returns `true` exactly when the rule fires.
    pub fn step(&mut self, trigger: bool, rearm: bool) -> bool {
        match self {
            Self::Armed if trigger => {
                *self = Self::Fired;
                true
            }
            Self::Fired if rearm => {
                *self = Self::Armed;
                false
            }
            _ => false,
        }
    }

    /// Step a rule whose re-arm condition is the negation of its trigger.
    pub fn step_level(&mut self, condition: bool) -> bool {
        self.step(condition, !condition)
    }

    pub fn is_armed(&self) -> bool {
        matches!(self, Self::Armed)
    }
}
