// SPDX-License-Identifier: MIT

//! The run record: an admitted run's identifier plus the outcomes
//! collected so far.

use crate::{RunId, TaskOutcome};
use serde::{Deserialize, Serialize};

/// An admitted run and everything collected for it.
///
/// Serializes with keys `ID`/`ExecutionRuns`, matching the original
/// agent's JSON. `ProfilingRuns` is accepted as an alias on
/// deserialization only, since that was the field's name before
/// scripting mode was introduced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    #[serde(rename = "ID")]
    pub id: RunId,
    #[serde(rename = "ExecutionRuns", alias = "ProfilingRuns", default)]
    pub outcomes: Vec<TaskOutcome>,
}

impl Run {
    /// A freshly admitted run with no collector outcomes yet.
    pub fn new(id: RunId) -> Self {
        Self { id, outcomes: Vec::new() }
    }

    pub fn push(&mut self, outcome: TaskOutcome) {
        self.outcomes.push(outcome);
    }

    /// A run is successful iff it has at least one outcome and every
    /// outcome succeeded.
    pub fn successful(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|o| o.successful)
    }
}
