//! Output from session execution

use crate::types::state::Commit;
use crate::types::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Why a session stopped
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Termination {
    /// An `Exit` action ran
    Normal,
    /// No guard, branch or fallback applied
    NoTransition,
    /// The resolved target does not exist in the graph
    DanglingTransition { from: String, target: String },
    /// The entry step is missing; the session never started
    MissingEntryStep { name: String },
}

impl Termination {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Termination::DanglingTransition { .. } | Termination::MissingEntryStep { .. }
        )
    }
}

/// What the session needs from the host before it can continue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Yield {
    /// Waiting for a user utterance
    NeedInput {
        step: String,
        min_duration: u32,
        max_duration: u32,
    },
    /// Waiting for the intent label of `utterance`
    NeedIntent {
        step: String,
        utterance: String,
        candidates: Vec<String>,
    },
    /// The session is over
    Finished(Termination),
}

impl Yield {
    pub fn is_finished(&self) -> bool {
        matches!(self, Yield::Finished(_))
    }
}

/// Result of resuming a session up to its next suspension point
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepOutput {
    /// Speak output, already substituted
    pub lines: Vec<String>,
    /// Variable writes committed since the previous resume
    pub commits: Vec<Commit>,
    /// Steps entered since the previous resume
    pub visited: Vec<String>,
    pub yielded: Yield,
}

impl StepOutput {
    pub fn new(yielded: Yield) -> Self {
        Self {
            lines: Vec::new(),
            commits: Vec::new(),
            visited: Vec::new(),
            yielded,
        }
    }
}

/// Engine output for a whole run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunReport {
    /// Step names in visit order
    pub visited: Vec<String>,
    /// Every emitted line in order
    pub lines: Vec<String>,
    /// Final session variables
    pub variables: BTreeMap<String, Value>,
    pub termination: Termination,
}
