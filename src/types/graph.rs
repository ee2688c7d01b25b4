//! Compiled step graph: steps, actions, branch maps and guards

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The compiled dialogue graph, keyed by step name.
///
/// Built once by the compiler and never mutated afterwards. Share it between
/// sessions behind an `Arc`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StepGraph {
    pub steps: BTreeMap<String, Step>,
}

impl StepGraph {
    pub fn new(steps: BTreeMap<String, Step>) -> Self {
        Self { steps }
    }

    pub fn get(&self, name: &str) -> Option<&Step> {
        self.steps.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.steps.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.steps.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// One node of the dialogue graph
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Step {
    pub name: String,
    /// Actions in execution order
    pub actions: Vec<Action>,
    /// Intent label to target step name
    #[serde(default)]
    pub branch: BTreeMap<String, String>,
    /// Guards in declared order; the first true condition wins
    #[serde(default)]
    pub guards: Vec<Guard>,
}

impl Step {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Branch labels offered to the intent classifier
    pub fn branch_labels(&self) -> Vec<String> {
        self.branch.keys().cloned().collect()
    }

    pub fn has_listen(&self) -> bool {
        self.actions
            .iter()
            .any(|action| matches!(action, Action::Listen { .. }))
    }

    /// Every step name this step can transition to, in declaration order
    pub fn targets(&self) -> Vec<&str> {
        let mut targets: Vec<&str> = Vec::new();
        for action in &self.actions {
            if let Action::Jump { target } = action {
                targets.push(target);
            }
        }
        targets.extend(self.guards.iter().map(|g| g.target.as_str()));
        targets.extend(self.branch.values().map(String::as_str));
        targets
    }
}

/// A typed action performed when a step runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Display a `${name}`-templated string
    Speak { template: String },
    /// Request user input; the duration bounds are advisory
    Listen {
        min_duration: u32,
        max_duration: u32,
    },
    /// Assign a session variable
    Upgrade { field: String, value: ValueSpec },
    /// Unconditional transfer to a well-known step
    Jump { target: String },
    /// Terminate the session
    Exit,
}

/// Right-hand side of an upgrade
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ValueSpec {
    /// Literal text, typed by inference when applied
    Literal(String),
    /// Reference to a session variable or to the listened input
    Reference(String),
}

impl ValueSpec {
    /// Parse the raw value of an upgrade directive
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix('$') {
            Some(name) => ValueSpec::Reference(name.to_string()),
            None => ValueSpec::Literal(raw.to_string()),
        }
    }
}

/// A guarded transition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Guard {
    /// Condition source text, parsed at evaluation time
    pub condition: String,
    pub target: String,
}

impl Guard {
    pub fn new(condition: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            condition: condition.into(),
            target: target.into(),
        }
    }
}
