//! Core types for the csbot library
//!
//! - Graph: the compiled step graph (steps, actions, branches, guards)
//! - State: the session variable store and input buffer
//! - Event: host data that resumes a suspended session
//! - Output: per-resume output and whole-run reports
//! - Value: dynamically-typed scalar variables

pub mod event;
pub mod graph;
pub mod output;
pub mod state;
pub mod value;

pub use event::Event;
pub use graph::{Action, Guard, Step, StepGraph, ValueSpec};
pub use output::{RunReport, StepOutput, Termination, Yield};
pub use state::{Commit, InputBuffer, VariableStore};
pub use value::Value;
