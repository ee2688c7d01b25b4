//! Infrastructure layer - adapters for the host-facing collaborator traits
//!
//! File-backed and in-memory variable repositories, a keyword intent
//! classifier and terminal input/output.

pub mod classifier;
pub mod console;
pub mod repositories;

pub use classifier::KeywordClassifier;
pub use console::{LineInput, StdinInput, StdoutSink};
pub use repositories::{InMemoryVariableRepository, JsonFileVariableRepository};
