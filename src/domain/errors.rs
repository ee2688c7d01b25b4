//! Error taxonomy for compilation, condition evaluation and execution

use crate::domain::repositories::RepositoryError;
use crate::domain::services::CollaboratorError;
use thiserror::Error;

/// Compilation failure. Compilation never yields a partial graph.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompileError {
    #[error("syntax error at line {line}: {message} (`{text}`)")]
    Syntax {
        line: usize,
        text: String,
        message: String,
    },
}

impl CompileError {
    pub fn syntax(line: usize, text: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            text: text.into(),
            message: message.into(),
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Self::Syntax { line, .. } => *line,
        }
    }
}

/// A guard condition that could not be evaluated.
///
/// Non-fatal: the engine treats the guard as false and moves on.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("cannot parse condition `{condition}`: {message}")]
    Parse { condition: String, message: String },

    #[error("variable '{name}' is not bound")]
    UnboundVariable { name: String },

    #[error("cannot compare {left} {op} {right}")]
    TypeMismatch {
        op: String,
        left: String,
        right: String,
    },
}

impl EvaluationError {
    pub fn parse(condition: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            condition: condition.into(),
            message: message.into(),
        }
    }

    pub fn unbound(name: impl Into<String>) -> Self {
        Self::UnboundVariable { name: name.into() }
    }
}

/// Errors raised while running a session
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("entry step '{name}' is missing")]
    MissingEntryStep { name: String },

    #[error("session expected {expected} but is {state}")]
    InvalidEvent { expected: String, state: String },

    #[error("input source failed")]
    Input(#[source] CollaboratorError),

    #[error("intent classifier failed")]
    Classifier(#[source] CollaboratorError),

    #[error("variable repository failed")]
    Repository(#[from] RepositoryError),
}

impl RuntimeError {
    pub fn invalid_event(expected: impl Into<String>, state: impl Into<String>) -> Self {
        Self::InvalidEvent {
            expected: expected.into(),
            state: state.into(),
        }
    }
}
