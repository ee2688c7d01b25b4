//! Host-supplied collaborators consumed by the execution engine
//!
//! Implementations are created once per process and shared by every running
//! session, so they take `&self` and must be `Send + Sync`.

use async_trait::async_trait;

/// Supplies user utterances for `Listen` actions
#[async_trait]
pub trait InputSource: Send + Sync {
    /// Wait for the next user utterance
    async fn request_input(&self) -> Result<String, CollaboratorError>;
}

/// External natural-language intent classification
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Return one of `candidates`, or the failure sentinel when nothing matches
    async fn classify(
        &self,
        utterance: &str,
        candidates: &[String],
    ) -> Result<String, CollaboratorError>;
}

/// Host-side display of speak output
pub trait OutputSink: Send + Sync {
    fn emit(&self, text: &str);
}

/// Collaborator failures
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum CollaboratorError {
    /// The source has no more data (end of input, disconnected user)
    #[error("collaborator closed")]
    Closed,

    #[error("collaborator failed: {message}")]
    Failed { message: String },
}

impl CollaboratorError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}
