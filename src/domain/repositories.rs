//! Session variable persistence contract

use crate::types::value::Value;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Repository for session variables
///
/// `save` is a merge, not a replace: fields present in `changed` overwrite the
/// stored record and every other stored field is preserved, including fields
/// the script never mentions.
#[async_trait]
pub trait VariableRepository: Send + Sync {
    /// Load the variables of a session; unknown keys yield an empty map
    async fn load(&self, session_key: &str) -> Result<BTreeMap<String, Value>, RepositoryError>;

    /// Merge changed fields into the stored record
    async fn save(
        &self,
        session_key: &str,
        changed: &BTreeMap<String, Value>,
    ) -> Result<(), RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Invalid data format: {message}")]
    InvalidFormat { message: String },
}

impl RepositoryError {
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization {
            message: error.to_string(),
        }
    }
}
