//! External events that resume a suspended session

use serde::{Deserialize, Serialize};

/// Data supplied by the host to a session waiting at a suspension point
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    /// The user's utterance for a pending `Listen`
    Input(String),
    /// The classifier's label for the last utterance
    Intent(String),
}
