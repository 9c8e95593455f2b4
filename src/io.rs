use serde::{Deserialize, Serialize};

use crate::Turn;

/// Body POSTed to the chat collaborator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub input: String,      // newest user text
    pub history: Vec<Turn>, // whole transcript, newest turn included
}

/// Collaborator response: `{ reply }` or `{ error, details? }`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ChatReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ChatReply {
    pub fn reply(text: impl Into<String>) -> Self {
        Self { reply: Some(text.into()), ..Self::default() }
    }

    pub fn error(error: impl Into<String>, details: Option<String>) -> Self {
        Self { error: Some(error.into()), details, ..Self::default() }
    }

    /// Assistant text for an error response, `None` when there is no error.
    /// An empty error string counts as no error.
    pub fn error_message(&self) -> Option<String> {
        let error = self.error.as_deref().filter(|e| !e.is_empty())?;
        Some(format!("Error: {} {}", error, self.details.as_deref().unwrap_or("")))
    }
}
