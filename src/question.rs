//! The user's question.

use crate::error::{AskError, Result};

/// A non-empty natural-language question.
///
/// Validated once at construction; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question(String);

impl Question {
    /// Creates a question, rejecting empty or whitespace-only input.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(AskError::EmptyQuestion);
        }
        Ok(Self(text))
    }

    /// Returns the question text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
