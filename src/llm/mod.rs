//! LLM integration.
//!
//! Provides the translator trait and implementations for the supported
//! model providers. Any backend capable of one-shot text completion can sit
//! behind [`LlmClient`].

pub mod gemini;
pub mod mock;
pub mod openai;
pub mod prompt;

pub use gemini::{GeminiClient, GeminiConfig};
pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, OpenAiConfig};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{AskError, Result};

/// Role of a message in a model request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message providing schema context and instructions.
    System,
    /// User message (the question).
    User,
}

impl Role {
    /// Returns the role as a string for API requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
        }
    }
}

/// A single message in a model request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender.
    pub role: Role,
    /// The content of the message.
    pub content: String,
}

impl Message {
    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Trait for LLM clients that can generate completions.
///
/// Implementations must be thread-safe (Send + Sync). A call is made at most
/// once per pipeline run; callers must not retry on failure, since the remote
/// side gives no idempotency guarantee.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generates a completion for the given messages.
    ///
    /// Returns the raw response text, which may contain code fences around
    /// the SQL.
    async fn complete(&self, messages: &[Message]) -> Result<String>;
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// Google Gemini.
    #[default]
    Gemini,
    /// OpenAI (GPT-4o, etc.)
    OpenAi,
    /// Mock client for testing (no API key required).
    Mock,
}

impl LlmProvider {
    /// Returns the provider as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::Mock => "mock",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAi),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Creates an LLM client for the given provider.
///
/// The credential is resolved BEFORE any client is built or any network
/// activity happens: a provided `api_key` takes precedence, then the
/// provider's environment variable (`GOOGLE_API_KEY` or `OPENAI_API_KEY`).
/// A missing credential is a configuration error, surfaced to the user
/// without attempting a call.
///
/// Model selection: explicit `model` first, then `GEMINI_MODEL` /
/// `OPENAI_MODEL`, then the provider default.
pub fn create_client(
    provider: LlmProvider,
    api_key: Option<String>,
    model: Option<String>,
) -> Result<Box<dyn LlmClient>> {
    match provider {
        LlmProvider::Gemini => {
            let key = api_key
                .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
                .ok_or_else(|| {
                    AskError::config(
                        "GOOGLE_API_KEY not found. Please set the key in your environment.",
                    )
                })?;
            let model = model
                .or_else(|| std::env::var("GEMINI_MODEL").ok())
                .unwrap_or_else(|| "gemini-1.5-flash".to_string());
            Ok(Box::new(GeminiClient::new(GeminiConfig::new(key, model))?))
        }
        LlmProvider::OpenAi => {
            let key = api_key
                .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                .ok_or_else(|| {
                    AskError::config(
                        "OPENAI_API_KEY not found. Please set the key in your environment.",
                    )
                })?;
            let model = model
                .or_else(|| std::env::var("OPENAI_MODEL").ok())
                .unwrap_or_else(|| "gpt-4o".to_string());
            Ok(Box::new(OpenAiClient::new(OpenAiConfig::new(key, model))?))
        }
        LlmProvider::Mock => Ok(Box::new(MockLlmClient::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!("gemini".parse::<LlmProvider>().unwrap(), LlmProvider::Gemini);
        assert_eq!("Google".parse::<LlmProvider>().unwrap(), LlmProvider::Gemini);
        assert_eq!("openai".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAi);
        assert_eq!("mock".parse::<LlmProvider>().unwrap(), LlmProvider::Mock);
        assert!("unknown".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn test_provider_default_is_gemini() {
        assert_eq!(LlmProvider::default(), LlmProvider::Gemini);
    }

    #[test]
    fn test_create_mock_client() {
        assert!(create_client(LlmProvider::Mock, None, None).is_ok());
    }

    #[test]
    fn test_create_gemini_without_key_is_config_error() {
        let original = std::env::var("GOOGLE_API_KEY").ok();
        std::env::remove_var("GOOGLE_API_KEY");

        let result = create_client(LlmProvider::Gemini, None, None);
        let err = result.err().unwrap();
        assert_eq!(err.category(), "Configuration Error");
        assert!(err.to_string().contains("GOOGLE_API_KEY"));

        if let Some(key) = original {
            std::env::set_var("GOOGLE_API_KEY", key);
        }
    }

    #[test]
    fn test_create_gemini_with_provided_key() {
        let result = create_client(LlmProvider::Gemini, Some("test-key".to_string()), None);
        assert!(result.is_ok());
    }

    #[test]
    fn test_create_openai_without_key_is_config_error() {
        let original = std::env::var("OPENAI_API_KEY").ok();
        std::env::remove_var("OPENAI_API_KEY");

        let result = create_client(LlmProvider::OpenAi, None, None);
        let err = result.err().unwrap();
        assert_eq!(err.category(), "Configuration Error");

        if let Some(key) = original {
            std::env::set_var("OPENAI_API_KEY", key);
        }
    }

    #[tokio::test]
    async fn test_mock_client_implements_trait() {
        let client: Box<dyn LlmClient> = Box::new(MockLlmClient::new());
        let messages = vec![Message::user("Show me all users")];
        let response = client.complete(&messages).await.unwrap();
        assert!(response.contains("SELECT"));
    }
}
