//! Google Gemini LLM client implementation.
//!
//! Implements the LlmClient trait against the Generative Language API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{AskError, Result};
use crate::llm::{LlmClient, Message, Role};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Gemini API base URL; the model name is appended per request.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini client configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Model to use (e.g., "gemini-1.5-flash").
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl GeminiConfig {
    /// Creates a new config with the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Google Gemini LLM client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    client: Client,
}

impl GeminiClient {
    /// Creates a new Gemini client with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AskError::llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Splits our messages into Gemini's system instruction + user contents.
    fn convert_messages(messages: &[Message]) -> (Option<SystemInstruction>, Vec<Content>) {
        let system_text: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();
        let system = if system_text.is_empty() {
            None
        } else {
            Some(SystemInstruction {
                parts: vec![Part {
                    text: system_text.join("\n\n"),
                }],
            })
        };

        let contents = messages
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: m.content.clone(),
                }],
            })
            .collect();

        (system, contents)
    }

    /// Maps an API error response to an AskError.
    fn parse_error(status: reqwest::StatusCode, body: &str) -> AskError {
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return AskError::llm("Authentication failed. Check your GOOGLE_API_KEY.");
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return AskError::llm("Rate limited. Please wait and try again.");
        }

        if let Ok(error_response) = serde_json::from_str::<GeminiErrorResponse>(body) {
            return AskError::llm(format!("Gemini API error: {}", error_response.error.message));
        }

        AskError::llm(format!("Gemini API error ({}): {}", status, body))
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let (system_instruction, contents) = Self::convert_messages(messages);
        let request = GeminiRequest {
            system_instruction,
            contents,
        };

        let url = format!(
            "{}/{}:generateContent",
            GEMINI_API_BASE, self.config.model
        );

        debug!(model = %self.config.model, "Gemini API request");

        // One attempt only; the remote side gives no idempotency guarantee.
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AskError::llm("Gemini API request timed out")
                } else {
                    AskError::llm(format!("Gemini API request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AskError::llm(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Self::parse_error(status, &body));
        }

        let response: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| AskError::llm(format!("Failed to parse response: {}", e)))?;

        response
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|text| !text.is_empty())
            .ok_or_else(|| AskError::llm("No response from Gemini"))
    }
}

// === API request/response types ===

#[derive(Debug, Serialize)]
struct GeminiRequest {
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_messages_splits_system_and_user() {
        let messages = vec![Message::system("schema here"), Message::user("question")];
        let (system, contents) = GeminiClient::convert_messages(&messages);

        assert_eq!(system.unwrap().parts[0].text, "schema here");
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].role, "user");
        assert_eq!(contents[0].parts[0].text, "question");
    }

    #[test]
    fn test_convert_messages_without_system() {
        let messages = vec![Message::user("question")];
        let (system, contents) = GeminiClient::convert_messages(&messages);
        assert!(system.is_none());
        assert_eq!(contents.len(), 1);
    }

    #[test]
    fn test_parse_error_auth() {
        let err = GeminiClient::parse_error(reqwest::StatusCode::FORBIDDEN, "denied");
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn test_parse_error_structured_body() {
        let body = r#"{"error": {"code": 400, "message": "Invalid model", "status": "INVALID_ARGUMENT"}}"#;
        let err = GeminiClient::parse_error(reqwest::StatusCode::BAD_REQUEST, body);
        assert!(err.to_string().contains("Invalid model"));
    }

    #[test]
    fn test_parse_response_body() {
        let body = r#"{"candidates": [{"content": {"role": "model", "parts": [{"text": "```sql\nSELECT 1;\n```"}]}}]}"#;
        let response: GeminiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.candidates[0].content.parts[0].text, "```sql\nSELECT 1;\n```");
    }

    #[test]
    fn test_client_construction() {
        let client = GeminiClient::new(GeminiConfig::new("key", "gemini-1.5-flash").with_timeout(5));
        assert!(client.is_ok());
    }
}
