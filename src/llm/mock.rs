//! Mock LLM client for testing.
//!
//! Provides deterministic responses based on input patterns, plus a call
//! counter so tests can assert that no translation was attempted.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::Result;
use crate::llm::{LlmClient, Message, Role};

/// Mock LLM client that returns canned responses based on input patterns.
///
/// Used for unit testing without making real API calls.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    /// Custom response mappings (pattern -> response), checked first.
    custom_responses: Vec<(String, String)>,
    /// Number of `complete` calls made, shared across clones.
    calls: Arc<AtomicUsize>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a custom response mapping.
    ///
    /// When the question contains `pattern`, the mock returns `response`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Returns the number of completion calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Generates a mock response based on the input.
    fn mock_response(&self, input: &str) -> String {
        let input_lower = input.to_lowercase();

        for (pattern, response) in &self.custom_responses {
            if input_lower.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        if input_lower.contains("movies") && input_lower.contains("2020") {
            return "```sql\nSELECT COUNT(*) FROM movies WHERE year=2020;\n```".to_string();
        }

        if input_lower.contains("all users") || input_lower.contains("show users") {
            return "```sql\nSELECT * FROM users;\n```".to_string();
        }

        if input_lower.contains("count") && input_lower.contains("orders") {
            return "```sql\nSELECT COUNT(*) FROM orders;\n```".to_string();
        }

        if input_lower.contains("orders") && input_lower.contains("user") {
            return "```sql\nSELECT o.* FROM orders o\nJOIN users u ON o.user_id = u.id;\n```"
                .to_string();
        }

        "I don't understand that question. Could you please rephrase it?".to_string()
    }

    /// Extracts the last user message content from a message list.
    fn extract_user_input(messages: &[Message]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let input = Self::extract_user_input(messages);
        Ok(self.mock_response(&input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_returns_select_all_users() {
        let client = MockLlmClient::new();
        let messages = vec![Message::user("Show me all users")];

        let response = client.complete(&messages).await.unwrap();

        assert!(response.contains("SELECT * FROM users"));
    }

    #[tokio::test]
    async fn test_mock_movies_scenario() {
        let client = MockLlmClient::new();
        let messages = vec![Message::user("How many movies were released in 2020?")];

        let response = client.complete(&messages).await.unwrap();

        assert_eq!(
            response,
            "```sql\nSELECT COUNT(*) FROM movies WHERE year=2020;\n```"
        );
    }

    #[tokio::test]
    async fn test_mock_custom_response() {
        let client = MockLlmClient::new()
            .with_response("custom query", "```sql\nSELECT custom FROM things;\n```");

        let messages = vec![Message::user("Run the custom query")];
        let response = client.complete(&messages).await.unwrap();

        assert!(response.contains("SELECT custom FROM things"));
    }

    #[tokio::test]
    async fn test_mock_unknown_response() {
        let client = MockLlmClient::new();
        let messages = vec![Message::user("What is the meaning of life?")];

        let response = client.complete(&messages).await.unwrap();

        assert!(response.contains("don't understand"));
    }

    #[tokio::test]
    async fn test_call_counter() {
        let client = MockLlmClient::new();
        assert_eq!(client.call_count(), 0);

        let messages = vec![Message::user("Show me all users")];
        client.complete(&messages).await.unwrap();
        client.complete(&messages).await.unwrap();

        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_counter_shared_across_clones() {
        let client = MockLlmClient::new();
        let clone = client.clone();

        clone
            .complete(&[Message::user("count orders")])
            .await
            .unwrap();

        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_case_insensitive() {
        let client = MockLlmClient::new();
        let messages = vec![Message::user("SHOW ME ALL USERS")];

        let response = client.complete(&messages).await.unwrap();

        assert!(response.contains("SELECT * FROM users"));
    }
}
