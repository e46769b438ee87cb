//! Prompt construction for LLM requests.
//!
//! Builds the system prompt that grounds SQL generation in the database
//! schema, and assembles the message list for one translation request.

use crate::db::Schema;
use crate::llm::Message;
use crate::question::Question;

/// System prompt template for the SQL assistant.
const SYSTEM_PROMPT_TEMPLATE: &str = r#"You are a SQL assistant for a PostgreSQL database. Generate a SQL query that answers the user's question.

DATABASE SCHEMA:
{schema}

INSTRUCTIONS:
- Generate only valid PostgreSQL SQL
- Return ONLY the SQL query, no explanations
- Use appropriate JOINs based on foreign keys
- Never generate DROP DATABASE or similar destructive operations

OUTPUT FORMAT:
Return the SQL query wrapped in ```sql code blocks."#;

/// Builds the system prompt with the database schema injected.
pub fn build_system_prompt(schema: &Schema) -> String {
    SYSTEM_PROMPT_TEMPLATE.replace("{schema}", &schema.format_for_llm())
}

/// Builds the message list for a single translation request.
pub fn build_messages(schema: &Schema, question: &Question) -> Vec<Message> {
    vec![
        Message::system(build_system_prompt(schema)),
        Message::user(question.as_str()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockDatabaseClient;
    use crate::llm::Role;

    #[test]
    fn test_system_prompt_contains_schema_and_instructions() {
        let schema = MockDatabaseClient::sample_schema();
        let prompt = build_system_prompt(&schema);

        assert!(prompt.contains("Table: movies"));
        assert!(prompt.contains("title: varchar(255)"));
        assert!(prompt.contains("INSTRUCTIONS:"));
        assert!(prompt.contains("```sql"));
        assert!(!prompt.contains("{schema}"));
    }

    #[test]
    fn test_build_messages_shape() {
        let schema = MockDatabaseClient::sample_schema();
        let question = Question::new("How many movies were released in 2020?").unwrap();

        let messages = build_messages(&schema, &question);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "How many movies were released in 2020?");
    }
}
