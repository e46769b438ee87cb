//! End-to-end pipeline tests over the mock LLM and mock database.
//!
//! Run with: `cargo test --test pipeline_tests`

use askdb::db::{ColumnInfo, FailingDatabaseClient, MockDatabaseClient, QueryResult, Value};
use askdb::error::AskError;
use askdb::llm::{self, LlmProvider, MockLlmClient};
use askdb::pipeline::{Outcome, Pipeline};
use askdb::question::Question;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_movies_question_end_to_end() {
    let llm = MockLlmClient::new();
    let canned = QueryResult::with_data(
        vec![ColumnInfo::new("count", "bigint")],
        vec![vec![Value::Int(42)]],
    );
    let db = MockDatabaseClient::new().with_result("COUNT(*) FROM movies", canned);
    let pipeline = Pipeline::new(&llm, &db);

    let question = Question::new("How many movies were released in 2020?").unwrap();
    let outcome = pipeline.run(&question).await;

    let answer = match outcome {
        Outcome::Done(answer) => answer,
        other => panic!("expected Done, got {other:?}"),
    };

    assert_eq!(answer.query, "SELECT COUNT(*) FROM movies WHERE year=2020;");
    assert_eq!(
        answer.tables.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["movies"]
    );
    assert_eq!(answer.result.rows[0][0], Value::Int(42));

    // Schema context for the referenced table is available for display.
    assert_eq!(answer.table_schemas.len(), 1);
    assert_eq!(answer.table_schemas[0].0, "movies");
    assert!(answer.table_schemas[0].1.contains("title: varchar(255)"));
}

#[tokio::test]
async fn test_join_query_reports_both_tables() {
    let llm = MockLlmClient::new();
    let db = MockDatabaseClient::new();
    let pipeline = Pipeline::new(&llm, &db);

    let question = Question::new("Show orders per user").unwrap();
    let outcome = pipeline.run(&question).await;

    let answer = match outcome {
        Outcome::Done(answer) => answer,
        other => panic!("expected Done, got {other:?}"),
    };
    let tables: Vec<_> = answer.tables.iter().map(String::as_str).collect();
    assert_eq!(tables, vec!["orders", "users"]);
    assert_eq!(answer.table_schemas.len(), 2);
}

#[tokio::test]
async fn test_database_error_is_terminal_and_query_is_shown() {
    let llm = MockLlmClient::new();
    let db = FailingDatabaseClient::new("syntax error at or near \"FORM\"");
    let pipeline = Pipeline::new(&llm, &db);

    let question = Question::new("How many movies were released in 2020?").unwrap();
    let outcome = pipeline.run(&question).await;

    let (error, attempted_query) = match outcome {
        Outcome::Failed {
            error,
            attempted_query,
        } => (error, attempted_query),
        other => panic!("expected Failed, got {other:?}"),
    };

    assert_eq!(error.category(), "Query Error");
    assert!(error.to_string().contains("syntax error"));
    // The sanitized query is still exposed so the user sees what ran.
    assert_eq!(
        attempted_query.as_deref(),
        Some("SELECT COUNT(*) FROM movies WHERE year=2020;")
    );
    // Exactly one translation attempt; nothing is retried.
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn test_missing_credential_fails_before_any_translation() {
    let original = std::env::var("GOOGLE_API_KEY").ok();
    std::env::remove_var("GOOGLE_API_KEY");

    let result = llm::create_client(LlmProvider::Gemini, None, None);

    if let Some(key) = original {
        std::env::set_var("GOOGLE_API_KEY", key);
    }

    let err = result.err().expect("client creation must fail without a key");
    assert!(matches!(err, AskError::Config(_)));
    assert!(err.to_string().contains("GOOGLE_API_KEY"));
}

#[tokio::test]
async fn test_empty_question_never_reaches_the_pipeline() {
    let llm = MockLlmClient::new();

    let err = Question::new("   ").unwrap_err();
    assert!(matches!(err, AskError::EmptyQuestion));

    // No Question value exists, so no translation can have happened.
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_unfenced_model_output_still_executes() {
    let llm = MockLlmClient::new().with_response("plain", "SELECT * FROM users;");
    let db = MockDatabaseClient::new();
    let pipeline = Pipeline::new(&llm, &db);

    let question = Question::new("Give me the plain one").unwrap();
    let outcome = pipeline.run(&question).await;

    let answer = match outcome {
        Outcome::Done(answer) => answer,
        other => panic!("expected Done, got {other:?}"),
    };
    assert_eq!(answer.query, "SELECT * FROM users;");
    assert_eq!(
        answer.tables.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["users"]
    );
}
