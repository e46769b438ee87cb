//! Mock database clients for testing.

use super::{Column, ColumnInfo, DatabaseClient, QueryResult, Schema, Table, Value};
use crate::error::{AskError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// A mock database client backed by a fixed schema and canned results.
pub struct MockDatabaseClient {
    schema: Schema,
    /// (substring of SQL, result) pairs checked in order.
    canned_results: Vec<(String, QueryResult)>,
}

impl MockDatabaseClient {
    /// Creates a mock client with a small movies/users/orders schema.
    pub fn new() -> Self {
        Self {
            schema: Self::sample_schema(),
            canned_results: Vec::new(),
        }
    }

    /// Creates a mock client with the given schema.
    pub fn with_schema(schema: Schema) -> Self {
        Self {
            schema,
            canned_results: Vec::new(),
        }
    }

    /// Registers a canned result returned when the executed SQL contains
    /// `pattern`.
    pub fn with_result(mut self, pattern: impl Into<String>, result: QueryResult) -> Self {
        self.canned_results.push((pattern.into(), result));
        self
    }

    /// The default schema used by the mock.
    pub fn sample_schema() -> Schema {
        Schema {
            tables: vec![
                Table {
                    name: "movies".to_string(),
                    columns: vec![
                        Column::new("id", "integer").nullable(false),
                        Column::new("title", "varchar(255)").nullable(false),
                        Column::new("year", "integer"),
                    ],
                    primary_key: vec!["id".to_string()],
                    samples: vec![
                        vec![Value::Int(1), Value::from("Arrival"), Value::Int(2016)],
                        vec![Value::Int(2), Value::from("Tenet"), Value::Int(2020)],
                    ],
                },
                Table {
                    name: "users".to_string(),
                    columns: vec![
                        Column::new("id", "integer").nullable(false),
                        Column::new("email", "varchar(255)").nullable(false),
                    ],
                    primary_key: vec!["id".to_string()],
                    samples: vec![],
                },
                Table {
                    name: "orders".to_string(),
                    columns: vec![
                        Column::new("id", "integer").nullable(false),
                        Column::new("user_id", "integer").nullable(false),
                    ],
                    primary_key: vec!["id".to_string()],
                    samples: vec![],
                },
            ],
            foreign_keys: vec![],
        }
    }
}

impl Default for MockDatabaseClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        Ok(self.schema.clone())
    }

    async fn table_info(&self, name: &str) -> Result<Table> {
        self.schema
            .find_table(name)
            .cloned()
            .ok_or_else(|| AskError::query(format!("Unknown table: {name}")))
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        for (pattern, result) in &self.canned_results {
            if sql.contains(pattern.as_str()) {
                return Ok(result.clone());
            }
        }

        if sql.trim_start().to_uppercase().starts_with("SELECT") {
            let columns = vec![ColumnInfo::new("result", "text")];
            let rows = vec![vec![Value::String(format!("Mock result for: {}", sql))]];
            Ok(QueryResult::with_data(columns, rows)
                .with_execution_time(Duration::from_millis(1)))
        } else {
            Ok(QueryResult::default())
        }
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A mock client whose query execution always fails, for exercising the
/// pipeline's error path.
pub struct FailingDatabaseClient {
    message: String,
}

impl FailingDatabaseClient {
    /// Creates a failing client that reports `message` on every query.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        Ok(MockDatabaseClient::sample_schema())
    }

    async fn table_info(&self, name: &str) -> Result<Table> {
        MockDatabaseClient::sample_schema()
            .find_table(name)
            .cloned()
            .ok_or_else(|| AskError::query(format!("Unknown table: {name}")))
    }

    async fn execute_query(&self, _sql: &str) -> Result<QueryResult> {
        Err(AskError::query(self.message.clone()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
