//! Database abstraction layer.
//!
//! Provides a trait-based interface for schema introspection and query
//! execution, allowing different backends (and test doubles) to be used
//! interchangeably.

mod mock;
mod postgres;
mod schema;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use postgres::PostgresClient;
pub use schema::{Column, ForeignKey, Schema, Table};
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Trait defining the interface for database clients.
///
/// All operations are async and return Results with AskError.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Introspects the full database schema, including sample rows per table.
    async fn introspect_schema(&self) -> Result<Schema>;

    /// Fetches a single table's structure and sample rows, for display.
    async fn table_info(&self, name: &str) -> Result<Table>;

    /// Executes a SQL query and returns the results.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}

/// Connects to the configured database and returns a boxed client.
///
/// `sample_rows` controls how many example rows are captured per table
/// during introspection.
pub async fn connect(
    config: &ConnectionConfig,
    sample_rows: usize,
) -> Result<Box<dyn DatabaseClient>> {
    let client = PostgresClient::connect(config, sample_rows).await?;
    Ok(Box::new(client))
}
