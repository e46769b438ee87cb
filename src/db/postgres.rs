//! PostgreSQL database client implementation.
//!
//! Provides the `PostgresClient` struct that implements the `DatabaseClient`
//! trait using sqlx.

use crate::config::ConnectionConfig;
use crate::db::{Column, ColumnInfo, DatabaseClient, ForeignKey, QueryResult, Row, Schema, Table, Value};
use crate::error::{AskError, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column as SqlxColumn, Row as SqlxRow, TypeInfo};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Query timeout in seconds.
const QUERY_TIMEOUT_SECS: u64 = 30;

/// Maximum rows to return from a query.
const MAX_ROWS: usize = 1000;

/// Maximum number of connection retry attempts.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Base delay between retry attempts (doubles each retry).
const RETRY_BASE_DELAY_MS: u64 = 500;

/// PostgreSQL database client.
#[derive(Debug)]
pub struct PostgresClient {
    pool: PgPool,
    sample_rows: usize,
}

impl PostgresClient {
    /// Connects to the database described by `config`.
    ///
    /// Transient failures are retried with exponential backoff; queries run
    /// through the resulting pool are never retried.
    pub async fn connect(config: &ConnectionConfig, sample_rows: usize) -> Result<Self> {
        let conn_str = config.to_connection_string()?;

        let mut last_error = None;
        let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);

        for attempt in 1..=MAX_RETRY_ATTEMPTS {
            debug!("Connection attempt {} of {}", attempt, MAX_RETRY_ATTEMPTS);

            let result = PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(10))
                .connect(&conn_str)
                .await;

            match result {
                Ok(pool) => {
                    debug!("Connected to {}", config.display_string());
                    return Ok(Self { pool, sample_rows });
                }
                Err(e) => {
                    let is_transient = matches!(e, sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut);
                    last_error = Some(e);

                    if attempt < MAX_RETRY_ATTEMPTS && is_transient {
                        warn!(
                            "Connection attempt {} failed (transient error), retrying in {:?}",
                            attempt, delay
                        );
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    } else {
                        break;
                    }
                }
            }
        }

        let e = last_error.expect("at least one attempt was made");
        Err(AskError::connection(format!(
            "Failed to connect to {}: {}",
            config.display_string(),
            e
        )))
    }

    /// Creates a client from an existing pool. Primarily useful for testing.
    #[allow(dead_code)]
    pub fn from_pool(pool: PgPool, sample_rows: usize) -> Self {
        Self { pool, sample_rows }
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        let table_names = self.fetch_table_names().await?;

        let mut tables = Vec::with_capacity(table_names.len());
        for name in table_names {
            tables.push(self.fetch_table(&name).await?);
        }

        let foreign_keys = self.fetch_foreign_keys().await?;

        Ok(Schema {
            tables,
            foreign_keys,
        })
    }

    async fn table_info(&self, name: &str) -> Result<Table> {
        // The extractor preserves casing from the SQL text, which may not
        // match the catalog. Resolve to the actual table name first.
        let actual: Option<String> = sqlx::query_scalar(
            r#"
            SELECT table_name::text
            FROM information_schema.tables
            WHERE table_schema = 'public' AND lower(table_name) = lower($1)
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AskError::query(format!("Failed to look up table {name}: {e}")))?;

        let actual = actual.ok_or_else(|| AskError::query(format!("Unknown table: {name}")))?;
        self.fetch_table(&actual).await
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        let result = tokio::time::timeout(
            Duration::from_secs(QUERY_TIMEOUT_SECS),
            sqlx::query(sql).fetch_all(&self.pool),
        )
        .await
        .map_err(|_| AskError::query(format!("Query timed out after {QUERY_TIMEOUT_SECS} seconds")))?
        .map_err(|e| AskError::query(format_query_error(e)))?;

        let execution_time = start.elapsed();

        let columns: Vec<ColumnInfo> = result
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                    .collect()
            })
            .unwrap_or_default();

        let total_rows = result.len();
        let truncated = total_rows > MAX_ROWS;
        if truncated {
            warn!(
                "Query returned {} rows, truncating to {} rows",
                total_rows, MAX_ROWS
            );
        }

        let rows: Vec<Row> = result.iter().take(MAX_ROWS).map(convert_row).collect();

        Ok(QueryResult {
            columns,
            rows,
            execution_time,
            truncated_from: truncated.then_some(total_rows),
        })
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

impl PostgresClient {
    /// Fetches all table names from the public schema.
    async fn fetch_table_names(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(
            r#"
            SELECT table_name::text
            FROM information_schema.tables
            WHERE table_schema = 'public' AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AskError::query(format!("Failed to fetch tables: {e}")))
    }

    /// Fetches a table's columns, primary key, and sample rows.
    async fn fetch_table(&self, name: &str) -> Result<Table> {
        let columns = self.fetch_columns(name).await?;
        let primary_key = self.fetch_primary_key(name).await?;
        let samples = self.fetch_samples(name).await?;

        Ok(Table {
            name: name.to_string(),
            columns,
            primary_key,
            samples,
        })
    }

    /// Fetches columns for a specific table.
    async fn fetch_columns(&self, table_name: &str) -> Result<Vec<Column>> {
        let rows: Vec<(String, String, String)> = sqlx::query_as(
            r#"
            SELECT
                column_name::text,
                data_type::text,
                is_nullable::text
            FROM information_schema.columns
            WHERE table_schema = 'public' AND table_name = $1
            ORDER BY ordinal_position
            "#,
        )
        .bind(table_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AskError::query(format!("Failed to fetch columns for {table_name}: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|(name, data_type, is_nullable)| Column {
                name,
                data_type,
                is_nullable: is_nullable == "YES",
            })
            .collect())
    }

    /// Fetches primary key columns for a specific table.
    async fn fetch_primary_key(&self, table_name: &str) -> Result<Vec<String>> {
        sqlx::query_scalar(
            r#"
            SELECT kcu.column_name::text
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON tc.constraint_name = kcu.constraint_name
                AND tc.table_schema = kcu.table_schema
            WHERE tc.table_schema = 'public'
                AND tc.table_name = $1
                AND tc.constraint_type = 'PRIMARY KEY'
            ORDER BY kcu.ordinal_position
            "#,
        )
        .bind(table_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AskError::query(format!("Failed to fetch primary key for {table_name}: {e}"))
        })
    }

    /// Fetches up to `sample_rows` example rows from a table.
    async fn fetch_samples(&self, table_name: &str) -> Result<Vec<Row>> {
        if self.sample_rows == 0 {
            return Ok(Vec::new());
        }

        // Table name comes from the catalog, but quote it anyway.
        let quoted = table_name.replace('"', "\"\"");
        let sql = format!(r#"SELECT * FROM "{}" LIMIT {}"#, quoted, self.sample_rows);

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AskError::query(format!("Failed to sample {table_name}: {e}")))?;

        Ok(rows.iter().map(convert_row).collect())
    }

    /// Fetches all foreign key relationships.
    async fn fetch_foreign_keys(&self) -> Result<Vec<ForeignKey>> {
        let rows: Vec<(String, String, String, String)> = sqlx::query_as(
            r#"
            SELECT
                kcu.table_name::text AS from_table,
                kcu.column_name::text AS from_column,
                ccu.table_name::text AS to_table,
                ccu.column_name::text AS to_column
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON tc.constraint_name = kcu.constraint_name
                AND tc.table_schema = kcu.table_schema
            JOIN information_schema.constraint_column_usage ccu
                ON tc.constraint_name = ccu.constraint_name
                AND tc.table_schema = ccu.table_schema
            WHERE tc.table_schema = 'public'
                AND tc.constraint_type = 'FOREIGN KEY'
            ORDER BY kcu.table_name, kcu.ordinal_position
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AskError::query(format!("Failed to fetch foreign keys: {e}")))?;

        // Group by (from_table, to_table); good enough for single-column FKs.
        let mut fk_map: std::collections::BTreeMap<(String, String), (Vec<String>, Vec<String>)> =
            std::collections::BTreeMap::new();

        for (from_table, from_column, to_table, to_column) in rows {
            let entry = fk_map
                .entry((from_table, to_table))
                .or_insert_with(|| (Vec::new(), Vec::new()));
            entry.0.push(from_column);
            entry.1.push(to_column);
        }

        Ok(fk_map
            .into_iter()
            .map(|((from_table, to_table), (from_columns, to_columns))| ForeignKey {
                from_table,
                from_columns,
                to_table,
                to_columns,
            })
            .collect())
    }
}

/// Formats a sqlx error for user display, preferring the database's own
/// message over the driver wrapper.
fn format_query_error(e: sqlx::Error) -> String {
    match e {
        sqlx::Error::Database(db_err) => db_err.message().to_string(),
        other => other.to_string(),
    }
}

/// Converts a PgRow into our Value-based row representation.
///
/// Decoding is by declared type name; anything unrecognized falls back to a
/// textual decode, then NULL.
fn convert_row(row: &PgRow) -> Row {
    (0..row.columns().len())
        .map(|idx| convert_value(row, idx))
        .collect()
}

fn convert_value(row: &PgRow, idx: usize) -> Value {
    let type_name = row.columns()[idx].type_info().name().to_uppercase();

    match type_name.as_str() {
        "BOOL" => opt(row.try_get::<Option<bool>, _>(idx).ok().flatten().map(Value::Bool)),
        "INT2" => opt(row
            .try_get::<Option<i16>, _>(idx)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))),
        "INT4" => opt(row
            .try_get::<Option<i32>, _>(idx)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))),
        "INT8" => opt(row.try_get::<Option<i64>, _>(idx).ok().flatten().map(Value::Int)),
        "FLOAT4" => opt(row
            .try_get::<Option<f32>, _>(idx)
            .ok()
            .flatten()
            .map(|v| Value::Float(v as f64))),
        "FLOAT8" => opt(row.try_get::<Option<f64>, _>(idx).ok().flatten().map(Value::Float)),
        "BYTEA" => opt(row
            .try_get::<Option<Vec<u8>>, _>(idx)
            .ok()
            .flatten()
            .map(Value::Bytes)),
        _ => opt(row
            .try_get::<Option<String>, _>(idx)
            .ok()
            .flatten()
            .map(Value::String)),
    }
}

fn opt(v: Option<Value>) -> Value {
    v.unwrap_or(Value::Null)
}
