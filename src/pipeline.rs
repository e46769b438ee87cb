//! End-to-end question answering pipeline.
//!
//! Runs a single request through translation, sanitizing, table extraction,
//! and execution. The run is terminal on first failure: no stage is
//! re-entered and nothing is retried. Each run owns its own immutable
//! values; the only shared resource is the database client's pool.

use std::collections::BTreeSet;

use tracing::{debug, error};

use crate::db::{DatabaseClient, QueryResult};
use crate::error::AskError;
use crate::llm::{prompt, LlmClient};
use crate::question::Question;
use crate::sanitize::sanitize;
use crate::tables::extract_tables;

/// A successful pipeline run.
#[derive(Debug)]
pub struct Answer {
    /// The sanitized SQL that was executed.
    pub query: String,
    /// Tabular results from the database.
    pub result: QueryResult,
    /// Tables referenced by the query.
    pub tables: BTreeSet<String>,
    /// (table name, schema text) for each referenced table that exists.
    pub table_schemas: Vec<(String, String)>,
}

/// Terminal state of a pipeline run.
#[derive(Debug)]
pub enum Outcome {
    /// All stages completed.
    Done(Answer),
    /// A stage failed; the request is aborted.
    Failed {
        /// What went wrong.
        error: AskError,
        /// The sanitized query, when translation had already produced one,
        /// so the user can see what was attempted.
        attempted_query: Option<String>,
    },
}

impl Outcome {
    fn failed(error: AskError) -> Self {
        Self::Failed {
            error,
            attempted_query: None,
        }
    }
}

/// The question answering pipeline.
///
/// Holds the translator and database collaborators; stateless between runs.
pub struct Pipeline<'a> {
    llm: &'a dyn LlmClient,
    db: &'a dyn DatabaseClient,
}

impl<'a> Pipeline<'a> {
    /// Creates a pipeline over the given collaborators.
    pub fn new(llm: &'a dyn LlmClient, db: &'a dyn DatabaseClient) -> Self {
        Self { llm, db }
    }

    /// Answers one question, returning the terminal outcome.
    ///
    /// Stage order: translate, sanitize, extract tables, execute. Failures
    /// are returned as [`Outcome::Failed`], never panics, never retries.
    pub async fn run(&self, question: &Question) -> Outcome {
        debug!("introspecting schema");
        let schema = match self.db.introspect_schema().await {
            Ok(schema) => schema,
            Err(e) => {
                error!("{}: {}", e.category(), e);
                return Outcome::failed(e);
            }
        };

        debug!("translating question");
        let messages = prompt::build_messages(&schema, question);
        let raw = match self.llm.complete(&messages).await {
            Ok(raw) => raw,
            Err(e) => {
                error!("{}: {}", e.category(), e);
                return Outcome::failed(e);
            }
        };

        debug!("sanitizing model output");
        let query = sanitize(&raw);

        debug!(query = %query, "extracting table references");
        let tables = extract_tables(&query);

        debug!("executing query");
        let result = match self.db.execute_query(&query).await {
            Ok(result) => result,
            Err(e) => {
                error!("{}: {}", e.category(), e);
                return Outcome::Failed {
                    error: e,
                    attempted_query: Some(query),
                };
            }
        };

        // Informational path: fetch schema text for each referenced table.
        // Unknown references are skipped; the schema expander shows nothing.
        let mut table_schemas = Vec::with_capacity(tables.len());
        for name in &tables {
            match self.db.table_info(name).await {
                Ok(table) => table_schemas.push((name.clone(), table.format_standalone())),
                Err(e) => debug!(table = %name, "no schema available: {}", e),
            }
        }

        Outcome::Done(Answer {
            query,
            result,
            tables,
            table_schemas,
        })
    }
}
