//! askdb - ask questions about your data in plain language.
//!
//! Translates a natural-language question into SQL with a language model,
//! sanitizes the model output, extracts the referenced tables, executes the
//! query, and returns the results together with schema context.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod question;
pub mod sanitize;
pub mod tables;
