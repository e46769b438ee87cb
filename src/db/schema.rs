//! Database schema types.
//!
//! Represents the structure of a database (tables, columns, foreign keys)
//! plus a few sample rows per table, and formats it both for LLM grounding
//! and for per-table display.

use crate::db::types::{Row, Value};

/// Represents the complete schema of a database.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// All tables in the schema.
    pub tables: Vec<Table>,

    /// Foreign key relationships between tables.
    pub foreign_keys: Vec<ForeignKey>,
}

impl Schema {
    /// Creates a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a table by name, case-insensitively.
    ///
    /// Generated SQL does not always match the catalog's casing, so table
    /// references extracted from a query are resolved this way.
    pub fn find_table(&self, name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Formats the schema for inclusion in an LLM system prompt.
    ///
    /// Produces a human-readable representation of every table, its columns
    /// and a handful of sample rows, followed by foreign key relationships.
    pub fn format_for_llm(&self) -> String {
        let mut out = String::from("Database Schema:\n");
        for table in &self.tables {
            out.push('\n');
            out.push_str(&table.format(self));
        }
        if !self.foreign_keys.is_empty() {
            out.push_str("\nForeign Keys:\n");
            for fk in &self.foreign_keys {
                out.push_str(&format!(
                    "  - {}.{} -> {}.{}\n",
                    fk.from_table,
                    fk.from_columns.join(", "),
                    fk.to_table,
                    fk.to_columns.join(", ")
                ));
            }
        }
        out
    }
}

/// Represents a database table, including sample rows for grounding/display.
#[derive(Debug, Clone, Default)]
pub struct Table {
    /// Table name.
    pub name: String,

    /// Columns in the table.
    pub columns: Vec<Column>,

    /// Column names that form the primary key.
    pub primary_key: Vec<String>,

    /// Up to `sample_rows` example rows, aligned with `columns`.
    pub samples: Vec<Row>,
}

impl Table {
    /// Creates a new table with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Formats the table (columns, annotations, sample rows) as text.
    ///
    /// Foreign-key annotations come from the surrounding schema.
    pub fn format(&self, schema: &Schema) -> String {
        let mut out = format!("Table: {}\n", self.name);
        for column in &self.columns {
            out.push_str(&self.format_column(column, schema));
        }
        if !self.samples.is_empty() {
            out.push_str("Sample rows:\n");
            for row in &self.samples {
                let cells: Vec<String> = row.iter().map(Value::to_display_string).collect();
                out.push_str(&format!("  ({})\n", cells.join(", ")));
            }
        }
        out
    }

    /// Formats the table for standalone display (e.g. the schema expander).
    pub fn format_standalone(&self) -> String {
        self.format(&Schema::default())
    }

    fn format_column(&self, column: &Column, schema: &Schema) -> String {
        let mut annotations = Vec::new();
        if self.primary_key.contains(&column.name) {
            annotations.push("PK".to_string());
        }
        if !column.is_nullable {
            annotations.push("NOT NULL".to_string());
        }
        for fk in &schema.foreign_keys {
            if fk.from_table == self.name && fk.from_columns.contains(&column.name) {
                annotations.push(format!(
                    "FK -> {}.{}",
                    fk.to_table,
                    fk.to_columns.first().map(String::as_str).unwrap_or("")
                ));
            }
        }

        if annotations.is_empty() {
            format!("  - {}: {}\n", column.name, column.data_type)
        } else {
            format!(
                "  - {}: {} ({})\n",
                column.name,
                column.data_type,
                annotations.join(", ")
            )
        }
    }
}

/// Represents a column in a table.
#[derive(Debug, Clone, Default)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Data type (e.g., "integer", "varchar(255)").
    pub data_type: String,

    /// Whether the column allows NULL values.
    pub is_nullable: bool,
}

impl Column {
    /// Creates a new nullable column with the given name and data type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable: true,
        }
    }

    /// Sets whether the column is nullable.
    pub fn nullable(self, nullable: bool) -> Self {
        Self {
            is_nullable: nullable,
            ..self
        }
    }
}

/// Represents a foreign key relationship between tables.
#[derive(Debug, Clone, Default)]
pub struct ForeignKey {
    /// Source table name.
    pub from_table: String,

    /// Source column names.
    pub from_columns: Vec<String>,

    /// Target table name.
    pub to_table: String,

    /// Target column names.
    pub to_columns: Vec<String>,
}

impl ForeignKey {
    /// Creates a new foreign key relationship.
    pub fn new(
        from_table: impl Into<String>,
        from_columns: Vec<String>,
        to_table: impl Into<String>,
        to_columns: Vec<String>,
    ) -> Self {
        Self {
            from_table: from_table.into(),
            from_columns,
            to_table: to_table.into(),
            to_columns,
        }
    }
}
