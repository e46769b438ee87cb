//! Query result types.
//!
//! Defines the structures used to represent tabular results coming back from
//! the database.

use std::fmt;
use std::time::Duration;

/// Represents the result of executing a SQL query.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// Column metadata for the result set.
    pub columns: Vec<ColumnInfo>,

    /// Rows of data.
    pub rows: Vec<Row>,

    /// Time taken to execute the query.
    pub execution_time: Duration,

    /// Total number of rows before truncation, when the result was capped.
    pub truncated_from: Option<usize>,
}

impl QueryResult {
    /// Creates a query result with the given columns and rows.
    pub fn with_data(columns: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows,
            execution_time: Duration::ZERO,
            truncated_from: None,
        }
    }

    /// Sets the execution time.
    pub fn with_execution_time(mut self, duration: Duration) -> Self {
        self.execution_time = duration;
        self
    }

    /// Returns the number of rows in the (possibly truncated) result.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the result set is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns a truncation warning message if rows were dropped.
    pub fn truncation_warning(&self) -> Option<String> {
        self.truncated_from.map(|total| {
            format!("Result truncated: showing {} of {} rows", self.rows.len(), total)
        })
    }

    /// Renders the result as an aligned text table.
    ///
    /// Falls back to a plain row listing when no column metadata is available
    /// (non-tabular results).
    pub fn render_text(&self) -> String {
        if self.columns.is_empty() {
            if self.rows.is_empty() {
                return "(no rows)".to_string();
            }
            return self
                .rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(Value::to_display_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .collect::<Vec<_>>()
                .join("\n");
        }

        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.name.len()).collect();
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(Value::to_display_string).collect())
            .collect();
        for row in &cells {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() && cell.len() > widths[i] {
                    widths[i] = cell.len();
                }
            }
        }

        let mut out = String::new();
        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<w$}", c.name, w = *w))
            .collect();
        out.push_str(header.join(" | ").trim_end());
        out.push('\n');
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&rule.join("-+-"));
        for row in &cells {
            out.push('\n');
            let line: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(i, cell)| format!("{:<w$}", cell, w = widths.get(i).copied().unwrap_or(0)))
                .collect();
            out.push_str(line.join(" | ").trim_end());
        }
        out
    }
}

/// Metadata about a column in a result set.
#[derive(Debug, Clone, Default)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Column data type.
    pub data_type: String,
}

impl ColumnInfo {
    /// Creates a new column info with the given name and type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A row of data from a query result.
pub type Row = Vec<Value>;

/// Represents a single value from a database query.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,

    /// Boolean value.
    Bool(bool),

    /// Signed integer (up to i64).
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// Text/string value.
    String(String),

    /// Binary data.
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Converts the value to a string representation for display.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_display_string(), "NULL");
        assert_eq!(Value::Bool(true).to_display_string(), "true");
        assert_eq!(Value::Int(42).to_display_string(), "42");
        assert_eq!(Value::from("hello").to_display_string(), "hello");
        assert_eq!(Value::Bytes(vec![1, 2, 3]).to_display_string(), "<3 bytes>");
    }

    #[test]
    fn test_value_from_option() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(7i64)), Value::Int(7));
    }

    #[test]
    fn test_query_result_counts() {
        let result = QueryResult::with_data(
            vec![ColumnInfo::new("id", "integer")],
            vec![vec![Value::Int(1)], vec![Value::Int(2)]],
        );
        assert_eq!(result.row_count(), 2);
        assert!(!result.is_empty());
        assert!(result.truncation_warning().is_none());
    }

    #[test]
    fn test_truncation_warning() {
        let mut result = QueryResult::with_data(
            vec![ColumnInfo::new("id", "integer")],
            vec![vec![Value::Int(1)]],
        );
        result.truncated_from = Some(5000);
        let warning = result.truncation_warning().unwrap();
        assert!(warning.contains("1 of 5000"));
    }

    #[test]
    fn test_render_text_grid() {
        let result = QueryResult::with_data(
            vec![ColumnInfo::new("id", "integer"), ColumnInfo::new("name", "text")],
            vec![
                vec![Value::Int(1), Value::from("Alice")],
                vec![Value::Int(2), Value::from("Bob")],
            ],
        );
        let text = result.render_text();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "id | name");
        assert!(lines.next().unwrap().starts_with("---"));
        assert!(text.contains("1  | Alice"));
        assert!(text.contains("2  | Bob"));
    }

    #[test]
    fn test_render_text_without_columns() {
        let result = QueryResult::with_data(vec![], vec![vec![Value::from("scalar")]]);
        assert_eq!(result.render_text(), "scalar");

        let empty = QueryResult::default();
        assert_eq!(empty.render_text(), "(no rows)");
    }
}
