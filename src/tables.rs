//! Table reference extraction.
//!
//! Discovers which tables a generated SQL statement touches by scanning its
//! FROM and JOIN clauses. This is a lightweight heuristic, not a SQL parser:
//! identifiers inside string literals or comments can in principle be
//! matched, which is acceptable for schema display purposes.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Matches `FROM <ident>` / `JOIN <ident>` case-insensitively. The identifier
/// capture stops before any terminator (`;`, whitespace, punctuation, end of
/// input), so those never leak into the table name.
static TABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:FROM|JOIN)\s+([A-Za-z_][A-Za-z0-9_]*)").expect("valid regex")
});

/// Extracts the set of table names referenced by `sql`.
///
/// Case is preserved as found; duplicates are collapsed. A query without any
/// FROM/JOIN clause yields an empty set, which is not an error.
pub fn extract_tables(sql: &str) -> BTreeSet<String> {
    TABLE_RE
        .captures_iter(sql)
        .map(|caps| caps[1].to_string())
        .collect()
}
