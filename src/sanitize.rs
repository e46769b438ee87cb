//! Sanitizing of raw LLM output.
//!
//! Models frequently wrap generated SQL in markdown code fences, with or
//! without a language tag. This module turns that raw output into an
//! executable SQL string.

/// Strips code-fence artifacts from raw model output.
///
/// If the output contains a well-formed fenced block (```` ``` ```` with an
/// optional language tag, a newline, content, and a closing fence), the
/// trimmed content of the first such block is returned. Otherwise a loose
/// leading/trailing fence marker is stripped as a fallback, matching the
/// behavior of models that forget the closing fence.
///
/// Total function: always returns a best-effort string, never fails.
pub fn sanitize(raw: &str) -> String {
    if let Some(block) = first_fenced_block(raw) {
        return block.trim().to_string();
    }
    strip_loose_fences(raw).trim().to_string()
}

/// Extracts the content of the first well-formed fenced block, if any.
///
/// The language tag after the opening fence is ignored; only the closing
/// fence adjacent to this block is considered.
fn first_fenced_block(text: &str) -> Option<&str> {
    let start_idx = text.find("```")?;
    let after_fence = &text[start_idx + 3..];

    // The opening line may carry a language tag; content starts after it.
    let newline = after_fence.find('\n')?;
    let tag = after_fence[..newline].trim();
    if !tag.is_empty() && !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
        // Not a language tag, so not a fence we recognize.
        return None;
    }

    let content = &after_fence[newline + 1..];
    let end_idx = content.find("```")?;
    Some(&content[..end_idx])
}

/// Fallback for malformed fences: strips a leading fence marker (with an
/// optional language tag) and a trailing fence marker, if present.
fn strip_loose_fences(text: &str) -> &str {
    let mut out = text.trim();

    if let Some(rest) = out.strip_prefix("```") {
        // Drop the rest of the opening line (language tag), if there is one.
        out = match rest.find('\n') {
            Some(idx) if rest[..idx].trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
                &rest[idx + 1..]
            }
            _ => rest,
        };
    }

    if let Some(rest) = out.trim_end().strip_suffix("```") {
        out = rest;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strips_sql_fence() {
        let raw = "```sql\nSELECT COUNT(*) FROM movies WHERE year=2020;\n```";
        assert_eq!(sanitize(raw), "SELECT COUNT(*) FROM movies WHERE year=2020;");
    }

    #[test]
    fn test_strips_untagged_fence() {
        let raw = "```\nSELECT 1;\n```";
        assert_eq!(sanitize(raw), "SELECT 1;");
    }

    #[test]
    fn test_unfenced_input_is_trimmed_only() {
        assert_eq!(sanitize("  SELECT * FROM users;  \n"), "SELECT * FROM users;");
    }

    #[test]
    fn test_surrounding_prose_is_dropped() {
        let raw = "Here is the query:\n\n```sql\nSELECT id FROM orders;\n```\n\nHope that helps.";
        assert_eq!(sanitize(raw), "SELECT id FROM orders;");
    }

    #[test]
    fn test_only_first_block_is_used() {
        let raw = "```sql\nSELECT 1;\n```\n\n```sql\nSELECT 2;\n```";
        assert_eq!(sanitize(raw), "SELECT 1;");
    }

    #[test]
    fn test_missing_closing_fence_falls_back() {
        let raw = "```sql\nSELECT name FROM users;";
        assert_eq!(sanitize(raw), "SELECT name FROM users;");
    }

    #[test]
    fn test_missing_opening_tagless_closing() {
        let raw = "SELECT name FROM users;\n```";
        assert_eq!(sanitize(raw), "SELECT name FROM users;");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_multiline_sql_survives_byte_identical() {
        let sql = "SELECT u.id,\n       COUNT(o.id)\nFROM users u\nJOIN orders o ON o.user_id = u.id\nGROUP BY u.id;";
        let wrapped = format!("```sql\n{sql}\n```");
        assert_eq!(sanitize(&wrapped), sql);
    }

    #[test]
    fn test_round_trip_on_wrapped_corpus() {
        let statements = [
            "SELECT 1",
            "SELECT * FROM movies;",
            "SELECT COUNT(*) FROM movies WHERE year=2020;",
            "SELECT a.x, b.y FROM a JOIN b ON a.id = b.id;",
        ];
        for sql in statements {
            for tag in ["", "sql", "SQL", "postgresql"] {
                let wrapped = format!("```{tag}\n{sql}\n```");
                assert_eq!(sanitize(&wrapped), sql, "tag={tag:?}");
            }
            // Unwrapped input passes through unchanged.
            assert_eq!(sanitize(sql), sql);
        }
    }
}
