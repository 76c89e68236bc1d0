use anyhow::{Context, Result};
use regex::Regex;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

// Anything that is not safe inside a DOM id / CSS selector
static UNSAFE_ID_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_\-]+").unwrap());

pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {:?}", path))?;
    }
    Ok(())
}

/// Normalise a table name into the suffix used for component ids.
///
/// Spaces become underscores, leading/trailing `-` and `_` are stripped and
/// the result is lowercased. Remaining characters that would break a DOM id
/// are replaced by `_`.
pub fn normalize_suffix(name: &str) -> String {
    let lowered = name
        .replace(' ', "_")
        .trim_matches('-')
        .trim_matches('_')
        .to_lowercase();
    UNSAFE_ID_CHARS_RE.replace_all(&lowered, "_").into_owned()
}

/// Render a cell value the way a user reads it: strings without quotes,
/// `null` as an empty marker, everything else as JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "(empty)".to_string(),
        other => other.to_string(),
    }
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_suffix_spaces_and_case() {
        assert_eq!(normalize_suffix("Table 3"), "table_3");
    }

    #[test]
    fn test_normalize_suffix_strips_edges() {
        assert_eq!(normalize_suffix("-_Sales_-"), "sales");
        assert_eq!(normalize_suffix(" quarterly "), "quarterly");
    }

    #[test]
    fn test_normalize_suffix_replaces_unsafe_chars() {
        assert_eq!(normalize_suffix("q1/q2 (eu)"), "q1_q2__eu_");
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!(5)), "5");
        assert_eq!(display_value(&json!("north")), "north");
        assert_eq!(display_value(&json!(2.5)), "2.5");
        assert_eq!(display_value(&Value::Null), "(empty)");
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_ensure_dir_creates_nested() {
        let dir = std::path::PathBuf::from("test_utils_ensure_dir/nested");
        let _ = fs::remove_dir_all("test_utils_ensure_dir");
        ensure_dir(&dir).unwrap();
        assert!(dir.is_dir());
        let _ = fs::remove_dir_all("test_utils_ensure_dir");
    }
}
