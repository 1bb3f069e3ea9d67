//! Response normalizer
//!
//! Recovers a JSON value from free-form model output. Models often wrap their
//! answer in a code fence or surround it with prose, so recovery runs in
//! stages and stops at the first one that parses:
//!
//! 1. trim, drop a leading ```` ```json ```` and a trailing ```` ``` ````, trim again
//! 2. parse the cleaned text directly
//! 3. if the text has both `[` and `]`, parse from the first `[` to the last `]`
//! 4. otherwise, if it has both `{` and `}`, parse from the first `{` to the last `}`
//!
//! Step 4 only runs when step 3 was not applicable. The outermost-bracket slice
//! can swallow prose sitting between two bracketed fragments; that is accepted.
//!
//! When nothing parses the caller still gets a value: a [`ParseDiagnostic`]
//! carrying the untouched raw text.

use serde::Serialize;
use serde_json::Value;

use super::request::OutputFormat;

/// Opening fence for JSON code blocks
pub const JSON_FENCE_OPEN: &str = "```json";

/// Closing fence
pub const FENCE_CLOSE: &str = "```";

/// Error tag carried by a diagnostic
pub const PARSE_FAILURE: &str = "Failed to parse JSON response";

/// Strategies reported in a diagnostic
pub const PARSING_ATTEMPTS: [&str; 2] = [
    "Direct JSON parsing failed",
    "JSON extraction from text failed",
];

const LOG_PREVIEW_CHARS: usize = 500;

/// Outcome of normalizing model output
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// Any JSON value recovered from the text, returned as-is
    Structured(Value),
    /// Raw text for non-JSON output formats
    Text(String),
    /// JSON was requested but none could be recovered
    Diagnostic(ParseDiagnostic),
}

/// Non-exceptional failure record for JSON recovery
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseDiagnostic {
    pub error: String,
    /// Full model output, never truncated
    pub raw_result: String,
    pub parsing_attempts: Vec<String>,
}

impl ParseDiagnostic {
    pub fn new(raw: &str) -> Self {
        Self {
            error: PARSE_FAILURE.to_string(),
            raw_result: raw.to_string(),
            parsing_attempts: PARSING_ATTEMPTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Normalize model output for the requested format
pub fn normalize(raw: &str, format: OutputFormat) -> Extraction {
    match format {
        OutputFormat::Text => Extraction::Text(raw.to_string()),
        OutputFormat::Json => match recover_json(raw) {
            Some(value) => Extraction::Structured(value),
            None => {
                tracing::warn!(
                    "All JSON parsing failed. Raw result: {}...",
                    preview(raw, LOG_PREVIEW_CHARS)
                );
                Extraction::Diagnostic(ParseDiagnostic::new(raw))
            }
        },
    }
}

/// Trim and remove a JSON code fence, if present
pub fn strip_fences(raw: &str) -> &str {
    let cleaned = raw.trim();
    let cleaned = cleaned.strip_prefix(JSON_FENCE_OPEN).unwrap_or(cleaned);
    let cleaned = cleaned.strip_suffix(FENCE_CLOSE).unwrap_or(cleaned);
    cleaned.trim()
}

/// Run the staged recovery, returning the first value that parses
pub fn recover_json(raw: &str) -> Option<Value> {
    let cleaned = strip_fences(raw);

    match serde_json::from_str::<Value>(cleaned) {
        Ok(value) => {
            tracing::debug!("Parsed JSON directly");
            return Some(value);
        }
        Err(e) => tracing::debug!("Direct JSON parsing failed: {}", e),
    }

    let (candidate, kind) = if let Some(slice) = outermost(cleaned, '[', ']') {
        (slice, "array")
    } else if let Some(slice) = outermost(cleaned, '{', '}') {
        (slice, "object")
    } else {
        return None;
    };

    match serde_json::from_str::<Value>(candidate) {
        Ok(value) => {
            tracing::debug!("Parsed JSON {} from surrounding text", kind);
            Some(value)
        }
        Err(e) => {
            tracing::debug!("Extraction-based JSON parsing also failed: {}", e);
            None
        }
    }
}

/// Slice from the first `open` to the last `close`, inclusive.
///
/// Returns `None` only when one of the delimiters is missing. A last `close`
/// that sits before the first `open` yields an empty slice, which then fails
/// to parse without falling through to the next delimiter pair.
fn outermost(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end < start {
        return Some("");
    }
    Some(&text[start..end + close.len_utf8()])
}

/// First `max` characters of `text`
fn preview(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn structured(raw: &str) -> Value {
        match normalize(raw, OutputFormat::Json) {
            Extraction::Structured(value) => value,
            other => panic!("expected structured value, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_json_object() {
        assert_eq!(
            structured(r#"{"invoice_number": "INV-1"}"#),
            json!({"invoice_number": "INV-1"})
        );
    }

    #[test]
    fn test_fenced_json_is_unwrapped() {
        let raw = "```json\n{\"invoice_number\":\"INV-1\"}\n```";
        assert_eq!(structured(raw), json!({"invoice_number": "INV-1"}));
    }

    #[test]
    fn test_fenced_values_round_trip() {
        let values = [
            json!({"vendor": {"name": "ACME", "gstin": null}, "items": [{"qty": 2, "rate": 10.5}]}),
            json!([1, 2, 3]),
            json!("just a string"),
            json!(42),
            json!(true),
            json!(null),
        ];

        for value in values {
            let raw = format!("```json\n{}\n```", serde_json::to_string_pretty(&value).unwrap());
            assert_eq!(structured(&raw), value);
        }
    }

    #[test]
    fn test_wide_integers_are_kept_exact() {
        let raw = "```json\n{\"account_number\": 12345678901234567890123}\n```";
        assert_eq!(
            structured(raw).to_string(),
            r#"{"account_number":12345678901234567890123}"#
        );

        let raw = "IRN follows: [98765432109876543210987654321, 0.5] done";
        assert_eq!(
            structured(raw).to_string(),
            "[98765432109876543210987654321,0.5]"
        );
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        assert_eq!(structured("  \n ```json [1] ```  \n"), json!([1]));
    }

    #[test]
    fn test_array_recovered_from_prose() {
        assert_eq!(
            structured("here is your data: [1,2,3] thanks!"),
            json!([1, 2, 3])
        );
    }

    #[test]
    fn test_object_recovered_from_prose() {
        assert_eq!(
            structured("Sure! {\"total\": \"100.00\"} Let me know if you need more."),
            json!({"total": "100.00"})
        );
    }

    #[test]
    fn test_array_is_returned_unwrapped() {
        let value = structured(r#"[{"item": "a"}, {"item": "b"}]"#);
        assert!(value.is_array());
        assert_eq!(value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_brackets_take_priority_over_braces() {
        // The inner array is found before the object is ever considered
        assert_eq!(
            structured(r#"Result: {"items": [1, 2]} (end)"#),
            json!([1, 2])
        );
    }

    #[test]
    fn test_failed_array_slice_does_not_fall_back_to_object() {
        let raw = r#"note [see below] {"a": 1}"#;
        match normalize(raw, OutputFormat::Json) {
            Extraction::Diagnostic(diag) => assert_eq!(diag.raw_result, raw),
            other => panic!("expected diagnostic, got {:?}", other),
        }
    }

    #[test]
    fn test_outermost_slice_includes_interior_prose() {
        // Two fragments joined by prose do not parse as one value
        let raw = r#"{"a": 1} and also {"b": 2}"#;
        assert!(matches!(
            normalize(raw, OutputFormat::Json),
            Extraction::Diagnostic(_)
        ));
    }

    #[test]
    fn test_reversed_delimiters_fail_cleanly() {
        let raw = "] nothing here [";
        assert!(matches!(
            normalize(raw, OutputFormat::Json),
            Extraction::Diagnostic(_)
        ));
        assert_eq!(outermost(raw, '[', ']'), Some(""));
    }

    #[test]
    fn test_failure_returns_diagnostic_with_raw_text() {
        let raw = "not json at all";
        let expected = ParseDiagnostic {
            error: "Failed to parse JSON response".to_string(),
            raw_result: raw.to_string(),
            parsing_attempts: vec![
                "Direct JSON parsing failed".to_string(),
                "JSON extraction from text failed".to_string(),
            ],
        };

        assert_eq!(
            normalize(raw, OutputFormat::Json),
            Extraction::Diagnostic(expected)
        );
    }

    #[test]
    fn test_diagnostic_keeps_full_raw_text() {
        let raw = format!("```json\n{}", "x".repeat(2000));
        match normalize(&raw, OutputFormat::Json) {
            Extraction::Diagnostic(diag) => assert_eq!(diag.raw_result, raw),
            other => panic!("expected diagnostic, got {:?}", other),
        }
    }

    #[test]
    fn test_diagnostic_serialization() {
        let body = serde_json::to_value(ParseDiagnostic::new("oops")).unwrap();
        assert_eq!(
            body,
            json!({
                "error": "Failed to parse JSON response",
                "raw_result": "oops",
                "parsing_attempts": ["Direct JSON parsing failed", "JSON extraction from text failed"]
            })
        );
    }

    #[test]
    fn test_text_format_bypasses_parsing() {
        for raw in ["```json\n{\"a\":1}\n```", "  padded  ", "[1,2,3]", ""] {
            assert_eq!(
                normalize(raw, OutputFormat::Text),
                Extraction::Text(raw.to_string())
            );
        }
    }

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_fences("  {}  "), "{}");
        assert_eq!(strip_fences("```json"), "");
        // A bare opening fence without the language tag is left alone
        assert_eq!(strip_fences("```\n{}"), "```\n{}");
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        assert_eq!(preview("héllo", 2), "hé");
        assert_eq!(preview("abc", 10), "abc");
    }
}
