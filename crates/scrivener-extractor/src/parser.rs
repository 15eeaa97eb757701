//! Parse provider output into a value map
//!
//! Providers do not reliably emit well-formed JSON. The response is cut down
//! to its outermost object and then parsed in stages, each stage attempted
//! only when the previous one failed.

use crate::error::ExtractorError;
use crate::types::{FieldSelection, RepairStage};
use regex::{Captures, Regex};
use scrivener_domain::{FieldCatalog, ValueMap};
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, info};

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json|JSON)?").expect("valid regex"));

/// Quote-delimited segments, ignoring escapes
static SIMPLE_LITERAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""[^"]*""#).expect("valid regex"));

/// Quote-delimited segments that may contain escaped quotes or backslashes
static ESCAPED_LITERAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)"(?:[^"\\]|\\.)*""#).expect("valid regex"));

/// A parsed provider response
#[derive(Debug, Clone)]
pub struct ParsedResponse {
    /// Flat path → value map, in emission order
    pub values: ValueMap,

    /// Stage that produced it
    pub stage: RepairStage,
}

/// Parse a raw provider response
///
/// `excerpt_chars` bounds the diagnostic excerpts carried by the error when
/// every stage fails.
pub fn parse_response(raw: &str, excerpt_chars: usize) -> Result<ParsedResponse, ExtractorError> {
    let stripped = FENCE_RE.replace_all(raw, "");
    let extracted = outermost_object(&stripped);

    let mut last_error = match parse_object(extracted) {
        Ok(values) => return Ok(done(values, RepairStage::Direct)),
        Err(e) => e,
    };
    debug!("Direct parse failed: {}", last_error);

    for (regex, stage) in [
        (&*SIMPLE_LITERAL_RE, RepairStage::EscapedControls),
        (&*ESCAPED_LITERAL_RE, RepairStage::EscapedControlsWithQuotes),
    ] {
        let repaired = regex.replace_all(extracted, |caps: &Captures| escape_controls(&caps[0]));
        match parse_object(&repaired) {
            Ok(values) => return Ok(done(values, stage)),
            Err(e) => {
                debug!("Repair stage {} failed: {}", stage, e);
                last_error = e;
            }
        }
    }

    Err(ExtractorError::Parse {
        message: last_error,
        original_excerpt: excerpt(raw, excerpt_chars),
        extracted_excerpt: excerpt(extracted, excerpt_chars),
    })
}

/// Check that every enabled, non-virtual catalog field is present
///
/// A field counts as present when a key names it, addresses something
/// beneath it, or names an ancestor object holding the child property.
pub fn validate_required(
    values: &ValueMap,
    catalog: &FieldCatalog,
    selection: &FieldSelection,
) -> Result<(), ExtractorError> {
    let missing: Vec<String> = catalog
        .iter()
        .filter(|f| !f.is_virtual && !values.holds(&f.path))
        .map(|f| f.path.to_string())
        .filter(|path| selection.is_enabled(path))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ExtractorError::MissingFields(missing))
    }
}

fn done(values: ValueMap, stage: RepairStage) -> ParsedResponse {
    info!("Parsed {} values (stage: {})", values.len(), stage);
    ParsedResponse { values, stage }
}

/// Substring from the first `{` to the last `}`, or the whole text
fn outermost_object(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text.trim(),
    }
}

fn parse_object(text: &str) -> Result<ValueMap, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(ValueMap::from(map)),
        Ok(_) => Err("response is not a JSON object".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

/// Escape raw control characters; existing escape sequences are untouched
fn escape_controls(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    for c in literal.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0C}' => out.push_str("\\f"),
            '\u{08}' => out.push_str("\\b"),
            c if c.is_control() && (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}

fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrivener_domain::{DocNode, FieldKind, FieldPath, SchemaField};

    #[test]
    fn test_direct_parse() {
        let parsed = parse_response(r#"{"title":"Hi"}"#, 500).unwrap();
        assert_eq!(parsed.stage, RepairStage::Direct);
        assert_eq!(parsed.values.get("title"), Some(&DocNode::string("Hi")));
    }

    #[test]
    fn test_fenced_with_prose() {
        let raw = "Here you go:\n```json\n{\"title\": \"Hi\", \"n\": 2}\n```\nEnjoy!";
        let parsed = parse_response(raw, 500).unwrap();
        assert_eq!(parsed.stage, RepairStage::Direct);
        assert_eq!(parsed.values.len(), 2);
    }

    #[test]
    fn test_raw_newline_repaired_at_stage_two() {
        let raw = "{\"body\": \"line one\nline two\", \"title\": \"T\"}";
        let parsed = parse_response(raw, 500).unwrap();
        assert_eq!(parsed.stage, RepairStage::EscapedControls);

        let expected = parse_response(r#"{"body": "line one\nline two", "title": "T"}"#, 500).unwrap();
        assert_eq!(parsed.values, expected.values);
    }

    #[test]
    fn test_escaped_quotes_need_stage_three() {
        // A lone escaped quote shifts plain quote pairing, leaving the raw
        // newline outside every matched segment.
        let raw = "{\"a\": \"5\\\" tall\", \"b\": \"x\ny\"}";
        let parsed = parse_response(raw, 500).unwrap();
        assert_eq!(parsed.stage, RepairStage::EscapedControlsWithQuotes);
        assert_eq!(parsed.values.get("a"), Some(&DocNode::string("5\" tall")));
        assert_eq!(parsed.values.get("b"), Some(&DocNode::string("x\ny")));
    }

    #[test]
    fn test_already_escaped_sequences_untouched() {
        let raw = "{\"a\": \"keep \\n this\", \"b\": \"raw\ttab\"}";
        let parsed = parse_response(raw, 500).unwrap();
        assert_eq!(parsed.values.get("a"), Some(&DocNode::string("keep \n this")));
        assert_eq!(parsed.values.get("b"), Some(&DocNode::string("raw\ttab")));
    }

    #[test]
    fn test_no_braces_is_parse_error() {
        let result = parse_response("I could not write that article.", 500);
        assert!(matches!(result, Err(ExtractorError::Parse { .. })));
    }

    #[test]
    fn test_parse_error_excerpts_are_truncated() {
        let raw = format!("{{\"a\": {}", "x".repeat(2_000));
        match parse_response(&raw, 500) {
            Err(ExtractorError::Parse {
                original_excerpt,
                extracted_excerpt,
                ..
            }) => {
                assert_eq!(original_excerpt.chars().count(), 500);
                assert!(extracted_excerpt.chars().count() <= 500);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(parse_response("[1, 2, 3]", 500).is_err());
    }

    fn catalog() -> FieldCatalog {
        let mut catalog = FieldCatalog::new("post");
        for (path, kind) in [
            ("title", FieldKind::String),
            ("seo", FieldKind::Object),
            ("modules", FieldKind::Array),
        ] {
            catalog
                .insert(SchemaField::new(FieldPath::parse(path).unwrap(), kind, path))
                .unwrap();
        }
        catalog
            .insert(
                SchemaField::new(FieldPath::parse("seo.metaTitle").unwrap(), FieldKind::String, "Meta")
                    .with_parent(FieldPath::root("seo")),
            )
            .unwrap();
        catalog
            .insert(
                SchemaField::new(
                    FieldPath::parse("modules[].quoteModule.quote").unwrap(),
                    FieldKind::Text,
                    "Quote",
                )
                .with_parent(FieldPath::root("modules"))
                .in_array_item(Some("quoteModule".to_string())),
            )
            .unwrap();
        catalog
    }

    #[test]
    fn test_validation_accepts_nested_and_ancestor_keys() {
        let catalog = catalog();
        let selection = FieldSelection::all(&catalog);
        let parsed = parse_response(
            r#"{"title": "T", "seo": {"metaTitle": "M"}, "modules[0].quoteModule.quote": "Q"}"#,
            500,
        )
        .unwrap();
        assert!(validate_required(&parsed.values, &catalog, &selection).is_ok());
    }

    #[test]
    fn test_validation_reports_missing_fields() {
        let catalog = catalog();
        let selection = FieldSelection::all(&catalog);
        let parsed = parse_response(r#"{"seo.metaTitle": "M"}"#, 500).unwrap();
        match validate_required(&parsed.values, &catalog, &selection) {
            Err(ExtractorError::MissingFields(missing)) => {
                assert_eq!(missing, vec!["title".to_string(), "modules".to_string()]);
            }
            other => panic!("expected missing fields, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_rejects_ancestor_without_child() {
        let catalog = catalog();
        let selection = FieldSelection::all(&catalog);
        for seo in [r#"{}"#, r#""nonsense""#, r#"{"other": 1}"#] {
            let raw = format!(
                r#"{{"title": "T", "seo": {}, "modules[0].quoteModule.quote": "Q"}}"#,
                seo
            );
            let parsed = parse_response(&raw, 500).unwrap();
            match validate_required(&parsed.values, &catalog, &selection) {
                Err(ExtractorError::MissingFields(missing)) => {
                    assert_eq!(missing, vec!["seo.metaTitle".to_string()]);
                }
                other => panic!("expected missing seo.metaTitle for {}, got {:?}", seo, other),
            }
        }
    }

    #[test]
    fn test_validation_ignores_disabled_fields() {
        let catalog = catalog();
        let selection = FieldSelection::new().enable("title");
        let parsed = parse_response(r#"{"title": "T"}"#, 500).unwrap();
        assert!(validate_required(&parsed.values, &catalog, &selection).is_ok());
    }
}
