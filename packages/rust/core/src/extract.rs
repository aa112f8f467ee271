//! Recovery of a JSON document from free-form model output.
//!
//! Backends do not reliably honor "return only JSON". [`extract_document`]
//! tries, in order:
//! 1. Direct parse of the whole text
//! 2. Parse inside one ```` ```json ```` / ```` ``` ```` fence: the wrapper of
//!    the whole text if it is fenced, else the first fenced block in it
//! 3. Parse the span from the first `{` to the last `}`
//!
//! Only a JSON object counts as a document. Fence markers inside the
//! document's string values are never touched.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use boardsmith_shared::{BoardsmithError, Result};

/// The whole text wrapped in a single fence; captures the body.
static WRAPPER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A\s*```(?:json)?[ \t]*\r?\n?(.*)```\s*\z").expect("wrapper regex")
});

/// The first fenced block anywhere in the text; captures the body.
static FENCED_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?[ \t]*\r?\n?(.*?)```").expect("fenced block regex")
});

/// Extract a structured document from model text.
///
/// Fails with an extraction error carrying the first 100 characters of
/// `text` when no strategy yields a JSON object.
pub fn extract_document(text: &str) -> Result<Map<String, Value>> {
    if let Some(doc) = parse_object(text) {
        return Ok(doc);
    }

    if let Some(doc) = fenced_body(text).and_then(parse_object) {
        debug!("recovered document from fenced block");
        return Ok(doc);
    }

    if let Some(doc) = brace_span(text).and_then(parse_object) {
        debug!("recovered document from brace-delimited span");
        return Ok(doc);
    }

    Err(BoardsmithError::extraction(text))
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Body of the outer fence wrapper, or of the first fenced block.
fn fenced_body(text: &str) -> Option<&str> {
    WRAPPER_RE
        .captures(text)
        .or_else(|| FENCED_BLOCK_RE.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|body| body.as_str())
}

/// The slice from the first `{` to the last `}`, inclusive.
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn sample() -> Map<String, Value> {
        object(json!({
            "name": "X",
            "role": "Y",
            "goal": "Z",
            "sub_agents": [],
            "tools": [],
            "workflows": []
        }))
    }

    #[test]
    fn plain_json() {
        let doc = sample();
        let text = serde_json::to_string(&doc).unwrap();
        assert_eq!(extract_document(&text).unwrap(), doc);
    }

    #[test]
    fn pretty_json_with_surrounding_whitespace() {
        let doc = sample();
        let text = format!("\n\n{}\n", serde_json::to_string_pretty(&doc).unwrap());
        assert_eq!(extract_document(&text).unwrap(), doc);
    }

    #[test]
    fn fenced_json() {
        let doc = sample();
        let text = format!("```json\n{}\n```", serde_json::to_string(&doc).unwrap());
        assert_eq!(extract_document(&text).unwrap(), doc);

        let text = format!("```\n{}\n```", serde_json::to_string(&doc).unwrap());
        assert_eq!(extract_document(&text).unwrap(), doc);
    }

    #[test]
    fn prose_around_fenced_block() {
        let text = "Sure! Here is the agent specification you asked for:\n\n\
            ```json\n\
            {\"name\":\"X\",\"role\":\"Y\",\"goal\":\"Z\",\"sub_agents\":[],\"tools\":[],\"workflows\":[]}\n\
            ```\n\n\
            Let me know if you want any changes.";
        assert_eq!(extract_document(text).unwrap(), sample());
    }

    #[test]
    fn fence_markers_inside_strings_survive_wrapper() {
        let doc = object(json!({
            "name": "X",
            "tools": [{"name": "shell", "description": "run ```ls``` then stop"}],
            "example": "```json\n{}\n```"
        }));
        let text = format!("```json\n{}\n```", serde_json::to_string(&doc).unwrap());
        assert_eq!(extract_document(&text).unwrap(), doc);

        let pretty = format!("```\n{}\n```\n", serde_json::to_string_pretty(&doc).unwrap());
        assert_eq!(extract_document(&pretty).unwrap(), doc);
    }

    #[test]
    fn fence_markers_inside_strings_survive_prose() {
        let doc = object(json!({"name": "X", "description": "run ```ls``` then stop"}));
        let text = format!(
            "Here you go:\n```json\n{}\n```\nDone.",
            serde_json::to_string(&doc).unwrap()
        );
        assert_eq!(extract_document(&text).unwrap(), doc);
    }

    #[test]
    fn first_fenced_block_wins() {
        let text = "Plan:\n```json\n{\"a\": 1}\n```\nAlternative:\n```json\n{\"a\": 2}\n```";
        assert_eq!(extract_document(text).unwrap(), object(json!({"a": 1})));
    }

    #[test]
    fn prose_around_bare_object() {
        let text = "Result: {\"a\": {\"b\": [1, 2]}} -- done";
        assert_eq!(extract_document(text).unwrap(), object(json!({"a": {"b": [1, 2]}})));
    }

    #[test]
    fn nested_braces_inside_strings_survive() {
        let doc = object(json!({"template": "use {name} here", "n": 1}));
        let text = format!("prefix {} suffix", serde_json::to_string(&doc).unwrap());
        assert_eq!(extract_document(&text).unwrap(), doc);
    }

    #[test]
    fn no_braces_fails() {
        let err = extract_document("I could not produce a plan for this board.").unwrap_err();
        assert_eq!(err.kind(), boardsmith_shared::ErrorKind::Extraction);
        assert!(err.to_string().contains("I could not produce a plan"));
    }

    #[test]
    fn non_object_json_fails() {
        assert!(extract_document("[1, 2, 3]").is_err());
        assert!(extract_document("42").is_err());
    }

    #[test]
    fn unbalanced_span_fails() {
        assert!(extract_document("} nothing here {").is_err());
        assert!(extract_document("{\"a\": ").is_err());
    }

    #[test]
    fn error_prefix_is_bounded() {
        let text = format!("no json {}", "z".repeat(1_000));
        let err = extract_document(&text).unwrap_err();
        match err {
            BoardsmithError::Extraction { prefix } => {
                assert_eq!(prefix.chars().count(), 100);
                assert!(prefix.starts_with("no json"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
