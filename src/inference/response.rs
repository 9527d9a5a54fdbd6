//! Response-shape normalization for hosted inference results.
//!
//! The provider is not consistent about payload shape across models:
//! image-to-text models typically answer `[{ "generated_text": "..." }]`,
//! some return a bare JSON string, and a few use alternate field names.
//! Both extractors walk a fallback chain and reduce anything unrecognized
//! to an empty string, which callers treat according to their own policy.

use serde_json::Value;

/// Extract recognized text from an image-to-text response.
///
/// Chain: first array element's `generated_text`, then a bare string,
/// then `generated_text` / `text` / `output` on a top-level object.
pub fn extract_text(value: &Value) -> String {
    if let Some(first) = value.as_array().and_then(|items| items.first()) {
        if let Some(text) = first.get("generated_text").and_then(Value::as_str) {
            return text.trim().to_string();
        }
    }

    if let Some(text) = value.as_str() {
        return text.trim().to_string();
    }

    for field in ["generated_text", "text", "output"] {
        if let Some(text) = value.get(field).and_then(Value::as_str) {
            return text.trim().to_string();
        }
    }

    String::new()
}

/// Extract the generated answer from a text-generation response.
///
/// Unlike [`extract_text`], an array response joins every element's
/// `generated_text` with newlines (multi-sequence generations).
pub fn extract_answer(value: &Value) -> String {
    if let Some(items) = value.as_array() {
        let joined = items
            .iter()
            .filter_map(|item| item.get("generated_text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n");
        return joined.trim().to_string();
    }

    if let Some(text) = value.get("generated_text").and_then(Value::as_str) {
        return text.trim().to_string();
    }

    if let Some(text) = value.as_str() {
        return text.trim().to_string();
    }

    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_from_array_takes_first_element() {
        let value = json!([
            { "generated_text": "  hello world " },
            { "generated_text": "ignored" }
        ]);
        assert_eq!(extract_text(&value), "hello world");
    }

    #[test]
    fn text_from_bare_string() {
        assert_eq!(extract_text(&json!("  plain  ")), "plain");
    }

    #[test]
    fn text_from_alternate_fields() {
        assert_eq!(extract_text(&json!({ "text": "a" })), "a");
        assert_eq!(extract_text(&json!({ "output": "b" })), "b");
        assert_eq!(extract_text(&json!({ "generated_text": "c" })), "c");
    }

    #[test]
    fn unrecognized_shape_reduces_to_empty() {
        assert_eq!(extract_text(&json!({ "unexpected": 42 })), "");
        assert_eq!(extract_text(&json!(null)), "");
    }

    #[test]
    fn answer_joins_array_elements() {
        let value = json!([
            { "generated_text": "first" },
            { "generated_text": "second" }
        ]);
        assert_eq!(extract_answer(&value), "first\nsecond");
    }

    #[test]
    fn answer_from_object_and_string() {
        assert_eq!(extract_answer(&json!({ "generated_text": " x " })), "x");
        assert_eq!(extract_answer(&json!("raw")), "raw");
        assert_eq!(extract_answer(&json!({ "other": 1 })), "");
    }
}
