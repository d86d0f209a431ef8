//! Recovering JSON from chat replies.
//!
//! Models asked for JSON often wrap it in a markdown fence. The prompts ask
//! for an object, but the reply is untrusted text.

use serde_json::{json, Value};

/// Strip surrounding whitespace and a markdown code fence, if present.
pub fn clean_json_response(text: &str) -> &str {
    let mut cleaned = text.trim();
    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest;
    } else if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest;
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest;
    }
    cleaned.trim()
}

/// Parse a reply as JSON, falling back to `{"raw_response": text}`.
pub fn parse_structured(text: &str) -> Value {
    match serde_json::from_str::<Value>(clean_json_response(text)) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("Model reply was not valid JSON ({}), returning raw text", e);
            json!({ "raw_response": text })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_fenced_json() {
        let reply = "```json\n{\"title\": \"Silk Scarf\"}\n```";
        assert_eq!(clean_json_response(reply), "{\"title\": \"Silk Scarf\"}");
    }

    #[test]
    fn test_clean_bare_fence() {
        assert_eq!(clean_json_response("```\n[1, 2]\n```  "), "[1, 2]");
    }

    #[test]
    fn test_parse_structured_object() {
        let value = parse_structured("  ```json\n{\"category\": \"Textiles\", \"materials\": [\"silk\"]}```");
        assert_eq!(value["category"], "Textiles");
        assert_eq!(value["materials"][0], "silk");
    }

    #[test]
    fn test_parse_structured_falls_back_to_raw() {
        let reply = "Here is a lovely title: Silk Scarf";
        let value = parse_structured(reply);
        assert_eq!(value, json!({ "raw_response": reply }));
    }
}
