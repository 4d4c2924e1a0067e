use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use shared::result::StructuredResult;
use std::sync::LazyLock;
use tracing::{debug, warn};

pub const FALLBACK_CHANGE_NOTE: &str =
    "Response was not structured JSON; used the returned text as code";

// First fenced block; an unclosed fence runs to the end of the text.
static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[\w+.-]*[ \t]*\n?(.*?)(?:```|\z)").expect("valid regex"));

#[derive(Debug, Deserialize)]
struct WireResult {
    #[serde(default)]
    thinking: Option<String>,
    code: String,
    #[serde(default)]
    changes_made: Option<Vec<Value>>,
    #[serde(default)]
    preserved_elements: Option<Vec<Value>>,
}

fn stringify_items(items: Option<Vec<Value>>) -> Vec<String> {
    items
        .unwrap_or_default()
        .into_iter()
        .map(|item| match item {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .collect()
}

impl From<WireResult> for StructuredResult {
    fn from(w: WireResult) -> Self {
        StructuredResult {
            reasoning: w.thinking.unwrap_or_default(),
            code: w.code,
            changes: stringify_items(w.changes_made),
            preserved: stringify_items(w.preserved_elements),
        }
    }
}

/// Interpret a completed answer. Never fails: when the model ignored the
/// schema the raw text (or the first fenced block in it) becomes the code.
pub fn parse_structured(content: &str) -> StructuredResult {
    let trimmed = content.trim();
    if let Some(result) = try_structured(trimmed) {
        return result;
    }

    let fenced = FENCE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim());

    if let Some(inner) = fenced {
        if let Some(result) = try_structured(inner) {
            debug!("Structured answer was wrapped in a code fence");
            return result;
        }
    }

    if let (Some(open), Some(close)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if open < close {
            if let Some(result) = try_structured(&trimmed[open..=close]) {
                debug!("Structured answer was surrounded by prose");
                return result;
            }
        }
    }

    warn!(
        "Model answer was not structured JSON ({} chars), using raw text as code",
        content.len()
    );
    StructuredResult {
        reasoning: String::new(),
        code: fenced.unwrap_or(trimmed).to_string(),
        changes: vec![FALLBACK_CHANGE_NOTE.to_string()],
        preserved: Vec::new(),
    }
}

fn try_structured(text: &str) -> Option<StructuredResult> {
    if !text.starts_with('{') {
        return None;
    }
    let wire = serde_json::from_str::<WireResult>(text).ok()?;
    if wire.code.trim().is_empty() {
        debug!("Structured answer carried no code");
        return None;
    }
    Some(wire.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_answer() {
        let text = r#"{"thinking":"add a button","code":"<button>Go</button>","changes_made":["Added button"],"preserved_elements":["header"]}"#;
        let result = parse_structured(text);
        assert_eq!(result.reasoning, "add a button");
        assert_eq!(result.code, "<button>Go</button>");
        assert_eq!(result.changes, vec!["Added button"]);
        assert_eq!(result.preserved, vec!["header"]);
    }

    #[test]
    fn test_missing_lists_default_to_empty() {
        let result = parse_structured(r#"{"code":"x = 1"}"#);
        assert_eq!(result.code, "x = 1");
        assert!(result.changes.is_empty());
        assert!(result.reasoning.is_empty());
    }

    #[test]
    fn test_fenced_code_fallback() {
        let result = parse_structured("Sorry, here's your code:\n```\nconsole.log(1)\n```");
        assert_eq!(result.code, "console.log(1)");
        assert!(!result.changes.is_empty());
        assert_eq!(result.changes[0], FALLBACK_CHANGE_NOTE);
    }

    #[test]
    fn test_fence_with_language_tag() {
        let result = parse_structured("```html\n<h1>Hi</h1>\n```\nEnjoy!");
        assert_eq!(result.code, "<h1>Hi</h1>");
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let result = parse_structured("Here:\n```python\nprint('a')\nprint('b')");
        assert_eq!(result.code, "print('a')\nprint('b')");
    }

    #[test]
    fn test_structured_json_inside_fence() {
        let text = "```json\n{\"thinking\":\"t\",\"code\":\"<p></p>\",\"changes_made\":[\"p\"],\"preserved_elements\":[]}\n```";
        let result = parse_structured(text);
        assert_eq!(result.code, "<p></p>");
        assert_eq!(result.changes, vec!["p"]);
    }

    #[test]
    fn test_structured_json_after_prose() {
        let text = "Sure! {\"code\":\"let a = 1;\",\"changes_made\":[\"a\"]} Hope that helps.";
        let result = parse_structured(text);
        assert_eq!(result.code, "let a = 1;");
        assert_eq!(result.changes, vec!["a"]);
    }

    #[test]
    fn test_raw_text_fallback() {
        let result = parse_structured("  <div>plain</div>\n");
        assert_eq!(result.code, "<div>plain</div>");
        assert_eq!(result.changes.len(), 1);
    }

    #[test]
    fn test_empty_code_is_not_a_structured_answer() {
        let text = r#"{"thinking":"x","code":"  ","changes_made":[],"preserved_elements":[]}"#;
        let result = parse_structured(text);
        assert!(!result.code.trim().is_empty());
        assert_eq!(result.changes, vec![FALLBACK_CHANGE_NOTE]);
    }

    #[test]
    fn test_non_string_list_items_are_stringified() {
        let text = r#"{"thinking":"t","code":"<p>x</p>","changes_made":[{"what":"added p"},3,"kept"],"preserved_elements":[true]}"#;
        let result = parse_structured(text);
        assert_eq!(result.code, "<p>x</p>");
        assert_eq!(result.changes, vec![r#"{"what":"added p"}"#, "3", "kept"]);
        assert_eq!(result.preserved, vec!["true"]);
    }

    #[test]
    fn test_null_fields_default_to_empty() {
        let text = r#"{"thinking":null,"code":"<p>x</p>","changes_made":null}"#;
        let result = parse_structured(text);
        assert_eq!(result.code, "<p>x</p>");
        assert!(result.reasoning.is_empty());
        assert!(result.changes.is_empty());
        assert!(result.preserved.is_empty());
    }

    #[test]
    fn test_javascript_braces_are_not_mistaken_for_json() {
        let result = parse_structured("function f() { return 1; }");
        assert_eq!(result.code, "function f() { return 1; }");
        assert_eq!(result.changes[0], FALLBACK_CHANGE_NOTE);
    }
}
