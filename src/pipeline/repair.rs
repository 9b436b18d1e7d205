//! Best-effort repair of model-written tool-call payloads.
//!
//! Small models regularly emit almost-JSON: bare keys, single-quoted strings,
//! trailing commas, or prose after the object. The heuristics here recover the
//! common cases only. Anything they cannot fix is reported as "no directive"
//! and the text flows through as prose, so false negatives are expected.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static UNQUOTED_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([{,]\s*)([A-Za-z_][A-Za-z0-9_\-]*)(\s*:)"#).expect("static regex")
});

static SINGLE_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([:\[{,]\s*)'([^'"]*)'"#).expect("static regex"));

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("static regex"));

/// A tool invocation recovered from the model's text.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Map<String, Value>,
}

/// Byte offset just past the brace that closes the object opening at
/// `text[0]`, or `None` while the object is still incomplete.
///
/// String literals (either quote style) are skipped so braces inside values
/// do not count.
pub fn object_end(text: &str) -> Option<usize> {
    if !text.starts_with('{') {
        return None;
    }

    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (index, c) in text.char_indices() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == open {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(index + 1);
                }
            }
            _ => {}
        }
    }

    None
}

/// Apply the repair heuristics to a payload that failed to parse as-is.
pub fn repair(payload: &str) -> String {
    let trimmed = payload.trim();
    let start = trimmed.find('{').unwrap_or(0);
    let object = &trimmed[start..];
    let object = object_end(object).map_or(object, |end| &object[..end]);

    let requoted = SINGLE_QUOTED.replace_all(object, r#"$1"$2""#);
    let keyed = UNQUOTED_KEY.replace_all(&requoted, r#"$1"$2"$3"#);
    TRAILING_COMMA.replace_all(&keyed, "$1").into_owned()
}

/// Parse a directive payload, repairing it when strict parsing fails.
///
/// Accepts only objects with a string `name` and an object `arguments`.
pub fn parse_tool_call(payload: &str) -> Option<ToolCall> {
    let value = serde_json::from_str::<Value>(payload.trim())
        .ok()
        .or_else(|| serde_json::from_str::<Value>(&repair(payload)).ok())?;

    let Value::Object(mut object) = value else {
        tracing::debug!("Discarding tool directive whose payload is not an object");
        return None;
    };

    let Some(Value::String(name)) = object.remove("name") else {
        tracing::debug!("Discarding tool directive without a string name field");
        return None;
    };

    let Some(Value::Object(arguments)) = object.remove("arguments") else {
        tracing::debug!(tool = %name, "Discarding tool directive without object arguments");
        return None;
    };

    Some(ToolCall { name, arguments })
}
