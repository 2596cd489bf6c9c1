// SPDX-License-Identifier: MIT

//! Instruction templating against shared state
//!
//! Placeholder syntax:
//! - `{key}`: required state value, error if missing
//! - `{key?}`: optional state value, empty string if missing
//! - anything else in braces (e.g. `{ not a key }`, `{{json}}`) is kept as is

use super::error::{AdkError, Result};
use super::state::SessionState;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{+[^{}]*\}+").expect("valid placeholder regex"));

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Resolve every placeholder in `template` against `state`.
///
/// `agent` is only used to name the culprit in the error.
pub fn inject_state(agent: &str, template: &str, state: &SessionState) -> Result<String> {
    let mut result = String::with_capacity(template.len());
    let mut last_end = 0;

    for m in PLACEHOLDER.find_iter(template) {
        result.push_str(&template[last_end..m.start()]);
        last_end = m.end();

        let raw = m.as_str();
        // Doubled braces are literal text
        if raw.starts_with("{{") {
            result.push_str(raw);
            continue;
        }

        // One brace each side; extra closing braces stay as text
        let close = raw.find('}').unwrap_or(raw.len());
        let (body, trailing) = (&raw[1..close], raw.get(close + 1..).unwrap_or(""));
        let inner = body.trim();
        let (key, optional) = match inner.strip_suffix('?') {
            Some(k) => (k, true),
            None => (inner, false),
        };

        if !is_identifier(key) {
            result.push_str(raw);
            continue;
        }

        match state.get(key) {
            Some(value) => result.push_str(&render_value(value)),
            None if optional => {}
            None => {
                return Err(AdkError::MissingStateKey {
                    agent: agent.to_string(),
                    key: key.to_string(),
                })
            }
        }
        result.push_str(trailing);
    }

    result.push_str(&template[last_end..]);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state() -> SessionState {
        let mut s = SessionState::new();
        s.set("topic", json!("A robot learning to paint"));
        s.set("score", json!(7));
        s
    }

    #[test]
    fn test_plain_text_unchanged() {
        let out = inject_state("a", "No placeholders here.", &state()).unwrap();
        assert_eq!(out, "No placeholders here.");
    }

    #[test]
    fn test_required_placeholder() {
        let out = inject_state("a", "Write about {topic}.", &state()).unwrap();
        assert_eq!(out, "Write about A robot learning to paint.");
    }

    #[test]
    fn test_non_string_value_rendered_as_json() {
        let out = inject_state("a", "Score: {score}", &state()).unwrap();
        assert_eq!(out, "Score: 7");
    }

    #[test]
    fn test_missing_required_placeholder_errors() {
        let err = inject_state("synthesis_agent", "R: {ev_technology_result}", &state())
            .unwrap_err();
        match err {
            AdkError::MissingStateKey { agent, key } => {
                assert_eq!(agent, "synthesis_agent");
                assert_eq!(key, "ev_technology_result");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_optional_placeholder() {
        let out = inject_state("a", "[{criticism?}]", &state()).unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_non_identifier_kept_literal() {
        let out = inject_state("a", "Reply as { \"k\": 1 } or {1abc}", &state()).unwrap();
        assert_eq!(out, "Reply as { \"k\": 1 } or {1abc}");
    }

    #[test]
    fn test_double_braces_kept_literal() {
        let out = inject_state("a", "Use {{topic}} literally", &state()).unwrap();
        assert_eq!(out, "Use {{topic}} literally");
    }

    #[test]
    fn test_extra_closing_brace_kept() {
        let out = inject_state("a", "{\"topic\": {topic}}", &state()).unwrap();
        assert_eq!(out, "{\"topic\": A robot learning to paint}");

        let out = inject_state("a", "{score}}}", &state()).unwrap();
        assert_eq!(out, "7}}");
    }

    #[test]
    fn test_multiple_placeholders() {
        let mut s = state();
        s.set("criticism", json!("Add a twist."));
        let out = inject_state("a", "{topic} / {criticism}", &s).unwrap();
        assert_eq!(out, "A robot learning to paint / Add a twist.");
    }
}
