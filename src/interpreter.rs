//! Recovery of a structured star rating from free-text model replies.
//!
//! Models do not reliably follow formatting instructions: the JSON object may
//! arrive bare, inside a fenced code block, or surrounded by prose. Recovery
//! tries an ordered list of pure strategies and keeps the first object found,
//! then validates the `predicted_stars` field.

pub use crate::models::PARSE_FAILURE;
use crate::models::Prediction;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

pub const STARS_KEY: &str = "predicted_stars";
pub const EXPLANATION_KEY: &str = "explanation";
pub const DEFAULT_EXPLANATION: &str = "No explanation provided";

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*\n?(.*?)\n?```").expect("Invalid fenced block regex pattern")
});

// Flat objects only: a nested brace anywhere in the object defeats the match.
static STARS_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{[^{}]*"predicted_stars"[^{}]*\}"#).expect("Invalid stars object regex pattern")
});

type JsonObject = Map<String, Value>;

/// A recovery strategy: given the trimmed reply, maybe produce an object
type Strategy = fn(&str) -> Option<JsonObject>;

/// Tried in order; the first `Some` wins.
const STRATEGIES: &[Strategy] = &[parse_candidate, scan_for_stars_object];

/// Interpret a raw model reply as a star prediction
pub fn interpret(raw: &str) -> Prediction {
    match extract_object(raw) {
        Some(object) => validate(&object),
        None => Prediction::invalid(PARSE_FAILURE),
    }
}

/// Run the recovery strategies against the trimmed reply
pub fn extract_object(raw: &str) -> Option<JsonObject> {
    let text = raw.trim();
    STRATEGIES.iter().find_map(|strategy| strategy(text))
}

/// Interior of the first fenced code block, if any
fn fenced_interior(text: &str) -> Option<&str> {
    FENCED_BLOCK
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// Parse the fenced interior, or the whole text when there is no fence
fn parse_candidate(text: &str) -> Option<JsonObject> {
    let candidate = fenced_interior(text).unwrap_or(text);
    parse_object(candidate)
}

/// Find the first flat object mentioning `predicted_stars` anywhere in the text
fn scan_for_stars_object(text: &str) -> Option<JsonObject> {
    STARS_OBJECT
        .find(text)
        .and_then(|m| parse_object(m.as_str()))
}

fn parse_object(candidate: &str) -> Option<JsonObject> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

/// Check the recovered object and build the prediction
fn validate(object: &JsonObject) -> Prediction {
    let Some(stars) = object
        .get(STARS_KEY)
        .and_then(Value::as_i64)
        .and_then(|stars| u8::try_from(stars).ok())
    else {
        return Prediction::invalid(PARSE_FAILURE);
    };

    let explanation = match object.get(EXPLANATION_KEY) {
        None | Some(Value::Null) => DEFAULT_EXPLANATION.to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    };

    Prediction::valid(stars, explanation)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_failed(prediction: &Prediction) {
        assert_eq!(prediction.predicted_stars, None);
        assert_eq!(prediction.explanation, PARSE_FAILURE);
        assert!(!prediction.valid);
    }

    #[test]
    fn test_bare_object() {
        let prediction = interpret(r#"{"predicted_stars": 5, "explanation": "great food"}"#);
        assert_eq!(prediction, Prediction::valid(5, "great food"));
    }

    #[test]
    fn test_bare_object_with_whitespace() {
        let prediction = interpret("\n\n  {\"predicted_stars\": 1, \"explanation\": \"awful\"}  \n");
        assert_eq!(prediction, Prediction::valid(1, "awful"));
    }

    #[test]
    fn test_fenced_object_without_explanation() {
        let prediction = interpret("```json\n{\"predicted_stars\": 2}\n```");
        assert_eq!(prediction, Prediction::valid(2, DEFAULT_EXPLANATION));
    }

    #[test]
    fn test_inline_fence_without_tag() {
        let prediction = interpret(r#"```{"predicted_stars": 2}```"#);
        assert_eq!(prediction, Prediction::valid(2, DEFAULT_EXPLANATION));
    }

    #[test]
    fn test_fence_matches_unwrapped_result() {
        let bare = r#"{"predicted_stars": 4, "explanation": "good pasta"}"#;
        let fenced = format!("Here you go:\n```json\n{bare}\n```\nHope that helps.");
        assert_eq!(interpret(bare), interpret(&fenced));
    }

    #[test]
    fn test_object_in_prose() {
        let prediction = interpret(
            r#"Sure! Based on the tone: {"predicted_stars": 3, "explanation": "mixed"} Let me know."#,
        );
        assert_eq!(prediction, Prediction::valid(3, "mixed"));
    }

    #[test]
    fn test_out_of_range_in_prose() {
        let prediction =
            interpret(r#"I think this is great! {"predicted_stars": 7, "explanation": "too high"}"#);
        assert_failed(&prediction);
    }

    #[test]
    fn test_out_of_range_values() {
        for stars in ["0", "6", "-1", "100"] {
            let prediction = interpret(&format!(r#"{{"predicted_stars": {stars}}}"#));
            assert_failed(&prediction);
        }
    }

    #[test]
    fn test_non_integer_values() {
        for stars in [r#""4""#, "4.0", "3.5", "true", "null", "[4]"] {
            let prediction = interpret(&format!(r#"{{"predicted_stars": {stars}}}"#));
            assert_failed(&prediction);
        }
    }

    #[test]
    fn test_missing_stars_key() {
        assert_failed(&interpret(r#"{"rating": 4, "explanation": "wrong key"}"#));
    }

    #[test]
    fn test_no_object() {
        assert_failed(&interpret("This review seems positive overall."));
        assert_failed(&interpret(""));
    }

    #[test]
    fn test_non_object_json() {
        assert_failed(&interpret("4"));
        assert_failed(&interpret(r#""predicted_stars""#));
    }

    #[test]
    fn test_array_wrapper_recovered_by_scan() {
        let prediction = interpret(r#"[{"predicted_stars": 4}]"#);
        assert_eq!(prediction, Prediction::valid(4, DEFAULT_EXPLANATION));
    }

    #[test]
    fn test_scan_uses_original_text_when_fence_is_not_json() {
        let raw = "```\nnot json at all\n```\nFinal answer: {\"predicted_stars\": 4}";
        assert_eq!(interpret(raw), Prediction::valid(4, DEFAULT_EXPLANATION));
    }

    #[test]
    fn test_broken_fence_falls_back_to_scan() {
        let raw = "```json\n{\"predicted_stars\": 5, \"explanation\": \"ok\"\n```\n{\"predicted_stars\": 5, \"explanation\": \"ok\"}";
        assert_eq!(interpret(raw), Prediction::valid(5, "ok"));
    }

    #[test]
    fn test_scan_takes_first_match() {
        let raw = r#"Draft {"predicted_stars": 2} then revised {"predicted_stars": 4}"#;
        assert_eq!(interpret(raw), Prediction::valid(2, DEFAULT_EXPLANATION));
    }

    #[test]
    fn test_nested_object_in_prose_is_not_recovered() {
        let raw = r#"Answer: {"predicted_stars": 4, "explanation": {"tone": "warm"}}"#;
        assert_failed(&interpret(raw));
    }

    #[test]
    fn test_nested_object_parses_when_bare() {
        let raw = r#"{"predicted_stars": 4, "explanation": {"tone": "warm"}}"#;
        assert_eq!(interpret(raw), Prediction::valid(4, r#"{"tone":"warm"}"#));
    }

    #[test]
    fn test_null_explanation_uses_default() {
        let prediction = interpret(r#"{"predicted_stars": 3, "explanation": null}"#);
        assert_eq!(prediction, Prediction::valid(3, DEFAULT_EXPLANATION));
    }

    #[test]
    fn test_interpret_is_idempotent() {
        let inputs = [
            r#"{"predicted_stars": 5, "explanation": "great food"}"#,
            "```json\n{\"predicted_stars\": 2}\n```",
            r#"I think this is great! {"predicted_stars": 7, "explanation": "too high"}"#,
            "This review seems positive overall.",
        ];
        for raw in inputs {
            assert_eq!(interpret(raw), interpret(raw));
        }
    }

    #[test]
    fn test_extract_object_returns_raw_map() {
        let object = extract_object(r#"noise {"predicted_stars": 9} noise"#).unwrap();
        assert_eq!(object.get(STARS_KEY), Some(&Value::from(9)));
    }
}
