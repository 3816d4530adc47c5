//! Map model replies onto the prompt's expected fields.
//!
//! Structured replies are filtered to the expected field set. Free-text
//! replies are searched for an embedded JSON object first; only replies
//! without one are read as `field: value` lines. Any expected field without a value is set to
//! [`UNSURE`].

use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::state_machine::{TranscriptionFields, UNSURE};

/// Keys models sometimes wrap the real field object in.
const WRAPPER_KEYS: &[&str] = &["transcription", "text", "fields", "result"];

/// Field name used when the prompt declares no fields and the reply is plain prose.
const FREE_TEXT_FIELD: &str = "transcription";

pub fn structure_object(
    object: &Map<String, Value>,
    expected: &[&str],
) -> Result<TranscriptionFields, ParseError> {
    let object = unwrap_nested(object);

    if expected.is_empty() {
        let mut fields = TranscriptionFields::new();
        for (key, value) in object {
            fields.insert(key.as_str(), value_text(value).unwrap_or_else(|| UNSURE.to_string()));
        }
        return confident(fields, "the reply object is empty");
    }

    let fields = fill(expected, |name| {
        let wanted = normalize(name);
        object
            .iter()
            .find(|(k, _)| normalize(k) == wanted)
            .and_then(|(_, v)| value_text(v))
    });
    confident(fields, "none of the expected fields were present in the reply")
}

pub fn structure_text(text: &str, expected: &[&str]) -> Result<TranscriptionFields, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError("the reply was empty".to_string()));
    }

    // An embedded object is the reply; its JSON lines are not `key: value` pairs.
    if let Some(object) = find_json_object(text) {
        return structure_object(&object, expected);
    }

    let pairs = key_value_lines(text);

    if expected.is_empty() {
        let mut fields = TranscriptionFields::new();
        if pairs.is_empty() {
            fields.insert(FREE_TEXT_FIELD, text);
        } else {
            for (key, value) in pairs {
                fields.insert(key, non_empty(value).unwrap_or_else(|| UNSURE.to_string()));
            }
        }
        return confident(fields, "no fields could be read from the reply");
    }

    let fields = fill(expected, |name| {
        let wanted = normalize(name);
        pairs
            .iter()
            .find(|(k, _)| normalize(k) == wanted)
            .and_then(|(_, v)| non_empty(v))
    });
    confident(fields, "none of the expected fields could be read from the reply")
}

fn fill(expected: &[&str], mut lookup: impl FnMut(&str) -> Option<String>) -> TranscriptionFields {
    let mut fields = TranscriptionFields::new();
    for name in expected {
        let value = lookup(name).unwrap_or_else(|| UNSURE.to_string());
        fields.insert(*name, value);
    }
    fields
}

fn confident(fields: TranscriptionFields, reason: &str) -> Result<TranscriptionFields, ParseError> {
    if fields.confident_count() == 0 {
        Err(ParseError(reason.to_string()))
    } else {
        Ok(fields)
    }
}

fn unwrap_nested(object: &Map<String, Value>) -> &Map<String, Value> {
    if object.len() == 1 {
        for key in WRAPPER_KEYS {
            if let Some(Value::Object(inner)) = object.get(*key) {
                return unwrap_nested(inner);
            }
        }
    }
    object
}

fn normalize(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// String form of a reply value. Null, blank strings and empty arrays count as missing.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => non_empty(s),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(value_text).collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        other => Some(other.to_string()),
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn find_json_object(text: &str) -> Option<Map<String, Value>> {
    let parse = |candidate: &str| match serde_json::from_str::<Value>(candidate.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    };

    if let Some(map) = parse(text) {
        return Some(map);
    }
    if let Some(map) = fenced_block(text).and_then(parse) {
        return Some(map);
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| parse(&text[start..=end])).flatten()
}

/// Body of the first ``` fenced block, without its language tag.
fn fenced_block(text: &str) -> Option<&str> {
    let after_open = &text[text.find("```")? + 3..];
    let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_open[body_start..];
    let end = body.find("```")?;
    Some(&body[..end])
}

/// `key: value` lines, in order, first occurrence of a key wins.
fn key_value_lines(text: &str) -> Vec<(&str, &str)> {
    let mut pairs: Vec<(&str, &str)> = Vec::new();
    for line in text.lines() {
        let line = line
            .trim()
            .trim_start_matches(['-', '*', '•', ' '])
            .trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().trim_matches(['*', '"', '`', ' ']);
        if key.is_empty() || key.len() > 64 {
            continue;
        }
        let value = value
            .trim()
            .trim_end_matches(',')
            .trim_matches(['"', '*', ' ']);
        if !pairs.iter().any(|(k, _)| normalize(k) == normalize(key)) {
            pairs.push((key, value));
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const EXPECTED: &[&str] = &["verbatimCollectors", "recordNumber", "country"];

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn structured_reply_keeps_expected_fields_in_order() {
        let reply = object(json!({
            "country": "Peru",
            "extra": "ignored",
            "verbatimCollectors": "J. Smith & A. Gray",
            "recordNumber": "1234"
        }));
        let fields = structure_object(&reply, EXPECTED).unwrap();
        let names: Vec<&str> = fields.iter().map(|(k, _)| k).collect();
        assert_eq!(names, EXPECTED);
        assert_eq!(fields.get("recordNumber"), Some("1234"));
        assert!(fields.get("extra").is_none());
    }

    #[test]
    fn structured_reply_missing_field_is_unsure() {
        let reply = object(json!({"verbatimCollectors": "J. Smith", "recordNumber": null}));
        let fields = structure_object(&reply, EXPECTED).unwrap();
        assert_eq!(fields.get("recordNumber"), Some(UNSURE));
        assert_eq!(fields.get("country"), Some(UNSURE));
        assert_eq!(fields.confident_count(), 1);
    }

    #[test]
    fn structured_reply_unwraps_transcription_object() {
        let reply = object(json!({"transcription": {"country": "Chile", "recordNumber": 88}}));
        let fields = structure_object(&reply, EXPECTED).unwrap();
        assert_eq!(fields.get("country"), Some("Chile"));
        assert_eq!(fields.get("recordNumber"), Some("88"));
    }

    #[test]
    fn structured_reply_without_any_expected_field_fails() {
        let reply = object(json!({"foo": "bar"}));
        assert!(structure_object(&reply, EXPECTED).is_err());
    }

    #[test]
    fn free_text_missing_field_is_unsure() {
        let text = "Here is the transcription:\nverbatimCollectors: J. Smith\ncountry: Peru\n";
        let fields = structure_text(text, EXPECTED).unwrap();
        assert_eq!(fields.get("verbatimCollectors"), Some("J. Smith"));
        assert_eq!(fields.get("recordNumber"), Some(UNSURE));
        assert_eq!(fields.get("country"), Some("Peru"));
    }

    #[test]
    fn free_text_with_fenced_json() {
        let text = "Sure!\n```json\n{\"verbatimCollectors\": \"R. Lee\", \"recordNumber\": \"7\", \"country\": \"\"}\n```\nDone.";
        let fields = structure_text(text, EXPECTED).unwrap();
        assert_eq!(fields.get("verbatimCollectors"), Some("R. Lee"));
        assert_eq!(fields.get("country"), Some(UNSURE));
        assert_eq!(fields.confident_count(), 2);
    }

    #[test]
    fn all_empty_values_are_not_usable_content() {
        let reply = object(json!({
            "verbatimCollectors": "",
            "recordNumber": "  ",
            "country": []
        }));
        assert!(structure_object(&reply, EXPECTED).is_err());

        let text = r#"{"verbatimCollectors": "", "recordNumber": "", "country": ""}"#;
        assert!(structure_text(text, EXPECTED).is_err());
    }

    #[test]
    fn array_values_are_joined() {
        let reply = object(json!({"verbatimCollectors": ["J. Smith", "", "A. Gray"]}));
        let fields = structure_object(&reply, EXPECTED).unwrap();
        assert_eq!(fields.get("verbatimCollectors"), Some("J. Smith; A. Gray"));
    }

    #[test]
    fn free_text_with_inline_json() {
        let text = "The label reads {\"recordNumber\": \"55\"} as far as I can tell.";
        let fields = structure_text(text, EXPECTED).unwrap();
        assert_eq!(fields.get("recordNumber"), Some("55"));
        assert_eq!(fields.get("country"), Some(UNSURE));
    }

    #[test]
    fn free_text_bulleted_and_bold_keys_match_by_normalized_name() {
        let text = "- **Verbatim Collectors**: M. Ortiz\n- record_number: 301";
        let fields = structure_text(text, EXPECTED).unwrap();
        assert_eq!(fields.get("verbatimCollectors"), Some("M. Ortiz"));
        assert_eq!(fields.get("recordNumber"), Some("301"));
    }

    #[test]
    fn free_text_without_usable_content_fails() {
        assert!(structure_text("   ", EXPECTED).is_err());
        assert!(structure_text("I cannot read this label.", EXPECTED).is_err());
    }

    #[test]
    fn no_expected_fields_keeps_prose() {
        let fields = structure_text("Herbarium of Peru, 1921", &[]).unwrap();
        assert_eq!(fields.get("transcription"), Some("Herbarium of Peru, 1921"));
    }
}
