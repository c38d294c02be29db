//! Response payload decoding.
//!
//! A stored `response_json` is an array of `{ "prompt_id": .., "value": .. }`
//! objects. `{ "responses": [..] }` is accepted as well.

use super::DefinitionError;
use rusqlite::types::Value;
use serde::Deserialize;

/// One answered prompt, ready to be stored in `prompt_responses`.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptAnswer {
    pub prompt_id: String,
    pub value: Value,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    List(Vec<RawAnswer>),
    Wrapped { responses: Vec<RawAnswer> },
}

#[derive(Deserialize)]
struct RawAnswer {
    prompt_id: String,
    #[serde(default)]
    value: serde_json::Value,
}

/// Decodes a response payload into prompt answers.
///
/// Numbers keep their numeric type, `null` stays NULL, strings are stored as
/// text and any other JSON value as its compact JSON text.
pub fn parse_response_payload(payload: &str) -> Result<Vec<PromptAnswer>, DefinitionError> {
    if payload.trim().is_empty() {
        return Err(DefinitionError::Empty);
    }
    let answers = match serde_json::from_str::<Payload>(payload)? {
        Payload::List(answers) | Payload::Wrapped { responses: answers } => answers,
    };

    answers
        .into_iter()
        .map(|raw| {
            if raw.prompt_id.trim().is_empty() {
                return Err(DefinitionError::MissingField {
                    element: "response",
                    field: "prompt_id",
                });
            }
            Ok(PromptAnswer {
                prompt_id: raw.prompt_id,
                value: to_sql_value(raw.value),
            })
        })
        .collect()
}

fn to_sql_value(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Number(number) => match number.as_i64() {
            Some(integer) => Value::Integer(integer),
            None => number.as_f64().map_or(Value::Null, Value::Real),
        },
        serde_json::Value::String(text) => Value::Text(text),
        other => Value::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_response_payload;
    use crate::definition::DefinitionError;
    use rusqlite::types::Value;

    #[test]
    fn values_keep_numeric_types() {
        let answers = parse_response_payload(
            r#"[
                {"prompt_id": "sleep", "value": 7},
                {"prompt_id": "weight", "value": 61.5},
                {"prompt_id": "note", "value": "tired"},
                {"prompt_id": "skipped", "value": null},
                {"prompt_id": "choices", "value": [1, 2]}
            ]"#,
        )
        .unwrap();
        let values: Vec<&Value> = answers.iter().map(|a| &a.value).collect();
        assert_eq!(
            values,
            [
                &Value::Integer(7),
                &Value::Real(61.5),
                &Value::Text("tired".to_string()),
                &Value::Null,
                &Value::Text("[1,2]".to_string()),
            ]
        );
    }

    #[test]
    fn wrapped_payload_is_accepted() {
        let answers =
            parse_response_payload(r#"{"responses": [{"prompt_id": "a", "value": true}]}"#)
                .unwrap();
        assert_eq!(answers[0].prompt_id, "a");
        assert_eq!(answers[0].value, Value::Text("true".to_string()));
    }

    #[test]
    fn missing_prompt_id_is_rejected() {
        assert!(matches!(
            parse_response_payload(r#"[{"prompt_id": " ", "value": 1}]"#),
            Err(DefinitionError::MissingField { .. })
        ));
        assert!(matches!(
            parse_response_payload(r#"[{"value": 1}]"#),
            Err(DefinitionError::Json(_))
        ));
    }
}
