//! Wire protocol between the grading engine and a running harness

use serde_json::Value;

use crate::{
    constants::{HARNESS_ERROR_KEY, SERIALIZATION_ERROR_PREFIX},
    error::HarnessError,
    models::TestCase,
};

/// Outcome of one case as reported by the harness
#[derive(Debug, Clone, PartialEq)]
pub enum CaseOutput {
    /// JSON-serializable return value
    Value(Value),
    /// The call raised; message is `"<ErrorType>: <detail>"`
    Raised(String),
    /// The call returned, but its value has no JSON form
    Unserializable(HarnessError),
}

impl CaseOutput {
    /// Returned value, if the case produced one
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Error message, if the case did not produce a value
    pub fn error_message(&self) -> Option<String> {
        match self {
            Self::Value(_) => None,
            Self::Raised(message) => Some(message.clone()),
            Self::Unserializable(err) => Some(err.to_string()),
        }
    }

    fn from_entry(entry: Value) -> Self {
        match entry {
            Value::Object(map) if map.len() == 1 => match map.get(HARNESS_ERROR_KEY) {
                Some(Value::String(message)) => Self::from_error_message(message),
                _ => Self::Value(Value::Object(map)),
            },
            other => Self::Value(other),
        }
    }

    fn from_error_message(message: &str) -> Self {
        match message.strip_prefix(SERIALIZATION_ERROR_PREFIX) {
            Some(detail) => {
                Self::Unserializable(HarnessError::SerializationError(detail.trim().to_string()))
            }
            None => Self::Raised(message.to_string()),
        }
    }
}

/// Harness stdout that does not follow the protocol
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("harness produced no output")]
    Empty,

    #[error("harness output is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("harness output is not a JSON array")]
    NotAnArray,

    #[error("harness returned {actual} results for {expected} cases")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Serialize the ordered cases into the harness stdin document
pub fn encode_cases(cases: &[TestCase]) -> String {
    let document = Value::Array(cases.iter().map(TestCase::input_value).collect());
    document.to_string()
}

/// Parse harness stdout into one [`CaseOutput`] per case, in order
pub fn decode_results(stdout: &str, expected_len: usize) -> Result<Vec<CaseOutput>, ProtocolError> {
    // The result array is the last line written; anything before it is noise.
    let line = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or(ProtocolError::Empty)?;

    let parsed: Value =
        serde_json::from_str(line).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;

    let Value::Array(entries) = parsed else {
        return Err(ProtocolError::NotAnArray);
    };

    if entries.len() != expected_len {
        return Err(ProtocolError::LengthMismatch {
            expected: expected_len,
            actual: entries.len(),
        });
    }

    Ok(entries.into_iter().map(CaseOutput::from_entry).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn case(input: Vec<Value>, sequence: i32) -> TestCase {
        TestCase {
            id: Uuid::new_v4(),
            input,
            expected: Value::Null,
            sequence,
        }
    }

    #[test]
    fn test_encode_cases_is_array_of_argument_lists() {
        let cases = vec![
            case(vec![json!([2, 7, 11, 15]), json!(9)], 1),
            case(vec![json!("abc")], 2),
        ];

        let stdin: Value = serde_json::from_str(&encode_cases(&cases)).unwrap();
        assert_eq!(stdin, json!([[[2, 7, 11, 15], 9], ["abc"]]));
    }

    #[test]
    fn test_decode_two_sum_result() {
        let outputs = decode_results("[[0, 1]]\n", 1).unwrap();
        assert_eq!(outputs, vec![CaseOutput::Value(json!([0, 1]))]);
    }

    #[test]
    fn test_decode_error_entries() {
        let stdout = r#"[1, {"__error__": "ZeroDivisionError: division by zero"}, {"__error__": "SerializationError: Object of type set is not JSON serializable"}]"#;
        let outputs = decode_results(stdout, 3).unwrap();

        assert_eq!(outputs[0], CaseOutput::Value(json!(1)));
        assert_eq!(
            outputs[1],
            CaseOutput::Raised("ZeroDivisionError: division by zero".to_string())
        );
        assert_eq!(
            outputs[2],
            CaseOutput::Unserializable(HarnessError::SerializationError(
                "Object of type set is not JSON serializable".to_string()
            ))
        );
    }

    #[test]
    fn test_objects_with_other_keys_are_values() {
        let outputs = decode_results(r#"[{"__error__": "x", "other": 1}]"#, 1).unwrap();
        assert_eq!(
            outputs[0],
            CaseOutput::Value(json!({"__error__": "x", "other": 1}))
        );
    }

    #[test]
    fn test_decode_rejects_malformed_output() {
        assert_eq!(decode_results("  \n", 1), Err(ProtocolError::Empty));
        assert!(matches!(decode_results("Traceback", 1), Err(ProtocolError::InvalidJson(_))));
        assert_eq!(decode_results("{}", 1), Err(ProtocolError::NotAnArray));
        assert_eq!(
            decode_results("[1, 2]", 3),
            Err(ProtocolError::LengthMismatch { expected: 3, actual: 2 })
        );
    }
}
