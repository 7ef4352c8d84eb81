//! Test case model

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Test case for a function-style problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: Uuid,
    /// Positional arguments, in declaration order
    pub input: Vec<Value>,
    pub expected: Value,
    /// Ordering key; lower sequences run first
    pub sequence: i32,
}

impl TestCase {
    /// Arguments as a JSON array, the shape the harness reads per case
    pub fn input_value(&self) -> Value {
        Value::Array(self.input.clone())
    }
}
