//! One JSON record read from a dataset

use serde_json::Value;

/// A single record with the line it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub data: Value,
    /// 1-based line number in the decompressed input
    pub source_line: usize,
}

impl Record {
    pub fn new(data: Value, source_line: usize) -> Self {
        Self { data, source_line }
    }

    /// String value of `field`, if present
    pub fn text(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }

    pub fn into_data(self) -> Value {
        self.data
    }
}
