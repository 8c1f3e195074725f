//! Document value passed through the filter

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field read from a record when none is configured
pub const DEFAULT_TEXT_FIELD: &str = "text";

/// One unit of corpus text
///
/// A rejected document is represented by empty `text`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Empty document, the result of rejection
    pub fn rejected() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Read the document text out of a JSON record
    ///
    /// Missing and non-string fields are invalid input, never coerced.
    pub fn from_record(record: &Value, field: &str) -> Result<Self> {
        match record.get(field) {
            Some(Value::String(text)) => Ok(Self::new(text.as_str())),
            Some(other) => Err(Error::InvalidInput(format!(
                "field '{}' is {}, expected a string",
                field,
                json_type_name(other)
            ))),
            None => Err(Error::InvalidInput(format!("missing field '{}'", field))),
        }
    }

    /// Copy of `record` with `field` replaced by this document's text
    pub fn write_into(&self, record: &Value, field: &str) -> Value {
        let mut updated = record.clone();
        if let Value::Object(map) = &mut updated {
            map.insert(field.to_string(), Value::String(self.text.clone()));
        }
        updated
    }
}

impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Document {
    fn from(text: String) -> Self {
        Self { text }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
