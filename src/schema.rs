//! Flat record schemas for query strings and request bodies.
//!
//! A [`RecordSchema`] describes a mapping of string keys to values of a
//! single declared type, plus an optional set of required keys with their own
//! declared types. Schemas are flat by contract: nested object graphs are
//! never validated here.

use serde_json::{Map, Value};

/// Declared type for a record value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Number,
    Boolean,
    Object,
    Array,
    /// Any decoded JSON-like value.
    Any,
}

impl ValueType {
    /// Whether a decoded value satisfies this declared type.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            ValueType::String => value.is_string(),
            ValueType::Number => value.is_number(),
            ValueType::Boolean => value.is_boolean(),
            ValueType::Object => value.is_object(),
            ValueType::Array => value.is_array(),
            ValueType::Any => true,
        }
    }

    fn name(self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::Object => "object",
            ValueType::Array => "array",
            ValueType::Any => "any",
        }
    }
}

/// First violation found while checking a record against its schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Field the violation refers to.
    pub field: String,
    pub message: String,
}

impl SchemaViolation {
    fn new(field: &str, message: String) -> Self {
        SchemaViolation {
            field: field.to_string(),
            message,
        }
    }
}

/// A flat `string -> ValueType` record shape.
///
/// `value_type` applies to every present key; `required` lists keys that must
/// be present, each with its own declared type.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    value_type: ValueType,
    required: Vec<(String, ValueType)>,
}

impl RecordSchema {
    /// Record where every value must be of `value_type`.
    #[must_use]
    pub fn of(value_type: ValueType) -> Self {
        RecordSchema {
            value_type,
            required: Vec::new(),
        }
    }

    /// Add a required key with its declared type.
    #[must_use]
    pub fn require(mut self, name: impl Into<String>, ty: ValueType) -> Self {
        self.required.push((name.into(), ty));
        self
    }

    /// Check a decoded mapping against this schema.
    ///
    /// Reports the first violation: a required key that is absent, a required
    /// key of the wrong type, or any present value not matching the declared
    /// value type.
    pub fn check(&self, fields: &Map<String, Value>) -> Result<(), SchemaViolation> {
        for (name, ty) in &self.required {
            match fields.get(name) {
                None => {
                    return Err(SchemaViolation::new(
                        name,
                        format!("required field `{name}` is missing"),
                    ))
                }
                Some(v) if !ty.matches(v) => {
                    return Err(SchemaViolation::new(
                        name,
                        format!("field `{name}` must be of type {}", ty.name()),
                    ))
                }
                Some(_) => {}
            }
        }
        for (name, value) in fields {
            if !self.value_type.matches(value) {
                return Err(SchemaViolation::new(
                    name,
                    format!("field `{name}` must be of type {}", self.value_type.name()),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_string_record_accepts_strings() {
        let schema = RecordSchema::of(ValueType::String);
        assert!(schema.check(&map(json!({"a": "1", "b": "2"}))).is_ok());
    }

    #[test]
    fn test_string_record_rejects_numbers() {
        let schema = RecordSchema::of(ValueType::String);
        let err = schema.check(&map(json!({"a": 1}))).unwrap_err();
        assert_eq!(err.field, "a");
    }

    #[test]
    fn test_any_record_accepts_mixed() {
        let schema = RecordSchema::of(ValueType::Any);
        assert!(schema
            .check(&map(json!({"a": 1, "b": [true], "c": {"x": 1}})))
            .is_ok());
    }

    #[test]
    fn test_required_field_missing() {
        let schema = RecordSchema::of(ValueType::Any).require("id", ValueType::String);
        let err = schema.check(&map(json!({"other": 1}))).unwrap_err();
        assert_eq!(err.field, "id");
    }

    #[test]
    fn test_required_field_wrong_type() {
        let schema = RecordSchema::of(ValueType::Any).require("count", ValueType::Number);
        let err = schema.check(&map(json!({"count": "three"}))).unwrap_err();
        assert_eq!(err.field, "count");
        assert!(schema.check(&map(json!({"count": 3}))).is_ok());
    }
}
