//! Request validation: decoding query strings and bodies and applying a
//! [`RecordSchema`] over the result.
//!
//! Failures are structured [`PipelineError::Validation`] values the
//! finalizer turns into 400 responses with a machine-readable reason; this
//! layer never panics on malformed input.

use crate::error::PipelineError;
use crate::pipeline::Request;
use crate::schema::RecordSchema;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

/// Decoded request body, prior to schema validation.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedBody {
    /// No payload at all; distinct from a malformed one, and not an error.
    Absent,
    /// Body that parsed as JSON, or a form-encoded body decoded into an
    /// object of string values.
    Json(Value),
    /// Body that did not parse as JSON, kept as an opaque string.
    Text(String),
}

/// Decode a raw request body.
///
/// Form-encoded bodies (by content type) decode into a flat string mapping,
/// last write wins on repeated keys. Anything else is attempted as JSON;
/// on parse failure the body degrades to an opaque string rather than
/// failing.
#[must_use]
pub fn decode_body(req: &Request) -> DecodedBody {
    let Some(raw) = req.raw_body.as_deref() else {
        return DecodedBody::Absent;
    };
    if raw.is_empty() {
        return DecodedBody::Absent;
    }

    let is_form = req
        .header("content-type")
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
    if is_form {
        let mut map = Map::new();
        for (k, v) in url::form_urlencoded::parse(raw.as_bytes()) {
            map.insert(k.into_owned(), Value::String(v.into_owned()));
        }
        debug!(fields = map.len(), "Form body decoded");
        return DecodedBody::Json(Value::Object(map));
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(value) => DecodedBody::Json(value),
        Err(_) => DecodedBody::Text(raw.to_string()),
    }
}

/// Decode and validate the query string.
///
/// Multi-valued parameters are rejected outright, not coerced to a
/// sequence. Returns every key as a string on success.
pub fn validate_query(
    req: &Request,
    schema: &RecordSchema,
) -> Result<HashMap<String, String>, PipelineError> {
    let mut out = HashMap::new();
    if let Some(query) = req.raw_query.as_deref() {
        for (k, v) in url::form_urlencoded::parse(query.as_bytes()) {
            let key = k.into_owned();
            if out.insert(key.clone(), v.into_owned()).is_some() {
                return Err(PipelineError::validation_field(
                    format!("query parameter `{key}` appears more than once"),
                    key,
                ));
            }
        }
    }

    let as_values: Map<String, Value> = out
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    schema
        .check(&as_values)
        .map_err(|v| PipelineError::validation_field(v.message, v.field))?;

    debug!(params = out.len(), "Query validated");
    Ok(out)
}

/// Decode and validate the request body as a flat mapping.
///
/// An absent body and a body that does not decode to an object both fail the
/// record schema (the decode itself is lenient; the shape requirement is
/// not).
pub fn validate_body(
    req: &Request,
    schema: &RecordSchema,
) -> Result<Map<String, Value>, PipelineError> {
    let map = match decode_body(req) {
        DecodedBody::Json(Value::Object(map)) => map,
        DecodedBody::Absent => {
            return Err(PipelineError::validation("request body is required"))
        }
        DecodedBody::Json(_) | DecodedBody::Text(_) => {
            return Err(PipelineError::validation(
                "request body must be a JSON object or form data",
            ))
        }
    };
    schema
        .check(&map)
        .map_err(|v| PipelineError::validation_field(v.message, v.field))?;
    debug!(fields = map.len(), "Body validated");
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ValueType;
    use http::Method;
    use serde_json::json;

    fn get(path: &str) -> Request {
        Request::new(Method::GET, path)
    }

    #[test]
    fn test_validate_query_ok() {
        let req = get("/api/endpoint").with_query("a=1&b=two");
        let schema = RecordSchema::of(ValueType::String);
        let query = validate_query(&req, &schema).unwrap();
        assert_eq!(query.get("a").map(String::as_str), Some("1"));
        assert_eq!(query.get("b").map(String::as_str), Some("two"));
    }

    #[test]
    fn test_validate_query_rejects_repeated_key() {
        let req = get("/api/endpoint").with_query("a=1&a=2");
        let schema = RecordSchema::of(ValueType::String);
        let err = validate_query(&req, &schema).unwrap_err();
        assert_eq!(err.status(), 400);
        match err {
            PipelineError::Validation { field, .. } => assert_eq!(field.as_deref(), Some("a")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validate_query_empty_query_ok() {
        let req = get("/api/endpoint");
        let schema = RecordSchema::of(ValueType::String);
        assert!(validate_query(&req, &schema).unwrap().is_empty());
    }

    #[test]
    fn test_validate_query_url_decoding() {
        let req = get("/api/endpoint").with_query("name=a%20b");
        let schema = RecordSchema::of(ValueType::String);
        let query = validate_query(&req, &schema).unwrap();
        assert_eq!(query.get("name").map(String::as_str), Some("a b"));
    }

    #[test]
    fn test_validate_query_required_key() {
        let req = get("/api/endpoint").with_query("other=1");
        let schema = RecordSchema::of(ValueType::String).require("id", ValueType::String);
        assert!(validate_query(&req, &schema).is_err());
    }

    #[test]
    fn test_decode_body_absent() {
        assert_eq!(decode_body(&get("/x")), DecodedBody::Absent);
        assert_eq!(decode_body(&get("/x").with_body("")), DecodedBody::Absent);
    }

    #[test]
    fn test_decode_body_json_kinds() {
        assert_eq!(
            decode_body(&get("/x").with_body(r#"{"a":1}"#)),
            DecodedBody::Json(json!({"a": 1}))
        );
        assert_eq!(
            decode_body(&get("/x").with_body("[1,2]")),
            DecodedBody::Json(json!([1, 2]))
        );
        assert_eq!(decode_body(&get("/x").with_body("42")), DecodedBody::Json(json!(42)));
        assert_eq!(
            decode_body(&get("/x").with_body("true")),
            DecodedBody::Json(json!(true))
        );
    }

    #[test]
    fn test_decode_body_invalid_json_degrades_to_text() {
        assert_eq!(
            decode_body(&get("/x").with_body("{not json")),
            DecodedBody::Text("{not json".to_string())
        );
    }

    #[test]
    fn test_decode_body_form_encoded() {
        let req = get("/x")
            .with_header("Content-Type", "application/x-www-form-urlencoded")
            .with_body("a=1&b=two%20words");
        assert_eq!(
            decode_body(&req),
            DecodedBody::Json(json!({"a": "1", "b": "two words"}))
        );
    }

    #[test]
    fn test_validate_body_object_ok() {
        let req = get("/x").with_body(r#"{"a":"1","n":5}"#);
        let schema = RecordSchema::of(ValueType::Any);
        let body = validate_body(&req, &schema).unwrap();
        assert_eq!(body.get("n"), Some(&json!(5)));
    }

    #[test]
    fn test_validate_body_absent_fails() {
        let schema = RecordSchema::of(ValueType::Any);
        assert!(validate_body(&get("/x"), &schema).is_err());
    }

    #[test]
    fn test_validate_body_non_object_fails() {
        let schema = RecordSchema::of(ValueType::Any);
        assert!(validate_body(&get("/x").with_body("[1]"), &schema).is_err());
        assert!(validate_body(&get("/x").with_body("plain text"), &schema).is_err());
    }

    #[test]
    fn test_validate_body_form_shape_matches_json_shape() {
        let schema = RecordSchema::of(ValueType::Any);
        let form = get("/x")
            .with_header("Content-Type", "application/x-www-form-urlencoded")
            .with_body("a=1");
        let json_req = get("/x").with_body(r#"{"a":"1"}"#);
        assert_eq!(
            validate_body(&form, &schema).unwrap(),
            validate_body(&json_req, &schema).unwrap()
        );
    }
}
