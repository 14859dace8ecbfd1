//! Response finalization: converting a chain outcome into concrete wire-level
//! response parts.
//!
//! Rules, in priority order: an error finalizes at its own status with a JSON
//! `{message, data}` body; an explicit status with no payload emits no body;
//! plain-text payloads get NO automatic content type (a handler that wants a
//! charset must set the header itself); JSON payloads are serialized as
//! `application/json` without a forced charset; an exhausted chain is a 404.
//!
//! Headers accumulated during traversal are merged with finalizer-set
//! headers: same-name values combine comma-joined per multi-value header
//! semantics (`Vary` style), except the content type, which is only set when
//! the accumulator has none.

use crate::error::PipelineError;
use crate::pipeline::{HandlerResult, Payload, ResponseHeaders};
use serde_json::{json, Value};

const CONTENT_TYPE: &str = "Content-Type";

/// Concrete response: status, merged headers, optional body.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseParts {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// `None` emits no body at all (204 use-case).
    pub body: Option<Vec<u8>>,
}

/// Collapse accumulated header entries into one value per name, combining
/// repeated names comma-joined and preserving first-seen order.
fn merge_headers(headers: &ResponseHeaders) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = Vec::with_capacity(headers.entries().len());
    for (name, value) in headers.entries() {
        match merged.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some((_, existing)) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            None => merged.push((name.clone(), value.clone())),
        }
    }
    merged
}

fn set_content_type_if_absent(headers: &mut Vec<(String, String)>, value: &str) {
    if !headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(CONTENT_TYPE)) {
        headers.push((CONTENT_TYPE.to_string(), value.to_string()));
    }
}

fn json_body(value: &Value) -> Vec<u8> {
    serde_json::to_vec(value).unwrap_or_default()
}

fn write_payload(payload: Payload, headers: &mut Vec<(String, String)>) -> Vec<u8> {
    match payload {
        // No automatic content type (and so no forced charset) for plain
        // strings; the transport default applies unless set upstream.
        Payload::Text(s) => s.into_bytes(),
        Payload::Bytes(b) => b,
        Payload::Json(v) => {
            set_content_type_if_absent(headers, "application/json");
            json_body(&v)
        }
    }
}

fn error_body(err: &PipelineError) -> Value {
    let (message, data) = match err {
        PipelineError::Validation { reason, field } => (
            reason.clone(),
            field.as_ref().map(|f| json!({ "field": f })),
        ),
        PipelineError::Handler {
            message, data, ..
        } => (message.clone(), data.clone()),
        // Deliberately generic; the detail was already logged.
        PipelineError::Internal(_) => ("Internal Server Error".to_string(), None),
    };
    match data {
        Some(data) => json!({ "message": message, "data": data }),
        None => json!({ "message": message }),
    }
}

/// Map a chain outcome plus the accumulated headers to concrete response
/// parts. Consumes the outcome exactly once.
#[must_use]
pub fn finalize(
    outcome: Result<HandlerResult, PipelineError>,
    headers: ResponseHeaders,
) -> ResponseParts {
    let mut merged = merge_headers(&headers);
    match outcome {
        Err(err) => {
            let body = error_body(&err);
            set_content_type_if_absent(&mut merged, "application/json");
            ResponseParts {
                status: err.status(),
                headers: merged,
                body: Some(json_body(&body)),
            }
        }
        Ok(HandlerResult::NoResult) => {
            set_content_type_if_absent(&mut merged, "application/json");
            ResponseParts {
                status: 404,
                headers: merged,
                body: Some(json_body(&json!({ "message": "Not Found" }))),
            }
        }
        Ok(HandlerResult::Value(payload)) => {
            let body = write_payload(payload, &mut merged);
            ResponseParts {
                status: 200,
                headers: merged,
                body: Some(body),
            }
        }
        Ok(HandlerResult::Status(code, None)) => ResponseParts {
            status: code,
            headers: merged,
            body: None,
        },
        Ok(HandlerResult::Status(code, Some(payload))) => {
            let body = write_payload(payload, &mut merged);
            ResponseParts {
                status: code,
                headers: merged,
                body: Some(body),
            }
        }
    }
}
