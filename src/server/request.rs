use crate::pipeline::Request;
use http::Method;
use may_minihttp::Request as WireRequest;
use std::collections::HashMap;
use std::io::Read;
use tracing::debug;

/// Parse an incoming wire request into the pipeline's immutable snapshot.
///
/// Splits the path from the query string, lower-cases header names so
/// lookups are case-insensitive, and reads the body as text. Nothing here
/// interprets the body; decoding belongs to the validation layer.
pub fn parse_request(req: WireRequest) -> Request {
    let method = Method::from_bytes(req.method().as_bytes()).unwrap_or(Method::GET);
    let raw_path = req.path().to_string();
    let (path, raw_query) = match raw_path.split_once('?') {
        Some((p, q)) => (p.to_string(), Some(q.to_string())),
        None => (raw_path, None),
    };

    let headers: HashMap<String, String> = req
        .headers()
        .iter()
        .map(|h| {
            (
                h.name.to_ascii_lowercase(),
                String::from_utf8_lossy(h.value).to_string(),
            )
        })
        .collect();

    // Lossy conversion: a non-UTF-8 body must still reach the validation
    // layer (where it degrades to opaque text), not read as absent.
    let raw_body = {
        let mut buf = Vec::new();
        match req.body().read_to_end(&mut buf) {
            Ok(size) if size > 0 => Some(String::from_utf8_lossy(&buf).into_owned()),
            _ => None,
        }
    };

    debug!(
        method = %method,
        path = %path,
        header_count = headers.len(),
        body_bytes = raw_body.as_ref().map_or(0, String::len),
        "Wire request parsed"
    );

    Request::from_parts(method, path, raw_query, headers, raw_body)
}
