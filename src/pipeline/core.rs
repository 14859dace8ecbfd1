use crate::error::PipelineError;
use crate::finalizer::{self, ResponseParts};
use crate::matcher::{PathPattern, RouteParams};
use http::Method;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Immutable snapshot of an inbound HTTP request.
///
/// Header keys are stored lower-cased so lookups are case-insensitive.
/// Never mutated after creation.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Path without the query string.
    pub path: String,
    /// Raw query string, without the leading `?`.
    pub raw_query: Option<String>,
    headers: HashMap<String, String>,
    pub raw_body: Option<String>,
}

impl Request {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Request {
            method,
            path: path.into(),
            raw_query: None,
            headers: HashMap::new(),
            raw_body: None,
        }
    }

    /// Assemble a request from already-parsed transport pieces.
    #[must_use]
    pub fn from_parts(
        method: Method,
        path: String,
        raw_query: Option<String>,
        headers: HashMap<String, String>,
        raw_body: Option<String>,
    ) -> Self {
        Request {
            method,
            path,
            raw_query,
            headers,
            raw_body,
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.raw_query = Some(query.into());
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.raw_body = Some(body.into());
        self
    }

    /// Header lookup, case-insensitive per RFC 7230.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Response headers accumulated across one chain traversal.
///
/// A single accumulator is shared by every entry a request passes through;
/// headers appended by entries that later defer are preserved into the final
/// response.
#[derive(Debug, Clone, Default)]
pub struct ResponseHeaders {
    entries: Vec<(String, String)>,
}

impl ResponseHeaders {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header value, keeping any previously appended values for the
    /// same name (multi-value semantics, e.g. `Vary`).
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        self.entries.push((name.to_string(), value.into()));
    }

    /// Set a header, replacing every previously appended value of that name.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.entries.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.entries.push((name.to_string(), value.into()));
    }

    /// First value appended under `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    #[must_use]
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }
}

/// Body payload produced by a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Json(serde_json::Value),
    Bytes(Vec<u8>),
}

/// What a handler invocation yielded.
///
/// `NoResult` is the explicit fallthrough signal: the entry declines to
/// handle and defers to the next one. Any other variant halts the chain and
/// is consumed exactly once by the finalizer.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerResult {
    NoResult,
    Value(Payload),
    Status(u16, Option<Payload>),
}

impl HandlerResult {
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        HandlerResult::Value(Payload::Text(body.into()))
    }

    #[must_use]
    pub fn json(body: serde_json::Value) -> Self {
        HandlerResult::Value(Payload::Json(body))
    }

    #[must_use]
    pub fn bytes(body: Vec<u8>) -> Self {
        HandlerResult::Value(Payload::Bytes(body))
    }

    /// Explicit status with no body (e.g. 204).
    #[must_use]
    pub fn status(code: u16) -> Self {
        HandlerResult::Status(code, None)
    }
}

/// Per-invocation view handed to a handler.
pub struct Context<'a> {
    pub request: &'a Request,
    /// Request path relative to the current mount (prefix stripped).
    pub path: &'a str,
    /// Parameters extracted by this entry's route pattern; empty for
    /// pattern-less entries.
    pub params: &'a RouteParams,
    /// Shared response header accumulator for the whole traversal.
    pub headers: &'a mut ResponseHeaders,
}

impl Context<'_> {
    /// Path parameter by name, last write wins on duplicate names.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Handler invoked when an entry's gates all pass.
pub type HandlerFn =
    Arc<dyn Fn(&mut Context<'_>) -> Result<HandlerResult, PipelineError> + Send + Sync>;

/// Pure guard evaluated against the request snapshot.
pub type Predicate = Arc<dyn Fn(&Request) -> bool + Send + Sync>;

enum EntryHandler {
    Func(HandlerFn),
    /// A nested chain; its exhaustion reads as `NoResult` to the outer chain.
    Nested(Arc<Pipeline>),
}

/// One (prefix, predicate, route, handler) registration in the chain.
pub struct PipelineEntry {
    prefix: Option<String>,
    predicate: Option<Predicate>,
    route: Option<(Method, PathPattern)>,
    handler: EntryHandler,
}

impl PipelineEntry {
    /// Bare entry: runs for every request reaching it.
    pub fn handler<F>(f: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> Result<HandlerResult, PipelineError> + Send + Sync + 'static,
    {
        PipelineEntry {
            prefix: None,
            predicate: None,
            route: None,
            handler: EntryHandler::Func(Arc::new(f)),
        }
    }

    /// Route entry: runs when the method matches and the pattern matches the
    /// current path.
    pub fn route<F>(method: Method, pattern: &str, f: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> Result<HandlerResult, PipelineError> + Send + Sync + 'static,
    {
        PipelineEntry {
            prefix: None,
            predicate: None,
            route: Some((method, PathPattern::compile(pattern))),
            handler: EntryHandler::Func(Arc::new(f)),
        }
    }

    /// Entry dispatching into a nested pipeline.
    #[must_use]
    pub fn nested(pipeline: Pipeline) -> Self {
        PipelineEntry {
            prefix: None,
            predicate: None,
            route: None,
            handler: EntryHandler::Nested(Arc::new(pipeline)),
        }
    }

    /// Gate this entry on a path prefix. Prefix comparison is a raw string
    /// `starts_with`; trailing slashes are not normalized. Nested pipelines
    /// see the path with the prefix stripped.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Gate this entry on a predicate over the request snapshot.
    #[must_use]
    pub fn with_predicate<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }
}

/// Startup-time registration surface for a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    entries: Vec<PipelineEntry>,
}

impl PipelineBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entry(mut self, entry: PipelineEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Bare entry invoked for every request reaching it; return `NoResult`
    /// to defer.
    #[must_use]
    pub fn handle<F>(self, f: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> Result<HandlerResult, PipelineError> + Send + Sync + 'static,
    {
        self.entry(PipelineEntry::handler(f))
    }

    #[must_use]
    pub fn get<F>(self, pattern: &str, f: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> Result<HandlerResult, PipelineError> + Send + Sync + 'static,
    {
        self.entry(PipelineEntry::route(Method::GET, pattern, f))
    }

    #[must_use]
    pub fn post<F>(self, pattern: &str, f: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> Result<HandlerResult, PipelineError> + Send + Sync + 'static,
    {
        self.entry(PipelineEntry::route(Method::POST, pattern, f))
    }

    /// Mount a nested pipeline under a path prefix.
    #[must_use]
    pub fn mount(self, prefix: &str, pipeline: Pipeline) -> Self {
        self.entry(PipelineEntry::nested(pipeline).with_prefix(prefix))
    }

    /// Mount a nested pipeline guarded by a predicate.
    #[must_use]
    pub fn mount_if<P>(self, predicate: P, pipeline: Pipeline) -> Self
    where
        P: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        self.entry(PipelineEntry::nested(pipeline).with_predicate(predicate))
    }

    #[must_use]
    pub fn build(self) -> Pipeline {
        info!(entry_count = self.entries.len(), "Pipeline built");
        Pipeline {
            entries: self.entries,
        }
    }
}

/// The dispatch chain. Built once at startup, immutable for the process
/// lifetime, safely shared across concurrent requests.
pub struct Pipeline {
    entries: Vec<PipelineEntry>,
}

impl Pipeline {
    /// Run the chain for one request and finalize the outcome into concrete
    /// response parts. Never panics outward: handler panics are caught and
    /// finalized as generic 500s.
    #[must_use]
    pub fn dispatch(&self, req: &Request) -> ResponseParts {
        let mut headers = ResponseHeaders::new();
        let outcome = self.run(req, &req.path, &mut headers);
        match &outcome {
            Ok(HandlerResult::NoResult) => {
                warn!(method = %req.method, path = %req.path, "No pipeline entry matched");
            }
            Ok(_) => {
                debug!(method = %req.method, path = %req.path, "Chain produced a terminal result");
            }
            Err(e) => {
                info!(method = %req.method, path = %req.path, status = e.status(), error = %e, "Chain halted with error");
            }
        }
        finalizer::finalize(outcome, headers)
    }

    /// Traverse entries in registration order against `path` (the request
    /// path relative to the current mount). `Ok(NoResult)` means the chain
    /// was exhausted without a terminal result.
    fn run(
        &self,
        req: &Request,
        path: &str,
        headers: &mut ResponseHeaders,
    ) -> Result<HandlerResult, PipelineError> {
        for (idx, entry) in self.entries.iter().enumerate() {
            let current = match &entry.prefix {
                Some(prefix) => match path.strip_prefix(prefix.as_str()) {
                    Some(rest) => rest,
                    None => continue,
                },
                None => path,
            };

            if let Some(pred) = &entry.predicate {
                if !pred(req) {
                    debug!(entry = idx, path = %path, "Entry predicate declined");
                    continue;
                }
            }

            let mut params = RouteParams::new();
            if let Some((method, pattern)) = &entry.route {
                if req.method != *method {
                    continue;
                }
                match pattern.match_path(current) {
                    Some(p) => params = p,
                    None => continue,
                }
                debug!(entry = idx, pattern = %pattern.pattern(), path = %current, "Route matched");
            }

            let result = match &entry.handler {
                EntryHandler::Nested(pipeline) => pipeline.run(req, current, headers)?,
                EntryHandler::Func(f) => {
                    let mut ctx = Context {
                        request: req,
                        path: current,
                        params: &params,
                        headers: &mut *headers,
                    };
                    match catch_unwind(AssertUnwindSafe(|| f(&mut ctx))) {
                        Ok(outcome) => outcome?,
                        Err(panic) => {
                            error!(
                                entry = idx,
                                method = %req.method,
                                path = %req.path,
                                panic_message = %format!("{panic:?}"),
                                "Handler panicked"
                            );
                            return Err(PipelineError::Internal("handler panicked".to_string()));
                        }
                    }
                }
            };

            match result {
                HandlerResult::NoResult => continue,
                terminal => return Ok(terminal),
            }
        }
        Ok(HandlerResult::NoResult)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_headers_append_keeps_both() {
        let mut h = ResponseHeaders::new();
        h.append("Vary", "Accept");
        h.append("Vary", "Origin");
        let values: Vec<_> = h
            .entries()
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("vary"))
            .collect();
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_response_headers_set_replaces() {
        let mut h = ResponseHeaders::new();
        h.append("Content-Type", "text/plain");
        h.set("content-type", "application/json");
        assert_eq!(h.get("Content-Type"), Some("application/json"));
        assert_eq!(h.entries().len(), 1);
    }

    #[test]
    fn test_request_header_lookup_case_insensitive() {
        let req = Request::new(Method::GET, "/").with_header("Accept", "text/html");
        assert_eq!(req.header("accept"), Some("text/html"));
        assert_eq!(req.header("ACCEPT"), Some("text/html"));
    }

    #[test]
    fn test_context_param_last_write_wins() {
        let mut params = RouteParams::new();
        params.push((Arc::from("id"), "org".to_string()));
        params.push((Arc::from("id"), "user".to_string()));
        let req = Request::new(Method::GET, "/");
        let mut headers = ResponseHeaders::new();
        let ctx = Context {
            request: &req,
            path: "/",
            params: &params,
            headers: &mut headers,
        };
        assert_eq!(ctx.param("id"), Some("user"));
    }
}
