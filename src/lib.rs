//! # Waypoint
//!
//! **Waypoint** is the request-dispatch core of a small HTTP service: an
//! ordered middleware/router pipeline built on the `may` coroutine runtime
//! and `may_minihttp`.
//!
//! ## Overview
//!
//! The pipeline matches incoming requests against route patterns and custom
//! predicates (including content-negotiation-driven branching between
//! alternate handler sets for the same path), extracts path parameters,
//! validates query strings and request bodies against flat declared schemas,
//! and converts a handler's return value into a concrete HTTP response.
//!
//! ## Architecture
//!
//! - **[`pipeline`]**: the middleware chain engine. Ordered entries with
//!   optional prefix/predicate/route gates, executed with short-circuit
//!   fallthrough; a handler yielding `NoResult` defers to the next entry
//! - **[`matcher`]**: `:name`-style route patterns compiled to anchored
//!   regex matchers that extract named path parameters
//! - **[`negotiation`]**: `Accept` header preference ordering (quality
//!   values, specificity) used as a pipeline predicate
//! - **[`schema`]** / **[`validator`]**: flat record schemas applied to
//!   decoded query strings and bodies, failing with structured 400s
//! - **[`finalizer`]**: maps a chain outcome to status, merged headers,
//!   and a serialized body
//! - **[`server`]**: `may_minihttp` transport glue and server handle
//! - **[`static_files`]**: directory serving as an opaque pipeline entry
//! - **[`app`]**: the reference route set served by the binary
//!
//! ## Request Flow
//!
//! 1. The server parses the wire request into an immutable [`pipeline::Request`]
//!    snapshot.
//! 2. The pipeline traverses its entries in registration order; the first
//!    entry whose prefix, predicate, and route gates all pass runs its
//!    handler.
//! 3. A handler returning `NoResult` defers to the next entry; headers it
//!    appended are preserved. Any other result, or an error, halts the
//!    chain.
//! 4. The finalizer converts the outcome into `(status, headers, body)`;
//!    an exhausted chain becomes a 404, handler panics become generic 500s.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use waypoint::pipeline::{HandlerResult, PipelineBuilder};
//! use waypoint::server::{AppService, HttpServer};
//!
//! let pipeline = PipelineBuilder::new()
//!     .get("/hello/:name", |ctx| {
//!         let name = ctx.param("name").unwrap_or_default().to_string();
//!         Ok(HandlerResult::json(serde_json::json!({ "hello": name })))
//!     })
//!     .build();
//!
//! let service = AppService::new(Arc::new(pipeline));
//! let handle = HttpServer(service).start("0.0.0.0:3333").unwrap();
//! handle.join().unwrap();
//! ```
//!
//! ## Runtime Considerations
//!
//! Waypoint runs on the `may` coroutine runtime, not tokio: each connection
//! is served on a coroutine, the traversal for one request is sequential,
//! and the built pipeline is immutable read-only data shared by every
//! in-flight request. Stack size is configurable via `WAYPOINT_STACK_SIZE`.

pub mod app;
pub mod error;
pub mod finalizer;
pub mod matcher;
pub mod negotiation;
pub mod pipeline;
pub mod runtime_config;
pub mod schema;
pub mod server;
pub mod static_files;
pub mod validator;

pub use error::PipelineError;
pub use finalizer::ResponseParts;
pub use matcher::{PathPattern, RouteParams};
pub use pipeline::{
    Context, HandlerResult, Payload, Pipeline, PipelineBuilder, PipelineEntry, Request,
    ResponseHeaders,
};
pub use schema::{RecordSchema, ValueType};
