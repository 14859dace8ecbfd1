//! # Middleware Chain Engine
//!
//! Holds an ordered list of pipeline entries and executes them in
//! registration order with short-circuit fallthrough.
//!
//! Each entry carries an optional path prefix, an optional predicate, an
//! optional method + pattern route, and a handler. The first entry whose
//! gates all pass invokes its handler; a handler that yields
//! [`HandlerResult::NoResult`] defers to the next entry, any other result
//! halts the chain and is finalized. An exhausted chain finalizes as 404.
//!
//! The entry list is built once at startup through [`PipelineBuilder`] and
//! is immutable afterwards; a built [`Pipeline`] is shared read-only across
//! all in-flight requests.

mod core;

pub use core::{
    Context, HandlerFn, HandlerResult, Payload, Pipeline, PipelineBuilder, PipelineEntry,
    Predicate, Request, ResponseHeaders,
};
