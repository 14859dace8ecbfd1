//! The reference service: the concrete route set served by the `waypoint`
//! binary, wired onto the pipeline engine.
//!
//! Entry order matters and mirrors the served behavior: a request logger
//! first, then the negotiation-guarded alternate tree, the default routes,
//! the `/api` mount with its default-header entry and validated endpoints,
//! and finally the static mount.

use crate::error::PipelineError;
use crate::negotiation;
use crate::pipeline::{HandlerResult, Pipeline, PipelineBuilder};
use crate::schema::{RecordSchema, ValueType};
use crate::static_files::StaticFiles;
use crate::validator::{validate_body, validate_query};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

/// Cache lifetime for static assets, in seconds.
const STATIC_MAX_AGE_SECS: u64 = 300;

/// Routes served only for alternate-representation requests. The same
/// logical path exists in the default tree with a different shape; the
/// negotiation predicate on the mount decides which tree runs.
fn alternate_tree() -> Pipeline {
    PipelineBuilder::new()
        .get("/users/:userId", |ctx| {
            ctx.headers.append("Vary", "Accept");
            let id = ctx.param("userId").unwrap_or_default().to_string();
            Ok(HandlerResult::json(json!({ "name": id })))
        })
        .build()
}

/// The `/api` subtree: a deferring default-header entry followed by the
/// validated endpoints.
fn api_tree() -> Pipeline {
    let query_schema = RecordSchema::of(ValueType::String);
    let body_schema = RecordSchema::of(ValueType::Any);
    PipelineBuilder::new()
        .handle(|ctx| {
            ctx.headers
                .append("Cache-Control", "private, max-age=0, must-revalidate");
            Ok(HandlerResult::NoResult)
        })
        .get("/endpoint", move |ctx| {
            let query = validate_query(ctx.request, &query_schema)?;
            Ok(HandlerResult::json(json!({ "res": "ok", "query": query })))
        })
        .post("/post", move |ctx| {
            let body = validate_body(ctx.request, &body_schema)?;
            Ok(HandlerResult::json(json!({ "res": "ok", "body": body })))
        })
        .build()
}

/// Build the full reference pipeline.
///
/// `static_dir`, when given, is mounted under `/static` with a fixed cache
/// lifetime.
#[must_use]
pub fn reference_pipeline(static_dir: Option<PathBuf>) -> Pipeline {
    let mut builder = PipelineBuilder::new()
        .handle(|ctx| {
            info!(method = %ctx.request.method, path = %ctx.request.path, "Request received");
            Ok(HandlerResult::NoResult)
        })
        .mount_if(negotiation::selects_alternate, alternate_tree())
        .get("/text", |ctx| {
            // The transport adds no charset on its own; set it explicitly.
            ctx.headers.set("Content-Type", "text/plain; charset=utf-8");
            Ok(HandlerResult::text("あ"))
        })
        .get("/json", |_ctx| Ok(HandlerResult::json(json!({ "a": "あ" }))))
        .get("/403", |_ctx| {
            Err(PipelineError::handler(
                403,
                "Forbidden",
                Some(json!({ "message": "message" })),
            ))
        })
        .get("/204", |_ctx| Ok(HandlerResult::status(204)))
        .get("/params/:name", |ctx| {
            let name = ctx.param("name").unwrap_or_default().to_string();
            Ok(HandlerResult::json(json!({ "name": name })))
        })
        .get("/users/:userId", |ctx| {
            ctx.headers.append("Vary", "Accept");
            let id = ctx.param("userId").unwrap_or_default();
            Ok(HandlerResult::text(format!("Non AP request for {id}")))
        })
        .get("/users/:userId/outbox", |ctx| {
            let id = ctx.param("userId").unwrap_or_default();
            Ok(HandlerResult::text(format!("outbox request for {id}")))
        })
        .mount("/api", api_tree());

    if let Some(dir) = static_dir {
        builder = builder.entry(StaticFiles::new(dir, STATIC_MAX_AGE_SECS).into_entry("/static"));
    }
    builder.build()
}
