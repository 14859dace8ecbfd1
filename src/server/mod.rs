//! Transport glue: parsing wire requests into pipeline [`Request`]
//! snapshots, writing finalized [`ResponseParts`] back, and running the
//! `may_minihttp` server.
//!
//! [`Request`]: crate::pipeline::Request
//! [`ResponseParts`]: crate::finalizer::ResponseParts

pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::parse_request;
pub use service::AppService;
