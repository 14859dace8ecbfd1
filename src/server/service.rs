use super::request::parse_request;
use super::response::write_response;
use crate::pipeline::Pipeline;
use may_minihttp::{HttpService, Request, Response};
use std::io;
use std::sync::Arc;
use tracing::info;

/// The `may_minihttp` service: one shared, immutable pipeline serving every
/// connection. Cloned per connection; clones share the same entry list.
#[derive(Clone)]
pub struct AppService {
    pipeline: Arc<Pipeline>,
}

impl AppService {
    #[must_use]
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let request = parse_request(req);
        let parts = self.pipeline.dispatch(&request);
        info!(
            method = %request.method,
            path = %request.path,
            status = parts.status,
            "Request completed"
        );
        write_response(res, parts);
        Ok(())
    }
}
