use crate::finalizer::ResponseParts;
use may_minihttp::Response;

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "OK",
    }
}

/// Write finalized response parts to the wire.
///
/// Header lines are leaked: `may_minihttp::Response::header` takes
/// `&'static str`.
pub fn write_response(res: &mut Response, parts: ResponseParts) {
    res.status_code(parts.status as usize, status_reason(parts.status));
    for (name, value) in &parts.headers {
        let line = format!("{name}: {value}").into_boxed_str();
        res.header(Box::leak(line));
    }
    if let Some(body) = parts.body {
        res.body_vec(body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(204), "No Content");
        assert_eq!(status_reason(403), "Forbidden");
        assert_eq!(status_reason(404), "Not Found");
        assert_eq!(status_reason(418), "OK");
    }
}
