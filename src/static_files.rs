//! Static file serving as an opaque pipeline entry.
//!
//! Maps URL paths onto a base directory (path traversal is rejected), infers
//! a content type from the file extension, and stamps every response with a
//! fixed cache lifetime. A miss yields `NoResult` so the chain continues to
//! the 404 fallthrough.

use crate::pipeline::{Context, HandlerResult, PipelineEntry};
use http::Method;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

pub struct StaticFiles {
    base_dir: PathBuf,
    /// Cache lifetime in seconds, emitted as `Cache-Control: max-age=<secs>`.
    max_age_secs: u64,
}

impl StaticFiles {
    pub fn new<P: Into<PathBuf>>(base: P, max_age_secs: u64) -> Self {
        Self {
            base_dir: base.into(),
            max_age_secs,
        }
    }

    fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let mut pb = self.base_dir.clone();
        for comp in Path::new(url_path.trim_start_matches('/')).components() {
            match comp {
                Component::Normal(s) => pb.push(s),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(pb)
    }

    fn content_type(path: &Path) -> &'static str {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase()
            .as_str()
        {
            "html" => "text/html",
            "css" => "text/css",
            "js" => "application/javascript",
            "json" => "application/json",
            "txt" => "text/plain",
            _ => "application/octet-stream",
        }
    }

    /// Read a file under the base directory.
    pub fn load(&self, url_path: &str) -> io::Result<(Vec<u8>, &'static str)> {
        let path = self
            .map_path(url_path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "invalid path"))?;
        if !path.is_file() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        }
        let bytes = fs::read(&path)?;
        Ok((bytes, Self::content_type(&path)))
    }

    /// Package this directory as a prefix-mounted pipeline entry.
    ///
    /// GET requests whose mount-relative path resolves to a file are served
    /// with the content type and cache lifetime headers; everything else
    /// falls through.
    #[must_use]
    pub fn into_entry(self, prefix: &str) -> PipelineEntry {
        let cache_control = format!("max-age={}", self.max_age_secs);
        PipelineEntry::handler(move |ctx: &mut Context<'_>| {
            if ctx.request.method != Method::GET {
                return Ok(HandlerResult::NoResult);
            }
            match self.load(ctx.path) {
                Ok((bytes, content_type)) => {
                    debug!(path = %ctx.path, content_type = %content_type, "Static file served");
                    ctx.headers.set("Content-Type", content_type);
                    ctx.headers.set("Cache-Control", cache_control.clone());
                    Ok(HandlerResult::bytes(bytes))
                }
                Err(_) => Ok(HandlerResult::NoResult),
            }
        })
        .with_prefix(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fixture_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let mut f = fs::File::create(dir.path().join("hello.txt")).unwrap();
        f.write_all(b"Hello\n").unwrap();
        dir
    }

    #[test]
    fn test_map_path_prevents_traversal() {
        let sf = StaticFiles::new("static", 300);
        assert!(sf.map_path("../Cargo.toml").is_none());
        assert!(sf.map_path("../../etc/passwd").is_none());
    }

    #[test]
    fn test_load_plain_file() {
        let dir = fixture_dir();
        let sf = StaticFiles::new(dir.path(), 300);
        let (bytes, ct) = sf.load("hello.txt").unwrap();
        assert_eq!(ct, "text/plain");
        assert_eq!(bytes, b"Hello\n");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = fixture_dir();
        let sf = StaticFiles::new(dir.path(), 300);
        assert!(sf.load("nope.txt").is_err());
    }
}
