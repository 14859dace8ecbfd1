use regex::Regex;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::debug;

/// Maximum number of path parameters before heap allocation.
/// Most routes have well under 8 named segments.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Parameter names come from the compiled pattern and are shared as
/// `Arc<str>`; values are per-request data extracted from the URL.
pub type RouteParams = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// A compiled route pattern.
///
/// Pattern segments are either literal (must match exactly) or named
/// (`:name`, capturing one non-slash segment). Matching is anchored at both
/// ends of the path. A pattern with zero named segments matches only the
/// exact literal path.
#[derive(Debug, Clone)]
pub struct PathPattern {
    pattern: String,
    regex: Regex,
    param_names: Vec<Arc<str>>,
}

impl PathPattern {
    /// Compile a `:name`-style pattern into a matcher.
    ///
    /// Called once per route at startup; an invalid pattern is a programming
    /// error and aborts startup.
    #[must_use]
    pub fn compile(pattern: &str) -> Self {
        let mut regex_src = String::with_capacity(pattern.len() + 8);
        regex_src.push('^');
        let mut param_names: Vec<Arc<str>> = Vec::new();

        if pattern == "/" {
            regex_src.push('/');
        } else {
            for segment in pattern.split('/').skip(1) {
                if let Some(name) = segment.strip_prefix(':') {
                    regex_src.push_str("/([^/]+)");
                    param_names.push(Arc::from(name));
                } else {
                    regex_src.push('/');
                    regex_src.push_str(&regex::escape(segment));
                }
            }
        }
        regex_src.push('$');

        let regex = Regex::new(&regex_src).expect("failed to compile route pattern regex");
        debug!(pattern = %pattern, regex = %regex_src, params = ?param_names, "Route pattern compiled");

        PathPattern {
            pattern: pattern.to_string(),
            regex,
            param_names,
        }
    }

    /// The source pattern this matcher was compiled from.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Names of the declared parameters, in pattern order.
    #[must_use]
    pub fn param_names(&self) -> &[Arc<str>] {
        &self.param_names
    }

    /// Match a path, extracting named parameters.
    ///
    /// Captured values are percent-decoded; no other transformation is
    /// applied. Returns `None` when the path does not satisfy the pattern.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<RouteParams> {
        let caps = self.regex.captures(path)?;
        let mut params = RouteParams::new();
        for (i, name) in self.param_names.iter().enumerate() {
            let raw = caps.get(i + 1)?.as_str();
            let value = urlencoding::decode(raw)
                .map(|c| c.into_owned())
                .unwrap_or_else(|_| raw.to_string());
            params.push((Arc::clone(name), value));
        }
        Some(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(params: &'a RouteParams, name: &str) -> Option<&'a str> {
        params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_literal_pattern_exact_match_only() {
        let p = PathPattern::compile("/text");
        assert!(p.match_path("/text").is_some());
        assert!(p.match_path("/text/more").is_none());
        assert!(p.match_path("/tex").is_none());
    }

    #[test]
    fn test_named_segment_capture() {
        let p = PathPattern::compile("/params/:name");
        let params = p.match_path("/params/foo").unwrap();
        assert_eq!(param(&params, "name"), Some("foo"));
    }

    #[test]
    fn test_multiple_named_segments() {
        let p = PathPattern::compile("/users/:userId/posts/:postId");
        let params = p.match_path("/users/42/posts/abc").unwrap();
        assert_eq!(param(&params, "userId"), Some("42"));
        assert_eq!(param(&params, "postId"), Some("abc"));
    }

    #[test]
    fn test_named_segment_does_not_cross_slash() {
        let p = PathPattern::compile("/users/:userId");
        assert!(p.match_path("/users/42/outbox").is_none());
    }

    #[test]
    fn test_trailing_slash_is_distinct() {
        let p = PathPattern::compile("/users/:userId");
        assert!(p.match_path("/users/42/").is_none());
        let slash = PathPattern::compile("/users/:userId/");
        assert!(slash.match_path("/users/42/").is_some());
        assert!(slash.match_path("/users/42").is_none());
    }

    #[test]
    fn test_percent_decoding() {
        let p = PathPattern::compile("/params/:name");
        let params = p.match_path("/params/a%20b").unwrap();
        assert_eq!(param(&params, "name"), Some("a b"));
    }

    #[test]
    fn test_root_pattern() {
        let p = PathPattern::compile("/");
        assert!(p.match_path("/").is_some());
        assert!(p.match_path("/x").is_none());
    }

    #[test]
    fn test_literal_segments_are_escaped() {
        let p = PathPattern::compile("/a.b");
        assert!(p.match_path("/a.b").is_some());
        assert!(p.match_path("/aXb").is_none());
    }

    #[test]
    fn test_declared_params_exactly() {
        let p = PathPattern::compile("/users/:userId/outbox");
        let params = p.match_path("/users/42/outbox").unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(param(&params, "userId"), Some("42"));
    }
}
