//! # Path Matcher
//!
//! Compiles `:name`-style route patterns into anchored regex matchers that
//! extract named parameters from a URL path.
//!
//! Two-phase approach: patterns are compiled once at startup, then each
//! incoming path is tested against the compiled regex, which captures one
//! non-slash segment per named parameter.
//!
//! Trailing slashes are never normalized: `/x` and `/x/` are distinct paths.

mod core;

pub use core::{PathPattern, RouteParams, MAX_INLINE_PARAMS};
