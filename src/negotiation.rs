//! Content negotiation over the `Accept` header.
//!
//! Implements standard HTTP preference ordering: media ranges are weighted by
//! quality value, then specificity (exact type beats `type/*` beats `*/*`),
//! then position in the header. Candidate order breaks remaining ties.
//!
//! The selector here is used purely as a pipeline predicate to branch between
//! an alternate-representation route tree and the default tree for the same
//! logical resource path. It is a pure function of the `Accept` header value
//! and never mutates the request.

use crate::pipeline::Request;

/// Default representation candidate.
pub const HTML: &str = "text/html";
/// ActivityPub representation.
pub const ACTIVITY_JSON: &str = "application/activity+json";
/// JSON-LD representation (ActivityStreams profile).
pub const LD_JSON: &str = "application/ld+json";

/// Quality values are parsed into thousandths so ordering stays integral.
const MAX_QUALITY: u16 = 1000;

/// One media range from an `Accept` header.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MediaRange {
    main: String,
    sub: String,
    /// Quality in thousandths, clamped to [0, 1000].
    quality: u16,
    /// Position in the header, for tie-breaking.
    position: usize,
}

/// Specificity of a range match: exact > subtype wildcard > full wildcard.
fn specificity(range: &MediaRange) -> u8 {
    match (range.main.as_str(), range.sub.as_str()) {
        ("*", _) => 0,
        (_, "*") => 1,
        _ => 2,
    }
}

fn parse_quality(raw: &str) -> Option<u16> {
    let value: f64 = raw.trim().parse().ok()?;
    Some((value.clamp(0.0, 1.0) * f64::from(MAX_QUALITY)).round() as u16)
}

/// Parse an `Accept` header value into media ranges.
///
/// Malformed entries are skipped rather than failing the whole header.
fn parse_accept(header: &str) -> Vec<MediaRange> {
    let mut ranges = Vec::new();
    for (position, entry) in header.split(',').enumerate() {
        let mut parts = entry.split(';');
        let Some(mime) = parts.next() else { continue };
        let mime = mime.trim();
        let Some((main, sub)) = mime.split_once('/') else {
            continue;
        };
        if main.is_empty() || sub.is_empty() {
            continue;
        }
        let mut quality = MAX_QUALITY;
        for param in parts {
            if let Some((key, value)) = param.split_once('=') {
                if key.trim().eq_ignore_ascii_case("q") {
                    quality = parse_quality(value).unwrap_or(0);
                }
            }
        }
        ranges.push(MediaRange {
            main: main.trim().to_ascii_lowercase(),
            sub: sub.trim().to_ascii_lowercase(),
            quality,
            position,
        });
    }
    ranges
}

/// How well a candidate type matches one media range, if at all.
fn range_match(range: &MediaRange, main: &str, sub: &str) -> bool {
    match (range.main.as_str(), range.sub.as_str()) {
        ("*", _) => true,
        (m, "*") => m == main,
        (m, s) => m == main && s == sub,
    }
}

/// Pick the client's preferred type among `candidates`.
///
/// `accept` is the raw `Accept` header value; `None` means every candidate is
/// acceptable and the first one wins. Candidates carrying parameters (e.g. a
/// profile) are compared on their `type/subtype` part only.
///
/// Per RFC 7231 a candidate's quality comes from the most specific range
/// matching it: `text/*, text/html;q=0.1` gives `text/html` quality 0.1,
/// not 1.0. Candidates are then compared by quality.
///
/// Returns `None` when negotiation yields no acceptable candidate.
#[must_use]
pub fn preferred_type<'a>(accept: Option<&str>, candidates: &[&'a str]) -> Option<&'a str> {
    let Some(header) = accept else {
        return candidates.first().copied();
    };
    let ranges = parse_accept(header);
    if ranges.is_empty() {
        return None;
    }

    // weight = (quality, specificity, reversed header position); higher wins.
    let mut best: Option<(&str, (u16, u8, usize))> = None;
    for candidate in candidates {
        let bare = candidate.split(';').next().unwrap_or(candidate).trim();
        let Some((main, sub)) = bare.split_once('/') else {
            continue;
        };
        // Specificity first: the most specific matching range owns the
        // candidate's quality.
        let governing = ranges
            .iter()
            .filter(|r| range_match(r, main, sub))
            .map(|r| (specificity(r), r.quality, usize::MAX - r.position))
            .max();
        if let Some((spec, quality, position)) = governing {
            if quality == 0 {
                continue;
            }
            let weight = (quality, spec, position);
            // Strict comparison keeps earlier candidates on ties.
            if best.map_or(true, |(_, w)| weight > w) {
                best = Some((candidate, weight));
            }
        }
    }
    best.map(|(c, _)| c)
}

/// Whether the request asks for an alternate (non-HTML) representation.
///
/// `false` when no `Accept` header is present, when the best match is HTML,
/// or when negotiation yields no match among the fixed candidate set.
#[must_use]
pub fn selects_alternate(req: &Request) -> bool {
    let Some(accept) = req.header("accept") else {
        return false;
    };
    matches!(
        preferred_type(Some(accept), &[HTML, ACTIVITY_JSON, LD_JSON]),
        Some(best) if best != HTML
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_type_wins() {
        let best = preferred_type(Some("application/activity+json"), &[HTML, ACTIVITY_JSON]);
        assert_eq!(best, Some(ACTIVITY_JSON));
    }

    #[test]
    fn test_html_preferred() {
        let best = preferred_type(Some("text/html"), &[HTML, ACTIVITY_JSON, LD_JSON]);
        assert_eq!(best, Some(HTML));
    }

    #[test]
    fn test_no_header_prefers_first_candidate() {
        assert_eq!(preferred_type(None, &[HTML, ACTIVITY_JSON]), Some(HTML));
    }

    #[test]
    fn test_quality_ordering() {
        let best = preferred_type(
            Some("text/html;q=0.2, application/activity+json;q=0.9"),
            &[HTML, ACTIVITY_JSON],
        );
        assert_eq!(best, Some(ACTIVITY_JSON));
    }

    #[test]
    fn test_wildcard_matches_all_first_candidate_wins() {
        assert_eq!(preferred_type(Some("*/*"), &[HTML, ACTIVITY_JSON]), Some(HTML));
    }

    #[test]
    fn test_subtype_wildcard() {
        let best = preferred_type(Some("application/*"), &[HTML, ACTIVITY_JSON, LD_JSON]);
        assert_eq!(best, Some(ACTIVITY_JSON));
    }

    #[test]
    fn test_specificity_beats_wildcard_at_equal_quality() {
        let best = preferred_type(Some("*/*, text/html"), &[ACTIVITY_JSON, HTML]);
        assert_eq!(best, Some(HTML));
    }

    #[test]
    fn test_most_specific_range_governs_quality() {
        // text/html is matched by both text/* (q=1) and text/html;q=0.1;
        // the exact range wins, downgrading html below the alternate type.
        let best = preferred_type(
            Some("text/*, application/activity+json;q=0.5, text/html;q=0.1"),
            &[HTML, ACTIVITY_JSON],
        );
        assert_eq!(best, Some(ACTIVITY_JSON));

        use http::Method;
        let req = Request::new(Method::GET, "/users/42")
            .with_header("Accept", "text/*, application/activity+json;q=0.5, text/html;q=0.1");
        assert!(selects_alternate(&req));
    }

    #[test]
    fn test_exact_zero_quality_not_rescued_by_wildcard() {
        assert_eq!(preferred_type(Some("text/*, text/html;q=0"), &[HTML]), None);
    }

    #[test]
    fn test_out_of_range_quality_clamps() {
        let best = preferred_type(
            Some("text/html;q=9, application/activity+json"),
            &[HTML, ACTIVITY_JSON],
        );
        assert_eq!(best, Some(HTML));
        assert_eq!(preferred_type(Some("text/html;q=-1"), &[HTML]), None);
    }

    #[test]
    fn test_zero_quality_excludes() {
        assert_eq!(preferred_type(Some("text/html;q=0"), &[HTML]), None);
    }

    #[test]
    fn test_no_match_yields_none() {
        assert_eq!(preferred_type(Some("image/png"), &[HTML, ACTIVITY_JSON]), None);
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let best = preferred_type(Some("garbage, text/html"), &[HTML]);
        assert_eq!(best, Some(HTML));
    }

    #[test]
    fn test_ld_json_profile_candidate_matches_bare_type() {
        let candidate = "application/ld+json; profile=\"https://www.w3.org/ns/activitystreams\"";
        let best = preferred_type(Some("application/ld+json"), &[HTML, candidate]);
        assert_eq!(best, Some(candidate));
    }

    #[test]
    fn test_selector_is_pure() {
        use http::Method;
        let req = Request::new(Method::GET, "/users/42")
            .with_header("Accept", "application/activity+json");
        assert!(selects_alternate(&req));
        assert!(selects_alternate(&req));
    }

    #[test]
    fn test_selector_false_without_header() {
        use http::Method;
        let req = Request::new(Method::GET, "/users/42");
        assert!(!selects_alternate(&req));
    }

    #[test]
    fn test_selector_false_for_html() {
        use http::Method;
        let req = Request::new(Method::GET, "/users/42").with_header("Accept", "text/html");
        assert!(!selects_alternate(&req));
    }
}
