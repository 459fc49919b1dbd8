use regex::Regex;
use std::sync::OnceLock;

static LISTING_ID_RE: OnceLock<Regex> = OnceLock::new();

fn listing_id_re() -> &'static Regex {
    // hyphen + digits, right before the query string or at the end of the link
    LISTING_ID_RE.get_or_init(|| Regex::new(r"-(\d+)(?:\?|$)").expect("valid listing id pattern"))
}

/// Stable identifier for a listing derived from its detail link.
///
/// `https://…/view/backend-engineer-at-acme-3791234567?refId=x` → `3791234567`.
/// Links without such a segment are their own identifier.
pub fn resolve_listing_id(link: &str) -> String {
    listing_id_re()
        .captures(link)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| link.to_string())
}
