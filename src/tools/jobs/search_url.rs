use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::query::SearchSpec;

/// Characters escaped by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

fn encode(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// Build the listings search URL for `spec`.
///
/// `{base}?keywords=…[&location=…]&f_TPR=r{secs}[&f_E={code}]`. Output
/// depends only on its inputs.
pub fn build_search_url(base: &str, spec: &SearchSpec) -> String {
    let mut url = format!("{}?keywords={}", base, encode(&spec.job_title));
    if let Some(location) = &spec.location {
        url.push_str("&location=");
        url.push_str(&encode(location));
    }
    url.push_str(&format!("&f_TPR=r{}", spec.recency_window_secs));
    if let Some(level) = spec.experience {
        url.push_str("&f_E=");
        url.push_str(level.code());
    }
    url
}
