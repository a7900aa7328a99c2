//! Image delivery transformations.

use contentstack_protocol::QueryParams;

/// Appends transformation parameters (`width`, `height`, `format`, ...) to an
/// image URL, keeping any query string it already has.
pub fn transform_url(url: &str, params: &QueryParams) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, separator, params.query_string())
}
