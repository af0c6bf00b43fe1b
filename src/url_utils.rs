//! URL helpers for resolving the site's relative links.

use std::sync::LazyLock;

use url::Url;

use crate::patterns::ROOT_URL;

#[allow(clippy::expect_used)]
static ROOT: LazyLock<Url> = LazyLock::new(|| Url::parse(ROOT_URL).expect("ROOT_URL parses"));

/// True for absolute http(s) URLs with a host.
#[must_use]
pub fn is_http_url(s: &str) -> bool {
    let s = s.trim();
    if !s.starts_with("http://") && !s.starts_with("https://") {
        return false;
    }
    matches!(Url::parse(s), Ok(url) if url.host().is_some())
}

/// Resolve a possibly-relative href against the site root.
///
/// Absolute URLs and special schemes (`data:`, `javascript:`) pass through
/// unchanged; unresolvable input is returned as-is rather than erroring.
#[must_use]
pub fn absolute_url(href: &str) -> String {
    let href = href.trim();

    if href.is_empty() {
        return String::new();
    }
    if href.starts_with("data:") || href.starts_with("javascript:") {
        return href.to_string();
    }
    if is_http_url(href) {
        return href.to_string();
    }

    match ROOT.join(href) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => href.to_string(),
    }
}
