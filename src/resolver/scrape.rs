//! Regex scraping of repository search and package pages.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use url::Url;

/// Compiles a regex at static init; panics on invalid pattern.
fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Package detail links on a search page: `/en/packages/<id>/`.
static PACKAGE_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"/en/packages/([A-Za-z0-9_.\-]+)/"));

/// Anchor targets ending in `.apk`.
static APK_HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"href="([^"]+?\.apk)""#));

/// Named and numeric character references.
static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z]+);"));

/// Yields every package id linked from a search page, in document order.
///
/// Duplicates are kept; [`SearchResults`](super::SearchResults) dedupes and sorts.
pub fn extract_package_ids(html: &str) -> impl Iterator<Item = &str> {
    PACKAGE_LINK_RE
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}

/// Returns the first APK link on a package page that belongs to `package_name`.
///
/// Only hrefs containing `/repo/<package_name>_` qualify; links to other
/// packages' APKs on the same page are ignored. Repository pages list the
/// newest build first, so document order decides. The result is
/// entity-decoded and made absolute against `base_url` when site-root-relative.
#[must_use]
pub fn extract_download_url(html: &str, package_name: &str, base_url: &str) -> Option<String> {
    let marker = format!("/repo/{package_name}_");
    APK_HREF_RE
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .find(|href| href.contains(&marker))
        .map(|href| absolutize(&unescape_html(href), base_url))
}

/// Makes a scraped href absolute.
///
/// Absolute URLs pass through, `//host/...` gets the base URL's scheme,
/// `/path` is prefixed with the base URL, and anything else is joined
/// against the base URL.
#[must_use]
pub fn absolutize(href: &str, base_url: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    if href.starts_with("//") {
        let scheme = Url::parse(base_url)
            .map(|u| u.scheme().to_string())
            .unwrap_or_else(|_| "https".to_string());
        return format!("{scheme}:{href}");
    }
    if href.starts_with('/') {
        return format!("{base_url}{href}");
    }
    Url::parse(&format!("{base_url}/"))
        .and_then(|base| base.join(href))
        .map_or_else(|_| href.to_string(), |joined| joined.to_string())
}

/// Decodes HTML character references (`&amp;`, `&#39;`, `&#x2F;`, ...).
///
/// Unknown named references are left untouched.
#[must_use]
pub fn unescape_html(value: &str) -> String {
    ENTITY_RE
        .replace_all(value, |caps: &Captures<'_>| {
            let entity = &caps[1];
            decode_entity(entity).map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

fn decode_entity(entity: &str) -> Option<char> {
    if let Some(numeric) = entity.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    match entity {
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "nbsp" => Some('\u{00a0}'),
        _ => None,
    }
}
