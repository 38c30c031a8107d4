//! Internal link discovery
//!
//! Extracts same-site page links from an entry page so the crawl controller
//! can sample a bounded number of internal pages.

use crate::url::{canonical_page_url, same_page, site_key};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts internal links relative to a bare origin domain
///
/// Relative targets resolve against `https://{origin_domain}/`.
///
/// # Example
///
/// ```
/// use forge_scout::crawler::extract_links;
///
/// let html = r#"<a href="/services">Services</a><a href="https://other.com/">Other</a>"#;
/// let links = extract_links(html, "acme.com", 15);
/// assert_eq!(links, vec!["https://acme.com/services".to_string()]);
/// ```
pub fn extract_links(html: &str, origin_domain: &str, cap: usize) -> Vec<String> {
    match Url::parse(&format!("https://{}/", origin_domain)) {
        Ok(base) => extract_internal_links(html, &base, cap),
        Err(_) => Vec::new(),
    }
}

/// Extracts internal links of the site that served `base`
///
/// # Link Rules
///
/// **Skip:**
/// - Empty and fragment-only targets
/// - `javascript:`, `mailto:`, `tel:` (and any other non-HTTP scheme)
/// - Links to another host after `www.` normalization
/// - The base page itself
///
/// **Resolve:**
/// - `/path` against the base origin, `//host/path` with the base scheme
/// - Absolute `http(s)` targets as-is
///
/// Results drop query string and fragment, are de-duplicated in document
/// order, and are capped after de-duplication.
pub fn extract_internal_links(html: &str, base: &Url, cap: usize) -> Vec<String> {
    let Some(origin) = site_key(base) else {
        return Vec::new();
    };
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(url) = resolve_link(href, base) else {
            continue;
        };

        if site_key(&url).as_deref() != Some(origin.as_str()) || same_page(&url, base) {
            continue;
        }

        let canonical = canonical_page_url(&url);
        if seen.insert(canonical.clone()) {
            links.push(canonical);
        }
    }

    links.truncate(cap);
    links
}

/// Resolves a link href to an absolute HTTP(S) URL
///
/// Returns None if the link should be excluded:
/// - empty or fragment-only
/// - javascript:, mailto:, tel: and other non-HTTP schemes
/// - document-relative paths (`page.html`, `../x`)
/// - invalid URLs
fn resolve_link(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
    {
        return None;
    }

    let resolved = if href.starts_with("//") {
        Url::parse(&format!("{}:{}", base.scheme(), href)).ok()?
    } else if href.starts_with('/') {
        base.join(href).ok()?
    } else if lowered.starts_with("http://") || lowered.starts_with("https://") {
        Url::parse(href).ok()?
    } else {
        return None;
    };

    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}
