use url::Url;

/// Returns the site identity of a URL: host lower-cased with any `www.`
/// prefix removed, plus `:port` when the URL carries a non-default port
///
/// Two URLs belong to the same site exactly when their site keys are equal.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use forge_scout::url::site_key;
///
/// let a = Url::parse("https://www.Example.com/about").unwrap();
/// let b = Url::parse("http://example.com/").unwrap();
/// assert_eq!(site_key(&a), site_key(&b));
/// ```
pub fn site_key(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();

    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Canonical form of an internal page URL: query string and fragment removed
pub fn canonical_page_url(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.to_string()
}

/// Returns true if two URLs address the same page of the same site
///
/// Scheme, `www.`, query, fragment and a trailing slash are ignored.
pub fn same_page(a: &Url, b: &Url) -> bool {
    site_key(a) == site_key(b) && a.path().trim_end_matches('/') == b.path().trim_end_matches('/')
}
