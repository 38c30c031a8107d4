//! Domain and URL handling for Forge-Scout
//!
//! This module provides backlog domain normalization, the syntactic validity
//! pre-check, and the site-identity helpers used to keep link discovery on
//! the origin domain.

mod domain;
mod normalize;

pub use domain::{normalize_domain, prepare_domain, validate_domain};
pub use normalize::{canonical_page_url, same_page, site_key};

/// The four URL variants tried for a bare domain, in resolution order
///
/// # Examples
///
/// ```
/// use forge_scout::url::url_variants;
///
/// let variants = url_variants("example.com");
/// assert_eq!(variants[0], "https://example.com");
/// assert_eq!(variants[3], "http://www.example.com");
/// ```
pub fn url_variants(domain: &str) -> [String; 4] {
    [
        format!("https://{}", domain),
        format!("https://www.{}", domain),
        format!("http://{}", domain),
        format!("http://www.{}", domain),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_order() {
        assert_eq!(
            url_variants("acme-machining.com"),
            [
                "https://acme-machining.com".to_string(),
                "https://www.acme-machining.com".to_string(),
                "http://acme-machining.com".to_string(),
                "http://www.acme-machining.com".to_string(),
            ]
        );
    }
}
