use crate::DomainError;

/// Placeholder values that show up in backlog rows instead of a domain
const PLACEHOLDERS: &[&str] = &["#na", "#n/a", "n/a", "na", "none", "null", "-"];

/// Fragments left behind when a search-engine URL was pasted as a domain
const SEARCH_ARTIFACTS: &[&str] = &["google.comsearch", "search?"];

/// Normalizes a raw backlog domain string
///
/// Trims whitespace, lower-cases, strips a leading `http://` / `https://`
/// scheme and `www.` prefix, and drops everything from the first `/`.
///
/// # Examples
///
/// ```
/// use forge_scout::url::normalize_domain;
///
/// assert_eq!(normalize_domain("  HTTPS://WWW.Example.com/about "), "example.com");
/// assert_eq!(normalize_domain("shop.example.com"), "shop.example.com");
/// ```
pub fn normalize_domain(raw: &str) -> String {
    let mut domain = raw.trim().to_lowercase();

    for scheme in ["https://", "http://"] {
        if let Some(rest) = domain.strip_prefix(scheme) {
            domain = rest.to_string();
            break;
        }
    }

    if let Some(rest) = domain.strip_prefix("www.") {
        domain = rest.to_string();
    }

    match domain.split('/').next() {
        Some(host) => host.trim().to_string(),
        None => String::new(),
    }
}

/// Cheap syntactic validity pre-check for a normalized domain
///
/// No network access is involved. A domain is accepted when it is non-empty,
/// is not a known placeholder or search artifact, contains a dot, and only
/// uses characters that can appear in a host name (an optional `:port` is
/// allowed).
pub fn validate_domain(domain: &str) -> Result<(), DomainError> {
    if domain.is_empty() {
        return Err(DomainError::Empty);
    }

    if PLACEHOLDERS.contains(&domain) {
        return Err(DomainError::Placeholder(domain.to_string()));
    }

    if SEARCH_ARTIFACTS.iter().any(|a| domain.contains(a)) {
        return Err(DomainError::SearchArtifact(domain.to_string()));
    }

    if !domain.contains('.') {
        return Err(DomainError::MissingDot(domain.to_string()));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ':'))
    {
        return Err(DomainError::InvalidCharacters(domain.to_string()));
    }

    if domain.starts_with('.') || domain.ends_with('.') || domain.contains("..") {
        return Err(DomainError::InvalidCharacters(domain.to_string()));
    }

    Ok(())
}

/// Normalizes and validates a raw backlog value in one step
///
/// Placeholders and search artifacts are detected on the raw value as well,
/// since normalization would cut `n/a` down to `n` and
/// `google.com/search?q=x` down to `google.com`.
///
/// # Examples
///
/// ```
/// use forge_scout::url::prepare_domain;
/// use forge_scout::DomainError;
///
/// assert_eq!(prepare_domain("http://www.acme.com/").unwrap(), "acme.com");
/// assert_eq!(prepare_domain("N/A"), Err(DomainError::Placeholder("n/a".into())));
/// ```
pub fn prepare_domain(raw: &str) -> Result<String, DomainError> {
    let lowered = raw.trim().to_lowercase();

    if PLACEHOLDERS.contains(&lowered.as_str()) {
        return Err(DomainError::Placeholder(lowered));
    }
    if SEARCH_ARTIFACTS.iter().any(|a| lowered.contains(a)) {
        return Err(DomainError::SearchArtifact(lowered));
    }

    let domain = normalize_domain(&lowered);
    validate_domain(&domain)?;
    Ok(domain)
}
