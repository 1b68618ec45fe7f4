//! URL validation. Runs before any outbound call.

use crate::domain::ErrorKind;
use url::{Host, Url};

/// Longest URL the bot accepts.
pub const MAX_URL_LEN: usize = 2048;

/// Accepts absolute `http`/`https` URLs whose host is a dotted domain name
/// ending in an alphabetic TLD of at least two letters.
pub fn validate_url(raw: &str) -> Result<Url, ErrorKind> {
    if raw.is_empty() || raw.len() > MAX_URL_LEN || raw.chars().any(char::is_whitespace) {
        return Err(ErrorKind::InvalidUrl);
    }
    // `Url::parse` also accepts `https:example.com`; insist on the authority slashes.
    let lower = raw.get(..8).unwrap_or(raw).to_ascii_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return Err(ErrorKind::InvalidUrl);
    }
    let url = Url::parse(raw).map_err(|_| ErrorKind::InvalidUrl)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ErrorKind::InvalidUrl);
    }
    match url.host() {
        Some(Host::Domain(domain)) if is_public_domain(domain) => Ok(url),
        _ => Err(ErrorKind::InvalidUrl),
    }
}

fn is_public_domain(domain: &str) -> bool {
    let labels: Vec<&str> = domain.trim_end_matches('.').split('.').collect();
    let Some((tld, rest)) = labels.split_last() else {
        return false;
    };
    !rest.is_empty()
        && tld.len() >= 2
        && tld.chars().all(|c| c.is_ascii_alphabetic())
        && rest
            .iter()
            .all(|l| !l.is_empty() && l.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'))
}

pub fn is_valid_url(raw: &str) -> bool {
    validate_url(raw).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_http_and_https() {
        assert!(is_valid_url("https://a.com"));
        assert!(is_valid_url("http://example.com:8080/path?q=1"));
    }

    #[test]
    fn test_rejects_missing_scheme_and_garbage() {
        assert_eq!(validate_url("not a url"), Err(ErrorKind::InvalidUrl));
        assert_eq!(validate_url("not-a-url"), Err(ErrorKind::InvalidUrl));
        assert_eq!(validate_url("example.com"), Err(ErrorKind::InvalidUrl));
        assert_eq!(validate_url(""), Err(ErrorKind::InvalidUrl));
    }

    #[test]
    fn test_rejects_forms_without_a_dotted_host() {
        assert!(!is_valid_url("https:example.com"));
        assert!(!is_valid_url("https://a"));
        assert!(!is_valid_url("http://localhost:8080/x"));
        assert!(!is_valid_url("http://127.0.0.1/"));
        assert!(!is_valid_url("https://example.c0m"));
        assert!(is_valid_url("HTTPS://Sub.Example.org/a?b=c"));
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert!(!is_valid_url("ftp://example.com/file"));
        assert!(!is_valid_url("mailto:someone@example.com"));
    }

    #[test]
    fn test_rejects_overlong() {
        let long = format!("https://a.com/{}", "x".repeat(MAX_URL_LEN));
        assert!(!is_valid_url(&long));
    }
}
