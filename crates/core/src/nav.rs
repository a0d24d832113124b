//! URL normalization for navigation commands.

use url::Url;

use crate::error::{Error, Result};

/// Normalizes a caller-supplied navigation target.
///
/// Bare hosts like `example.com` get an `https://` prefix and are parsed
/// again; anything that still is not an absolute http(s) URL is rejected.
pub fn normalize_url(input: &str) -> Result<Url> {
    if let Ok(url) = Url::parse(input) {
        if matches!(url.scheme(), "http" | "https") {
            return Ok(url);
        }
        // "localhost:3000" parses with scheme "localhost", so a parsed
        // non-http(s) scheme alone cannot reject: only an explicit
        // "scheme://" spelling names a real scheme the caller chose.
        if input.contains("://") {
            return Err(Error::InvalidUrl(input.to_string()));
        }
    }

    let prefixed = format!("https://{input}");
    match Url::parse(&prefixed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url),
        _ => Err(Error::InvalidUrl(input.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_https_prefix() {
        let url = normalize_url("example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn absolute_http_urls_pass_through() {
        let url = normalize_url("http://example.com/path?q=1").unwrap();
        assert_eq!(url.as_str(), "http://example.com/path?q=1");
        let url = normalize_url("https://example.com/feed/").unwrap();
        assert_eq!(url.as_str(), "https://example.com/feed/");
    }

    #[test]
    fn host_with_port_is_not_mistaken_for_a_scheme() {
        // Url::parse sees "localhost:3000" as scheme "localhost".
        let url = normalize_url("localhost:3000").unwrap();
        assert_eq!(url.as_str(), "https://localhost:3000/");
    }

    #[test]
    fn non_http_schemes_are_rejected() {
        assert!(normalize_url("ftp://example.com").is_err());
        assert!(normalize_url("javascript:alert(1)").is_err());
        assert!(normalize_url("file:///etc/passwd").is_err());
    }

    #[test]
    fn explicit_scheme_does_not_survive_the_https_prefix_fallback() {
        // "https://ftp://example.com" happens to parse (host "ftp",
        // empty port); the scheme the caller named must still reject.
        assert!(normalize_url("ftp://example.com").is_err());
        assert!(normalize_url("ws://example.com").is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(normalize_url("").is_err());
        assert!(normalize_url("not a host").is_err());
    }
}
