use url::Url;

/// Canonicalizes an absolute URL before it is admitted to the frontier
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Lowercase scheme and host, drop default ports (done by the parser)
/// 3. Give an empty path the root `/`
/// 4. Remove the fragment (everything after #)
///
/// Query strings and path case are preserved: on many sites they select
/// different documents.
///
/// # Examples
///
/// ```
/// use site_scraper::url::canonicalize;
///
/// assert_eq!(
///     canonicalize("HTTP://Example.com:80/Page#top").as_deref(),
///     Some("http://example.com/Page")
/// );
/// ```
pub fn canonicalize(url_str: &str) -> Option<String> {
    let mut url = Url::parse(url_str.trim()).ok()?;
    url.set_fragment(None);
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_fragment() {
        assert_eq!(
            canonicalize("https://example.com/page#section").as_deref(),
            Some("https://example.com/page")
        );
    }

    #[test]
    fn test_root_gets_slash() {
        assert_eq!(
            canonicalize("https://example.com").as_deref(),
            Some("https://example.com/")
        );
    }

    #[test]
    fn test_lowercase_host_keeps_path_case() {
        assert_eq!(
            canonicalize("https://EXAMPLE.COM/Page").as_deref(),
            Some("https://example.com/Page")
        );
    }

    #[test]
    fn test_default_port_dropped() {
        assert_eq!(
            canonicalize("http://example.com:80/a").as_deref(),
            Some("http://example.com/a")
        );
        assert_eq!(
            canonicalize("http://example.com:8080/a").as_deref(),
            Some("http://example.com:8080/a")
        );
    }

    #[test]
    fn test_query_preserved() {
        assert_eq!(
            canonicalize("https://example.com/list?page=2").as_deref(),
            Some("https://example.com/list?page=2")
        );
    }

    #[test]
    fn test_malformed_rejected() {
        assert_eq!(canonicalize("not a url"), None);
        assert_eq!(canonicalize(""), None);
    }
}
