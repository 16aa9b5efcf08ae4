use url::Url;

/// File extensions that never lead to an HTML document
pub const ASSET_EXTENSIONS: &[&str] = &[
    // images
    ".jpg", ".jpeg", ".png", ".gif", ".svg", ".ico", ".webp",
    // media
    ".mp4", ".mp3", ".avi", ".wmv",
    // documents
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx",
    // archives and binaries
    ".zip", ".tar", ".gz", ".rar", ".7z", ".exe", ".dmg", ".iso",
    // stylesheets, scripts, data and feeds
    ".css", ".js", ".json", ".xml", ".rss", ".atom",
    // fonts
    ".woff", ".woff2", ".ttf", ".eot",
];

/// Returns true if `url` lies under `base_url`
///
/// Both URLs are parsed, so scheme and host comparison is case-insensitive and
/// default ports are implied. The path of `url` must then start with the path of
/// `base_url`. Anything that fails to parse is out of scope.
///
/// # Examples
///
/// ```
/// use site_scraper::url::in_scope;
///
/// assert!(in_scope("http://a.com/x", "http://a.com"));
/// assert!(!in_scope("http://b.com/x", "http://a.com"));
/// ```
pub fn in_scope(url: &str, base_url: &str) -> bool {
    let (Ok(candidate), Ok(base)) = (Url::parse(url), Url::parse(base_url)) else {
        return false;
    };

    if candidate.scheme() != "http" && candidate.scheme() != "https" {
        return false;
    }

    candidate.scheme() == base.scheme()
        && candidate.host_str().is_some()
        && candidate.host_str() == base.host_str()
        && candidate.port_or_known_default() == base.port_or_known_default()
        && candidate.path().starts_with(base.path())
}

/// Returns true if `url` points at a non-document resource
///
/// Fragment-only links (a trailing `#`) count as assets too. The extension check
/// runs on the path, so query strings do not hide an asset.
///
/// # Examples
///
/// ```
/// use site_scraper::url::is_asset;
///
/// assert!(is_asset("http://a.com/img.png"));
/// assert!(!is_asset("http://a.com/page"));
/// ```
pub fn is_asset(url: &str) -> bool {
    if url.ends_with('#') {
        return true;
    }

    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_ascii_lowercase(),
        Err(_) => url.to_ascii_lowercase(),
    };

    ASSET_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Scope and asset filtering combined: may this URL ever be enqueued?
pub fn is_admittable(url: &str, base_url: &str) -> bool {
    in_scope(url, base_url) && !is_asset(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_site_in_scope() {
        assert!(in_scope("http://a.com/x", "http://a.com"));
        assert!(in_scope("http://a.com/", "http://a.com"));
        assert!(in_scope("http://A.COM/x", "http://a.com/"));
    }

    #[test]
    fn test_other_host_out_of_scope() {
        assert!(!in_scope("http://b.com/x", "http://a.com"));
        assert!(!in_scope("http://sub.a.com/x", "http://a.com"));
    }

    #[test]
    fn test_scheme_and_port_must_match() {
        assert!(!in_scope("https://a.com/x", "http://a.com"));
        assert!(!in_scope("http://a.com:8080/x", "http://a.com"));
        assert!(in_scope("http://a.com:80/x", "http://a.com"));
    }

    #[test]
    fn test_path_prefix() {
        assert!(in_scope("http://a.com/docs/intro", "http://a.com/docs"));
        assert!(!in_scope("http://a.com/blog", "http://a.com/docs"));
    }

    #[test]
    fn test_malformed_is_out_of_scope() {
        assert!(!in_scope("not a url", "http://a.com"));
        assert!(!in_scope("http://a.com/x", "::::"));
        assert!(!in_scope("mailto:someone@a.com", "http://a.com"));
    }

    #[test]
    fn test_asset_extensions() {
        assert!(is_asset("http://a.com/img.png"));
        assert!(is_asset("http://a.com/files/report.PDF"));
        assert!(is_asset("http://a.com/static/app.js?v=3"));
        assert!(is_asset("http://a.com/fonts/x.woff2"));
        assert!(is_asset("http://a.com/feed.rss"));
    }

    #[test]
    fn test_documents_are_not_assets() {
        assert!(!is_asset("http://a.com/page"));
        assert!(!is_asset("http://a.com/"));
        assert!(!is_asset("http://a.com/about.html"));
        assert!(!is_asset("http://a.com/json-guide"));
    }

    #[test]
    fn test_fragment_marker_is_asset() {
        assert!(is_asset("http://a.com/page#"));
    }

    #[test]
    fn test_is_admittable() {
        assert!(is_admittable("http://a.com/page", "http://a.com"));
        assert!(!is_admittable("http://a.com/logo.svg", "http://a.com"));
        assert!(!is_admittable("http://b.com/page", "http://a.com"));
    }
}
