use url::Url;

/// Name given to pages served at the site root
pub const ROOT_PAGE_NAME: &str = "home";

/// Derives a short page name from the last path segment
///
/// Returns `home` when the path is the root.
pub fn page_name(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => String::new(),
    };

    path.trim_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(ROOT_PAGE_NAME)
        .to_string()
}

/// Returns the root page of a URL's origin, `scheme://host[:port]/`
///
/// The result is in canonical form, so a site scraped from one of its pages
/// shares its row with a crawl seeded at the bare origin.
pub fn site_root(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}/", url.scheme(), host, port),
        None => format!("{}://{}/", url.scheme(), host),
    })
}

/// Returns the display name of a site: its host, or `unknown`
pub fn site_name(url: &Url) -> String {
    url.host_str().unwrap_or("unknown").to_string()
}
