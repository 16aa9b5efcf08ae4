//! Page rendering over HTTP
//!
//! This module turns a URL into a [`RenderedPage`]:
//! - Building HTTP clients that send browser-like request headers
//! - GET requests bounded by a per-call timeout
//! - Status and Content-Type checks
//! - Title and outbound anchor extraction
//! - Resolution of relative anchors against the final response URL

use crate::config::UserAgentConfig;
use crate::{ConfigError, FetchError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::{redirect::Policy, Client};
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

/// Maximum number of redirects followed for one page
const MAX_REDIRECTS: usize = 10;

/// A loaded page, ready for extraction
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// The URL the page was finally served from (after redirects)
    pub url: String,

    /// The page title (from the <title> tag)
    pub title: Option<String>,

    /// The page markup
    pub html: String,

    /// Outbound anchor targets, already absolute
    pub links: Vec<String>,
}

/// Capability to load a page
///
/// Each worker owns one renderer; implementations are never shared between
/// workers.
#[async_trait]
pub trait PageRenderer: Send {
    /// Loads `url`, giving up after `timeout`
    async fn render(&mut self, url: &str, timeout: Duration) -> Result<RenderedPage, FetchError>;
}

/// Builds an HTTP client that presents itself as a desktop browser
///
/// # Arguments
///
/// * `config` - The request header configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(ScraperError)` - A header value was invalid or the client failed to build
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, header_value("user-agent", &config.user_agent)?);
    headers.insert(
        ACCEPT_LANGUAGE,
        header_value("accept-language", &config.accept_language)?,
    );
    headers.insert(ACCEPT, header_value("accept", &config.accept)?);
    headers.insert(REFERER, header_value("referer", &config.referer)?);

    let client = Client::builder()
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value)
        .map_err(|e| ConfigError::Validation(format!("Invalid {} header: {}", name, e)))
}

/// Renders pages with a plain HTTP GET
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    /// Creates a renderer with its own HTTP client
    pub fn new(config: &UserAgentConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    async fn fetch(&self, url: &str, timeout: Duration) -> Result<(String, String), FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_error(url, timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !content_type.contains("text/html") {
            return Err(FetchError::NotHtml {
                url: url.to_string(),
                content_type,
            });
        }

        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| classify_error(url, timeout, e))?;

        Ok((final_url, body))
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn render(&mut self, url: &str, timeout: Duration) -> Result<RenderedPage, FetchError> {
        let (final_url, body) = self.fetch(url, timeout).await?;

        let base = Url::parse(&final_url).map_err(|e| FetchError::Network {
            url: url.to_string(),
            message: format!("Unparseable final URL {}: {}", final_url, e),
        })?;

        let page = parse_document(base, body);
        tracing::debug!(
            "Rendered {} ({} outbound links, title: {:?})",
            page.url,
            page.links.len(),
            page.title
        );
        Ok(page)
    }
}

fn classify_error(url: &str, timeout: Duration, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }
    } else if error.is_connect() {
        FetchError::Network {
            url: url.to_string(),
            message: "Connection refused".to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

/// Parses markup into a rendered page
///
/// Kept synchronous so the parsed DOM never lives across an await point.
pub fn parse_document(base_url: Url, html: String) -> RenderedPage {
    let document = Html::parse_document(&html);
    let title = extract_title(&document);
    let links = extract_links(&document, &base_url);

    RenderedPage {
        url: base_url.to_string(),
        title,
        html,
        links,
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts the absolute targets of every followable anchor
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Resolves a link href to an absolute URL
///
/// Returns None for empty hrefs, fragment-only anchors, `javascript:`,
/// `mailto:`, `tel:` and `data:` targets, and anything that does not
/// resolve to HTTP(S).
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url.to_string()),
        _ => None,
    }
}
