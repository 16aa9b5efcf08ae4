//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers for end-to-end runs,
//! and scripted renderers over synthetic link graphs for the worker pool.

use async_trait::async_trait;
use site_scraper::config::{resolve_tags, validate_seed_url, Config};
use site_scraper::crawler::{
    crawl_site, scrape_single_page, Coordinator, Frontier, PageProcessor, PageRenderer,
    ProcessorSettings, RenderedPage,
};
use site_scraper::extract::{HtmlTagExtractor, Tag, TagRecord};
use site_scraper::storage::{SqliteStorage, Storage, StorageError};
use site_scraper::{in_scope, is_asset, ConfigError, FetchError, TagBundle};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SITE: &str = "https://site.test/";

/// Creates a test configuration writing to `db_path`, with no politeness delay
fn create_test_config(db_path: &Path, workers: usize) -> Config {
    let mut config = Config::default();
    config.crawler.workers = workers;
    config.crawler.min_delay_ms = 0;
    config.crawler.max_delay_ms = 0;
    config.crawler.render_timeout_ms = 5_000;
    config.output.database_path = db_path.to_string_lossy().to_string();
    config
}

fn html_page(title: &str, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            title, body
        ),
        "text/html; charset=utf-8",
    )
}

fn node_url(i: usize) -> String {
    if i == 0 {
        SITE.to_string()
    } else {
        format!("{}n{}", SITE, i)
    }
}

/// Serves a fixed link graph; URLs in `failing` fail to render
#[derive(Clone)]
struct GraphRenderer {
    edges: Arc<HashMap<String, Vec<String>>>,
    failing: Arc<HashSet<String>>,
}

impl GraphRenderer {
    fn new(edges: HashMap<String, Vec<String>>, failing: HashSet<String>) -> Self {
        Self {
            edges: Arc::new(edges),
            failing: Arc::new(failing),
        }
    }
}

#[async_trait]
impl PageRenderer for GraphRenderer {
    async fn render(&mut self, url: &str, _timeout: Duration) -> Result<RenderedPage, FetchError> {
        // Give other workers a chance to interleave
        tokio::time::sleep(Duration::from_millis(5)).await;

        if self.failing.contains(url) {
            return Err(FetchError::Network {
                url: url.to_string(),
                message: "scripted failure".to_string(),
            });
        }

        Ok(RenderedPage {
            url: url.to_string(),
            title: Some(format!("Title of {}", url)),
            html: format!("<html><body><h1>{}</h1></body></html>", url),
            links: self.edges.get(url).cloned().unwrap_or_default(),
        })
    }
}

/// Runs a coordinator over `renderer` with `workers` workers
async fn run_graph(
    db_path: &Path,
    renderer: GraphRenderer,
    workers: usize,
) -> (site_scraper::CrawlSummary, Arc<Frontier>, SqliteStorage) {
    let mut storage = SqliteStorage::new(db_path).unwrap();
    let site_id = storage.upsert_site(SITE, "site.test").unwrap();

    let settings = Arc::new(ProcessorSettings {
        tags: vec![Tag::H1],
        render_timeout: Duration::from_secs(5),
        min_delay: Duration::ZERO,
        max_delay: Duration::ZERO,
    });

    let processors = (0..workers)
        .map(|_| {
            PageProcessor::new(
                renderer.clone(),
                SqliteStorage::new(db_path).unwrap(),
                Arc::new(HtmlTagExtractor::new()),
                Arc::clone(&settings),
                SITE,
            )
        })
        .collect();

    let frontier = Arc::new(Frontier::new(SITE));
    frontier.seed(SITE);

    let coordinator = Coordinator::new(Arc::clone(&frontier), site_id);
    let summary = tokio::time::timeout(Duration::from_secs(10), coordinator.run(processors))
        .await
        .expect("crawl did not reach quiescence")
        .unwrap();

    (summary, frontier, storage)
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Home",
            r#"<h1>Welcome</h1><a href="/page1">Page 1</a><a href="/page2">Page 2</a>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html_page(
            "Page 1",
            r#"<p>First</p><img src="/logo.png" alt="Logo"><a href="/">Home</a>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(html_page(
            "Page 2",
            r#"<a href="/page1#top">Back</a>
               <a href="/logo.png">Logo</a>
               <a href="http://other.invalid/elsewhere">Elsewhere</a>"#,
        ))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("crawl.db");
    let config = create_test_config(&db_path, 2);
    let seed = validate_seed_url(&format!("{}/", base_url)).unwrap();
    let tags = resolve_tags(&config.crawler.tags).unwrap();

    let summary = crawl_site(&config, &seed, tags).await.unwrap();

    assert_eq!(summary.visited, 3);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.admitted, 3);
    assert!(!summary.cancelled);

    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.count_sites().unwrap(), 1);
    assert_eq!(storage.count_pages().unwrap(), 3);
    assert_eq!(storage.count_links().unwrap(), 3);
    assert_eq!(storage.count_tag_bundles().unwrap(), 3);

    let page1 = storage
        .get_page_by_url(&format!("{}/page1", base_url))
        .unwrap()
        .expect("page1 should be stored");
    assert_eq!(page1.name, "page1");
    assert_eq!(page1.title.as_deref(), Some("Page 1"));

    let bundle = storage.get_tag_bundle(page1.id).unwrap().unwrap();
    assert_eq!(
        bundle.get(Tag::P).unwrap(),
        &[TagRecord::Text(Some("First".to_string()))]
    );
    assert_eq!(
        bundle.get(Tag::Img).unwrap(),
        &[TagRecord::Media {
            src: Some("/logo.png".to_string()),
            alt: Some("Logo".to_string()),
        }]
    );
    assert_eq!(bundle.get(Tag::H1), Some(&[][..]));

    let home = storage
        .get_page_by_url(&format!("{}/", base_url))
        .unwrap()
        .unwrap();
    assert_eq!(home.name, "home");
}

#[tokio::test]
async fn test_failed_pages_still_count_as_visited() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Home",
            r#"<a href="/missing">Missing</a><a href="/data">Data</a><a href="/ok">Ok</a>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(html_page("Ok", "<p>fine</p>"))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("failures.db");
    let config = create_test_config(&db_path, 3);
    let seed = validate_seed_url(&format!("{}/", base_url)).unwrap();

    let summary = crawl_site(&config, &seed, vec![Tag::P]).await.unwrap();

    assert_eq!(summary.visited, 4);
    assert_eq!(summary.failed, 2);

    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.count_pages().unwrap(), 2);
    assert!(storage
        .get_page_by_url(&format!("{}/missing", base_url))
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_single_page_mode_does_not_follow_links() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/docs/intro"))
        .respond_with(html_page(
            "Intro",
            r#"<h2>Getting started</h2><a href="/docs/next">Next</a>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/next"))
        .respond_with(html_page("Next", ""))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("single.db");
    let config = create_test_config(&db_path, 1);
    let url = validate_seed_url(&format!("{}/docs/intro", base_url)).unwrap();

    let summary = scrape_single_page(&config, &url, vec![Tag::H2, Tag::A])
        .await
        .unwrap();

    assert_eq!(summary.visited, 1);
    assert_eq!(summary.failed, 0);

    let storage = SqliteStorage::new(&db_path).unwrap();
    let site = storage
        .find_site(&format!("{}/", base_url))
        .unwrap()
        .expect("site keyed by origin root");
    assert_eq!(site.name, "127.0.0.1");
    assert_eq!(storage.list_links(site.id).unwrap(), vec![format!("{}/docs/intro", base_url)]);

    let page = storage
        .get_page_by_url(&format!("{}/docs/intro", base_url))
        .unwrap()
        .unwrap();
    assert_eq!(page.name, "intro");
    let bundle = storage.get_tag_bundle(page.id).unwrap().unwrap();
    assert_eq!(
        bundle.get(Tag::A).unwrap(),
        &[TagRecord::Link {
            text: Some("Next".to_string()),
            href: Some("/docs/next".to_string()),
        }]
    );
}

#[tokio::test]
async fn test_single_page_then_crawl_share_site() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("Home", r#"<a href="/docs/intro">Intro</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/intro"))
        .respond_with(html_page("Intro", "<p>hello</p>"))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("shared.db");
    let config = create_test_config(&db_path, 1);

    let page = validate_seed_url(&format!("{}/docs/intro", base_url)).unwrap();
    scrape_single_page(&config, &page, vec![Tag::P]).await.unwrap();

    // bare origin, no trailing slash
    let seed = validate_seed_url(&base_url).unwrap();
    let summary = crawl_site(&config, &seed, vec![Tag::P]).await.unwrap();
    assert_eq!(summary.visited, 2);

    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.count_sites().unwrap(), 1);

    let site = storage.find_site(&format!("{}/", base_url)).unwrap().unwrap();
    let links: HashSet<String> = storage.list_links(site.id).unwrap().into_iter().collect();
    assert_eq!(
        links,
        HashSet::from([format!("{}/", base_url), format!("{}/docs/intro", base_url)])
    );
}

#[tokio::test]
async fn test_quiescence_on_ten_node_graph() {
    let mut edges = HashMap::new();
    for i in 0..10 {
        edges.insert(
            node_url(i),
            vec![
                node_url((i + 1) % 10),
                node_url((i * 3) % 10),
                "https://elsewhere.test/page".to_string(),
                format!("{}n{}.pdf", SITE, i),
            ],
        );
    }

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("graph.db");
    let (summary, frontier, storage) =
        run_graph(&db_path, GraphRenderer::new(edges, HashSet::new()), 4).await;

    assert_eq!(summary.visited, 10);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.admitted, 10);
    assert_eq!(frontier.pending(), 0);
    assert_eq!(frontier.queued(), 0);
    assert!(frontier.is_closed());
    assert_eq!(storage.count_pages().unwrap(), 10);
}

#[tokio::test]
async fn test_partial_failure_isolation() {
    let mut edges = HashMap::new();
    edges.insert(node_url(0), (1..10).map(node_url).collect::<Vec<_>>());
    let failing: HashSet<String> = [3, 5, 7].into_iter().map(node_url).collect();

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("partial.db");
    let (summary, frontier, storage) =
        run_graph(&db_path, GraphRenderer::new(edges, failing), 3).await;

    assert_eq!(summary.visited, 10);
    assert_eq!(summary.failed, 3);
    assert_eq!(frontier.pending(), 0);
    assert_eq!(storage.count_pages().unwrap(), 7);
    assert_eq!(storage.count_tag_bundles().unwrap(), 7);
    assert!(storage.get_page_by_url(&node_url(3)).unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_offers_admit_each_url_once() {
    let frontier = Arc::new(Frontier::new(SITE));

    let mut workers = Vec::new();
    for _ in 0..10 {
        let frontier = Arc::clone(&frontier);
        workers.push(tokio::spawn(async move {
            (0..50)
                .filter(|i| frontier.offer(&format!("{}item/{}", SITE, i)))
                .count()
        }));
    }

    let mut admitted = 0;
    for worker in workers {
        admitted += worker.await.unwrap();
    }

    assert_eq!(admitted, 50);
    assert_eq!(frontier.admitted_count(), 50);
}

#[test]
fn test_idempotent_page_upsert_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = SqliteStorage::new(&dir.path().join("upsert.db")).unwrap();
    let site_id = storage.upsert_site(SITE, "site.test").unwrap();

    let first = storage
        .upsert_page("about", "https://site.test/about", Some("Old"), site_id)
        .unwrap();
    let second = storage
        .upsert_page("about", "https://site.test/about", Some("New"), site_id)
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(storage.count_pages().unwrap(), 1);
    let page = storage.get_page_by_url("https://site.test/about").unwrap().unwrap();
    assert_eq!(page.title.as_deref(), Some("New"));
}

#[test]
fn test_second_tag_bundle_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = SqliteStorage::new(&dir.path().join("bundle.db")).unwrap();
    let site_id = storage.upsert_site(SITE, "site.test").unwrap();
    let page_id = storage
        .upsert_page("home", SITE, None, site_id)
        .unwrap();

    storage.insert_tag_bundle(page_id, &TagBundle::new()).unwrap();
    let result = storage.insert_tag_bundle(page_id, &TagBundle::new());

    assert!(matches!(result, Err(StorageError::ConstraintViolation(_))));
}

#[test]
fn test_scope_and_asset_classification() {
    assert!(in_scope("http://a.com/x", "http://a.com"));
    assert!(!in_scope("http://b.com/x", "http://a.com"));
    assert!(is_asset("http://a.com/img.png"));
    assert!(!is_asset("http://a.com/page"));
}

#[test]
fn test_empty_inputs_are_configuration_errors() {
    assert!(matches!(validate_seed_url(""), Err(ConfigError::Validation(_))));
    assert!(matches!(resolve_tags(&[]), Err(ConfigError::Validation(_))));
    assert!(matches!(
        resolve_tags(&["marquee".to_string()]),
        Err(ConfigError::UnsupportedTag(_))
    ));
}
