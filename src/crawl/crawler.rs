// src/crawl/crawler.rs
// =============================================================================
// The traversal engine's entry point.
//
// A Crawler owns the memory of ONE crawl. dig() starts at the seed (which
// is never filtered), lets the configured policy walk the graph and returns
// the first URI found to contain the query.
//
// Cancellation:
// - the caller passes an abort token (Ctrl-C in main.rs)
// - each crawl derives its own search token from it, so an abort stops
//   every branch while a match only stops this crawl
// =============================================================================

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;
use url::Url;

use super::search::Search;
use super::strategy::Strategy;
use crate::assess::RelevanceFilter;
use crate::memory::Memory;
use crate::scout::Scout;

#[derive(Debug, Error)]
pub enum CrawlError {
    /// The abort token fired before any branch found a match
    #[error("crawl interrupted before a match was found")]
    Interrupted,
}

pub struct Crawler {
    memory: Arc<Memory>,
    scout: Arc<Scout>,
    relevance: Arc<RelevanceFilter>,
    strategy: Strategy,
}

impl Crawler {
    pub fn new(
        relevance: RelevanceFilter,
        strategy: Strategy,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        let memory = Arc::new(Memory::new());
        let scout = Scout::new(Arc::clone(&memory), timeout)?;

        Ok(Self {
            memory,
            scout: Arc::new(scout),
            relevance: Arc::new(relevance),
            strategy,
        })
    }

    // Everything learned so far, including work done after a match
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    // Searches for `query` starting at `seed`
    //
    // Returns:
    //   Ok(Some(uri)) = some page contains the query
    //   Ok(None)      = every reachable, relevant page was visited
    //   Err(..)       = aborted from outside before anything was found
    pub async fn dig(
        &self,
        seed: Url,
        query: &str,
        abort: &CancellationToken,
    ) -> Result<Option<Url>, CrawlError> {
        info!(%seed, query, strategy = %self.strategy, "🚀 digging");

        let search = Arc::new(Search::new(
            query,
            Arc::clone(&self.scout),
            Arc::clone(&self.relevance),
            abort.child_token(),
        ));

        let found = self
            .strategy
            .policy()
            .traverse(Arc::clone(&search), seed)
            .await;

        match search.winner().or(found) {
            Some(uri) => Ok(Some(uri)),
            None if abort.is_cancelled() => Err(CrawlError::Interrupted),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::ValueEnum;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const QUERY: &str = "Door-to-Door";

    // Serves an HTML page that must be requested `times` times
    async fn serve(server: &MockServer, route: &str, body: &str, delay_ms: u64, times: u64) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(body.to_string(), "text/html")
                    .set_delay(Duration::from_millis(delay_ms)),
            )
            .expect(times)
            .named(route)
            .mount(server)
            .await;
    }

    fn links(routes: &[&str]) -> String {
        routes
            .iter()
            .map(|route| format!(r#"<a href="{route}">{route}</a>"#))
            .collect()
    }

    fn page(server: &MockServer, route: &str) -> Url {
        Url::parse(&format!("{}{}", server.uri(), route)).unwrap()
    }

    fn crawler(strategy: Strategy) -> Crawler {
        let relevance = RelevanceFilter::new([r"127\.0\.0\.1"]).unwrap();
        Crawler::new(relevance, strategy, Duration::from_secs(5)).unwrap()
    }

    fn strategies() -> &'static [Strategy] {
        Strategy::value_variants()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_finds_match_among_siblings() {
        for &strategy in strategies() {
            let server = MockServer::start().await;
            serve(&server, "/", &links(&["/a", "/b"]), 0, 1).await;
            // The match answers late, so concurrent policies visit /b first
            serve(&server, "/a", &format!("<p>{QUERY}</p>"), 300, 1).await;
            let b_times = if strategy == Strategy::Sequential { 0 } else { 1 };
            serve(&server, "/b", "<p>nothing</p>", 0, b_times).await;

            let crawler = crawler(strategy);
            let found = crawler
                .dig(page(&server, "/"), QUERY, &CancellationToken::new())
                .await
                .unwrap();

            assert_eq!(found, Some(page(&server, "/a")), "{strategy}");
            let expected_sources = if strategy == Strategy::Sequential { 2 } else { 3 };
            assert_eq!(crawler.memory().statistics().sources, expected_sources, "{strategy}");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_statistics_include_in_flight_siblings() {
        for &strategy in strategies() {
            let server = MockServer::start().await;
            serve(&server, "/", &links(&["/a", "/b"]), 0, 1).await;
            serve(&server, "/a", &format!("<p>{QUERY}</p>"), 50, 1).await;
            // Still loading when /a matches
            let b_times = if strategy == Strategy::Sequential { 0 } else { 1 };
            serve(&server, "/b", &links(&["/c"]), 300, b_times).await;
            serve(&server, "/c", "<p>too late</p>", 0, 0).await;

            let crawler = crawler(strategy);
            let found = crawler
                .dig(page(&server, "/"), QUERY, &CancellationToken::new())
                .await
                .unwrap();

            assert_eq!(found, Some(page(&server, "/a")), "{strategy}");
            let expected_sources = if strategy == Strategy::Sequential { 2 } else { 3 };
            assert_eq!(crawler.memory().statistics().sources, expected_sources, "{strategy}");
            assert!(crawler.memory().unknown(&page(&server, "/c")), "{strategy}");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_exhausts_cyclic_graph_without_match() {
        for &strategy in strategies() {
            let server = MockServer::start().await;
            let seed = format!(
                "{}{}",
                links(&["/a", "/b"]),
                r#"<a href="https://elsewhere.test/">away</a>"#
            );
            serve(&server, "/", &seed, 0, 1).await;
            serve(&server, "/a", &links(&["/b", "/", "/a#frag"]), 0, 1).await;
            serve(&server, "/b", &links(&["/a", "/missing"]), 0, 1).await;
            Mock::given(method("GET"))
                .and(path("/missing"))
                .respond_with(ResponseTemplate::new(404))
                .expect(1)
                .mount(&server)
                .await;

            let crawler = crawler(strategy);
            let found = crawler
                .dig(page(&server, "/"), QUERY, &CancellationToken::new())
                .await
                .unwrap();

            assert_eq!(found, None, "{strategy}");
            let stats = crawler.memory().statistics();
            assert_eq!(stats.sources, 4, "{strategy}");
            // 3 on the seed, 3 on /a, 2 on /b, none on the 404
            assert_eq!(stats.references, 8, "{strategy}");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shared_children_fetched_once() {
        for &strategy in strategies() {
            let server = MockServer::start().await;
            serve(&server, "/", &links(&["/a", "/b", "/c"]), 0, 1).await;
            for route in ["/a", "/b", "/c"] {
                serve(&server, route, &links(&["/d"]), 10, 1).await;
            }
            serve(&server, "/d", &links(&["/a", "/b", "/c", "/"]), 0, 1).await;

            let crawler = crawler(strategy);
            let found = crawler
                .dig(page(&server, "/"), QUERY, &CancellationToken::new())
                .await
                .unwrap();

            assert_eq!(found, None, "{strategy}");
            assert_eq!(crawler.memory().statistics().sources, 5, "{strategy}");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_no_new_fetch_after_match() {
        for &strategy in strategies() {
            let server = MockServer::start().await;
            serve(&server, "/", &links(&["/a", "/b"]), 0, 1).await;
            serve(&server, "/a", &format!("<p>{QUERY}</p>"), 0, 1).await;
            // In flight when /a matches (or never started when sequential)
            Mock::given(method("GET"))
                .and(path("/b"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_raw(links(&["/c"]), "text/html")
                        .set_delay(Duration::from_millis(300)),
                )
                .expect(0..=1)
                .mount(&server)
                .await;
            serve(&server, "/c", "<p>too late</p>", 0, 0).await;

            let crawler = crawler(strategy);
            let found = crawler
                .dig(page(&server, "/"), QUERY, &CancellationToken::new())
                .await
                .unwrap();
            assert_eq!(found, Some(page(&server, "/a")), "{strategy}");

            // Give the in-flight fetch of /b time to complete
            tokio::time::sleep(Duration::from_millis(500)).await;
            assert!(crawler.memory().unknown(&page(&server, "/c")), "{strategy}");
        }
    }

    #[tokio::test]
    async fn test_seed_bypasses_relevance_filter() {
        for &strategy in strategies() {
            let server = MockServer::start().await;
            serve(&server, "/", &links(&["/a"]), 0, 1).await;
            serve(&server, "/a", "<p>never</p>", 0, 0).await;

            let relevance = RelevanceFilter::new([r"nowhere\.test"]).unwrap();
            let crawler = Crawler::new(relevance, strategy, Duration::from_secs(5)).unwrap();
            let found = crawler
                .dig(page(&server, "/"), QUERY, &CancellationToken::new())
                .await
                .unwrap();

            assert_eq!(found, None, "{strategy}");
            assert_eq!(crawler.memory().size(), 1, "{strategy}");
        }
    }

    #[tokio::test]
    async fn test_seed_itself_matches() {
        for &strategy in strategies() {
            let server = MockServer::start().await;
            serve(&server, "/", &format!("{QUERY}{}", links(&["/a"])), 0, 1).await;

            let crawler = crawler(strategy);
            let found = crawler
                .dig(page(&server, "/"), QUERY, &CancellationToken::new())
                .await
                .unwrap();

            assert_eq!(found, Some(page(&server, "/")), "{strategy}");
            assert_eq!(crawler.memory().size(), 1, "{strategy}");
        }
    }

    #[tokio::test]
    async fn test_dead_seed_reports_not_found() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let seed = Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap();

        for &strategy in strategies() {
            let crawler = crawler(strategy);
            let found = crawler
                .dig(seed.clone(), QUERY, &CancellationToken::new())
                .await
                .unwrap();

            assert_eq!(found, None, "{strategy}");
            let stats = crawler.memory().statistics();
            assert_eq!((stats.sources, stats.characters), (1, 0), "{strategy}");
        }
    }

    #[tokio::test]
    async fn test_abort_before_start_is_interrupted() {
        for &strategy in strategies() {
            let server = MockServer::start().await;
            serve(&server, "/", &links(&["/a"]), 0, 0).await;

            let abort = CancellationToken::new();
            abort.cancel();

            let crawler = crawler(strategy);
            let result = crawler.dig(page(&server, "/"), QUERY, &abort).await;

            assert!(matches!(result, Err(CrawlError::Interrupted)), "{strategy}");
            assert_eq!(crawler.memory().size(), 0, "{strategy}");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_abort_mid_crawl_keeps_fetched_reports() {
        for &strategy in strategies() {
            let server = MockServer::start().await;
            serve(&server, "/", &links(&["/slow"]), 0, 1).await;
            serve(&server, "/slow", &links(&["/never"]), 300, 1).await;
            serve(&server, "/never", "<p>never</p>", 0, 0).await;

            let abort = CancellationToken::new();
            tokio::spawn({
                let abort = abort.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    abort.cancel();
                }
            });

            let crawler = crawler(strategy);
            let result = crawler.dig(page(&server, "/"), QUERY, &abort).await;

            assert!(matches!(result, Err(CrawlError::Interrupted)), "{strategy}");
            let memory = crawler.memory();
            // The seed and the page in flight at abort time
            assert_eq!(memory.statistics().sources, 2, "{strategy}");
            assert!(!memory.unknown(&page(&server, "/slow")), "{strategy}");
            assert!(memory.unknown(&page(&server, "/never")), "{strategy}");
        }
    }
}
