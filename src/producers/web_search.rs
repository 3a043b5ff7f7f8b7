//! Web search provider backed by Google result-page scraping.

use async_stream::stream;
use futures_util::StreamExt;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::SearchConfig;
use crate::producers::{DocumentRef, DocumentStream, SearchProvider};
use crate::utils::HttpClient;

const RESULTS_PER_PAGE: usize = 10;

/// Searches Google and yields result URLs as they are discovered.
///
/// Result pages are fetched lazily with a configurable pause between
/// requests, so a consumer that only wants a few documents never pays for
/// pages it does not read. Any fetch failure ends the stream early with a
/// warning; the caller keeps whatever was already yielded.
#[derive(Debug, Clone)]
pub struct GoogleSearchProvider {
    http: HttpClient,
    pause: Duration,
    endpoint: String,
}

impl GoogleSearchProvider {
    /// Create a provider from the search configuration section.
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            http: HttpClient::builder().user_agent(&config.user_agent).build(),
            pause: Duration::from_secs_f64(config.pause_seconds),
            endpoint: "https://www.google.com/search".to_string(),
        }
    }

    /// Point the provider at a different search endpoint (used by tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl SearchProvider for GoogleSearchProvider {
    fn top_documents(&self, query: &str, limit: usize) -> DocumentStream {
        let http = self.http.clone();
        let query = query.to_string();
        let pause = self.pause;
        let endpoint = self.endpoint.clone();

        stream! {
            debug!(query = %query, limit, "searching the web");
            let mut yielded = 0usize;
            let mut offset = 0usize;

            while yielded < limit {
                let page_url = format!(
                    "{}?q={}&num={}&start={}",
                    endpoint,
                    urlencoding::encode(&query),
                    RESULTS_PER_PAGE,
                    offset,
                );
                let body = match fetch_page(&http, &page_url).await {
                    Ok(body) => body,
                    Err(err) => {
                        // Branch-degrading: keep what was already yielded.
                        warn!(query = %query, error = %err, "web search failed");
                        return;
                    }
                };

                let links = extract_result_links(&body);
                if links.is_empty() {
                    return;
                }
                for link in links {
                    if yielded >= limit {
                        return;
                    }
                    match DocumentRef::parse(&link) {
                        Ok(doc) => {
                            yielded += 1;
                            yield doc;
                        }
                        Err(err) => {
                            debug!(link = %link, error = %err, "skipping unparsable result link");
                        }
                    }
                }

                offset += RESULTS_PER_PAGE;
                tokio::time::sleep(pause).await;
            }
        }
        .boxed()
    }
}

async fn fetch_page(http: &HttpClient, url: &str) -> Result<String, reqwest::Error> {
    let response = http.client().get(url).send().await?.error_for_status()?;
    response.text().await
}

/// Pull candidate result URLs out of a search result page, preserving page
/// order and dropping duplicates.
fn extract_result_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let anchors = Selector::parse("a[href]").expect("valid selector");

    let mut links = Vec::new();
    for anchor in document.select(&anchors) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if let Some(target) = normalize_result_href(href) {
            if !links.contains(&target) {
                links.push(target);
            }
        }
    }
    links
}

/// Unwrap Google's `/url?q=<target>` redirect links and drop navigation
/// links that point back into the search engine itself.
fn normalize_result_href(href: &str) -> Option<String> {
    let target = if let Some(rest) = href.strip_prefix("/url?") {
        url::form_urlencoded::parse(rest.as_bytes())
            .find(|(key, _)| key == "q")
            .map(|(_, value)| value.into_owned())?
    } else if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        return None;
    };

    let parsed = Url::parse(&target).ok()?;
    let host = parsed.host_str()?;
    if host.contains("google.") {
        return None;
    }
    Some(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULT_PAGE: &str = r##"
        <html><body>
            <a href="/search?q=nav">navigation</a>
            <a href="/url?q=https://example.com/paper.pdf&amp;sa=U">Paper</a>
            <a href="/url?q=https://example.com/paper.pdf&amp;sa=U">Paper again</a>
            <a href="https://other.example.org/study">Direct</a>
            <a href="https://maps.google.com/somewhere">Maps</a>
            <a href="#fragment">Fragment</a>
        </body></html>
    "##;

    #[test]
    fn test_normalize_unwraps_redirects() {
        assert_eq!(
            normalize_result_href("/url?q=https://example.com/a&sa=U"),
            Some("https://example.com/a".to_string())
        );
        assert_eq!(normalize_result_href("/search?q=nav"), None);
        assert_eq!(normalize_result_href("https://maps.google.com/x"), None);
        assert_eq!(
            normalize_result_href("https://other.example.org/study"),
            Some("https://other.example.org/study".to_string())
        );
    }

    #[test]
    fn test_extract_result_links_dedupes_in_order() {
        let links = extract_result_links(RESULT_PAGE);
        assert_eq!(
            links,
            vec![
                "https://example.com/paper.pdf".to_string(),
                "https://other.example.org/study".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_top_documents_respects_limit() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", mockito::Matcher::Regex("^/search".to_string()))
            .with_status(200)
            .with_body(RESULT_PAGE)
            .create_async()
            .await;

        let provider = GoogleSearchProvider::new(&SearchConfig {
            pause_seconds: 0.0,
            ..SearchConfig::default()
        })
        .with_endpoint(format!("{}/search", server.url()));

        let docs: Vec<_> = provider.top_documents("anything", 1).collect().await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].url.as_str(), "https://example.com/paper.pdf");
    }

    #[tokio::test]
    async fn test_search_failure_ends_stream_early() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", mockito::Matcher::Regex("^/search".to_string()))
            .with_status(503)
            .create_async()
            .await;

        let provider = GoogleSearchProvider::new(&SearchConfig {
            pause_seconds: 0.0,
            ..SearchConfig::default()
        })
        .with_endpoint(format!("{}/search", server.url()));

        let docs: Vec<_> = provider.top_documents("anything", 5).collect().await;
        assert!(docs.is_empty());
    }
}
