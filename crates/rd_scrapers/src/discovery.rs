use std::collections::HashSet;
use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::warn;
use url::Url;

use rd_core::Result;

lazy_static! {
    static ref ARTICLE_PATH_RE: Regex =
        Regex::new(r"(?i)(blog|post|article|news|/\d{4}/\d{2}|/\d{4})").unwrap();
}

const SEARCH_ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const SEARCH_BASE: &str = "https://duckduckgo.com";
const USER_AGENT: &str = "redraft-discovery/0.1";

/// Turns a search phrase into candidate reference article URLs via the
/// DuckDuckGo HTML endpoint. Network and parse failures are downgraded to an
/// empty result; discovery is never fatal to its caller.
pub struct ReferenceDiscovery {
    client: Client,
    endpoint: String,
}

impl ReferenceDiscovery {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .expect("http client");
        Self {
            client,
            endpoint: SEARCH_ENDPOINT.to_string(),
        }
    }

    /// Points discovery at a different results page; used by tests.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Up to `count` unique absolute http(s) article URLs, none of them on
    /// `exclude_domain`.
    pub async fn search(
        &self,
        query: &str,
        count: usize,
        exclude_domain: Option<&str>,
    ) -> Vec<String> {
        if query.trim().is_empty() || count == 0 {
            return Vec::new();
        }
        match self.try_search(query).await {
            Ok(html) => collect_result_urls(&html, count, exclude_domain),
            Err(e) => {
                warn!("reference search failed for {:?}: {}", query, e);
                Vec::new()
            }
        }
    }

    async fn try_search(&self, query: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query)])
            .send()
            .await?;
        Ok(response.text().await?)
    }
}

/// Filters result-page anchors down to article-like URLs: unwraps redirect
/// wrappers, requires absolute http(s), rejects the excluded domain, and
/// keeps only paths matching the article heuristic. Order-preserving dedupe,
/// stops at `count`.
pub(crate) fn collect_result_urls(
    html: &str,
    count: usize,
    exclude_domain: Option<&str>,
) -> Vec<String> {
    let document = Html::parse_document(html);
    let anchors = Selector::parse("a").unwrap();

    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for anchor in document.select(&anchors) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(resolved) = unwrap_result_href(href) else {
            continue;
        };
        let Ok(parsed) = Url::parse(&resolved) else {
            continue;
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            continue;
        }
        if let (Some(host), Some(domain)) = (parsed.host_str(), exclude_domain) {
            if host.to_lowercase().ends_with(&domain.to_lowercase()) {
                continue;
            }
        }
        if !ARTICLE_PATH_RE.is_match(&resolved) {
            continue;
        }
        if seen.insert(resolved.clone()) {
            urls.push(resolved);
        }
        if urls.len() >= count {
            break;
        }
    }

    urls
}

/// Resolves an anchor href against the search origin and unwraps the `uddg`
/// redirect parameter to the true target.
fn unwrap_result_href(href: &str) -> Option<String> {
    let base = Url::parse(SEARCH_BASE).ok()?;
    let resolved = base.join(href).ok()?;
    if resolved
        .host_str()
        .map_or(false, |h| h.contains("duckduckgo.com"))
    {
        if let Some((_, target)) = resolved.query_pairs().find(|(k, _)| k == "uddg") {
            return Some(target.into_owned());
        }
    }
    Some(resolved.into())
}
