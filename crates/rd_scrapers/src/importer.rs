use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{info, warn};
use url::Url;

use rd_core::{Article, ArticleStore, Error, Result};

const USER_AGENT: &str = "redraft-importer/0.1";
/// Listing pages mix article and non-article links; grab extra candidates.
const CANDIDATE_OVERSAMPLE: usize = 3;
const MIN_CONTENT_CHARS: usize = 50;
const MAX_FALLBACK_PARAGRAPHS: usize = 10;

const CONTENT_SELECTORS: &[&str] = &[
    "article",
    ".post-content",
    ".entry-content",
    ".content",
    ".article-body",
    ".blog-post",
    ".post",
];

#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub listing_url: String,
    pub count: usize,
    /// Clear the store before importing.
    pub reset: bool,
    pub fetch_timeout: Duration,
}

impl ImportConfig {
    pub fn new(listing_url: impl Into<String>) -> Self {
        Self {
            listing_url: listing_url.into(),
            count: 7,
            reset: false,
            fetch_timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Default)]
pub struct ImportSummary {
    pub saved: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone)]
struct ScrapedArticle {
    title: String,
    content: String,
    url: String,
}

/// Imports the oldest articles from a blog listing into the store.
pub struct ListingImporter {
    store: Arc<dyn ArticleStore>,
    client: Client,
}

impl ListingImporter {
    pub fn new(store: Arc<dyn ArticleStore>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .expect("http client");
        Self { store, client }
    }

    pub async fn run(&self, config: &ImportConfig) -> Result<ImportSummary> {
        if config.reset {
            self.store.clear().await?;
            info!("🧹 article store cleared");
        }

        let scraped = self.fetch_oldest(config).await;
        info!("📥 fetched {} candidate article(s)", scraped.len());

        let mut summary = ImportSummary::default();
        for item in scraped {
            if self.store.find_by_source_url(&item.url).await?.is_some() {
                info!("skipping duplicate: {}", item.url);
                summary.skipped += 1;
                continue;
            }
            let article = Article::new(item.title, item.content, Some(item.url));
            self.store.insert(&article).await?;
            info!("💾 saved article {} - {}", article.id, article.title);
            summary.saved += 1;
        }

        info!(
            "✅ import complete: saved={}, skipped={}",
            summary.saved, summary.skipped
        );
        Ok(summary)
    }

    async fn fetch_oldest(&self, config: &ImportConfig) -> Vec<ScrapedArticle> {
        match self.try_fetch_oldest(config).await {
            Ok(articles) => articles,
            Err(e) => {
                warn!("listing fetch failed for {}: {}", config.listing_url, e);
                Vec::new()
            }
        }
    }

    async fn try_fetch_oldest(&self, config: &ImportConfig) -> Result<Vec<ScrapedArticle>> {
        let listing_url = Url::parse(&config.listing_url)
            .map_err(|_| Error::InvalidUrl(config.listing_url.clone()))?;

        let mut page_url = listing_url.clone();
        let mut html = self.fetch(page_url.as_str()).await?;

        // The oldest articles sit on the last listing page.
        if let Some(last) = last_page_url(&html, &listing_url) {
            if last != listing_url {
                html = self.fetch(last.as_str()).await?;
                page_url = last;
            }
        }

        let candidates: Vec<String> = collect_article_links(&html, &listing_url, &page_url)
            .into_iter()
            .take(config.count * CANDIDATE_OVERSAMPLE)
            .collect();

        let mut articles = Vec::new();
        for url in candidates {
            if articles.len() >= config.count {
                break;
            }
            match self.fetch(&url).await {
                Ok(page) => {
                    if let Some(article) = scrape_candidate(&page, &url) {
                        articles.push(article);
                    }
                }
                Err(e) => warn!("failed to fetch candidate {}: {}", url, e),
            }
        }
        Ok(articles)
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        Ok(response.text().await?)
    }
}

/// Last listing page: `a[rel="last"]` wins, else the pagination anchor with
/// the highest numeric label.
fn last_page_url(html: &str, base: &Url) -> Option<Url> {
    let document = Html::parse_document(html);

    let rel_last = Selector::parse(r#"a[rel="last"]"#).unwrap();
    if let Some(href) = document
        .select(&rel_last)
        .next()
        .and_then(|el| el.value().attr("href"))
    {
        return base.join(href).ok();
    }

    let anchors = Selector::parse("a").unwrap();
    let mut best: Option<(u32, &str)> = None;
    for anchor in document.select(&anchors) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let label = anchor.text().collect::<String>();
        let Ok(page) = label.trim().parse::<u32>() else {
            continue;
        };
        if best.map_or(true, |(n, _)| page > n) {
            best = Some((page, href));
        }
    }
    best.and_then(|(_, href)| base.join(href).ok())
}

/// Article-looking links from a listing page: same-host links or paths with a
/// blog/post/article segment, fragments skipped, order-preserving dedupe.
fn collect_article_links(html: &str, listing_url: &Url, page_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let anchors = Selector::parse("a").unwrap();
    let listing_host = listing_url.host_str().unwrap_or_default();

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for anchor in document.select(&anchors) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(absolute) = page_url.join(href) else {
            continue;
        };
        if absolute.fragment().is_some() {
            continue;
        }
        let article_like = absolute.path().contains("/blog")
            || absolute.path().contains("/post")
            || absolute.path().contains("/article")
            || absolute.host_str() == Some(listing_host);
        if !article_like {
            continue;
        }
        let url = absolute.to_string();
        if seen.insert(url.clone()) {
            links.push(url);
        }
    }
    links
}

/// Title and body of a candidate page; None when either is missing or the
/// body is too short to be an article.
fn scrape_candidate(html: &str, url: &str) -> Option<ScrapedArticle> {
    let document = Html::parse_document(html);

    let h1 = Selector::parse("h1").unwrap();
    let title_tag = Selector::parse("title").unwrap();
    let title = document
        .select(&h1)
        .next()
        .or_else(|| document.select(&title_tag).next())
        .map(|el| el.text().collect::<String>())
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();

    let mut content = String::new();
    for selector in CONTENT_SELECTORS {
        let sel = Selector::parse(selector).unwrap();
        if let Some(el) = document.select(&sel).next() {
            let text = el.text().collect::<String>().trim().to_string();
            if text.len() > MIN_CONTENT_CHARS {
                content = text;
                break;
            }
        }
    }
    if content.is_empty() {
        let paragraph = Selector::parse("p").unwrap();
        content = document
            .select(&paragraph)
            .take(MAX_FALLBACK_PARAGRAPHS)
            .map(|p| p.text().collect::<String>().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
    }

    if title.is_empty() || content.len() <= MIN_CONTENT_CHARS {
        return None;
    }
    Some(ScrapedArticle {
        title,
        content,
        url: url.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_page_prefers_rel_last() {
        let html = r#"
            <a href="/blogs?page=2">2</a>
            <a href="/blogs?page=9" rel="last">last</a>
            <a href="/blogs?page=5">5</a>
        "#;
        let base = Url::parse("https://example.com/blogs").unwrap();
        let last = last_page_url(html, &base).unwrap();
        assert_eq!(last.as_str(), "https://example.com/blogs?page=9");
    }

    #[test]
    fn test_last_page_falls_back_to_highest_numeric_anchor() {
        let html = r#"
            <a href="/blogs?page=2">2</a>
            <a href="/blogs?page=11">11</a>
            <a href="/blogs?page=3">3</a>
            <a href="/about">About</a>
        "#;
        let base = Url::parse("https://example.com/blogs").unwrap();
        let last = last_page_url(html, &base).unwrap();
        assert_eq!(last.as_str(), "https://example.com/blogs?page=11");
    }

    #[test]
    fn test_no_pagination_yields_none() {
        let html = r#"<a href="/blog/a-post">A post</a>"#;
        let base = Url::parse("https://example.com/blogs").unwrap();
        assert!(last_page_url(html, &base).is_none());
    }

    #[test]
    fn test_collect_article_links_filters_and_dedupes() {
        let html = r#"
            <a href="/blog/one">one</a>
            <a href="/blog/one">one again</a>
            <a href="https://elsewhere.org/blog/two">two</a>
            <a href="https://elsewhere.org/pricing">pricing</a>
            <a href="/blog/three#comments">comments</a>
        "#;
        let base = Url::parse("https://example.com/blogs").unwrap();
        let links = collect_article_links(html, &base, &base);
        assert_eq!(
            links,
            vec![
                "https://example.com/blog/one",
                "https://elsewhere.org/blog/two",
            ]
        );
    }

    #[test]
    fn test_same_host_links_are_kept() {
        let html = r#"<a href="/stories/deep-dive">deep dive</a>"#;
        let base = Url::parse("https://example.com/blogs").unwrap();
        let links = collect_article_links(html, &base, &base);
        assert_eq!(links, vec!["https://example.com/stories/deep-dive"]);
    }

    #[test]
    fn test_scrape_candidate_prefers_h1_and_article() {
        let html = r#"
            <html><head><title>Tab Title</title></head><body>
            <h1>Real Heading</h1>
            <article>Body text that is comfortably longer than the fifty character minimum.</article>
            </body></html>
        "#;
        let article = scrape_candidate(html, "https://example.com/blog/x").unwrap();
        assert_eq!(article.title, "Real Heading");
        assert!(article.content.starts_with("Body text"));
    }

    #[test]
    fn test_scrape_candidate_falls_back_to_title_and_paragraphs() {
        let html = r#"
            <html><head><title>Only Title</title></head><body>
            <p>First fallback paragraph with a reasonable amount of text in it.</p>
            <p>Second fallback paragraph, also long enough to matter for the test.</p>
            </body></html>
        "#;
        let article = scrape_candidate(html, "https://example.com/blog/y").unwrap();
        assert_eq!(article.title, "Only Title");
        assert!(article.content.contains("First fallback"));
        assert!(article.content.contains("\n\n"));
    }

    #[test]
    fn test_scrape_candidate_rejects_thin_pages() {
        let html = "<html><head><title>T</title></head><body><p>tiny</p></body></html>";
        assert!(scrape_candidate(html, "https://example.com/blog/z").is_none());
    }
}
