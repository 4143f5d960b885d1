use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info, warn};

use rd_core::{Article, ArticleStore, Result};
use rd_enhance::{RestructureOptions, Restructurer};

use crate::discovery::ReferenceDiscovery;
use crate::extract::ContentExtractor;

#[derive(Debug, Clone)]
pub struct EnhanceConfig {
    /// How many reference articles to look for per article.
    pub reference_count: usize,
    pub fetch_timeout: Duration,
    /// Pause between reference fetches.
    pub fetch_delay: Duration,
    /// Pause after each enhanced article.
    pub settle_delay: Duration,
    /// Reference texts at or under this length are unusable.
    pub min_reference_chars: usize,
    /// Restructured output under this length is too thin to persist.
    pub min_result_chars: usize,
    pub force_headings: bool,
    /// Fallback exclusion domain for articles without a source URL.
    pub origin_domain: Option<String>,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            reference_count: 2,
            fetch_timeout: Duration::from_secs(15),
            fetch_delay: Duration::from_millis(800),
            settle_delay: Duration::from_millis(600),
            min_reference_chars: 50,
            min_result_chars: 20,
            force_headings: false,
            origin_domain: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnhanceOutcome {
    /// Restructured content persisted. Terminal.
    Enhanced,
    /// No usable reference text; marked processed so it is not retried. Terminal.
    SkippedNoReferences,
    /// Restructured output too thin to persist; stays eligible for retry.
    SkippedThinResult,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub enhanced: usize,
    pub skipped_no_references: usize,
    pub skipped_thin: usize,
    pub failed: usize,
}

/// Per-article enhancement state machine: discover references, extract their
/// text, infer formatting patterns, restructure, persist.
pub struct EnhanceManager {
    store: Arc<dyn ArticleStore>,
    discovery: ReferenceDiscovery,
    extractor: ContentExtractor,
    restructurer: Restructurer,
    config: EnhanceConfig,
}

impl EnhanceManager {
    pub fn new(store: Arc<dyn ArticleStore>, config: EnhanceConfig) -> Self {
        let discovery = ReferenceDiscovery::new(config.fetch_timeout);
        let extractor = ContentExtractor::new(config.fetch_timeout);
        Self {
            store,
            discovery,
            extractor,
            restructurer: Restructurer::default(),
            config,
        }
    }

    pub fn with_discovery(mut self, discovery: ReferenceDiscovery) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn with_extractor(mut self, extractor: ContentExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Enhances pending articles, oldest first, one at a time. Per-article
    /// failures are logged and the batch continues.
    pub async fn run(&self, limit: Option<usize>) -> Result<BatchSummary> {
        let articles = self.store.list_pending(limit).await?;
        info!("📚 found {} article(s) to enhance", articles.len());

        let mut summary = BatchSummary {
            total: articles.len(),
            ..Default::default()
        };

        for mut article in articles {
            info!("➡️ processing article {} - {:?}", article.id, article.title);
            match self.enhance_article(&mut article).await {
                Ok(EnhanceOutcome::Enhanced) => {
                    summary.enhanced += 1;
                    info!("✅ article enhanced");
                    sleep(self.config.settle_delay).await;
                }
                Ok(EnhanceOutcome::SkippedNoReferences) => {
                    summary.skipped_no_references += 1;
                    warn!("⚠️ no usable reference content, marked processed");
                }
                Ok(EnhanceOutcome::SkippedThinResult) => {
                    summary.skipped_thin += 1;
                    warn!("⚠️ restructured content too thin, left for retry");
                }
                Err(e) => {
                    summary.failed += 1;
                    error!("❌ error processing article {}: {}", article.id, e);
                }
            }
        }

        info!(
            "🎯 enhancement completed: {}/{} article(s) enhanced",
            summary.enhanced, summary.total
        );
        Ok(summary)
    }

    pub async fn enhance_article(&self, article: &mut Article) -> Result<EnhanceOutcome> {
        let query = format!("{} blog", article.title);
        info!("🔍 searching references for: {}", query);

        let exclude = article
            .origin_domain()
            .or_else(|| self.config.origin_domain.clone());
        let urls = self
            .discovery
            .search(&query, self.config.reference_count, exclude.as_deref())
            .await;
        info!("🔗 found {} reference URL(s)", urls.len());

        let mut texts: Vec<String> = Vec::new();
        for url in &urls {
            match self.extractor.extract(url).await {
                Ok(text) if text.len() > self.config.min_reference_chars => {
                    info!("🧾 scraped {} characters from {}", text.len(), url);
                    texts.push(text);
                }
                Ok(_) => warn!("reference at {} had no usable text", url),
                Err(e) => warn!("❌ failed scraping {}: {}", url, e),
            }
            sleep(self.config.fetch_delay).await;
        }

        let enhanced = if texts.is_empty() {
            None
        } else {
            let ref_a = texts.first().map(String::as_str).unwrap_or("");
            let ref_b = texts.get(1).map(String::as_str).unwrap_or("");
            let opts = RestructureOptions {
                force_headings: self.config.force_headings,
            };
            Some(
                self.restructurer
                    .enhance(&article.content, ref_a, ref_b, &opts)?,
            )
        };

        let outcome = resolve_outcome(article, urls, enhanced, self.config.min_result_chars);
        self.store.save(article).await?;
        Ok(outcome)
    }
}

/// Applies the terminal state transition for one article. All field changes
/// land together in the caller's single save.
fn resolve_outcome(
    article: &mut Article,
    urls: Vec<String>,
    enhanced: Option<String>,
    min_result_chars: usize,
) -> EnhanceOutcome {
    article.preserve_original();
    match enhanced {
        None => {
            article.is_updated = true;
            article.references = Vec::new();
            EnhanceOutcome::SkippedNoReferences
        }
        Some(text) if text.len() < min_result_chars => {
            article.references = urls;
            EnhanceOutcome::SkippedThinResult
        }
        Some(text) => {
            article.content = text;
            article.references = urls;
            article.is_updated = true;
            EnhanceOutcome::Enhanced
        }
    }
}
