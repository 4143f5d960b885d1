use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    /// Body as it was before the first enhancement. Write-once: set when the
    /// pipeline first touches the article, never overwritten afterwards.
    pub original_content: Option<String>,
    pub content: String,
    pub source_url: Option<String>,
    /// Flips false -> true when the pipeline reaches a terminal outcome for
    /// this article. Never reverts.
    pub is_updated: bool,
    /// Reference URLs attempted by the last enhancement run.
    pub references: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Article {
    pub fn new(title: impl Into<String>, content: impl Into<String>, source_url: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            original_content: None,
            content: content.into(),
            source_url,
            is_updated: false,
            references: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Hostname of the article's publishing domain, lowercased.
    pub fn origin_domain(&self) -> Option<String> {
        let url = self.source_url.as_deref()?;
        let parsed = Url::parse(url).ok()?;
        parsed.host_str().map(|h| h.to_lowercase())
    }

    /// Captures the current body into `original_content` if not already set.
    pub fn preserve_original(&mut self) {
        if self.original_content.is_none() {
            self.original_content = Some(self.content.clone());
        }
    }
}

/// Externally fetched article body used only to infer formatting conventions.
/// Lives for a single enhancement run.
#[derive(Debug, Clone)]
pub struct ReferenceText {
    pub source_url: String,
    pub text: String,
}
