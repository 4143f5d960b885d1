use async_trait::async_trait;
use uuid::Uuid;

use crate::types::Article;
use crate::Result;

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Insert a new article. Fails if the id already exists.
    async fn insert(&self, article: &Article) -> Result<()>;

    /// Upsert an article by id, writing all current field values.
    async fn save(&self, article: &Article) -> Result<()>;

    async fn get(&self, id: Uuid) -> Result<Option<Article>>;

    async fn find_by_source_url(&self, url: &str) -> Result<Option<Article>>;

    /// All articles, newest first.
    async fn list(&self) -> Result<Vec<Article>>;

    /// Articles with `is_updated == false`, oldest first, optionally limited.
    async fn list_pending(&self, limit: Option<usize>) -> Result<Vec<Article>>;

    /// Returns true if an article was removed.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    async fn clear(&self) -> Result<()>;
}
