use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use rd_core::{Article, ArticleStore, Error, Result};

/// In-memory article store. Default backend for development runs and tests.
#[derive(Default)]
pub struct MemoryStorage {
    articles: Arc<RwLock<Vec<Article>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArticleStore for MemoryStorage {
    async fn insert(&self, article: &Article) -> Result<()> {
        let mut articles = self.articles.write().await;
        if articles.iter().any(|a| a.id == article.id) {
            return Err(Error::Storage(format!(
                "duplicate article id: {}",
                article.id
            )));
        }
        articles.push(article.clone());
        Ok(())
    }

    async fn save(&self, article: &Article) -> Result<()> {
        let mut articles = self.articles.write().await;
        if let Some(existing) = articles.iter_mut().find(|a| a.id == article.id) {
            *existing = article.clone();
        } else {
            articles.push(article.clone());
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Article>> {
        Ok(self
            .articles
            .read()
            .await
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn find_by_source_url(&self, url: &str) -> Result<Option<Article>> {
        Ok(self
            .articles
            .read()
            .await
            .iter()
            .find(|a| a.source_url.as_deref() == Some(url))
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Article>> {
        let mut articles: Vec<Article> = self.articles.read().await.clone();
        articles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(articles)
    }

    async fn list_pending(&self, limit: Option<usize>) -> Result<Vec<Article>> {
        let mut pending: Vec<Article> = self
            .articles
            .read()
            .await
            .iter()
            .filter(|a| !a.is_updated)
            .cloned()
            .collect();
        pending.sort_by_key(|a| a.created_at);
        if let Some(limit) = limit {
            pending.truncate(limit);
        }
        Ok(pending)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut articles = self.articles.write().await;
        let before = articles.len();
        articles.retain(|a| a.id != id);
        Ok(articles.len() < before)
    }

    async fn clear(&self) -> Result<()> {
        self.articles.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let storage = MemoryStorage::new();
        let article = Article::new("Title", "Content", Some("https://x.org/blog/a".into()));
        storage.insert(&article).await.unwrap();

        let fetched = storage.get(article.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Title");

        let by_url = storage
            .find_by_source_url("https://x.org/blog/a")
            .await
            .unwrap();
        assert!(by_url.is_some());
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let storage = MemoryStorage::new();
        let article = Article::new("Title", "Content", None);
        storage.insert(&article).await.unwrap();
        assert!(storage.insert(&article).await.is_err());
    }

    #[tokio::test]
    async fn test_save_upserts_by_id() {
        let storage = MemoryStorage::new();
        let mut article = Article::new("Title", "Content", None);
        storage.save(&article).await.unwrap();

        article.content = "Rewritten".to_string();
        article.is_updated = true;
        storage.save(&article).await.unwrap();

        let fetched = storage.get(article.id).await.unwrap().unwrap();
        assert_eq!(fetched.content, "Rewritten");
        assert!(fetched.is_updated);
        assert_eq!(storage.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_pending_is_oldest_first_and_limited() {
        let storage = MemoryStorage::new();

        let mut newest = Article::new("newest", "c", None);
        newest.created_at = Utc::now();
        let mut oldest = Article::new("oldest", "c", None);
        oldest.created_at = Utc::now() - Duration::hours(2);
        let mut middle = Article::new("middle", "c", None);
        middle.created_at = Utc::now() - Duration::hours(1);
        let mut done = Article::new("done", "c", None);
        done.created_at = Utc::now() - Duration::hours(3);
        done.is_updated = true;

        for a in [&newest, &oldest, &middle, &done] {
            storage.insert(a).await.unwrap();
        }

        let pending = storage.list_pending(None).await.unwrap();
        let titles: Vec<&str> = pending.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["oldest", "middle", "newest"]);

        let limited = storage.list_pending(Some(2)).await.unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].title, "oldest");
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let storage = MemoryStorage::new();
        let article = Article::new("Title", "Content", None);
        storage.insert(&article).await.unwrap();

        assert!(storage.delete(article.id).await.unwrap());
        assert!(!storage.delete(article.id).await.unwrap());

        storage.insert(&article).await.unwrap();
        storage.clear().await.unwrap();
        assert!(storage.list().await.unwrap().is_empty());
    }
}
