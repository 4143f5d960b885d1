use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use rd_core::{Article, ArticleStore, Error, Result};

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        original_content TEXT,
        content TEXT NOT NULL,
        source_url TEXT,
        is_updated INTEGER NOT NULL DEFAULT 0,
        ref_urls TEXT NOT NULL DEFAULT '[]',
        created_at TEXT NOT NULL
    )
    "#,
    // Add future migrations here
];

pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| Error::Storage(format!("failed to connect to database: {e}")))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Storage(format!("failed to run migration {i}: {e}")))?;
        }

        Ok(Self { pool })
    }
}

fn row_to_article(row: &SqliteRow) -> Result<Article> {
    let id: String = row.get("id");
    let refs: String = row.get("ref_urls");
    let created_at: String = row.get("created_at");

    Ok(Article {
        id: Uuid::parse_str(&id).map_err(|e| Error::Storage(format!("bad article id: {e}")))?,
        title: row.get("title"),
        original_content: row.get("original_content"),
        content: row.get("content"),
        source_url: row.get("source_url"),
        is_updated: row.get::<i64, _>("is_updated") != 0,
        references: serde_json::from_str(&refs)?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| Error::Storage(format!("bad created_at: {e}")))?
            .with_timezone(&Utc),
    })
}

#[async_trait]
impl ArticleStore for SqliteStorage {
    async fn insert(&self, article: &Article) -> Result<()> {
        let refs = serde_json::to_string(&article.references)?;
        sqlx::query(
            r#"
            INSERT INTO articles
            (id, title, original_content, content, source_url, is_updated, ref_urls, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(article.id.to_string())
        .bind(&article.title)
        .bind(article.original_content.as_deref())
        .bind(&article.content)
        .bind(article.source_url.as_deref())
        .bind(article.is_updated as i64)
        .bind(refs)
        .bind(article.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Storage(format!("failed to insert article: {e}")))?;
        Ok(())
    }

    async fn save(&self, article: &Article) -> Result<()> {
        let refs = serde_json::to_string(&article.references)?;
        // All field values land in one statement; partial updates cannot occur.
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO articles
            (id, title, original_content, content, source_url, is_updated, ref_urls, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(article.id.to_string())
        .bind(&article.title)
        .bind(article.original_content.as_deref())
        .bind(&article.content)
        .bind(article.source_url.as_deref())
        .bind(article.is_updated as i64)
        .bind(refs)
        .bind(article.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Storage(format!("failed to save article: {e}")))?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Article>> {
        let row = sqlx::query("SELECT * FROM articles WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("failed to get article: {e}")))?;
        row.as_ref().map(row_to_article).transpose()
    }

    async fn find_by_source_url(&self, url: &str) -> Result<Option<Article>> {
        let row = sqlx::query("SELECT * FROM articles WHERE source_url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("failed to query by source url: {e}")))?;
        row.as_ref().map(row_to_article).transpose()
    }

    async fn list(&self) -> Result<Vec<Article>> {
        let rows = sqlx::query("SELECT * FROM articles ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("failed to list articles: {e}")))?;
        rows.iter().map(row_to_article).collect()
    }

    async fn list_pending(&self, limit: Option<usize>) -> Result<Vec<Article>> {
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let rows = sqlx::query(
            r#"
            SELECT * FROM articles
            WHERE is_updated = 0
            ORDER BY created_at ASC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Storage(format!("failed to list pending articles: {e}")))?;
        rows.iter().map(row_to_article).collect()
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("failed to delete article: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM articles")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("failed to clear articles: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    async fn storage() -> (tempfile::TempDir, SqliteStorage) {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new_with_path(&dir.path().join("test.db"))
            .await
            .unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn test_round_trip_preserves_all_fields() {
        let (_dir, storage) = storage().await;

        let mut article = Article::new(
            "Title",
            "Body",
            Some("https://x.org/blog/a".to_string()),
        );
        article.original_content = Some("Original body".to_string());
        article.references = vec!["https://r.org/blog/1".to_string()];
        article.is_updated = true;

        storage.insert(&article).await.unwrap();
        let fetched = storage.get(article.id).await.unwrap().unwrap();

        assert_eq!(fetched.title, article.title);
        assert_eq!(fetched.original_content, article.original_content);
        assert_eq!(fetched.content, article.content);
        assert_eq!(fetched.source_url, article.source_url);
        assert_eq!(fetched.is_updated, article.is_updated);
        assert_eq!(fetched.references, article.references);
    }

    #[tokio::test]
    async fn test_save_upserts() {
        let (_dir, storage) = storage().await;
        let mut article = Article::new("Title", "Body", None);

        storage.save(&article).await.unwrap();
        article.content = "Rewritten".to_string();
        storage.save(&article).await.unwrap();

        let fetched = storage.get(article.id).await.unwrap().unwrap();
        assert_eq!(fetched.content, "Rewritten");
        assert_eq!(storage.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_pending_order_and_limit() {
        let (_dir, storage) = storage().await;

        let mut old = Article::new("old", "c", None);
        old.created_at = Utc::now() - Duration::hours(2);
        let mut new = Article::new("new", "c", None);
        new.created_at = Utc::now();
        let mut done = Article::new("done", "c", None);
        done.is_updated = true;

        for a in [&new, &old, &done] {
            storage.insert(a).await.unwrap();
        }

        let pending = storage.list_pending(None).await.unwrap();
        let titles: Vec<&str> = pending.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["old", "new"]);

        let limited = storage.list_pending(Some(1)).await.unwrap();
        assert_eq!(limited[0].title, "old");
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_find_by_source_url_and_delete() {
        let (_dir, storage) = storage().await;
        let article = Article::new("t", "c", Some("https://x.org/blog/a".to_string()));
        storage.insert(&article).await.unwrap();

        assert!(storage
            .find_by_source_url("https://x.org/blog/a")
            .await
            .unwrap()
            .is_some());
        assert!(storage
            .find_by_source_url("https://x.org/blog/missing")
            .await
            .unwrap()
            .is_none());

        assert!(storage.delete(article.id).await.unwrap());
        assert!(!storage.delete(article.id).await.unwrap());
    }
}
