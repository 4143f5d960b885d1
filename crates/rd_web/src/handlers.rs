use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use rd_core::Article;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateArticle {
    pub title: String,
    pub content: String,
    pub source_url: Option<String>,
    pub references: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateArticle {
    pub title: Option<String>,
    pub content: Option<String>,
    pub source_url: Option<String>,
    pub references: Option<Vec<String>>,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn internal_error<E: std::fmt::Display>(e: E) -> Response {
    error!("request failed: {}", e);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

pub async fn create_article(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateArticle>,
) -> Response {
    if body.title.trim().is_empty() || body.content.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "title and content are required");
    }

    let mut article = Article::new(body.title, body.content, body.source_url);
    if let Some(references) = body.references {
        article.references = references;
    }

    match state.store.insert(&article).await {
        Ok(()) => (StatusCode::CREATED, Json(article)).into_response(),
        Err(e) => internal_error(e),
    }
}

pub async fn list_articles(State(state): State<Arc<AppState>>) -> Response {
    match state.store.list().await {
        Ok(articles) => Json(articles).into_response(),
        Err(e) => internal_error(e),
    }
}

pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let Ok(id) = Uuid::parse_str(&id) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid article id");
    };

    match state.store.get(id).await {
        Ok(Some(article)) => Json(article).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Article not found"),
        Err(e) => internal_error(e),
    }
}

/// Applies partial updates. A changed title or content marks the article as
/// updated; `original_content` is never writable through the API.
pub async fn update_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateArticle>,
) -> Response {
    let Ok(id) = Uuid::parse_str(&id) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid article id");
    };

    let mut article = match state.store.get(id).await {
        Ok(Some(article)) => article,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Article not found"),
        Err(e) => return internal_error(e),
    };

    let marks_updated = body.title.is_some() || body.content.is_some();
    if let Some(title) = body.title {
        article.title = title;
    }
    if let Some(content) = body.content {
        article.content = content;
    }
    if let Some(source_url) = body.source_url {
        article.source_url = Some(source_url);
    }
    if let Some(references) = body.references {
        article.references = references;
    }
    if marks_updated {
        article.is_updated = true;
    }

    match state.store.save(&article).await {
        Ok(()) => Json(article).into_response(),
        Err(e) => internal_error(e),
    }
}

pub async fn delete_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let Ok(id) = Uuid::parse_str(&id) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid article id");
    };

    match state.store.delete(id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "Article not found"),
        Err(e) => internal_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rd_storage::MemoryStorage;

    fn app_state() -> Arc<AppState> {
        Arc::new(AppState {
            store: Arc::new(MemoryStorage::new()),
        })
    }

    #[tokio::test]
    async fn test_create_requires_title_and_content() {
        let state = app_state();
        let response = create_article(
            State(state),
            Json(CreateArticle {
                title: "".to_string(),
                content: "body".to_string(),
                source_url: None,
                references: None,
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let state = app_state();
        let response = create_article(
            State(state.clone()),
            Json(CreateArticle {
                title: "A title".to_string(),
                content: "A body".to_string(),
                source_url: None,
                references: None,
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let articles = state.store.list().await.unwrap();
        assert_eq!(articles.len(), 1);

        let response = get_article(State(state), Path(articles[0].id.to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_id_is_bad_request() {
        let state = app_state();
        let response = get_article(State(state.clone()), Path("not-a-uuid".to_string())).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = delete_article(State(state), Path("not-a-uuid".to_string())).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_marks_article_updated() {
        let state = app_state();
        let article = Article::new("Old title", "Old body", None);
        state.store.insert(&article).await.unwrap();

        let response = update_article(
            State(state.clone()),
            Path(article.id.to_string()),
            Json(UpdateArticle {
                content: Some("New body".to_string()),
                ..Default::default()
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let stored = state.store.get(article.id).await.unwrap().unwrap();
        assert_eq!(stored.content, "New body");
        assert!(stored.is_updated);
    }

    #[tokio::test]
    async fn test_update_of_references_alone_is_not_terminal() {
        let state = app_state();
        let article = Article::new("Title", "Body", None);
        state.store.insert(&article).await.unwrap();

        update_article(
            State(state.clone()),
            Path(article.id.to_string()),
            Json(UpdateArticle {
                references: Some(vec!["https://r.org/blog/1".to_string()]),
                ..Default::default()
            }),
        )
        .await;

        let stored = state.store.get(article.id).await.unwrap().unwrap();
        assert!(!stored.is_updated);
        assert_eq!(stored.references.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_article_is_not_found() {
        let state = app_state();
        let response = delete_article(State(state), Path(Uuid::new_v4().to_string())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
