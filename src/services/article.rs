//! Article service
//!
//! Business rules for news articles: required-field validation, tag
//! normalization, default status/date, and partial updates.

use crate::db::repositories::ArticleRepository;
use crate::models::{
    Article, ArticleQuery, CreateArticleInput, ListParams, PagedResult, UpdateArticleInput,
};
use chrono::Utc;
use std::sync::Arc;

/// Error types for article service operations
#[derive(Debug, thiserror::Error)]
pub enum ArticleServiceError {
    /// Article not found
    #[error("Article not found: {0}")]
    NotFound(i64),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Article service for managing news articles
pub struct ArticleService {
    repo: Arc<dyn ArticleRepository>,
}

impl ArticleService {
    pub fn new(repo: Arc<dyn ArticleRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, input: CreateArticleInput) -> Result<Article, ArticleServiceError> {
        require_text("כותרת", &input.title)?;
        require_text("מחבר", &input.author)?;
        require_text("תוכן", &input.content)?;

        let now = Utc::now();
        let article = Article {
            id: 0,
            title: input.title.trim().to_string(),
            author: input.author.trim().to_string(),
            content: input.content,
            category: input.category,
            status: input.status.unwrap_or_default(),
            date: input.date.unwrap_or(now),
            image: optional_text(input.image),
            tags: normalize_list(input.tags),
            seo_description: optional_text(input.seo_description),
            seo_keywords: normalize_list(input.seo_keywords),
            created_at: now,
            updated_at: now,
        };

        let created = self.repo.create(&article).await?;
        tracing::info!("Created article {} ({})", created.id, created.status);
        Ok(created)
    }

    pub async fn get(&self, id: i64) -> Result<Article, ArticleServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(ArticleServiceError::NotFound(id))
    }

    pub async fn list(
        &self,
        query: &ArticleQuery,
        params: &ListParams,
    ) -> Result<PagedResult<Article>, ArticleServiceError> {
        let (items, total) = self.repo.list(query, params).await?;
        Ok(PagedResult::new(items, total, params))
    }

    /// Apply a partial update; only supplied fields change
    pub async fn update(
        &self,
        id: i64,
        mut input: UpdateArticleInput,
    ) -> Result<Article, ArticleServiceError> {
        if let Some(title) = &input.title {
            require_text("כותרת", title)?;
            input.title = Some(title.trim().to_string());
        }
        if let Some(author) = &input.author {
            require_text("מחבר", author)?;
            input.author = Some(author.trim().to_string());
        }
        if let Some(content) = &input.content {
            require_text("תוכן", content)?;
        }
        input.image = input.image.map(optional_text);
        input.seo_description = input.seo_description.map(optional_text);
        input.tags = input.tags.map(normalize_list);
        input.seo_keywords = input.seo_keywords.map(normalize_list);

        let mut article = self.get(id).await?;
        input.apply_to(&mut article);
        article.updated_at = Utc::now();

        let updated = self.repo.update(&article).await?;
        tracing::info!("Updated article {}", id);
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ArticleServiceError> {
        if !self.repo.delete(id).await? {
            return Err(ArticleServiceError::NotFound(id));
        }
        tracing::info!("Deleted article {}", id);
        Ok(())
    }
}

fn require_text(field: &str, value: &str) -> Result<(), ArticleServiceError> {
    if value.trim().is_empty() {
        return Err(ArticleServiceError::ValidationError(format!(
            "שדה {} הוא שדה חובה",
            field
        )));
    }
    Ok(())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trim entries and drop blanks, keeping order
pub(crate) fn normalize_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
