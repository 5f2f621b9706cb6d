//! Article API endpoints
//!
//! Handles HTTP requests for news articles:
//! - GET /api/articles - List articles with pagination, filters and search
//! - GET /api/articles/{id} - Get article by id (token)
//! - POST /api/articles - Create article (token)
//! - PUT /api/articles/{id} - Partial update (token)
//! - DELETE /api/articles/{id} - Delete article (token)
//!
//! Anonymous callers only ever see published articles; the `status`
//! filter is honoured for authenticated callers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, ApiJson, ApiPath, AppState, AuthenticatedUser};
use crate::api::responses::{
    ArticleListResponse, ArticleMessageResponse, ArticleResponse, MessageResponse,
};
use crate::models::{
    ArticleCategory, ArticleQuery, CreateArticleInput, ListParams, StatusFilter,
    UpdateArticleInput,
};

/// Raw list query; values are parsed leniently
#[derive(Debug, Default, Deserialize)]
pub struct ListArticlesQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub status: Option<String>,
}

impl ListArticlesQuery {
    /// Build the repository query. `status` is only read for
    /// authenticated callers.
    fn to_query(&self, authenticated: bool) -> Result<ArticleQuery, ApiError> {
        let mut query = ArticleQuery::published();

        if authenticated {
            if let Some(status) = non_blank(&self.status) {
                let filter = StatusFilter::from_str(status)
                    .ok_or_else(|| ApiError::validation_error("סטטוס לא תקין"))?;
                query = query.with_status(filter);
            }
        }

        if let Some(category) = non_blank(&self.category) {
            let category = ArticleCategory::from_str(category)
                .ok_or_else(|| ApiError::validation_error("קטגוריה לא תקינה"))?;
            query = query.with_category(category);
        }

        if let Some(search) = non_blank(&self.search) {
            query = query.with_search(search);
        }

        Ok(query)
    }

    fn params(&self) -> ListParams {
        ListParams::from_query(self.page.as_deref(), self.limit.as_deref())
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// GET /api/articles
pub async fn list_articles(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    Query(raw): Query<ListArticlesQuery>,
) -> Result<Json<ArticleListResponse>, ApiError> {
    let query = raw.to_query(user.is_some())?;
    let params = raw.params();

    let result = state.article_service.list(&query, &params).await?;
    Ok(Json(result.into()))
}

/// GET /api/articles/{id}
pub async fn get_article(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ArticleResponse>, ApiError> {
    let article = state.article_service.get(id).await?;
    Ok(Json(article.into()))
}

/// POST /api/articles
pub async fn create_article(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiJson(input): ApiJson<CreateArticleInput>,
) -> Result<(StatusCode, Json<ArticleMessageResponse>), ApiError> {
    let article = state.article_service.create(input).await?;
    tracing::debug!("Article {} created by '{}'", article.id, claims.username);

    Ok((
        StatusCode::CREATED,
        Json(ArticleMessageResponse {
            message: "המאמר נשמר בהצלחה",
            article: article.into(),
        }),
    ))
}

/// PUT /api/articles/{id}
pub async fn update_article(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UpdateArticleInput>,
) -> Result<Json<ArticleMessageResponse>, ApiError> {
    let article = state.article_service.update(id, input).await?;

    Ok(Json(ArticleMessageResponse {
        message: "המאמר עודכן בהצלחה",
        article: article.into(),
    }))
}

/// DELETE /api/articles/{id}
pub async fn delete_article(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.article_service.delete(id).await?;
    Ok(Json(MessageResponse::new("המאמר נמחק בהצלחה")))
}
