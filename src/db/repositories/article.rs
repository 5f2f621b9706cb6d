//! Article repository
//!
//! Database operations for articles.
//!
//! This module provides:
//! - `ArticleRepository` trait defining the interface for article data access
//! - `SqlxArticleRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Article, ArticleCategory, ArticleQuery, ArticleStatus, ListParams};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use super::{decode_list, encode_list, fold_case, fold_list, like_pattern, LIST_SEPARATOR};

const ARTICLE_COLUMNS: &str = "id, title, author, content, category, status, date, image, tags, \
     seo_description, seo_keywords, created_at, updated_at";

/// Article repository trait
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Insert a new article; the `id` of the input is ignored
    async fn create(&self, article: &Article) -> Result<Article>;

    /// Get article by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Article>>;

    /// List articles matching the query, newest first.
    ///
    /// Returns the page of articles and the total number of matches.
    async fn list(&self, query: &ArticleQuery, params: &ListParams) -> Result<(Vec<Article>, i64)>;

    /// Overwrite all mutable fields of an existing article
    async fn update(&self, article: &Article) -> Result<Article>;

    /// Delete an article; returns `false` when no row matched
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Count published articles
    async fn count_published(&self) -> Result<i64>;

    /// Dates of published articles, optionally only those on or after `since`
    async fn published_dates_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<DateTime<Utc>>>;
}

/// SQLx-based article repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxArticleRepository {
    pool: DynDatabasePool,
}

impl SqlxArticleRepository {
    /// Create a new SQLx article repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ArticleRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ArticleRepository for SqlxArticleRepository {
    async fn create(&self, article: &Article) -> Result<Article> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_article_sqlite(self.pool.sqlite()?, article).await,
            DatabaseDriver::Mysql => create_article_mysql(self.pool.mysql()?, article).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_article_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_article_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list(&self, query: &ArticleQuery, params: &ListParams) -> Result<(Vec<Article>, i64)> {
        let filter = ArticleFilter::from_query(query);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_articles_sqlite(self.pool.sqlite()?, &filter, params).await,
            DatabaseDriver::Mysql => list_articles_mysql(self.pool.mysql()?, &filter, params).await,
        }
    }

    async fn update(&self, article: &Article) -> Result<Article> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_article_sqlite(self.pool.sqlite()?, article).await,
            DatabaseDriver::Mysql => update_article_mysql(self.pool.mysql()?, article).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query("DELETE FROM articles WHERE id = ?")
                .bind(id)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to delete article")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query("DELETE FROM articles WHERE id = ?")
                .bind(id)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to delete article")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn count_published(&self) -> Result<i64> {
        let sql = "SELECT COUNT(*) FROM articles WHERE status = ?";
        let status = ArticleStatus::Published.as_str();
        let count = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query_scalar::<_, i64>(sql)
                .bind(status)
                .fetch_one(self.pool.sqlite()?)
                .await,
            DatabaseDriver::Mysql => sqlx::query_scalar::<_, i64>(sql)
                .bind(status)
                .fetch_one(self.pool.mysql()?)
                .await,
        }
        .context("Failed to count published articles")?;
        Ok(count)
    }

    async fn published_dates_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<DateTime<Utc>>> {
        let status = ArticleStatus::Published.as_str();
        let dates = match (self.pool.driver(), since) {
            (DatabaseDriver::Sqlite, Some(since)) => {
                sqlx::query_scalar::<_, DateTime<Utc>>(
                    "SELECT date FROM articles WHERE status = ? AND date >= ? ORDER BY date",
                )
                .bind(status)
                .bind(since)
                .fetch_all(self.pool.sqlite()?)
                .await
            }
            (DatabaseDriver::Sqlite, None) => {
                sqlx::query_scalar::<_, DateTime<Utc>>(
                    "SELECT date FROM articles WHERE status = ? ORDER BY date",
                )
                .bind(status)
                .fetch_all(self.pool.sqlite()?)
                .await
            }
            (DatabaseDriver::Mysql, Some(since)) => {
                sqlx::query_scalar::<_, DateTime<Utc>>(
                    "SELECT date FROM articles WHERE status = ? AND date >= ? ORDER BY date",
                )
                .bind(status)
                .bind(since)
                .fetch_all(self.pool.mysql()?)
                .await
            }
            (DatabaseDriver::Mysql, None) => {
                sqlx::query_scalar::<_, DateTime<Utc>>(
                    "SELECT date FROM articles WHERE status = ? ORDER BY date",
                )
                .bind(status)
                .fetch_all(self.pool.mysql()?)
                .await
            }
        }
        .context("Failed to load article dates")?;
        Ok(dates)
    }
}

/// Case-folded copies of the searchable fields
struct SearchColumns {
    title: String,
    content: String,
    tags: String,
}

impl SearchColumns {
    fn of(article: &Article) -> Self {
        Self {
            title: fold_case(&article.title),
            content: fold_case(&article.content),
            tags: fold_list(&article.tags),
        }
    }
}

/// WHERE clause and its bind values, shared by both drivers
struct ArticleFilter {
    clause: String,
    binds: Vec<String>,
}

impl ArticleFilter {
    fn from_query(query: &ArticleQuery) -> Self {
        let mut conditions = Vec::new();
        let mut binds = Vec::new();

        if let Some(status) = query.status.status() {
            conditions.push("status = ?");
            binds.push(status.as_str().to_string());
        }
        if let Some(category) = query.category {
            conditions.push("category = ?");
            binds.push(category.as_str().to_string());
        }
        if let Some(search) = &query.search {
            let pattern = like_pattern(search);
            // A term spanning the separator would match across two tags
            if search.contains(LIST_SEPARATOR) {
                conditions.push(
                    "(search_title LIKE ? ESCAPE '!' OR search_content LIKE ? ESCAPE '!')",
                );
                binds.extend(std::iter::repeat(pattern).take(2));
            } else {
                conditions.push(
                    "(search_title LIKE ? ESCAPE '!' OR search_content LIKE ? ESCAPE '!' \
                     OR search_tags LIKE ? ESCAPE '!')",
                );
                binds.extend(std::iter::repeat(pattern).take(3));
            }
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        Self { clause, binds }
    }

    fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM articles {}", self.clause)
    }

    fn page_sql(&self) -> String {
        format!(
            "SELECT {} FROM articles {} ORDER BY date DESC, id DESC LIMIT ? OFFSET ?",
            ARTICLE_COLUMNS, self.clause
        )
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_article_sqlite(pool: &SqlitePool, article: &Article) -> Result<Article> {
    let search = SearchColumns::of(article);
    let result = sqlx::query(
        r#"
        INSERT INTO articles (title, author, content, category, status, date, image, tags,
                              seo_description, seo_keywords, search_title, search_content,
                              search_tags, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&article.title)
    .bind(&article.author)
    .bind(&article.content)
    .bind(article.category.map(|c| c.as_str()))
    .bind(article.status.as_str())
    .bind(article.date)
    .bind(&article.image)
    .bind(encode_list(&article.tags)?)
    .bind(&article.seo_description)
    .bind(encode_list(&article.seo_keywords)?)
    .bind(&search.title)
    .bind(&search.content)
    .bind(&search.tags)
    .bind(article.created_at)
    .bind(article.updated_at)
    .execute(pool)
    .await
    .context("Failed to create article")?;

    Ok(Article {
        id: result.last_insert_rowid(),
        ..article.clone()
    })
}

async fn get_article_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Article>> {
    let row = sqlx::query(&format!("SELECT {} FROM articles WHERE id = ?", ARTICLE_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get article by ID")?;

    row.as_ref().map(row_to_article_sqlite).transpose()
}

async fn list_articles_sqlite(
    pool: &SqlitePool,
    filter: &ArticleFilter,
    params: &ListParams,
) -> Result<(Vec<Article>, i64)> {
    let count_sql = filter.count_sql();
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for value in &filter.binds {
        count_query = count_query.bind(value);
    }
    let total = count_query
        .fetch_one(pool)
        .await
        .context("Failed to count articles")?;

    let page_sql = filter.page_sql();
    let mut page_query = sqlx::query(&page_sql);
    for value in &filter.binds {
        page_query = page_query.bind(value);
    }
    let rows = page_query
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list articles")?;

    let articles = rows
        .iter()
        .map(row_to_article_sqlite)
        .collect::<Result<Vec<_>>>()?;

    Ok((articles, total))
}

async fn update_article_sqlite(pool: &SqlitePool, article: &Article) -> Result<Article> {
    let search = SearchColumns::of(article);
    sqlx::query(
        r#"
        UPDATE articles
        SET title = ?, author = ?, content = ?, category = ?, status = ?, date = ?, image = ?,
            tags = ?, seo_description = ?, seo_keywords = ?, search_title = ?,
            search_content = ?, search_tags = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&article.title)
    .bind(&article.author)
    .bind(&article.content)
    .bind(article.category.map(|c| c.as_str()))
    .bind(article.status.as_str())
    .bind(article.date)
    .bind(&article.image)
    .bind(encode_list(&article.tags)?)
    .bind(&article.seo_description)
    .bind(encode_list(&article.seo_keywords)?)
    .bind(&search.title)
    .bind(&search.content)
    .bind(&search.tags)
    .bind(article.updated_at)
    .bind(article.id)
    .execute(pool)
    .await
    .context("Failed to update article")?;

    get_article_by_id_sqlite(pool, article.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Article not found after update"))
}

fn row_to_article_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Article> {
    let category: Option<String> = row.get("category");
    let status: String = row.get("status");

    Ok(Article {
        id: row.get("id"),
        title: row.get("title"),
        author: row.get("author"),
        content: row.get("content"),
        category: category.as_deref().and_then(ArticleCategory::from_str),
        status: ArticleStatus::from_str(&status).unwrap_or_default(),
        date: row.get("date"),
        image: row.get("image"),
        tags: decode_list(row.get("tags"))?,
        seo_description: row.get("seo_description"),
        seo_keywords: decode_list(row.get("seo_keywords"))?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_article_mysql(pool: &MySqlPool, article: &Article) -> Result<Article> {
    let search = SearchColumns::of(article);
    let result = sqlx::query(
        r#"
        INSERT INTO articles (title, author, content, category, status, date, image, tags,
                              seo_description, seo_keywords, search_title, search_content,
                              search_tags, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&article.title)
    .bind(&article.author)
    .bind(&article.content)
    .bind(article.category.map(|c| c.as_str()))
    .bind(article.status.as_str())
    .bind(article.date)
    .bind(&article.image)
    .bind(encode_list(&article.tags)?)
    .bind(&article.seo_description)
    .bind(encode_list(&article.seo_keywords)?)
    .bind(&search.title)
    .bind(&search.content)
    .bind(&search.tags)
    .bind(article.created_at)
    .bind(article.updated_at)
    .execute(pool)
    .await
    .context("Failed to create article")?;

    Ok(Article {
        id: result.last_insert_id() as i64,
        ..article.clone()
    })
}

async fn get_article_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Article>> {
    let row = sqlx::query(&format!("SELECT {} FROM articles WHERE id = ?", ARTICLE_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get article by ID")?;

    row.as_ref().map(row_to_article_mysql).transpose()
}

async fn list_articles_mysql(
    pool: &MySqlPool,
    filter: &ArticleFilter,
    params: &ListParams,
) -> Result<(Vec<Article>, i64)> {
    let count_sql = filter.count_sql();
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for value in &filter.binds {
        count_query = count_query.bind(value);
    }
    let total = count_query
        .fetch_one(pool)
        .await
        .context("Failed to count articles")?;

    let page_sql = filter.page_sql();
    let mut page_query = sqlx::query(&page_sql);
    for value in &filter.binds {
        page_query = page_query.bind(value);
    }
    let rows = page_query
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list articles")?;

    let articles = rows
        .iter()
        .map(row_to_article_mysql)
        .collect::<Result<Vec<_>>>()?;

    Ok((articles, total))
}

async fn update_article_mysql(pool: &MySqlPool, article: &Article) -> Result<Article> {
    let search = SearchColumns::of(article);
    sqlx::query(
        r#"
        UPDATE articles
        SET title = ?, author = ?, content = ?, category = ?, status = ?, date = ?, image = ?,
            tags = ?, seo_description = ?, seo_keywords = ?, search_title = ?,
            search_content = ?, search_tags = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&article.title)
    .bind(&article.author)
    .bind(&article.content)
    .bind(article.category.map(|c| c.as_str()))
    .bind(article.status.as_str())
    .bind(article.date)
    .bind(&article.image)
    .bind(encode_list(&article.tags)?)
    .bind(&article.seo_description)
    .bind(encode_list(&article.seo_keywords)?)
    .bind(&search.title)
    .bind(&search.content)
    .bind(&search.tags)
    .bind(article.updated_at)
    .bind(article.id)
    .execute(pool)
    .await
    .context("Failed to update article")?;

    get_article_by_id_mysql(pool, article.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Article not found after update"))
}

fn row_to_article_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Article> {
    let category: Option<String> = row.get("category");
    let status: String = row.get("status");

    Ok(Article {
        id: row.get("id"),
        title: row.get("title"),
        author: row.get("author"),
        content: row.get("content"),
        category: category.as_deref().and_then(ArticleCategory::from_str),
        status: ArticleStatus::from_str(&status).unwrap_or_default(),
        date: row.get("date"),
        image: row.get("image"),
        tags: decode_list(row.get("tags"))?,
        seo_description: row.get("seo_description"),
        seo_keywords: decode_list(row.get("seo_keywords"))?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
