//! Article model
//!
//! This module provides:
//! - `Article` entity representing a news item on the community site
//! - `ArticleCategory` and `ArticleStatus` enums
//! - Input types for creating and updating articles
//! - `ArticleQuery` describing list filters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fields::nullable;

/// Article entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Unique identifier
    pub id: i64,
    /// Article title
    pub title: String,
    /// Author display name
    pub author: String,
    /// Body text
    pub content: String,
    /// Topic category
    pub category: Option<ArticleCategory>,
    /// Publication status
    pub status: ArticleStatus,
    /// Article date, used for ordering
    pub date: DateTime<Utc>,
    /// Cover image URL
    pub image: Option<String>,
    /// Tags in author order
    pub tags: Vec<String>,
    /// Meta description for search engines
    pub seo_description: Option<String>,
    /// Meta keywords for search engines
    pub seo_keywords: Vec<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Article topic category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleCategory {
    Startups,
    Education,
    Events,
    Success,
    Technology,
}

impl ArticleCategory {
    pub const ALL: [ArticleCategory; 5] = [
        ArticleCategory::Startups,
        ArticleCategory::Education,
        ArticleCategory::Events,
        ArticleCategory::Success,
        ArticleCategory::Technology,
    ];

    /// Convert category to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleCategory::Startups => "startups",
            ArticleCategory::Education => "education",
            ArticleCategory::Events => "events",
            ArticleCategory::Success => "success",
            ArticleCategory::Technology => "technology",
        }
    }

    /// Parse category from its string representation
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }

    /// Hebrew display name shown on the news page
    pub fn label(&self) -> &'static str {
        match self {
            ArticleCategory::Startups => "סטארטאפים",
            ArticleCategory::Education => "הכשרות",
            ArticleCategory::Events => "אירועים",
            ArticleCategory::Success => "סיפורי הצלחה",
            ArticleCategory::Technology => "טכנולוגיה",
        }
    }
}

impl std::fmt::Display for ArticleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Article publication status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    /// Draft - not visible to public
    #[default]
    Draft,
    /// Published - visible to public
    Published,
}

impl ArticleStatus {
    /// Convert status to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Draft => "draft",
            ArticleStatus::Published => "published",
        }
    }

    /// Parse status from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(ArticleStatus::Draft),
            "published" => Some(ArticleStatus::Published),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ArticleStatus::Draft => "טיוטה",
            ArticleStatus::Published => "פורסם",
        }
    }
}

impl std::fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for creating a new article
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleInput {
    pub title: String,
    pub author: String,
    pub content: String,
    #[serde(default)]
    pub category: Option<ArticleCategory>,
    /// Defaults to Draft
    #[serde(default)]
    pub status: Option<ArticleStatus>,
    /// Defaults to the creation time
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub seo_description: Option<String>,
    #[serde(default)]
    pub seo_keywords: Vec<String>,
}

impl CreateArticleInput {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: ArticleCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_status(mut self, status: ArticleStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Partial update for an existing article; `None` leaves a field unchanged.
///
/// Optional fields are double options: `Some(None)` (JSON `null`) clears them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArticleInput {
    pub title: Option<String>,
    pub author: Option<String>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub category: Option<Option<ArticleCategory>>,
    pub status: Option<ArticleStatus>,
    pub date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "nullable")]
    pub image: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub seo_description: Option<Option<String>>,
    pub seo_keywords: Option<Vec<String>>,
}

impl UpdateArticleInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the set fields onto an existing article
    pub fn apply_to(&self, article: &mut Article) {
        if let Some(title) = &self.title {
            article.title = title.clone();
        }
        if let Some(author) = &self.author {
            article.author = author.clone();
        }
        if let Some(content) = &self.content {
            article.content = content.clone();
        }
        if let Some(category) = self.category {
            article.category = category;
        }
        if let Some(status) = self.status {
            article.status = status;
        }
        if let Some(date) = self.date {
            article.date = date;
        }
        if let Some(image) = &self.image {
            article.image = image.clone();
        }
        if let Some(tags) = &self.tags {
            article.tags = tags.clone();
        }
        if let Some(seo_description) = &self.seo_description {
            article.seo_description = seo_description.clone();
        }
        if let Some(seo_keywords) = &self.seo_keywords {
            article.seo_keywords = seo_keywords.clone();
        }
    }
}

/// Which statuses a list query returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    Published,
    Draft,
    All,
}

impl StatusFilter {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "published" => Some(StatusFilter::Published),
            "draft" => Some(StatusFilter::Draft),
            "all" => Some(StatusFilter::All),
            _ => None,
        }
    }

    /// The single status to match, or `None` for all statuses
    pub fn status(&self) -> Option<ArticleStatus> {
        match self {
            StatusFilter::Published => Some(ArticleStatus::Published),
            StatusFilter::Draft => Some(ArticleStatus::Draft),
            StatusFilter::All => None,
        }
    }
}

/// Filters for listing articles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleQuery {
    pub status: StatusFilter,
    pub category: Option<ArticleCategory>,
    /// Case-insensitive substring matched against title, content and tags
    pub search: Option<String>,
}

impl ArticleQuery {
    pub fn published() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn with_category(mut self, category: ArticleCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        let trimmed = search.trim();
        self.search = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_article() -> Article {
        let now = Utc::now();
        Article {
            id: 1,
            title: "Meetup".to_string(),
            author: "Dana".to_string(),
            content: "Monthly meetup".to_string(),
            category: Some(ArticleCategory::Events),
            status: ArticleStatus::Draft,
            date: now,
            image: None,
            tags: vec!["rust".to_string()],
            seo_description: None,
            seo_keywords: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_category_round_trip_and_labels() {
        for category in ArticleCategory::ALL {
            assert_eq!(ArticleCategory::from_str(category.as_str()), Some(category));
            assert!(!category.label().is_empty());
        }
        assert_eq!(ArticleCategory::from_str("sports"), None);
        assert_eq!(ArticleCategory::Success.label(), "סיפורי הצלחה");
    }

    #[test]
    fn test_category_rejects_unknown_value_on_deserialize() {
        let parsed: Result<ArticleCategory, _> = serde_json::from_str("\"gaming\"");
        assert!(parsed.is_err());

        let parsed: ArticleCategory = serde_json::from_str("\"technology\"").unwrap();
        assert_eq!(parsed, ArticleCategory::Technology);
    }

    #[test]
    fn test_status_default_is_draft() {
        assert_eq!(ArticleStatus::default(), ArticleStatus::Draft);
        assert_eq!(ArticleStatus::from_str("archived"), None);
    }

    #[test]
    fn test_article_serializes_camel_case() {
        let mut article = sample_article();
        article.seo_description = Some("desc".to_string());

        let value = serde_json::to_value(&article).unwrap();

        assert_eq!(value["seoDescription"], "desc");
        assert_eq!(value["category"], "events");
        assert_eq!(value["status"], "draft");
        assert!(value.get("seo_description").is_none());
    }

    #[test]
    fn test_update_apply_only_touches_set_fields() {
        let mut article = sample_article();
        let update = UpdateArticleInput {
            status: Some(ArticleStatus::Published),
            tags: Some(vec!["events".to_string(), "community".to_string()]),
            ..Default::default()
        };

        update.apply_to(&mut article);

        assert_eq!(article.status, ArticleStatus::Published);
        assert_eq!(article.tags, vec!["events", "community"]);
        assert_eq!(article.title, "Meetup");
        assert_eq!(article.category, Some(ArticleCategory::Events));
    }

    #[test]
    fn test_update_null_clears_optional_fields() {
        let mut article = sample_article();
        article.image = Some("/img/a.png".to_string());
        article.seo_description = Some("desc".to_string());

        let update: UpdateArticleInput =
            serde_json::from_str(r#"{"category": null, "image": null, "title": "Renamed"}"#)
                .unwrap();
        assert_eq!(update.category, Some(None));
        assert_eq!(update.seo_description, None);

        update.apply_to(&mut article);
        assert_eq!(article.category, None);
        assert_eq!(article.image, None);
        assert_eq!(article.seo_description.as_deref(), Some("desc"));
        assert_eq!(article.title, "Renamed");
    }

    #[test]
    fn test_update_rejects_unknown_category() {
        let parsed: Result<UpdateArticleInput, _> =
            serde_json::from_str(r#"{"category": "gaming"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_query_blank_search_is_ignored() {
        let query = ArticleQuery::published().with_search("   ");
        assert_eq!(query.search, None);

        let query = ArticleQuery::published().with_search("  Rust ");
        assert_eq!(query.search.as_deref(), Some("Rust"));
    }

    #[test]
    fn test_status_filter_parse() {
        assert_eq!(StatusFilter::from_str("all"), Some(StatusFilter::All));
        assert_eq!(StatusFilter::All.status(), None);
        assert_eq!(StatusFilter::Draft.status(), Some(ArticleStatus::Draft));
        assert_eq!(StatusFilter::from_str("Published"), None);
    }
}
