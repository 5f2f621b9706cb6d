//! Shared API response types
//!
//! Records are returned with their raw camelCase fields plus the Hebrew
//! display labels the site pages render.

use serde::Serialize;

use crate::models::{Article, Contact, PagedResult, Pagination, Statistics};

// ============================================================================
// Article Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleResponse {
    #[serde(flatten)]
    pub article: Article,
    pub category_label: Option<&'static str>,
    pub status_label: &'static str,
}

impl From<Article> for ArticleResponse {
    fn from(article: Article) -> Self {
        Self {
            category_label: article.category.map(|c| c.label()),
            status_label: article.status.label(),
            article,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ArticleListResponse {
    pub articles: Vec<ArticleResponse>,
    pub pagination: Pagination,
}

impl From<PagedResult<Article>> for ArticleListResponse {
    fn from(result: PagedResult<Article>) -> Self {
        let pagination = Pagination::from(&result);
        Self {
            articles: result.items.into_iter().map(ArticleResponse::from).collect(),
            pagination,
        }
    }
}

/// `{message, article}` returned by create and update
#[derive(Debug, Serialize)]
pub struct ArticleMessageResponse {
    pub message: &'static str,
    pub article: ArticleResponse,
}

// ============================================================================
// Contact Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    #[serde(flatten)]
    pub contact: Contact,
    pub reason_label: &'static str,
    pub status_label: &'static str,
}

impl From<Contact> for ContactResponse {
    fn from(contact: Contact) -> Self {
        Self {
            reason_label: contact.reason.label(),
            status_label: contact.status.label(),
            contact,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ContactListResponse {
    pub contacts: Vec<ContactResponse>,
    pub pagination: Pagination,
}

impl From<PagedResult<Contact>> for ContactListResponse {
    fn from(result: PagedResult<Contact>) -> Self {
        let pagination = Pagination::from(&result);
        Self {
            contacts: result.items.into_iter().map(ContactResponse::from).collect(),
            pagination,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ContactMessageResponse {
    pub message: &'static str,
    pub contact: ContactResponse,
}

// ============================================================================
// Misc
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StatisticsMessageResponse {
    pub message: &'static str,
    pub statistics: Statistics,
}

/// Plain acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}
