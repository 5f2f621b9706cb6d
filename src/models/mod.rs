//! Data models
//!
//! This module contains the data structures used throughout the tech hub backend.
//! Models represent:
//! - Database entities (Article, Contact, User, Statistics)
//! - Input and filter types consumed by services
//! - Pagination containers

mod article;
mod contact;
pub(crate) mod fields;
mod pagination;
mod statistics;
mod user;

pub use article::{
    Article, ArticleCategory, ArticleQuery, ArticleStatus, CreateArticleInput, StatusFilter,
    UpdateArticleInput,
};
pub use contact::{
    Contact, ContactQuery, ContactReason, ContactStatus, CreateContactInput, StatusCount,
};
pub use pagination::{ListParams, PagedResult, Pagination, DEFAULT_LIMIT, MAX_LIMIT};
pub use statistics::{Statistics, UpdateStatisticsInput};
pub use user::{CreateUserInput, User, UserRole};
