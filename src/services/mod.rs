//! Services layer - Business logic
//!
//! This module contains the business logic of the tech hub backend.
//! Services are responsible for:
//! - Implementing business rules and validation
//! - Coordinating between repositories, tokens and the mail notifier
//! - Mapping storage failures into typed errors

pub mod analytics;
pub mod article;
pub mod auth;
pub mod contact;
pub mod mailer;
pub mod password;
pub mod rate_limiter;
pub mod statistics;
pub mod user;

pub use analytics::{
    bucket_by_day, AnalyticsReport, AnalyticsService, AnalyticsServiceError, DayCount, Overview,
    Period,
};
pub use article::{ArticleService, ArticleServiceError};
pub use auth::{Claims, TokenError, TokenService};
pub use contact::{ContactService, ContactServiceError, RespondInput};
pub use mailer::{mailer_from_config, DisabledMailer, MailNotifier, Mailer, OutgoingEmail, SmtpMailer};
pub use password::{hash_password, verify_password};
pub use rate_limiter::{ApiRateLimiter, LoginRateLimiter, SlidingWindowLimiter};
pub use statistics::{StatisticsService, StatisticsServiceError};
pub use user::{LoginInput, LoginResult, UserService, UserServiceError};
