//! Contact service
//!
//! Accepts public contact form submissions, validates them, stores them and
//! hands them to the mail notifier. Admin operations cover listing, status
//! changes, replies and deletion.

use crate::db::repositories::ContactRepository;
use crate::models::{
    Contact, ContactQuery, ContactStatus, CreateContactInput, ListParams, PagedResult,
};
use crate::services::article::normalize_list;
use crate::services::mailer::MailNotifier;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});

/// Israeli landline, mobile or VoIP number after separators are removed
static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^0(5[0-689]|[2-4]|[8-9]|7[0-9])[0-9]{7}$").expect("valid phone regex")
});

/// Error types for contact service operations
#[derive(Debug, thiserror::Error)]
pub enum ContactServiceError {
    #[error("Contact not found: {0}")]
    NotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Admin reply to a submission
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondInput {
    pub contact_id: i64,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
    /// New status to record along with the reply
    #[serde(default)]
    pub status: Option<ContactStatus>,
}

pub struct ContactService {
    repo: Arc<dyn ContactRepository>,
    notifier: MailNotifier,
}

impl ContactService {
    pub fn new(repo: Arc<dyn ContactRepository>, notifier: MailNotifier) -> Self {
        Self { repo, notifier }
    }

    /// Store a submission and notify by email
    pub async fn submit(&self, input: CreateContactInput) -> Result<Contact, ContactServiceError> {
        validate_submission(&input)?;

        let contact = Contact {
            id: 0,
            company_name: input.company_name.trim().to_string(),
            contact_person: input.contact_person.trim().to_string(),
            email: input.email.trim().to_string(),
            phone: input
                .phone
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            reason: input.reason,
            developers_needed: input
                .developers_needed
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            tech_stack: normalize_list(input.tech_stack),
            message: input.message.filter(|m| !m.trim().is_empty()),
            newsletter: input.newsletter,
            status: ContactStatus::New,
            date: Utc::now(),
        };

        let created = self.repo.create(&contact).await?;
        tracing::info!("New contact {} from '{}'", created.id, created.company_name);

        self.notifier.contact_received(&created);
        Ok(created)
    }

    pub async fn list(
        &self,
        query: &ContactQuery,
        params: &ListParams,
    ) -> Result<PagedResult<Contact>, ContactServiceError> {
        let (items, total) = self.repo.list(query, params).await?;
        Ok(PagedResult::new(items, total, params))
    }

    pub async fn get(&self, id: i64) -> Result<Contact, ContactServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(ContactServiceError::NotFound(id))
    }

    pub async fn update_status(
        &self,
        id: i64,
        status: ContactStatus,
    ) -> Result<Contact, ContactServiceError> {
        let updated = self
            .repo
            .update_status(id, status)
            .await?
            .ok_or(ContactServiceError::NotFound(id))?;
        tracing::info!("Contact {} status set to {}", id, status);
        Ok(updated)
    }

    /// Email a reply to the submitter, optionally moving the status along
    pub async fn respond(&self, input: RespondInput) -> Result<Contact, ContactServiceError> {
        if input.subject.trim().is_empty() || input.message.trim().is_empty() {
            return Err(ContactServiceError::ValidationError(
                "נושא ותוכן התגובה נדרשים".to_string(),
            ));
        }

        let contact = match input.status {
            Some(status) => self.update_status(input.contact_id, status).await?,
            None => self.get(input.contact_id).await?,
        };

        self.notifier.reply(&contact, input.subject.trim(), &input.message);
        tracing::info!("Reply queued for contact {}", contact.id);
        Ok(contact)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ContactServiceError> {
        if !self.repo.delete(id).await? {
            return Err(ContactServiceError::NotFound(id));
        }
        tracing::info!("Deleted contact {}", id);
        Ok(())
    }
}

fn validate_submission(input: &CreateContactInput) -> Result<(), ContactServiceError> {
    let invalid = |message: &str| Err(ContactServiceError::ValidationError(message.to_string()));

    if input.company_name.trim().chars().count() < 2 {
        return invalid("נא להזין שם חברה תקין");
    }
    if input.contact_person.trim().chars().count() < 2 {
        return invalid("נא להזין שם איש קשר תקין");
    }
    if !is_valid_email(&input.email) {
        return invalid("נא להזין כתובת אימייל תקינה");
    }
    if let Some(phone) = input.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        if !is_valid_phone(phone) {
            return invalid("נא להזין מספר טלפון תקין");
        }
    }
    Ok(())
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Accepts separators such as `052-123-4567` or `(02) 123 4567`
pub fn is_valid_phone(phone: &str) -> bool {
    let digits: String = phone
        .chars()
        .filter(|c| !matches!(c, '-' | '(' | ')') && !c.is_whitespace())
        .collect();
    PHONE_RE.is_match(&digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxContactRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::models::ContactReason;
    use crate::services::mailer::tests::RecordingMailer;
    use std::time::Duration;

    async fn setup() -> (ContactService, Arc<RecordingMailer>) {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool).await.expect("Failed to migrate");
        let mailer = Arc::new(RecordingMailer::default());
        let service = ContactService::new(
            SqlxContactRepository::boxed(pool),
            MailNotifier::new(mailer.clone(), "admin@hub.test"),
        );
        (service, mailer)
    }

    fn input() -> CreateContactInput {
        CreateContactInput::new("Acme", "Dana Levi", "dana@acme.test", ContactReason::Recruitment)
    }

    async fn wait_for_mail(mailer: &RecordingMailer, count: usize) {
        for _ in 0..50 {
            if mailer.sent.lock().await.len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[test]
    fn test_phone_validation() {
        assert!(is_valid_phone("0521234567"));
        assert!(is_valid_phone("052-123-4567"));
        assert!(is_valid_phone("(02) 123 4567"));
        assert!(is_valid_phone("077-1234567"));
        assert!(!is_valid_phone("0571234567"));
        assert!(!is_valid_phone("0611234567"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("05212345678"));
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email(" dana@acme.co.il "));
        assert!(!is_valid_email("dana@acme"));
        assert!(!is_valid_email("dana acme@x.com"));
        assert!(!is_valid_email(""));
    }

    #[tokio::test]
    async fn test_submit_stores_and_notifies() {
        let (service, mailer) = setup().await;

        let contact = service
            .submit(input().with_phone("052-123-4567").with_message("We are hiring"))
            .await
            .unwrap();

        assert_eq!(contact.status, ContactStatus::New);
        assert_eq!(service.get(contact.id).await.unwrap(), contact);

        wait_for_mail(&mailer, 2).await;
        let sent = mailer.sent.lock().await;
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().any(|m| m.to == "admin@hub.test"));
    }

    #[tokio::test]
    async fn test_submit_validation() {
        let (service, _) = setup().await;

        let mut short_company = input();
        short_company.company_name = "A".to_string();
        let mut bad_email = input();
        bad_email.email = "not-an-email".to_string();
        let bad_phone = input().with_phone("123");

        for bad in [short_company, bad_email, bad_phone] {
            assert!(matches!(
                service.submit(bad).await,
                Err(ContactServiceError::ValidationError(_))
            ));
        }

        // Blank phone is treated as absent
        let contact = service.submit(input().with_phone("  ")).await.unwrap();
        assert_eq!(contact.phone, None);
    }

    #[tokio::test]
    async fn test_submit_succeeds_when_mail_fails() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let mailer = Arc::new(RecordingMailer {
            fail: true,
            ..Default::default()
        });
        let service = ContactService::new(
            SqlxContactRepository::boxed(pool),
            MailNotifier::new(mailer, "admin@hub.test"),
        );

        assert!(service.submit(input()).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_status_and_respond() {
        let (service, mailer) = setup().await;
        let contact = service.submit(input()).await.unwrap();

        let updated = service
            .update_status(contact.id, ContactStatus::InProgress)
            .await
            .unwrap();
        assert_eq!(updated.status, ContactStatus::InProgress);

        let replied = service
            .respond(RespondInput {
                contact_id: contact.id,
                subject: "Re: hiring".to_string(),
                message: "Thanks\nWe will call".to_string(),
                status: Some(ContactStatus::Completed),
            })
            .await
            .unwrap();
        assert_eq!(replied.status, ContactStatus::Completed);

        wait_for_mail(&mailer, 3).await;
        let sent = mailer.sent.lock().await;
        let reply = sent.iter().find(|m| m.subject == "Re: hiring").unwrap();
        assert!(reply.html.contains("Thanks<br>We will call"));
    }

    #[tokio::test]
    async fn test_missing_contact() {
        let (service, _) = setup().await;
        assert!(matches!(service.delete(99).await, Err(ContactServiceError::NotFound(99))));
        assert!(matches!(
            service.update_status(99, ContactStatus::Completed).await,
            Err(ContactServiceError::NotFound(99))
        ));
        assert!(matches!(
            service
                .respond(RespondInput {
                    contact_id: 99,
                    subject: "s".to_string(),
                    message: "m".to_string(),
                    status: None,
                })
                .await,
            Err(ContactServiceError::NotFound(99))
        ));
    }

    #[tokio::test]
    async fn test_respond_requires_subject_and_message() {
        let (service, _) = setup().await;
        let contact = service.submit(input()).await.unwrap();
        let result = service
            .respond(RespondInput {
                contact_id: contact.id,
                subject: " ".to_string(),
                message: "m".to_string(),
                status: None,
            })
            .await;
        assert!(matches!(result, Err(ContactServiceError::ValidationError(_))));
    }
}
