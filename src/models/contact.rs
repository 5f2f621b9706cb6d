//! Contact submission model
//!
//! Companies reach the community through the public contact form. Each
//! submission is tracked through a small status workflow by the admins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored contact form submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: i64,
    pub company_name: String,
    pub contact_person: String,
    pub email: String,
    pub phone: Option<String>,
    pub reason: ContactReason,
    /// Free text, e.g. "3-5"
    pub developers_needed: Option<String>,
    pub tech_stack: Vec<String>,
    pub message: Option<String>,
    pub newsletter: bool,
    pub status: ContactStatus,
    /// Server-assigned submission time
    pub date: DateTime<Utc>,
}

/// Why a company got in touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactReason {
    Recruitment,
    Partnership,
    Events,
    Education,
    Other,
}

impl ContactReason {
    pub const ALL: [ContactReason; 5] = [
        ContactReason::Recruitment,
        ContactReason::Partnership,
        ContactReason::Events,
        ContactReason::Education,
        ContactReason::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactReason::Recruitment => "recruitment",
            ContactReason::Partnership => "partnership",
            ContactReason::Events => "events",
            ContactReason::Education => "education",
            ContactReason::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == s)
    }

    /// Hebrew display name
    pub fn label(&self) -> &'static str {
        match self {
            ContactReason::Recruitment => "גיוס מפתחים",
            ContactReason::Partnership => "שיתוף פעולה",
            ContactReason::Events => "אירועים והרצאות",
            ContactReason::Education => "תוכניות הכשרה",
            ContactReason::Other => "אחר",
        }
    }
}

impl std::fmt::Display for ContactReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handling state of a submission
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContactStatus {
    #[default]
    New,
    InProgress,
    Completed,
}

impl ContactStatus {
    pub const ALL: [ContactStatus; 3] = [
        ContactStatus::New,
        ContactStatus::InProgress,
        ContactStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::New => "new",
            ContactStatus::InProgress => "in-progress",
            ContactStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.as_str() == s)
    }

    /// Hebrew display name
    pub fn label(&self) -> &'static str {
        match self {
            ContactStatus::New => "חדש",
            ContactStatus::InProgress => "בטיפול",
            ContactStatus::Completed => "הושלם",
        }
    }
}

impl std::fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for a new contact submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContactInput {
    pub company_name: String,
    pub contact_person: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub reason: ContactReason,
    #[serde(default)]
    pub developers_needed: Option<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub newsletter: bool,
}

impl CreateContactInput {
    pub fn new(
        company_name: impl Into<String>,
        contact_person: impl Into<String>,
        email: impl Into<String>,
        reason: ContactReason,
    ) -> Self {
        Self {
            company_name: company_name.into(),
            contact_person: contact_person.into(),
            email: email.into(),
            phone: None,
            reason,
            developers_needed: None,
            tech_stack: Vec::new(),
            message: None,
            newsletter: false,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Filters for listing contacts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactQuery {
    pub status: Option<ContactStatus>,
    pub reason: Option<ContactReason>,
}

/// Per-status contact count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: ContactStatus,
    pub count: i64,
}
