//! Outgoing email
//!
//! `Mailer` is the transport seam: `SmtpMailer` relays through an SMTP
//! server with lettre, `DisabledMailer` only logs. `MailNotifier` renders
//! the contact emails and sends them on detached tasks so delivery never
//! blocks or fails a request.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::config::MailConfig;
use crate::models::Contact;

/// A rendered email ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<()>;
}

/// SMTP relay transport
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let from = format!("{} <{}>", config.from_name, config.username)
            .parse::<Mailbox>()
            .map_err(|e| anyhow!("Invalid from address: {}", e))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
            .credentials(Credentials::new(config.username.clone(), config.password.clone()))
            .port(config.smtp_port)
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(email
                .to
                .parse()
                .map_err(|e| anyhow!("Invalid to address: {}", e))?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(email.html.clone())
            .map_err(|e| anyhow!("Failed to build email: {}", e))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;

        Ok(())
    }
}

/// Used when SMTP is not configured
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        tracing::debug!(to = %email.to, subject = %email.subject, "Mail disabled, skipping");
        Ok(())
    }
}

/// Pick the transport for the configuration
pub fn mailer_from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>> {
    if config.is_enabled() {
        tracing::info!("SMTP mail enabled via {}:{}", config.smtp_host, config.smtp_port);
        Ok(Arc::new(SmtpMailer::new(config)?))
    } else {
        tracing::info!("SMTP credentials not configured, outgoing mail disabled");
        Ok(Arc::new(DisabledMailer))
    }
}

/// Renders and dispatches the contact emails
#[derive(Clone)]
pub struct MailNotifier {
    mailer: Arc<dyn Mailer>,
    admin_email: String,
}

impl MailNotifier {
    pub fn new(mailer: Arc<dyn Mailer>, admin_email: impl Into<String>) -> Self {
        Self {
            mailer,
            admin_email: admin_email.into(),
        }
    }

    /// Confirmation to the submitter plus a notification to the admin address
    pub fn contact_received(&self, contact: &Contact) -> Vec<JoinHandle<()>> {
        vec![
            self.dispatch(confirmation_email(contact)),
            self.dispatch(admin_notification_email(contact, &self.admin_email)),
        ]
    }

    /// The admin's reply to a submission
    pub fn reply(&self, contact: &Contact, subject: &str, message: &str) -> JoinHandle<()> {
        self.dispatch(reply_email(contact, subject, message))
    }

    /// Send on a detached task; failures are logged, never retried
    fn dispatch(&self, email: OutgoingEmail) -> JoinHandle<()> {
        let mailer = self.mailer.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send(&email).await {
                tracing::warn!(to = %email.to, subject = %email.subject, "Email sending failed: {:#}", e);
            }
        })
    }
}

const SIGNATURE: &str = "<p>במידה ונעשה לעזור לך למצוא את הכישרונות הטובים ביותר בבית שמש.</p>\
     <br><p>בברכה,<br>צוות הייטק בית שמש</p>";

fn wrap(body: &str) -> String {
    format!(
        "<div dir=\"rtl\" style=\"font-family: Arial, sans-serif; line-height: 1.6;\">{}</div>",
        body
    )
}

fn field(label: &str, value: &str) -> String {
    format!("<p><strong>{}:</strong> {}</p>", label, escape_html(value))
}

pub fn confirmation_email(contact: &Contact) -> OutgoingEmail {
    let mut body = String::from("<h2 style=\"color: #0066cc;\">תודה על פנייתך!</h2>");
    body.push_str(&format!("<p>שלום {},</p>", escape_html(&contact.contact_person)));
    body.push_str(&format!(
        "<p>קיבלנו את פנייתך מ-{} ונעשה להגיב בהקדם האפשרי.</p>",
        escape_html(&contact.company_name)
    ));
    body.push_str(&field("סיבת פנייה", contact.reason.label()));
    if let Some(message) = non_blank(&contact.message) {
        body.push_str(&field("הודעה", message));
    }
    body.push_str(SIGNATURE);

    OutgoingEmail {
        to: contact.email.clone(),
        subject: "קבלת פנייה - הייטק בית שמש".to_string(),
        html: wrap(&body),
    }
}

pub fn admin_notification_email(contact: &Contact, admin_email: &str) -> OutgoingEmail {
    let mut body = String::from("<h2 style=\"color: #0066cc;\">פנייה חדשה מחברה</h2>");
    body.push_str(&field("שם חברה", &contact.company_name));
    body.push_str(&field("איש קשר", &contact.contact_person));
    body.push_str(&field("דוא\"ל", &contact.email));
    body.push_str(&field("טלפון", non_blank(&contact.phone).unwrap_or("לא צוין")));
    body.push_str(&field("סיבת פנייה", contact.reason.label()));
    if let Some(developers) = non_blank(&contact.developers_needed) {
        body.push_str(&field("מספר מפתחים דרוש", developers));
    }
    if !contact.tech_stack.is_empty() {
        body.push_str(&field("טכנולוגיות", &contact.tech_stack.join(", ")));
    }
    if let Some(message) = non_blank(&contact.message) {
        body.push_str(&field("הודעה", message));
    }
    body.push_str("<p>נא לטפל בפנייה זו במערכת הניהול.</p>");

    OutgoingEmail {
        to: admin_email.to_string(),
        subject: format!("פנייה חדשה מ-{}", contact.company_name),
        html: wrap(&body),
    }
}

pub fn reply_email(contact: &Contact, subject: &str, message: &str) -> OutgoingEmail {
    let mut body = String::from("<h2 style=\"color: #0066cc;\">תגובה מהייטק בית שמש</h2>");
    body.push_str(&format!("<p>שלום {},</p>", escape_html(&contact.contact_person)));
    body.push_str(&format!(
        "<div style=\"background-color: #f9f9f9; padding: 15px; border-radius: 5px; margin: 20px 0;\">{}</div>",
        escape_html(message).replace("\r\n", "\n").replace('\n', "<br>")
    ));
    body.push_str(SIGNATURE);
    body.push_str(&format!(
        "<hr><p style=\"font-size: 0.8em; color: #666;\">דוא\"ל זה נשלח בתגובה לפנייתך מתאריך {}</p>",
        contact.date.format("%d.%m.%Y")
    ));

    OutgoingEmail {
        to: contact.email.clone(),
        subject: subject.to_string(),
        html: wrap(&body),
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Escape text for interpolation into HTML
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{ContactReason, ContactStatus};
    use chrono::{TimeZone, Utc};
    use tokio::sync::Mutex;

    /// Captures sent emails; optionally fails every send
    #[derive(Default)]
    pub(crate) struct RecordingMailer {
        pub sent: Mutex<Vec<OutgoingEmail>>,
        pub fail: bool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutgoingEmail) -> Result<()> {
            if self.fail {
                return Err(anyhow!("smtp unavailable"));
            }
            self.sent.lock().await.push(email.clone());
            Ok(())
        }
    }

    fn contact() -> Contact {
        Contact {
            id: 3,
            company_name: "Acme <Labs>".to_string(),
            contact_person: "Rivka".to_string(),
            email: "rivka@acme.test".to_string(),
            phone: None,
            reason: ContactReason::Partnership,
            developers_needed: Some("2".to_string()),
            tech_stack: vec!["rust".to_string(), "go".to_string()],
            message: Some("Hello & welcome".to_string()),
            newsletter: false,
            status: ContactStatus::New,
            date: Utc.with_ymd_and_hms(2024, 2, 29, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>\"x\" & 'y'</b>"), "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;");
        assert_eq!(escape_html("שלום"), "שלום");
    }

    #[test]
    fn test_confirmation_email() {
        let email = confirmation_email(&contact());
        assert_eq!(email.to, "rivka@acme.test");
        assert_eq!(email.subject, "קבלת פנייה - הייטק בית שמש");
        assert!(email.html.contains("Acme &lt;Labs&gt;"));
        assert!(email.html.contains("שיתוף פעולה"));
        assert!(email.html.contains("Hello &amp; welcome"));
    }

    #[test]
    fn test_admin_notification_email() {
        let email = admin_notification_email(&contact(), "info@hub.test");
        assert_eq!(email.to, "info@hub.test");
        assert_eq!(email.subject, "פנייה חדשה מ-Acme <Labs>");
        assert!(email.html.contains("לא צוין"));
        assert!(email.html.contains("rust, go"));
    }

    #[test]
    fn test_reply_renders_line_breaks() {
        let email = reply_email(&contact(), "Re: partnership", "line one\nline <two>");
        assert_eq!(email.subject, "Re: partnership");
        assert!(email.html.contains("line one<br>line &lt;two&gt;"));
        assert!(email.html.contains("29.02.2024"));
    }

    #[tokio::test]
    async fn test_notifier_sends_both_emails() {
        let mailer = Arc::new(RecordingMailer::default());
        let notifier = MailNotifier::new(mailer.clone(), "info@hub.test");

        for handle in notifier.contact_received(&contact()) {
            handle.await.unwrap();
        }

        let sent = mailer.sent.lock().await;
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().any(|e| e.to == "info@hub.test"));
        assert!(sent.iter().any(|e| e.to == "rivka@acme.test"));
    }

    #[tokio::test]
    async fn test_notifier_swallows_failures() {
        let mailer = Arc::new(RecordingMailer {
            fail: true,
            ..Default::default()
        });
        let notifier = MailNotifier::new(mailer, "info@hub.test");

        notifier.reply(&contact(), "subject", "body").await.unwrap();
    }

    #[test]
    fn test_disabled_config_selects_noop_mailer() {
        let config = MailConfig {
            username: String::new(),
            password: String::new(),
            ..Default::default()
        };
        assert!(mailer_from_config(&config).is_ok());
    }
}
