// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Outbound notification mail.
//!
//! Mail bodies are tera templates loaded from `MAIL_TEMPLATE_DIR/**/*.html`.
//! Templates with an `.html` extension are autoescaped, so context values can
//! carry user- or database-supplied text as-is.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tera::Tera;
use tracing::{debug, error, info, warn};

pub const DEFAULT_SMTP_HOST: &str = "smtp.office365.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_TEMPLATE_DIR: &str = "templates/mail";
pub const DEFAULT_SUBJECT: &str = "NAV Upload Status- NPS";
pub const DEFAULT_TEMPLATE: &str = "nav";

/// Context key used as the body when a template is missing.
const BODY_KEY: &str = "body";

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail sender is not configured (set EMAIL and EMAIL_PASSWORD)")]
    NotConfigured,

    #[error("invalid mail address {0:?}")]
    InvalidAddress(String),

    #[error("no recipients")]
    NoRecipients,

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("SMTP delivery failed: {0}")]
    Transport(String),
}

/// What a handler asks to send.
#[derive(Debug, Clone, Default)]
pub struct MailRequest {
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: Option<String>,
    pub template: Option<String>,
    pub context: tera::Context,
}

/// A rendered message, ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError>;
}

// =============================================================================
// Templates
// =============================================================================

/// Mail templates parsed once at startup.
#[derive(Clone)]
pub struct TemplateRenderer {
    dir: PathBuf,
    templates: Option<Arc<Tera>>,
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer")
            .field("dir", &self.dir)
            .field("loaded", &self.templates.is_some())
            .finish()
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE_DIR)
    }
}

impl TemplateRenderer {
    /// Load every `*.html` under `dir`. A parse error disables templates
    /// rather than failing startup.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let glob = format!("{}/**/*.html", dir.display());
        let templates = match Tera::new(&glob) {
            Ok(tera) => {
                debug!(dir = %dir.display(), count = tera.get_template_names().count(), "Loaded mail templates");
                Some(Arc::new(tera))
            }
            Err(e) => {
                error!(dir = %dir.display(), error = %e, "Mail template parsing error");
                None
            }
        };
        Self { dir, templates }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve subject and template, then render the body.
    pub fn render(&self, request: MailRequest) -> OutgoingMail {
        let template = request.template.as_deref().unwrap_or(DEFAULT_TEMPLATE);
        let name = format!("{template}.html");

        let rendered = self
            .templates
            .as_deref()
            .filter(|tera| tera.get_template_names().any(|loaded| loaded == name))
            .map(|tera| tera.render(&name, &request.context));
        let html = match rendered {
            Some(Ok(html)) => html,
            Some(Err(e)) => {
                error!(template, error = %e, "Mail template render error, using plain body");
                plain_body(&request.context)
            }
            None => {
                warn!(template, "Mail template missing, using plain body");
                plain_body(&request.context)
            }
        };

        OutgoingMail {
            to: request.to,
            cc: request.cc,
            bcc: request.bcc,
            subject: request.subject.unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            html,
        }
    }
}

fn plain_body(context: &tera::Context) -> String {
    match context.get(BODY_KEY) {
        Some(tera::Value::String(body)) => body.clone(),
        Some(tera::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

// =============================================================================
// SMTP
// =============================================================================

#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    /// Login and sender address.
    pub email: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_SMTP_HOST.to_string(),
            port: DEFAULT_SMTP_PORT,
            email: None,
            password: None,
        }
    }
}

/// STARTTLS relay authenticated as the sender account.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Option<Mailbox>,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self, MailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(|e| MailError::Transport(format!("invalid SMTP host: {e}")))?
            .port(settings.port);

        let from = match &settings.email {
            Some(email) => {
                builder = builder.credentials(Credentials::new(
                    email.clone(),
                    settings.password.clone().unwrap_or_default(),
                ));
                Some(parse_mailbox(email)?)
            }
            None => {
                warn!("EMAIL not set; notification mail is disabled");
                None
            }
        };

        info!(host = %settings.host, port = settings.port, "SMTP relay configured");
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .trim()
        .parse()
        .map_err(|_| MailError::InvalidAddress(address.to_string()))
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        let from = self.from.clone().ok_or(MailError::NotConfigured)?;
        if mail.to.is_empty() && mail.cc.is_empty() && mail.bcc.is_empty() {
            return Err(MailError::NoRecipients);
        }

        let mut builder = Message::builder()
            .from(from)
            .subject(mail.subject.as_str())
            .header(ContentType::TEXT_HTML);
        for address in &mail.to {
            builder = builder.to(parse_mailbox(address)?);
        }
        for address in &mail.cc {
            builder = builder.cc(parse_mailbox(address)?);
        }
        for address in &mail.bcc {
            builder = builder.bcc(parse_mailbox(address)?);
        }
        let message = builder
            .body(mail.html)
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        info!(
            recipients = mail.to.len() + mail.cc.len() + mail.bcc.len(),
            subject = %mail.subject,
            "Mail sent"
        );
        Ok(())
    }
}

// =============================================================================
// Recording transport
// =============================================================================

/// Keeps sent mail in memory instead of delivering it.
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<OutgoingMail>>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl MailTransport for RecordingMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        debug!(subject = %mail.subject, "Recording mail");
        self.sent
            .lock()
            .map_err(|_| MailError::Transport("recording mailer poisoned".to_string()))?
            .push(mail);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer_with(files: &[(&str, &str)]) -> (tempfile::TempDir, TemplateRenderer) {
        let dir = tempfile::tempdir().unwrap();
        for (name, source) in files {
            std::fs::write(dir.path().join(name), source).unwrap();
        }
        let renderer = TemplateRenderer::new(dir.path());
        (dir, renderer)
    }

    #[test]
    fn renders_template_file_with_defaults() {
        let (_dir, renderer) = renderer_with(&[(
            "nav.html",
            "<p>{{ DATE }}</p>{% for row in rows %}<td>{{ row }}</td>{% endfor %}",
        )]);

        let mut context = tera::Context::new();
        context.insert("DATE", "2026");
        context.insert("rows", &["a", "b"]);
        let mail = renderer.render(MailRequest {
            to: vec!["ops@example.com".into()],
            context,
            ..Default::default()
        });

        assert_eq!(mail.subject, DEFAULT_SUBJECT);
        assert_eq!(mail.html, "<p>2026</p><td>a</td><td>b</td>");
        assert_eq!(mail.to, vec!["ops@example.com"]);
    }

    #[test]
    fn html_templates_escape_context_values() {
        let (_dir, renderer) = renderer_with(&[("contact_us.html", "<p>{{ NAME }}</p>")]);

        let mut context = tera::Context::new();
        context.insert("NAME", r#"<b>"Tom" & Jerry</b>"#);
        let mail = renderer.render(MailRequest {
            template: Some("contact_us".into()),
            context,
            ..Default::default()
        });

        assert!(mail.html.contains("&lt;b&gt;"));
        assert!(mail.html.contains("&quot;Tom&quot; &amp; Jerry"));
        assert!(!mail.html.contains("<b>"));
    }

    #[test]
    fn missing_template_falls_back_to_body() {
        let (_dir, renderer) = renderer_with(&[]);

        let mut context = tera::Context::new();
        context.insert("body", "plain text");
        let mail = renderer.render(MailRequest {
            subject: Some("Hello".into()),
            template: Some("absent".into()),
            context,
            ..Default::default()
        });
        assert_eq!(mail.subject, "Hello");
        assert_eq!(mail.html, "plain text");

        let mail = renderer.render(MailRequest {
            template: Some("absent".into()),
            ..Default::default()
        });
        assert_eq!(mail.html, "");
    }

    #[test]
    fn missing_directory_still_renders_body() {
        let renderer = TemplateRenderer::new("/nonexistent/mail/templates");
        let mut context = tera::Context::new();
        context.insert("body", "fallback");
        let mail = renderer.render(MailRequest {
            context,
            ..Default::default()
        });
        assert_eq!(mail.html, "fallback");
    }

    #[tokio::test]
    async fn unconfigured_smtp_refuses_to_send() {
        let mailer = SmtpMailer::new(&SmtpSettings::default()).unwrap();
        let result = mailer
            .send(OutgoingMail {
                to: vec!["ops@example.com".into()],
                cc: vec![],
                bcc: vec![],
                subject: "s".into(),
                html: "h".into(),
            })
            .await;
        assert!(matches!(result, Err(MailError::NotConfigured)));
    }

    #[test]
    fn smtp_settings_debug_hides_password() {
        let settings = SmtpSettings {
            password: Some("hunter2".into()),
            ..Default::default()
        };
        assert!(!format!("{settings:?}").contains("hunter2"));
    }

    #[tokio::test]
    async fn recording_mailer_keeps_messages() {
        let mailer = RecordingMailer::new();
        mailer
            .send(OutgoingMail {
                to: vec!["a@example.com".into()],
                cc: vec![],
                bcc: vec![],
                subject: "s".into(),
                html: "h".into(),
            })
            .await
            .unwrap();
        assert_eq!(mailer.sent().len(), 1);
    }
}
