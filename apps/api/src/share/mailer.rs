//! Outbound email for shared reports.
//!
//! `SmtpMailer` delivers through `lettre`'s async SMTP transport. `LogMailer` is used
//! when no relay is configured: it records the send in the log and reports that
//! nothing was delivered.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::info;

use crate::config::SmtpConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("could not build message: {0}")]
    Build(String),

    #[error("SMTP delivery failed: {0}")]
    Transport(String),
}

#[derive(Debug, Clone)]
pub struct PdfAttachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct OutgoingReport {
    pub recipient: Mailbox,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
    pub attachment: Option<PdfAttachment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MailReceipt {
    pub delivered: bool,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, report: OutgoingReport) -> Result<MailReceipt, MailError>;
}

/// Parses a bare or display-name address (`Jo <jo@example.com>`).
pub fn parse_recipient(raw: &str) -> Result<Mailbox, MailError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(MailError::InvalidAddress(
            "recipient email is required".to_string(),
        ));
    }
    trimmed
        .parse::<Mailbox>()
        .map_err(|e| MailError::InvalidAddress(format!("'{trimmed}': {e}")))
}

/// Builds the MIME message: text/html alternatives, plus the PDF when present.
pub fn build_message(from: &Mailbox, report: OutgoingReport) -> Result<Message, MailError> {
    let body = MultiPart::alternative_plain_html(report.text_body, report.html_body);
    let builder = Message::builder()
        .from(from.clone())
        .to(report.recipient)
        .subject(report.subject);

    let message = match report.attachment {
        Some(pdf) => {
            let content_type = ContentType::parse("application/pdf")
                .map_err(|e| MailError::Build(e.to_string()))?;
            let attachment = Attachment::new(pdf.filename).body(pdf.bytes, content_type);
            builder.multipart(MultiPart::mixed().multipart(body).singlepart(attachment))
        }
        None => builder.multipart(body),
    };
    message.map_err(|e| MailError::Build(e.to_string()))
}

pub struct SmtpMailer {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(smtp: &SmtpConfig, from: &str) -> Result<Self, MailError> {
        let from = from
            .parse::<Mailbox>()
            .map_err(|e| MailError::InvalidAddress(format!("MAIL_FROM '{from}': {e}")))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(smtp.port);
        if let Some(username) = &smtp.username {
            let password = smtp.password.clone().unwrap_or_default();
            builder = builder.credentials(Credentials::new(username.clone(), password));
        }

        Ok(Self {
            from,
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, report: OutgoingReport) -> Result<MailReceipt, MailError> {
        let recipient = report.recipient.to_string();
        let message = build_message(&self.from, report)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        info!("Emailed report to {recipient}");
        Ok(MailReceipt { delivered: true })
    }
}

pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, report: OutgoingReport) -> Result<MailReceipt, MailError> {
        info!(
            "SMTP not configured; report for {} not sent (subject: {:?}, attachment: {:?})",
            report.recipient,
            report.subject,
            report.attachment.as_ref().map(|a| a.filename.as_str())
        );
        Ok(MailReceipt { delivered: false })
    }
}
