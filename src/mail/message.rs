use lettre::message::{header::ContentType, Mailbox, Message};

use crate::mail::MailError;
use crate::security::headers::{normalize_body, sanitize_header};

/// Structured outbound message, independent of the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub reply_to: Option<String>,
    pub subject: String,
    pub text_body: String,
}

impl EmailMessage {
    /// Render into a lettre message. Subject and body are neutralized here so
    /// no caller can forget it.
    pub fn to_lettre(&self) -> Result<Message, MailError> {
        let mut builder = Message::builder()
            .from(mailbox(&self.from)?)
            .subject(sanitize_header(&self.subject))
            .header(ContentType::TEXT_PLAIN);

        for recipient in &self.to {
            builder = builder.to(mailbox(recipient)?);
        }

        if let Some(reply_to) = self.reply_to.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            builder = builder.reply_to(mailbox(reply_to)?);
        }

        let mut body = normalize_body(&self.text_body);
        if !body.ends_with('\n') {
            body.push('\n');
        }

        Ok(builder.body(body)?)
    }
}

fn mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.trim().parse().map_err(|e: lettre::address::AddressError| MailError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}
