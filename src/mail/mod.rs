//! Outbound mail.
//!
//! `Mailer` is the seam the contact handler talks to; `SmtpMailer` is the
//! production implementation over an SMTP relay.

pub mod message;
pub mod smtp;

use async_trait::async_trait;
use thiserror::Error;

pub use message::EmailMessage;
pub use smtp::SmtpMailer;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address {address:?}: {reason}")]
    Address { address: String, reason: String },

    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("smtp: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Delivers one message. Implementations must not retry.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError>;
}
