//! SMTP relay transport.
//!
//! Implicit TLS (usually port 465) wraps the connection from the first byte;
//! otherwise the connection is upgraded with STARTTLS when the relay offers
//! it. Every connect and command is bounded by the configured timeout.

use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::mail::{EmailMessage, MailError, Mailer};

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
}

impl SmtpMailer {
    pub fn from_config(config: &SmtpConfig) -> Result<Self, MailError> {
        let host = config.host.trim().to_string();

        let tls = TlsParameters::builder(host.clone())
            .dangerous_accept_invalid_certs(config.tls_insecure_skip_verify)
            .build()?;
        let tls = if config.uses_implicit_tls() {
            Tls::Wrapper(tls)
        } else {
            Tls::Opportunistic(tls)
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host.as_str())
            .port(config.port)
            .tls(tls)
            .timeout(Some(config.timeout()));

        if !config.username.is_empty() && !config.password.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        tracing::info!(
            host = %host,
            port = config.port,
            implicit_tls = config.uses_implicit_tls(),
            authenticated = !config.username.is_empty(),
            "SMTP relay configured"
        );

        Ok(Self {
            transport: builder.build(),
            host,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        let email = message.to_lettre()?;
        let response = self.transport.send(email).await?;
        tracing::debug!(
            relay = %self.host,
            code = %response.code(),
            "Message accepted by relay"
        );
        Ok(())
    }
}
