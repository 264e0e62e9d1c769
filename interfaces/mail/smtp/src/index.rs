use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;

/// Port on which SMTP servers expect TLS from the first byte; every other
/// port is upgraded with STARTTLS.
const IMPLICIT_TLS_PORT: u16 = 465;

/// A message with a plain-text body and an HTML alternative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: Mailbox,
    pub to: Mailbox,
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl OutgoingMail {
    pub fn to_message(&self) -> Result<Message, MailTransportError> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(self.subject.as_str())
            .multipart(MultiPart::alternative_plain_html(
                self.text.clone(),
                self.html.clone(),
            ))
            .map_err(|source| MailTransportError::Build { source })
    }
}

#[derive(Debug, Error)]
pub enum MailTransportError {
    #[error("Build: {source}")]
    Build {
        source: lettre::error::Error,
    },

    #[error("Send: {source}")]
    Send {
        source: lettre::transport::smtp::Error,
    },
}

/// Accept-or-error delivery of a single message.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailTransportError>;
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
}

#[derive(Debug, Error)]
pub enum SmtpMailerBuildError {
    #[error("Relay {host}: {source}")]
    Relay {
        host: String,
        source: lettre::transport::smtp::Error,
    },
}

/// `MailTransport` over an authenticated, pooled SMTP connection.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, SmtpMailerBuildError> {
        let builder = if config.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .map_err(|source| SmtpMailerBuildError::Relay {
            host: config.host.clone(),
            source,
        })?;

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(config.timeout))
            .build();

        Ok(Self { transport })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailTransportError> {
        let message = mail.to_message()?;

        self.transport
            .send(message)
            .await
            .map_err(|source| MailTransportError::Send { source })?;

        Ok(())
    }
}
