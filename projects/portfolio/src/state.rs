use std::sync::Arc;

use interfaces_github_repos::index::{GitHubApi, GitHubClient, GitHubClientBuildError};
use interfaces_mail_smtp::{
    index::{MailTransport, SmtpMailer, SmtpMailerBuildError},
    Mailbox,
};
use thiserror::Error;

use crate::{
    config::Config,
    rate_limit::{InMemoryRateLimiter, RateLimitConfig, RateLimitStore},
};

/// Sender and recipient of contact notifications. Never taken from a
/// submission.
#[derive(Debug, Clone)]
pub struct ContactAddresses {
    pub from: Mailbox,
    pub to: Mailbox,
}

#[derive(Clone)]
pub struct AppState {
    pub github: Arc<dyn GitHubApi>,
    pub github_username: Arc<str>,
    pub mailer: Arc<dyn MailTransport>,
    pub rate_limiter: Arc<dyn RateLimitStore>,
    pub contact: Arc<ContactAddresses>,
    pub trust_proxy: bool,
}

#[derive(Debug, Error)]
pub enum StateInitError {
    #[error("GitHubClient: {source}")]
    GitHubClient {
        #[from]
        source: GitHubClientBuildError,
    },

    #[error("SmtpMailer: {source}")]
    SmtpMailer {
        #[from]
        source: SmtpMailerBuildError,
    },
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self, StateInitError> {
        let github = GitHubClient::new(&config.github)?;
        let mailer = SmtpMailer::new(&config.smtp)?;

        Ok(Self {
            github: Arc::new(github),
            github_username: Arc::from(config.github_username.as_str()),
            mailer: Arc::new(mailer),
            rate_limiter: Arc::new(InMemoryRateLimiter::new(RateLimitConfig::contact_form())),
            contact: Arc::new(ContactAddresses {
                from: config.contact_from.clone(),
                to: config.contact_recipient.clone(),
            }),
            trust_proxy: config.trust_proxy,
        })
    }
}
