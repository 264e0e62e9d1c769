use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use interfaces_github_repos::index::{GitHubClientConfig, GITHUB_API_URL};
use interfaces_mail_smtp::{index::SmtpConfig, AddressError, Mailbox};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing: {key} must be set")]
    Missing { key: &'static str },

    #[error("Invalid {key}={value}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("InvalidAddress {key}: {source}")]
    InvalidAddress {
        key: &'static str,
        #[source]
        source: AddressError,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub github_username: String,
    pub github: GitHubClientConfig,
    pub smtp: SmtpConfig,
    pub contact_from: Mailbox,
    pub contact_recipient: Mailbox,
    pub static_dir: PathBuf,
    pub trust_proxy: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source; blank values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let upstream_timeout =
            Duration::from_secs(try_load(&lookup, "UPSTREAM_TIMEOUT_SECS", "10")?);
        let smtp_user = require(&lookup, "SMTP_USER")?;

        Ok(Self {
            port: try_load(&lookup, "PORT", "3000")?,
            github_username: require(&lookup, "GITHUB_USERNAME")?,
            github: GitHubClientConfig {
                base_url: try_load(&lookup, "GITHUB_API_URL", GITHUB_API_URL)?,
                token: require(&lookup, "GITHUB_TOKEN")?,
                timeout: upstream_timeout,
            },
            smtp: SmtpConfig {
                host: try_load(&lookup, "SMTP_HOST", "smtp.gmail.com")?,
                port: try_load(&lookup, "SMTP_PORT", "587")?,
                password: require(&lookup, "SMTP_PASS")?,
                username: smtp_user.clone(),
                timeout: upstream_timeout,
            },
            contact_from: mailbox(&lookup, "CONTACT_FROM", &smtp_user)?,
            contact_recipient: mailbox(&lookup, "CONTACT_RECIPIENT", &smtp_user)?,
            static_dir: try_load(&lookup, "STATIC_DIR", ".")?,
            trust_proxy: try_load(&lookup, "TRUST_PROXY", "false")?,
        })
    }
}

fn require<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).ok_or(ConfigError::Missing { key })
}

fn try_load<F, T>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.parse().map_err(|err: T::Err| ConfigError::Invalid {
        key,
        reason: err.to_string(),
        value,
    })
}

fn mailbox<F>(lookup: &F, key: &'static str, fallback: &str) -> Result<Mailbox, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .unwrap_or_else(|| fallback.to_string())
        .parse()
        .map_err(|source| ConfigError::InvalidAddress { key, source })
}
