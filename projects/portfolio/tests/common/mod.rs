#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    net::SocketAddr,
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::http::StatusCode;
use interfaces_github_repos::index::{GitHubApi, GitHubRequestError, GitHubResponse};
use interfaces_mail_smtp::index::{
    MailTransport, MailTransportError, OutgoingMail, SmtpConfig, SmtpMailer,
};
use projects_portfolio::{
    endpoints::router,
    rate_limit::{
        InMemoryRateLimiter, RateLimitConfig, RateLimitDecision, RateLimitStore,
        RateLimitStoreError,
    },
    state::{AppState, ContactAddresses},
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Default)]
pub struct FakeGitHub {
    pub responses: HashMap<String, Value>,
    pub failing: HashSet<String>,
}

impl FakeGitHub {
    pub fn with_repositories(names: &[&str]) -> Self {
        let mut fake = Self::default();
        let repositories: Vec<Value> = names
            .iter()
            .map(|name| {
                json!({
                    "name": name,
                    "description": null,
                    "html_url": format!("https://github.com/octo/{name}"),
                    "language": "Rust",
                    "updated_at": "2024-03-05T10:00:00Z",
                    "stargazers_count": 2,
                    "forks_count": 0
                })
            })
            .collect();
        fake.responses
            .insert("/users/octo/repos".to_string(), Value::Array(repositories));

        for name in names {
            fake.responses.insert(
                format!("/repos/octo/{name}/traffic/views"),
                json!({ "count": 7 }),
            );
            fake.responses.insert(
                format!("/repos/octo/{name}/traffic/clones"),
                json!({ "count": 1 }),
            );
        }
        fake
    }

    pub fn fail(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }
}

#[async_trait]
impl GitHubApi for FakeGitHub {
    async fn get(
        &self,
        path: &str,
        _query: &[(&str, &str)],
    ) -> Result<GitHubResponse, GitHubRequestError> {
        if self.failing.contains(path) {
            return Err(GitHubRequestError::Status {
                status: StatusCode::UNAUTHORIZED,
                message: "Bad credentials for token ghp_secret".to_string(),
            });
        }

        Ok(GitHubResponse {
            status: StatusCode::OK,
            body: self.responses.get(path).cloned().unwrap_or(Value::Null),
        })
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingMail>>,
}

#[async_trait]
impl MailTransport for RecordingMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailTransportError> {
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

pub struct PanickingMailer;

#[async_trait]
impl MailTransport for PanickingMailer {
    async fn send(&self, _mail: OutgoingMail) -> Result<(), MailTransportError> {
        panic!("mailer exploded");
    }
}

/// Counts how often the transport is reached, then fails like a real server
/// that cannot be contacted.
pub struct UnreachableMailer {
    pub attempts: AtomicUsize,
    inner: SmtpMailer,
}

impl UnreachableMailer {
    pub async fn new() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let inner = SmtpMailer::new(&SmtpConfig {
            host: "127.0.0.1".to_string(),
            port,
            username: "site@example.com".to_string(),
            password: "smtp-password".to_string(),
            timeout: Duration::from_secs(2),
        })
        .unwrap();

        Self {
            attempts: AtomicUsize::new(0),
            inner,
        }
    }
}

#[async_trait]
impl MailTransport for UnreachableMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailTransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.inner.send(mail).await
    }
}

pub struct BrokenStore;

#[async_trait]
impl RateLimitStore for BrokenStore {
    async fn try_acquire(&self, _key: &str) -> Result<RateLimitDecision, RateLimitStoreError> {
        Err(RateLimitStoreError::Backend {
            message: "store offline".to_string(),
        })
    }
}

pub fn state(github: Arc<dyn GitHubApi>, mailer: Arc<dyn MailTransport>) -> AppState {
    AppState {
        github,
        github_username: Arc::from("octo"),
        mailer,
        rate_limiter: Arc::new(InMemoryRateLimiter::new(RateLimitConfig::contact_form())),
        contact: Arc::new(ContactAddresses {
            from: "site@example.com".parse().unwrap(),
            to: "owner@example.com".parse().unwrap(),
        }),
        trust_proxy: false,
    }
}

/// Serves the app on an ephemeral local port and returns its base URL.
pub async fn spawn_app(state: AppState, static_dir: &Path) -> String {
    let app = router(state, static_dir);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .unwrap();
    });

    format!("http://{addr}")
}

pub fn valid_submission() -> Value {
    json!({ "name": "Ada", "email": "ada@example.com", "message": "Hello!" })
}
