use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT},
    Client, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;

pub const GITHUB_API_URL: &str = "https://api.github.com";

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const GITHUB_USER_AGENT: &str = "portfolio-backend";

#[derive(Debug)]
pub struct GitHubResponse {
    pub status: StatusCode,
    pub body: serde_json::Value,
}

/// Read access to the GitHub REST API.
///
/// Implementations never swallow failures: a network error or a non-2xx
/// status comes back as `Err` and the caller decides what to do with it.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<GitHubResponse, GitHubRequestError>;
}

#[derive(Debug, Error)]
pub enum GitHubRequestError {
    #[error("RequestSend: {source}")]
    RequestSend {
        source: reqwest::Error,
    },

    #[error("ResponseRead: {source}")]
    ResponseRead {
        source: reqwest::Error,
    },

    #[error("Status {status}: {message}")]
    Status {
        status: StatusCode,
        message: String,
    },

    #[error("Decode: {source}")]
    Decode {
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum GitHubClientBuildError {
    #[error("InvalidToken: {source}")]
    InvalidToken {
        source: reqwest::header::InvalidHeaderValue,
    },

    #[error("ClientBuild: {source}")]
    ClientBuild {
        source: reqwest::Error,
    },
}

#[derive(Debug, Clone)]
pub struct GitHubClientConfig {
    pub base_url: String,
    pub token: String,
    pub timeout: Duration,
}

/// `GitHubApi` over a pooled `reqwest::Client` with the auth and accept
/// headers baked in at construction.
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: String,
}

impl GitHubClient {
    pub fn new(config: &GitHubClientConfig) -> Result<Self, GitHubClientBuildError> {
        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|source| GitHubClientBuildError::InvalidToken { source })?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        headers.insert(USER_AGENT, HeaderValue::from_static(GITHUB_USER_AGENT));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|source| GitHubClientBuildError::ClientBuild { source })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<GitHubResponse, GitHubRequestError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await
            .map_err(|source| GitHubRequestError::RequestSend { source })?;

        let status = response.status();

        let text = response
            .text()
            .await
            .map_err(|source| GitHubRequestError::ResponseRead { source })?;

        if !status.is_success() {
            return Err(GitHubRequestError::Status {
                status,
                message: error_message(text),
            });
        }

        let body = if text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text).map_err(|source| GitHubRequestError::Decode { source })?
        };

        Ok(GitHubResponse { status, body })
    }
}

#[derive(Deserialize)]
struct GitHubErrorBody {
    message: Option<String>,
}

// GitHub reports failures as `{"message": "...", "documentation_url": "..."}`.
fn error_message(text: String) -> String {
    serde_json::from_str::<GitHubErrorBody>(&text)
        .ok()
        .and_then(|body| body.message)
        .unwrap_or(text)
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRepository {
    pub name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub language: Option<String>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct GitHubTraffic {
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficKind {
    Views,
    Clones,
}

impl TrafficKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TrafficKind::Views => "views",
            TrafficKind::Clones => "clones",
        }
    }
}

/// GET /users/{owner}/repos, most recently updated first.
pub async fn list_user_repositories(
    api: &dyn GitHubApi,
    owner: &str,
    per_page: u8,
) -> Result<Vec<GitHubRepository>, GitHubRequestError> {
    let per_page = per_page.to_string();
    let response = api
        .get(
            &format!("/users/{owner}/repos"),
            &[("sort", "updated"), ("per_page", per_page.as_str())],
        )
        .await?;

    decode(response)
}

/// GET /repos/{owner}/{repo}/traffic/{views|clones}
pub async fn fetch_repository_traffic(
    api: &dyn GitHubApi,
    owner: &str,
    repo: &str,
    kind: TrafficKind,
) -> Result<GitHubTraffic, GitHubRequestError> {
    let response = api
        .get(&format!("/repos/{owner}/{repo}/traffic/{}", kind.as_str()), &[])
        .await?;

    decode(response)
}

fn decode<T: DeserializeOwned>(response: GitHubResponse) -> Result<T, GitHubRequestError> {
    serde_json::from_value(response.body).map_err(|source| GitHubRequestError::Decode { source })
}
