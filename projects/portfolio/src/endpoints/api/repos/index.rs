use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use interfaces_github_repos::index::{
    fetch_repository_traffic, list_user_repositories, GitHubApi, GitHubRepository,
    GitHubRequestError, TrafficKind,
};
use serde::Serialize;
use thiserror::Error;
use tokio::task::{JoinError, JoinSet};
use tracing::error;

use crate::{endpoints::api::ErrorBody, state::AppState};

pub const REPOSITORY_PAGE_SIZE: u8 = 9;
pub const FETCH_REPOSITORIES_FAILED: &str = "Failed to fetch repository data";

/// Views and clones over the upstream's rolling window. Zero means either
/// "none" or "unknown".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrafficSummary {
    pub view_count: u64,
    pub clone_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySummary {
    pub name: String,
    pub description: Option<String>,
    pub url: String,
    #[serde(rename = "language")]
    pub primary_language: Option<String>,
    pub updated_at: String,
    #[serde(rename = "stars")]
    pub star_count: u64,
    #[serde(rename = "forks")]
    pub fork_count: u64,
    #[serde(rename = "views")]
    pub view_count: u64,
    #[serde(rename = "clones")]
    pub clone_count: u64,
}

impl RepositorySummary {
    fn new(repository: GitHubRepository, traffic: TrafficSummary) -> Self {
        Self {
            updated_at: format_calendar_date(repository.updated_at),
            name: repository.name,
            description: repository.description,
            url: repository.html_url,
            primary_language: repository.language,
            star_count: repository.stargazers_count,
            fork_count: repository.forks_count,
            view_count: traffic.view_count,
            clone_count: traffic.clone_count,
        }
    }
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("FetchRepositories: {source}")]
    FetchRepositories {
        #[from]
        source: FetchRepositoriesError,
    },
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> axum::response::Response {
        error!(error = %self, "Error fetching repositories");

        match self {
            HandlerError::FetchRepositories { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new(FETCH_REPOSITORIES_FAILED)),
            )
                .into_response(),
        }
    }
}

/// Axum handler: GET /api/repos
pub async fn handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<RepositorySummary>>, HandlerError> {
    let repositories =
        fetch_repositories_with_traffic(state.github.clone(), state.github_username.clone())
            .await?;

    Ok(Json(repositories))
}

#[derive(Debug, Error)]
pub enum FetchRepositoriesError {
    #[error("ListRepositories: {source}")]
    ListRepositories {
        #[from]
        source: GitHubRequestError,
    },

    #[error("TrafficTask: {source}")]
    TrafficTask {
        #[from]
        source: JoinError,
    },
}

/// Lists the owner's most recently updated repositories and enriches each
/// with its traffic.
///
/// Traffic lookups run as one task per repository. Each task reports back
/// with the index of the repository it was spawned for, so the output keeps
/// the upstream order whatever order the tasks finish in. Only a failure of
/// the listing itself fails the call.
pub async fn fetch_repositories_with_traffic(
    api: Arc<dyn GitHubApi>,
    owner: Arc<str>,
) -> Result<Vec<RepositorySummary>, FetchRepositoriesError> {
    let repositories = list_user_repositories(api.as_ref(), &owner, REPOSITORY_PAGE_SIZE).await?;

    let mut slots: Vec<Option<RepositorySummary>> = vec![None; repositories.len()];
    let mut tasks = JoinSet::new();

    for (index, repository) in repositories.into_iter().enumerate() {
        let api = Arc::clone(&api);
        let owner = Arc::clone(&owner);

        tasks.spawn(async move {
            let traffic = fetch_repo_traffic(api.as_ref(), &owner, &repository.name).await;
            (index, RepositorySummary::new(repository, traffic))
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (index, summary) = joined?;
        slots[index] = Some(summary);
    }

    Ok(slots.into_iter().flatten().collect())
}

/// Fetches views and clones concurrently. Never fails: if either request
/// fails the failure is logged and both counts are zero.
pub async fn fetch_repo_traffic(api: &dyn GitHubApi, owner: &str, repo: &str) -> TrafficSummary {
    let (views, clones) = tokio::join!(
        fetch_repository_traffic(api, owner, repo, TrafficKind::Views),
        fetch_repository_traffic(api, owner, repo, TrafficKind::Clones),
    );

    match (views, clones) {
        (Ok(views), Ok(clones)) => TrafficSummary {
            view_count: views.count,
            clone_count: clones.count,
        },
        (Err(source), _) | (_, Err(source)) => {
            error!(repository = repo, error = %source, "Error fetching traffic");
            TrafficSummary::default()
        }
    }
}

/// en-US short date (`3/5/2024`), no time component.
pub fn format_calendar_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%-m/%-d/%Y").to_string()
}
