use std::{net::SocketAddr, time::Duration};

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Json, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
};
use interfaces_mail_smtp::index::{MailTransport, MailTransportError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::render::render_contact_mail;
use crate::{
    endpoints::{api::ErrorBody, UNEXPECTED_ERROR},
    rate_limit::{client_key::client_key, RateLimitDecision, RateLimitStore, RateLimitStoreError},
    state::{AppState, ContactAddresses},
};

pub const MISSING_FIELDS: &str = "All fields are required";
pub const TOO_MANY_REQUESTS: &str = "Too many requests, please try again later";
pub const SEND_FAILED: &str = "Failed to send message, please try again later";

/// Raw request body. Every field is optional here so that a missing field is
/// reported the same way as an empty one.
#[derive(Debug, Default, Deserialize)]
pub struct ContactRequestBody {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

/// A submission whose fields are all present and non-empty. Nothing else
/// (email syntax included) is checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl TryFrom<ContactRequestBody> for ContactSubmission {
    type Error = HandlerError;

    fn try_from(body: ContactRequestBody) -> Result<Self, Self::Error> {
        let required = |field: Option<String>| field.filter(|value| !value.is_empty());

        match (
            required(body.name),
            required(body.email),
            required(body.message),
        ) {
            (Some(name), Some(email), Some(message)) => Ok(Self {
                name,
                email,
                message,
            }),
            _ => Err(HandlerError::MissingFields),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ContactAccepted {
    pub success: bool,
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("MissingFields")]
    MissingFields,

    #[error("RateLimited: {key}")]
    RateLimited { key: String, retry_after: Duration },

    #[error("Dispatch: {source}")]
    Dispatch {
        #[from]
        source: MailTransportError,
    },

    #[error("RateLimitStore: {source}")]
    RateLimitStore {
        #[from]
        source: RateLimitStoreError,
    },
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> axum::response::Response {
        match self {
            HandlerError::MissingFields => {
                (StatusCode::BAD_REQUEST, Json(ErrorBody::new(MISSING_FIELDS))).into_response()
            }
            HandlerError::RateLimited { key, retry_after } => {
                warn!(client = %key, "Contact submission rate limited");
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    [(header::RETRY_AFTER, whole_seconds(retry_after).to_string())],
                    Json(ErrorBody::new(TOO_MANY_REQUESTS)),
                )
                    .into_response()
            }
            HandlerError::Dispatch { source } => {
                error!(error = %source, "Error sending contact email");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody::new(SEND_FAILED)),
                )
                    .into_response()
            }
            HandlerError::RateLimitStore { source } => {
                error!(error = %source, "Unexpected error handling contact submission");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody::new(UNEXPECTED_ERROR)),
                )
                    .into_response()
            }
        }
    }
}

fn whole_seconds(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

/// Axum handler: POST /api/contact
pub async fn handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    payload: Result<Json<ContactRequestBody>, JsonRejection>,
) -> Result<Json<ContactAccepted>, HandlerError> {
    let body = payload.map(|Json(body)| body).unwrap_or_else(|rejection| {
        debug!(error = %rejection, "Unreadable contact payload");
        ContactRequestBody::default()
    });

    let submission = ContactSubmission::try_from(body)?;
    let key = client_key(peer, &headers, state.trust_proxy);

    relay_contact(
        state.rate_limiter.as_ref(),
        state.mailer.as_ref(),
        &state.contact,
        &key,
        submission,
    )
    .await?;

    Ok(Json(ContactAccepted { success: true }))
}

/// Rate-checks a validated submission for `key`, renders it and hands it to
/// the mail transport. Nothing is sent once the quota is spent.
pub async fn relay_contact(
    rate_limiter: &dyn RateLimitStore,
    mailer: &dyn MailTransport,
    addresses: &ContactAddresses,
    key: &str,
    submission: ContactSubmission,
) -> Result<(), HandlerError> {
    if let RateLimitDecision::Limited { retry_after } = rate_limiter.try_acquire(key).await? {
        return Err(HandlerError::RateLimited {
            key: key.to_string(),
            retry_after,
        });
    }

    let mail = render_contact_mail(&submission, addresses);
    mailer.send(mail).await?;

    info!(client = %key, "Contact submission relayed");
    Ok(())
}
