//! Per-client submission quotas.
//!
//! Handlers only see `RateLimitStore`; the in-memory store is one
//! implementation and can be swapped for a shared backend when the service
//! runs on more than one node.

pub mod client_key;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::InMemoryRateLimiter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitConfig {
    /// Three submissions per client every fifteen minutes.
    pub const fn contact_form() -> Self {
        Self {
            max_requests: 3,
            window: Duration::from_secs(15 * 60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

#[derive(Debug, Error)]
pub enum RateLimitStoreError {
    #[error("Backend: {message}")]
    Backend { message: String },
}

#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Records one hit for `key` if the window still has room.
    ///
    /// A `Limited` decision records nothing.
    async fn try_acquire(&self, key: &str) -> Result<RateLimitDecision, RateLimitStoreError>;
}
