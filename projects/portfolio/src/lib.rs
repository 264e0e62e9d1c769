//! Portfolio site backend
//!
//! - REST API endpoints in `endpoints/` (repository listing with traffic, contact form relay)
//! - Per-client quotas for the contact form in `rate_limit/`
//! - Environment configuration in `config`, shared handler state in `state`
//! - Requires GITHUB_TOKEN, GITHUB_USERNAME, SMTP_USER and SMTP_PASS env vars

pub mod config;
pub mod endpoints;
pub mod rate_limit;
pub mod state;
