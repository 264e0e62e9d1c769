//! REST client for the GitHub v3 API
//!
//! - `index`: authenticated client, `GitHubApi` seam and typed repository/traffic helpers

pub mod index;
