pub mod contact;
pub mod repos;

use serde::Serialize;

/// `{"error": "..."}` body shared by every failing API response. Messages
/// are fixed strings; error details only go to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
}

impl ErrorBody {
    pub const fn new(error: &'static str) -> Self {
        Self { error }
    }
}
