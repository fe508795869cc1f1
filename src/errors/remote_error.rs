use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code the service uses for rejected credentials.
pub const INVALID_CREDENTIALS: i64 = 3;

/// An error reported by the service inside a well-formed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    pub action: String,
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub location: String,
}

impl RemoteError {
    pub fn is_invalid_credentials(&self) -> bool {
        self.code == INVALID_CREDENTIALS
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed ({}): {}", self.action, self.code, self.message)
    }
}

impl std::error::Error for RemoteError {}
