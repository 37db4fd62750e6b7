use thiserror::Error;

/// Normalized errors for session and MFA operations.
///
/// The variants map onto what the caller can do next: retry with different
/// input (`AuthenticationFailed`, `ValidationFailed`), re-authenticate from
/// scratch (`SessionInvalid`), or retry the same call once (`Network`).
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    /// The refresh token was rejected or a replayed request failed
    /// authorization again. The token store has already been cleared.
    #[error("Session is no longer valid; re-authentication required")]
    SessionInvalid,
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::de::Error> for AuthError {
    fn from(error: toml::de::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::ser::Error> for AuthError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}
