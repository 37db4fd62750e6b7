use serde::{Deserialize, Serialize};

/// Access/refresh token pair for an authenticated session.
///
/// Both tokens are opaque strings; the client never inspects their contents.
/// A pair is only ever stored whole — a lone access or refresh token is never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}
