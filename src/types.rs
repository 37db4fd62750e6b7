use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;
use crate::token::TokenPair;

/// Read-only projection of the authenticated principal.
///
/// Re-fetched after any MFA state change so `mfa_enabled` stays current.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub company_name: String,
    pub mfa_enabled: bool,
}

/// Registration payload: first user of a company becomes its admin.
#[derive(Debug, Clone, Serialize)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub company_name: String,
    pub company_domain: String,
}

/// Minimal state carried from credential submission to MFA-code submission.
///
/// Holds no token material and confers no access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMfaChallenge {
    pub email: String,
}

/// Transient provisioning material for MFA setup. Exists only between setup
/// and enablement; never persisted.
#[derive(Debug, Clone)]
pub struct MfaProvisioning {
    /// Raw base32 secret, for clients that render their own QR.
    pub secret: String,
    /// Image-encoded QR of the provisioning URI (data URL).
    pub qr_code: String,
    /// Secret grouped for manual authenticator entry.
    pub manual_entry_key: String,
}

/// Single-use fallback codes issued exactly once at MFA enablement.
///
/// The server keeps no re-readable copy of this exact sequence, so the caller
/// must surface them for export before dropping the value.
#[derive(Debug, Clone)]
pub struct BackupCodes(Vec<String>);

impl BackupCodes {
    pub(crate) fn new(codes: Vec<String>) -> Result<Self, AuthError> {
        if codes.is_empty() {
            return Err(AuthError::InvalidResponse(
                "server returned no backup codes".to_string(),
            ));
        }
        Ok(Self(codes))
    }

    pub fn codes(&self) -> &[String] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Wire payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub mfa_required: bool,
}

impl LoginResponse {
    pub(crate) fn into_token_pair(self) -> Result<TokenPair, AuthError> {
        if self.access_token.is_empty() || self.refresh_token.is_empty() {
            return Err(AuthError::InvalidResponse(
                "login response missing token pair".to_string(),
            ));
        }
        Ok(TokenPair::new(self.access_token, self.refresh_token))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshResponse {
    pub access_token: String,
    /// Absent or empty when the server does not rotate the refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MfaSetupResponse {
    pub secret: String,
    pub qr_code: String,
    pub manual_entry_key: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BackupCodesResponse {
    pub backup_codes: Vec<String>,
}
