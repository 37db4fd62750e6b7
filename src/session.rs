use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::AuthApi;
use crate::error::AuthError;
use crate::mfa::sanitize_code;
use crate::types::{NewAccount, PendingMfaChallenge, SessionUser};

/// Result of a credential submission.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    /// Tokens stored; the session is live.
    Authenticated,
    /// The account requires an MFA code before tokens are issued. Nothing has
    /// been stored; the challenge only carries the email to resubmit.
    MfaRequired(PendingMfaChallenge),
}

/// Orchestrates login, MFA verification, logout, and the current-user
/// projection. Owns the token store through its [`AuthApi`].
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use tenauth::{AuthApi, LoginOutcome, MemoryTokenStore, SessionManager};
///
/// # async fn example() -> Result<(), tenauth::AuthError> {
/// let api = Arc::new(AuthApi::new("https://api.example.com", Arc::new(MemoryTokenStore::new())));
/// let session = SessionManager::new(api);
/// match session.login("you@company.com", "hunter2").await? {
///     LoginOutcome::Authenticated => {}
///     LoginOutcome::MfaRequired(challenge) => {
///         session.verify_mfa(&challenge, "123456").await?;
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SessionManager {
    api: Arc<AuthApi>,
}

impl SessionManager {
    pub fn new(api: Arc<AuthApi>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &Arc<AuthApi> {
        &self.api
    }

    /// Submit credentials. Either completes the session outright or returns a
    /// pending MFA challenge; bad credentials surface as
    /// [`AuthError::AuthenticationFailed`] with no state retained.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let resp = self.api.login(email, password).await?;
        if resp.mfa_required {
            debug!(email, "login requires MFA step-up");
            return Ok(LoginOutcome::MfaRequired(PendingMfaChallenge {
                email: email.to_string(),
            }));
        }
        let pair = resp.into_token_pair()?;
        self.api.store().save(&pair)?;
        debug!(email, "session established");
        Ok(LoginOutcome::Authenticated)
    }

    /// Complete an MFA login challenge. The code is stripped of non-digits
    /// before submission. On failure nothing is stored; the caller should
    /// clear its code input so a stale code cannot be resubmitted.
    pub async fn verify_mfa(
        &self,
        challenge: &PendingMfaChallenge,
        code: &str,
    ) -> Result<(), AuthError> {
        let code = sanitize_code(code)?;
        let resp = self.api.verify_mfa(&challenge.email, &code).await?;
        let pair = resp.into_token_pair()?;
        self.api.store().save(&pair)?;
        debug!(email = %challenge.email, "session established via MFA");
        Ok(())
    }

    /// Register a new company with its first (admin) user. Issues no tokens;
    /// the caller logs in afterwards.
    pub async fn register(&self, account: &NewAccount) -> Result<SessionUser, AuthError> {
        self.api.register(account).await
    }

    /// End the session. The remote side is notified best-effort so it can
    /// revoke the refresh token; the local pair is cleared unconditionally.
    pub async fn logout(&self) -> Result<(), AuthError> {
        match self.api.store().load() {
            Ok(Some(pair)) => {
                if let Err(err) = self.api.logout(&pair.refresh_token).await {
                    warn!(error = %err, "remote logout failed; clearing local session anyway");
                }
            }
            Ok(None) => {}
            Err(err) => {
                warn!(error = %err, "could not read stored session for remote logout");
            }
        }
        self.api.store().clear()
    }

    /// Fetch the authenticated principal.
    pub async fn current_user(&self) -> Result<SessionUser, AuthError> {
        self.api.me().await
    }

    pub fn is_authenticated(&self) -> Result<bool, AuthError> {
        Ok(self.api.store().load()?.is_some())
    }
}
