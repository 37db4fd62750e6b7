use crate::error::AuthError;
use crate::session::{LoginOutcome, SessionManager};
use crate::types::PendingMfaChallenge;

/// Current step of the interactive login flow.
#[derive(Debug, Clone)]
pub enum LoginStep {
    /// Waiting for email and password.
    Credentials,
    /// Credentials accepted; waiting for the 6-digit code.
    Mfa { challenge: PendingMfaChallenge },
    /// Session established.
    Done,
}

/// Two-step login controller for the presentation layer.
///
/// Wraps [`SessionManager`] with explicit step state so a UI only has to
/// render the current [`LoginStep`] and forward submissions.
pub struct LoginFlow {
    session: SessionManager,
    step: LoginStep,
}

impl LoginFlow {
    pub fn new(session: SessionManager) -> Self {
        Self {
            session,
            step: LoginStep::Credentials,
        }
    }

    pub fn step(&self) -> &LoginStep {
        &self.step
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.step, LoginStep::Done)
    }

    /// Submit credentials. Advances to `Mfa` or `Done`; on error the step
    /// stays at `Credentials` for another attempt.
    pub async fn submit_credentials(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<&LoginStep, AuthError> {
        if !matches!(self.step, LoginStep::Credentials) {
            return Err(AuthError::InvalidState(
                "credentials already submitted".to_string(),
            ));
        }
        match self.session.login(email, password).await? {
            LoginOutcome::Authenticated => self.step = LoginStep::Done,
            LoginOutcome::MfaRequired(challenge) => self.step = LoginStep::Mfa { challenge },
        }
        Ok(&self.step)
    }

    /// Submit the MFA code for the pending challenge. On failure the step
    /// stays at `Mfa` with the challenge intact; the caller should clear its
    /// code input before retrying.
    pub async fn submit_code(&mut self, code: &str) -> Result<(), AuthError> {
        let LoginStep::Mfa { challenge } = &self.step else {
            return Err(AuthError::InvalidState(
                "no MFA challenge pending".to_string(),
            ));
        };
        self.session.verify_mfa(challenge, code).await?;
        self.step = LoginStep::Done;
        Ok(())
    }

    /// Return from the MFA step to credential entry, discarding the pending
    /// challenge. Always permitted; a no-op in any other step.
    pub fn back(&mut self) {
        if matches!(self.step, LoginStep::Mfa { .. }) {
            self.step = LoginStep::Credentials;
        }
    }
}
