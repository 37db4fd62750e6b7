use std::sync::Arc;

use tracing::debug;

use crate::api::AuthApi;
use crate::error::AuthError;
use crate::types::{BackupCodes, MfaProvisioning, SessionUser};

/// TOTP and backup codes are always exactly this many ASCII digits.
const MFA_CODE_LEN: usize = 6;

/// Where the account stands in the enrollment lifecycle.
///
/// Forward path is `Disabled → PendingVerification → Enabled`; the only
/// reverse edge is `Enabled → Disabled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentState {
    Disabled,
    /// A secret/QR has been provisioned and awaits code confirmation.
    PendingVerification,
    Enabled,
}

/// Drives MFA enrollment for the authenticated account.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use tenauth::{AuthApi, MemoryTokenStore, MfaEnrollment};
///
/// # async fn example() -> Result<(), tenauth::AuthError> {
/// let api = Arc::new(AuthApi::new("https://api.example.com", Arc::new(MemoryTokenStore::new())));
/// let mut mfa = MfaEnrollment::new(api);
/// let provisioning = mfa.begin_setup().await?;
/// println!("scan: {}", provisioning.qr_code);
/// let backup_codes = mfa.confirm_enable("123456").await?;
/// for code in backup_codes.codes() {
///     println!("{code}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct MfaEnrollment {
    api: Arc<AuthApi>,
    state: EnrollmentState,
    provisioning: Option<MfaProvisioning>,
}

impl MfaEnrollment {
    pub fn new(api: Arc<AuthApi>) -> Self {
        Self {
            api,
            state: EnrollmentState::Disabled,
            provisioning: None,
        }
    }

    pub fn state(&self) -> EnrollmentState {
        self.state
    }

    /// Provisioning material from the last `begin_setup`, if confirmation is
    /// still pending.
    pub fn provisioning(&self) -> Option<&MfaProvisioning> {
        self.provisioning.as_ref()
    }

    /// Align local state with the server's `mfa_enabled` flag, e.g. after
    /// re-fetching the current user. Drops any pending provisioning when the
    /// server already reports MFA enabled.
    pub fn sync(&mut self, user: &SessionUser) {
        if user.mfa_enabled {
            self.state = EnrollmentState::Enabled;
            self.provisioning = None;
        } else if self.state == EnrollmentState::Enabled {
            self.state = EnrollmentState::Disabled;
        }
    }

    /// Request a fresh secret/QR pair and move to `PendingVerification`.
    ///
    /// Does not change `mfa_enabled` on the user record; an abandoned setup
    /// leaves the account exactly as it was.
    pub async fn begin_setup(&mut self) -> Result<&MfaProvisioning, AuthError> {
        if self.state == EnrollmentState::Enabled {
            return Err(AuthError::InvalidState(
                "MFA is already enabled".to_string(),
            ));
        }
        let setup = self.api.mfa_setup().await?;
        self.state = EnrollmentState::PendingVerification;
        debug!("MFA setup initiated");
        Ok(self.provisioning.insert(MfaProvisioning {
            secret: setup.secret,
            qr_code: setup.qr_code,
            manual_entry_key: setup.manual_entry_key,
        }))
    }

    /// Submit the confirmation code and enable MFA.
    ///
    /// Returns the one-time backup codes. They are issued exactly once and
    /// not retained here; the caller must surface them for export before
    /// dropping the value. On failure state stays `PendingVerification`.
    pub async fn confirm_enable(&mut self, code: &str) -> Result<BackupCodes, AuthError> {
        if self.state != EnrollmentState::PendingVerification {
            return Err(AuthError::InvalidState(
                "MFA setup has not been initiated".to_string(),
            ));
        }
        let code = sanitize_code(code)?;
        let resp = self.api.mfa_enable(&code).await?;
        self.state = EnrollmentState::Enabled;
        self.provisioning = None;
        debug!("MFA enabled");
        BackupCodes::new(resp.backup_codes)
    }

    /// Abandon an in-progress setup without a remote call. The provisioned
    /// secret is discarded; the server-side record was never flipped.
    pub fn abandon(&mut self) {
        if self.state == EnrollmentState::PendingVerification {
            self.state = EnrollmentState::Disabled;
            self.provisioning = None;
        }
    }

    /// Disable MFA. Requires the account password; a current code is
    /// forwarded when the caller supplies one. The password is taken by value
    /// and dropped whether or not the call succeeds; on failure state is
    /// unchanged.
    pub async fn disable(&mut self, password: String, code: Option<&str>) -> Result<(), AuthError> {
        if self.state != EnrollmentState::Enabled {
            return Err(AuthError::InvalidState("MFA is not enabled".to_string()));
        }
        let code = code.map(sanitize_code).transpose()?;
        self.api.mfa_disable(&password, code.as_deref()).await?;
        self.state = EnrollmentState::Disabled;
        debug!("MFA disabled");
        Ok(())
    }

    /// Mint a replacement set of backup codes. The previous set is
    /// invalidated server-side; like the original issuance, the new set is
    /// surfaced once and not retained.
    pub async fn regenerate_backup_codes(&mut self) -> Result<BackupCodes, AuthError> {
        if self.state != EnrollmentState::Enabled {
            return Err(AuthError::InvalidState("MFA is not enabled".to_string()));
        }
        let resp = self.api.regenerate_backup_codes().await?;
        BackupCodes::new(resp.backup_codes)
    }
}

/// Strip every non-digit from user input, keeping entry forgiving, then
/// require exactly six digits before anything goes over the wire.
pub fn sanitize_code(input: &str) -> Result<String, AuthError> {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != MFA_CODE_LEN {
        return Err(AuthError::ValidationFailed(format!(
            "MFA code must be {MFA_CODE_LEN} digits"
        )));
    }
    Ok(digits)
}
