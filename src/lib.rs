//! Tenauth — client-side session manager for a multi-tenant platform API.
//!
//! Establishes a session from credentials, steps up through a TOTP MFA
//! challenge when the account requires one, keeps the session alive across
//! access-token expiry via a single-flight silent refresh, and manages the
//! enable/disable lifecycle of MFA enrollment.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tenauth::{AuthApi, FileTokenStore, LoginOutcome, SessionManager};
//!
//! # async fn example() -> Result<(), tenauth::AuthError> {
//! let store = Arc::new(FileTokenStore::new_default());
//! let api = Arc::new(AuthApi::new("https://api.example.com", store));
//! let session = SessionManager::new(api);
//!
//! match session.login("you@company.com", "hunter2").await? {
//!     LoginOutcome::Authenticated => {}
//!     LoginOutcome::MfaRequired(challenge) => {
//!         session.verify_mfa(&challenge, "123456").await?;
//!     }
//! }
//! let user = session.current_user().await?;
//! println!("signed in as {}", user.email);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod error;
pub mod login_flow;
pub mod mfa;
pub mod session;
pub mod store;
pub mod token;
pub mod types;

pub use api::AuthApi;
pub use error::AuthError;
pub use login_flow::{LoginFlow, LoginStep};
pub use mfa::{sanitize_code, EnrollmentState, MfaEnrollment};
pub use session::{LoginOutcome, SessionManager};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore, TokenStoreConfig};
pub use token::TokenPair;
pub use types::{BackupCodes, MfaProvisioning, NewAccount, PendingMfaChallenge, SessionUser};
