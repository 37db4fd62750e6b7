use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::AuthError;
use crate::store::TokenStore;
use crate::token::TokenPair;
use crate::types::{
    BackupCodesResponse, LoginResponse, MfaSetupResponse, NewAccount, RefreshResponse, SessionUser,
};

const LOGIN_PATH: &str = "/api/auth/login";
const VERIFY_MFA_PATH: &str = "/api/auth/verify-mfa";
const REFRESH_PATH: &str = "/api/auth/refresh";
const LOGOUT_PATH: &str = "/api/auth/logout";
const REGISTER_PATH: &str = "/api/auth/register";
const MFA_SETUP_PATH: &str = "/api/auth/mfa/setup";
const MFA_ENABLE_PATH: &str = "/api/auth/mfa/enable";
const MFA_DISABLE_PATH: &str = "/api/auth/mfa/disable";
const BACKUP_CODES_PATH: &str = "/api/auth/mfa/backup-codes";
const ME_PATH: &str = "/api/auth/me";

/// A replayable request: method, path, and an owned JSON body so the gateway
/// can resend it after a token refresh.
#[derive(Debug, Clone)]
struct ApiRequest {
    method: Method,
    path: &'static str,
    body: Option<serde_json::Value>,
}

impl ApiRequest {
    fn get(path: &'static str) -> Self {
        Self {
            method: Method::GET,
            path,
            body: None,
        }
    }

    fn post(path: &'static str, body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            path,
            body: Some(body),
        }
    }
}

/// Gateway for calls to the remote auth/user API.
///
/// Attaches the stored access token as a bearer credential and transparently
/// recovers from access-token expiry: the first 401 on a bearer-carrying
/// request triggers a single-flight refresh, after which the original request
/// is replayed exactly once. A second 401, or a refresh failure, clears the
/// token store and resolves to [`AuthError::SessionInvalid`]. All other
/// failure statuses pass through for the caller to interpret.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use tenauth::{AuthApi, FileTokenStore};
///
/// let api = AuthApi::new("https://api.example.com", Arc::new(FileTokenStore::new_default()));
/// ```
pub struct AuthApi {
    client: reqwest::Client,
    base_url: String,
    store: Arc<dyn TokenStore>,
    refresh_lock: Mutex<()>,
}

impl AuthApi {
    pub fn new(base_url: impl Into<String>, store: Arc<dyn TokenStore>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
            store,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Replace the HTTP client, e.g. to configure timeouts or proxies.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Endpoint wrappers
    // -----------------------------------------------------------------------

    pub(crate) async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<LoginResponse, AuthError> {
        let req = ApiRequest::post(LOGIN_PATH, json!({ "email": email, "password": password }));
        let resp = self.send(&req, None).await?;
        Self::parse(resp).await
    }

    pub(crate) async fn verify_mfa(
        &self,
        email: &str,
        code: &str,
    ) -> Result<LoginResponse, AuthError> {
        let req = ApiRequest::post(VERIFY_MFA_PATH, json!({ "email": email, "code": code }));
        let resp = self.send(&req, None).await?;
        Self::parse(resp).await
    }

    pub(crate) async fn register(&self, account: &NewAccount) -> Result<SessionUser, AuthError> {
        let body = serde_json::to_value(account)?;
        let req = ApiRequest::post(REGISTER_PATH, body);
        let resp = self.send(&req, None).await?;
        Self::parse(resp).await
    }

    pub(crate) async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let req = ApiRequest::post(LOGOUT_PATH, json!({ "refresh_token": refresh_token }));
        let resp = self.execute(req).await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::into_error(resp).await)
        }
    }

    pub(crate) async fn mfa_setup(&self) -> Result<MfaSetupResponse, AuthError> {
        let resp = self.execute(ApiRequest::post(MFA_SETUP_PATH, json!({}))).await?;
        Self::parse(resp).await
    }

    pub(crate) async fn mfa_enable(&self, code: &str) -> Result<BackupCodesResponse, AuthError> {
        let req = ApiRequest::post(MFA_ENABLE_PATH, json!({ "code": code }));
        let resp = self.execute(req).await?;
        Self::parse(resp).await
    }

    pub(crate) async fn mfa_disable(
        &self,
        password: &str,
        code: Option<&str>,
    ) -> Result<(), AuthError> {
        let req = ApiRequest::post(
            MFA_DISABLE_PATH,
            json!({ "password": password, "code": code }),
        );
        let resp = self.execute(req).await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::into_error(resp).await)
        }
    }

    pub(crate) async fn regenerate_backup_codes(&self) -> Result<BackupCodesResponse, AuthError> {
        let resp = self.execute(ApiRequest::get(BACKUP_CODES_PATH)).await?;
        Self::parse(resp).await
    }

    pub(crate) async fn me(&self) -> Result<SessionUser, AuthError> {
        let resp = self.execute(ApiRequest::get(ME_PATH)).await?;
        Self::parse(resp).await
    }

    // -----------------------------------------------------------------------
    // Transport and refresh protocol
    // -----------------------------------------------------------------------

    /// Execute an authenticated request with refresh-and-replay recovery.
    ///
    /// Absence of a stored pair is not an error here: the call goes out
    /// without a bearer credential and the remote side decides. A 401 on such
    /// a call passes through untouched, since there is nothing to refresh.
    async fn execute(&self, req: ApiRequest) -> Result<reqwest::Response, AuthError> {
        let sent_access = self.store.load()?.map(|pair| pair.access_token);
        let resp = self.send(&req, sent_access.as_deref()).await?;

        let Some(stale) = sent_access else {
            return Ok(resp);
        };
        if resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }

        debug!(path = req.path, "access token rejected; refreshing session");
        let fresh = self.refreshed_access_token(&stale).await?;
        let resp = self.send(&req, Some(&fresh)).await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            // Replayed once with a fresh token and still rejected.
            warn!(path = req.path, "request rejected after refresh; session invalid");
            self.store.clear()?;
            return Err(AuthError::SessionInvalid);
        }
        Ok(resp)
    }

    /// Single-flight refresh: returns an access token that postdates `stale`.
    ///
    /// Callers that lose the race to the refresh lock re-read the store under
    /// the lock instead of issuing their own refresh call: a rotated pair
    /// means another caller already refreshed, an empty store means that
    /// refresh failed and the session is gone.
    async fn refreshed_access_token(&self, stale: &str) -> Result<String, AuthError> {
        let _guard = self.refresh_lock.lock().await;

        let pair = match self.store.load()? {
            Some(pair) if pair.access_token != stale => return Ok(pair.access_token),
            Some(pair) => pair,
            None => return Err(AuthError::SessionInvalid),
        };

        debug!("requesting new access token");
        let req = ApiRequest::post(REFRESH_PATH, json!({ "refresh_token": pair.refresh_token }));
        let resp = self.send(&req, None).await?;
        if !resp.status().is_success() {
            warn!(status = %resp.status(), "token refresh rejected; clearing session");
            self.store.clear()?;
            return Err(AuthError::SessionInvalid);
        }

        let payload: RefreshResponse = resp.json().await?;
        let refresh_token = match payload.refresh_token {
            Some(rotated) if !rotated.is_empty() => rotated,
            _ => pair.refresh_token,
        };
        let renewed = TokenPair::new(payload.access_token, refresh_token);
        self.store.save(&renewed)?;
        Ok(renewed.access_token)
    }

    async fn send(
        &self,
        req: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<reqwest::Response, AuthError> {
        let url = format!("{}{}", self.base_url, req.path);
        let mut builder = self.client.request(req.method.clone(), &url);
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }
        Ok(builder.send().await?)
    }

    async fn parse<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, AuthError> {
        if !resp.status().is_success() {
            return Err(Self::into_error(resp).await);
        }
        Ok(resp.json().await?)
    }

    /// Map a non-success response onto the error taxonomy, carrying the
    /// remote `detail` message when the body provides one.
    async fn into_error(resp: reqwest::Response) -> AuthError {
        let status = resp.status();
        let detail = remote_detail(resp).await.unwrap_or_else(|| status.to_string());
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                AuthError::AuthenticationFailed(detail)
            }
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                AuthError::ValidationFailed(detail)
            }
            _ => AuthError::InvalidResponse(format!("unexpected status {status}: {detail}")),
        }
    }
}

/// Extract the `detail` field from an error body. Validation failures carry a
/// structured list rather than a string; those are rendered as JSON.
async fn remote_detail(resp: reqwest::Response) -> Option<String> {
    let body: serde_json::Value = resp.json().await.ok()?;
    match body.get("detail")? {
        serde_json::Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
