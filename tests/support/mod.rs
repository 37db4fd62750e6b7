#![allow(dead_code)]

use std::sync::Arc;

use serde_json::json;
use tenauth::{AuthApi, MemoryTokenStore, SessionManager, TokenPair};
use uuid::Uuid;
use wiremock::MockServer;

pub fn pair(access: &str, refresh: &str) -> TokenPair {
    TokenPair::new(access, refresh)
}

pub fn api(server: &MockServer) -> (Arc<MemoryTokenStore>, Arc<AuthApi>) {
    let store = Arc::new(MemoryTokenStore::new());
    let api = Arc::new(AuthApi::new(server.uri(), store.clone()));
    (store, api)
}

pub fn session(server: &MockServer) -> (Arc<MemoryTokenStore>, SessionManager) {
    let (store, api) = api(server);
    (store, SessionManager::new(api))
}

pub fn user_json(email: &str, mfa_enabled: bool) -> serde_json::Value {
    json!({
        "id": Uuid::new_v4().to_string(),
        "email": email,
        "full_name": "Ada Lovelace",
        "role": "admin",
        "company_name": "Initech",
        "mfa_enabled": mfa_enabled,
    })
}

pub fn token_body(access: &str, refresh: &str) -> serde_json::Value {
    json!({
        "access_token": access,
        "refresh_token": refresh,
        "mfa_required": false,
    })
}
