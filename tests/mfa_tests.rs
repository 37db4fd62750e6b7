mod support;

use serde_json::json;
use tenauth::{AuthError, EnrollmentState, MfaEnrollment, SessionUser, TokenStore};
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{api, pair};

fn setup_body() -> serde_json::Value {
    json!({
        "secret": "JBSWY3DPEHPK3PXP",
        "qr_code": "data:image/png;base64,iVBORw0KGgo=",
        "manual_entry_key": "JBSW Y3DP EHPK 3PXP",
    })
}

fn enrolled_user() -> SessionUser {
    SessionUser {
        id: Uuid::new_v4(),
        email: "ada@initech.com".to_string(),
        full_name: "Ada Lovelace".to_string(),
        role: "admin".to_string(),
        company_name: "Initech".to_string(),
        mfa_enabled: true,
    }
}

#[tokio::test]
async fn begin_setup_provisions_secret_and_moves_to_pending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/mfa/setup"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(setup_body()))
        .expect(1)
        .mount(&server)
        .await;

    let (store, api) = api(&server);
    store.save(&pair("access-1", "refresh-1")).unwrap();
    let mut mfa = MfaEnrollment::new(api);

    let provisioning = mfa.begin_setup().await.unwrap();
    assert_eq!(provisioning.secret, "JBSWY3DPEHPK3PXP");
    assert_eq!(provisioning.manual_entry_key, "JBSW Y3DP EHPK 3PXP");
    assert!(provisioning.qr_code.starts_with("data:image/png"));

    assert_eq!(mfa.state(), EnrollmentState::PendingVerification);
    assert!(mfa.provisioning().is_some());
}

#[tokio::test]
async fn begin_setup_rejected_when_already_enabled() {
    let server = MockServer::start().await;
    let (_store, api) = api(&server);
    let mut mfa = MfaEnrollment::new(api);
    mfa.sync(&enrolled_user());

    let err = mfa.begin_setup().await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidState(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn confirm_enable_returns_one_time_backup_codes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/mfa/setup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(setup_body()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/mfa/enable"))
        .and(body_json(json!({"code": "654321"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "backup_codes": ["AAAA-1111", "BBBB-2222", "CCCC-3333"],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (store, api) = api(&server);
    store.save(&pair("access-1", "refresh-1")).unwrap();
    let mut mfa = MfaEnrollment::new(api);
    mfa.begin_setup().await.unwrap();

    let codes = mfa.confirm_enable("654-321").await.unwrap();
    assert_eq!(codes.codes().len(), 3);
    assert_eq!(codes.codes()[0], "AAAA-1111");

    // Enrollment no longer holds provisioning material or the codes.
    assert_eq!(mfa.state(), EnrollmentState::Enabled);
    assert!(mfa.provisioning().is_none());
}

#[tokio::test]
async fn confirm_enable_with_wrong_code_stays_pending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/mfa/setup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(setup_body()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/mfa/enable"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "Invalid MFA code"})))
        .expect(1)
        .mount(&server)
        .await;

    let (store, api) = api(&server);
    store.save(&pair("access-1", "refresh-1")).unwrap();
    let mut mfa = MfaEnrollment::new(api);
    mfa.begin_setup().await.unwrap();

    let err = mfa.confirm_enable("000000").await.unwrap_err();
    assert!(matches!(err, AuthError::ValidationFailed(_)));
    // Still pending: the user can retry with the next code.
    assert_eq!(mfa.state(), EnrollmentState::PendingVerification);
    assert!(mfa.provisioning().is_some());
}

#[tokio::test]
async fn confirm_enable_without_setup_is_invalid_state() {
    let server = MockServer::start().await;
    let (_store, api) = api(&server);
    let mut mfa = MfaEnrollment::new(api);

    let err = mfa.confirm_enable("123456").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidState(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn abandon_discards_provisioning_without_remote_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/mfa/setup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(setup_body()))
        .expect(1)
        .mount(&server)
        .await;

    let (store, api) = api(&server);
    store.save(&pair("access-1", "refresh-1")).unwrap();
    let mut mfa = MfaEnrollment::new(api);
    mfa.begin_setup().await.unwrap();

    mfa.abandon();
    assert_eq!(mfa.state(), EnrollmentState::Disabled);
    assert!(mfa.provisioning().is_none());
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn disable_with_password_clears_enabled_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/mfa/disable"))
        .and(body_json(json!({"password": "hunter2", "code": null})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "MFA has been disabled"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (store, api) = api(&server);
    store.save(&pair("access-1", "refresh-1")).unwrap();
    let mut mfa = MfaEnrollment::new(api);
    mfa.sync(&enrolled_user());

    mfa.disable("hunter2".to_string(), None).await.unwrap();
    assert_eq!(mfa.state(), EnrollmentState::Disabled);
}

#[tokio::test]
async fn disable_forwards_sanitized_code_when_supplied() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/mfa/disable"))
        .and(body_json(json!({"password": "hunter2", "code": "111111"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "MFA has been disabled"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (store, api) = api(&server);
    store.save(&pair("access-1", "refresh-1")).unwrap();
    let mut mfa = MfaEnrollment::new(api);
    mfa.sync(&enrolled_user());

    mfa.disable("hunter2".to_string(), Some("111 111"))
        .await
        .unwrap();
    assert_eq!(mfa.state(), EnrollmentState::Disabled);
}

#[tokio::test]
async fn disable_with_wrong_password_keeps_mfa_enabled() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/mfa/disable"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid password"})))
        .expect(1)
        .mount(&server)
        .await;

    let (store, api) = api(&server);
    store.save(&pair("access-1", "refresh-1")).unwrap();
    let mut mfa = MfaEnrollment::new(api);
    mfa.sync(&enrolled_user());

    let err = mfa.disable("wrong".to_string(), None).await.unwrap_err();
    assert!(matches!(err, AuthError::AuthenticationFailed(_)));
    assert_eq!(mfa.state(), EnrollmentState::Enabled);
}

#[tokio::test]
async fn regenerate_backup_codes_mints_a_fresh_set() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/mfa/backup-codes"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "backup_codes": ["DDDD-4444", "EEEE-5555"],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (store, api) = api(&server);
    store.save(&pair("access-1", "refresh-1")).unwrap();
    let mut mfa = MfaEnrollment::new(api);
    mfa.sync(&enrolled_user());

    let codes = mfa.regenerate_backup_codes().await.unwrap();
    assert_eq!(codes.codes(), ["DDDD-4444", "EEEE-5555"]);
}

#[tokio::test]
async fn regenerate_backup_codes_requires_enabled_mfa() {
    let server = MockServer::start().await;
    let (_store, api) = api(&server);
    let mut mfa = MfaEnrollment::new(api);

    let err = mfa.regenerate_backup_codes().await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidState(_)));
}

#[tokio::test]
async fn sync_tracks_server_side_disable() {
    let server = MockServer::start().await;
    let (_store, api) = api(&server);
    let mut mfa = MfaEnrollment::new(api);
    mfa.sync(&enrolled_user());
    assert_eq!(mfa.state(), EnrollmentState::Enabled);

    let mut user = enrolled_user();
    user.mfa_enabled = false;
    mfa.sync(&user);
    assert_eq!(mfa.state(), EnrollmentState::Disabled);
}
