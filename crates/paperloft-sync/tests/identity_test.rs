//! Identity client and sign-in flow against a mock identity endpoint.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use paperloft_core::{DocumentStore, GoogleSettings, Library, LocalStore, WorkSummary};
use paperloft_db::MemoryDocumentStore;
use paperloft_sync::{AuthError, IdentityClient, IdentityConfig, SettingsPushOutcome, UserSession};

fn client(server: &MockServer) -> IdentityClient {
    IdentityClient::new(
        IdentityConfig::default()
            .with_base_url(server.uri())
            .with_api_key("web-key"),
    )
    .unwrap()
}

fn signed_in_body(uid: &str) -> serde_json::Value {
    json!({
        "localId": uid,
        "email": "reader@example.org",
        "idToken": "id-token",
        "refreshToken": "refresh-token",
        "expiresIn": "3600"
    })
}

fn provider_error(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_json(json!({
        "error": {"code": 400, "message": message, "errors": []}
    }))
}

#[tokio::test]
async fn test_sign_in_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/accounts:signInWithPassword"))
        .and(query_param("key", "web-key"))
        .and(body_partial_json(json!({
            "email": "reader@example.org",
            "password": "correct horse",
            "returnSecureToken": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(signed_in_body("uid-42")))
        .expect(1)
        .mount(&server)
        .await;

    let user = client(&server)
        .sign_in("reader@example.org", "correct horse", Some("captcha"))
        .await
        .unwrap();
    assert_eq!(user.uid, "uid-42");
    assert_eq!(user.id_token, "id-token");
}

#[tokio::test]
async fn test_sign_in_error_codes_are_friendly() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/accounts:signInWithPassword"))
        .respond_with(provider_error("INVALID_PASSWORD"))
        .mount(&server)
        .await;

    let err = client(&server)
        .sign_in("reader@example.org", "wrong", Some("captcha"))
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::WrongPassword);
    assert_eq!(err.to_string(), "Incorrect password. Please try again.");
}

#[tokio::test]
async fn test_sign_up_weak_password_and_existing_email() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/accounts:signUp"))
        .and(body_partial_json(json!({"email": "taken@example.org"})))
        .respond_with(provider_error("EMAIL_EXISTS"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/accounts:signUp"))
        .and(body_partial_json(json!({"email": "new@example.org"})))
        .respond_with(provider_error(
            "WEAK_PASSWORD : Password should be at least 6 characters",
        ))
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client
        .sign_up("taken@example.org", "longenough", Some("captcha"))
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::EmailAlreadyInUse);

    let err = client
        .sign_up("new@example.org", "aaaaaa", Some("captcha"))
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::WeakPassword);
}

#[tokio::test]
async fn test_missing_captcha_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(signed_in_body("u")))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server)
        .sign_in("reader@example.org", "pw", None)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "reCAPTCHA verification failed. Please try again."
    );
}

#[tokio::test]
async fn test_unconfigured_key() {
    let server = MockServer::start().await;
    let client = IdentityClient::new(IdentityConfig::default().with_base_url(server.uri())).unwrap();
    let err = client
        .sign_in("reader@example.org", "pw", Some("captcha"))
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::NotConfigured);
}

#[tokio::test]
async fn test_sign_in_flow_pushes_and_loads() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(200).set_body_json(signed_in_body("uid-7")))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryDocumentStore::new());
    let library = Arc::new(Library::new(LocalStore::in_memory()));
    library
        .toggle_bookmark(&WorkSummary {
            id: "W100".to_string(),
            title: "Offline find".to_string(),
            authors: "B. Liskov".to_string(),
            year: Some(1987),
            publication_date: String::new(),
            doi: String::new(),
            cited_by_count: None,
            abstract_text: String::new(),
            source: String::new(),
            open_alex_url: "https://openalex.org/W100".to_string(),
        })
        .unwrap();
    library
        .store()
        .save_google_settings(&GoogleSettings {
            api_key: "g".to_string(),
            cx: "c".to_string(),
        })
        .unwrap();

    let session = UserSession::new(client(&server), store.clone(), library.clone());
    session
        .sign_in("reader@example.org", "pw", Some("captcha"))
        .await
        .unwrap();

    let report = session.sync_on_sign_in(true).await.unwrap();
    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert_eq!(report.pushed.as_ref().map(|r| r.synced_bookmarks), Some(1));
    assert_eq!(report.settings_push, Some(SettingsPushOutcome::Pushed));
    assert_eq!(report.loaded.map(|l| l.bookmarks), Some(1));
    assert!(report.settings_loaded);
    assert!(report.live);
    assert!(session.is_live().await);

    assert_eq!(store.list_artifacts("uid-7").await.unwrap().len(), 1);
    assert!(store.get_private_settings("uid-7").await.unwrap().is_some());

    session.sign_out().await;
    assert!(session.current_user().await.is_none());
    assert!(!session.is_live().await);
    assert!(session.vault().keys().cached_user().is_none());
}
