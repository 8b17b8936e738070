mod common;

use std::sync::Arc;

use datascrap_core::{
    AuthGuard, IdentityClient, OAuthProvider, Profile, PublicKey, Route, SessionStore,
};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{session, RecordingNavigator};

fn identity(server: &MockServer) -> IdentityClient {
    IdentityClient::new(Url::parse(&server.uri()).unwrap(), PublicKey::new("anon-key")).unwrap()
}

fn build_guard(server: &MockServer, sessions: SessionStore) -> (AuthGuard, Arc<RecordingNavigator>) {
    let navigator = Arc::new(RecordingNavigator::default());
    (
        AuthGuard::new(identity(server), sessions, navigator.clone()),
        navigator,
    )
}

async fn mount_user(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .and(header("apikey", "anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "user-1", "email": "reader@example.com"
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn require_auth_without_session_redirects_to_login() {
    let server = MockServer::start().await;
    let (guard, navigator) = build_guard(&server, SessionStore::in_memory());

    let redirect = guard.require_auth().await.unwrap_err();
    assert_eq!(redirect.to, Route::Login);
    assert_eq!(redirect.to.path(), "/login");
    assert_eq!(navigator.routes(), vec![Route::Login]);
}

#[tokio::test]
async fn require_auth_with_rejected_token_redirects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"msg": "invalid JWT"})))
        .mount(&server)
        .await;

    let (guard, navigator) = build_guard(&server, SessionStore::with_session(session("bad")));
    assert!(guard.current_user().await.is_none());
    assert!(guard.require_auth().await.is_err());
    assert_eq!(navigator.routes(), vec![Route::Login]);
}

#[tokio::test]
async fn require_auth_returns_user_for_valid_session() {
    let server = MockServer::start().await;
    mount_user(&server, "good").await;

    let (guard, navigator) = build_guard(&server, SessionStore::with_session(session("good")));
    let user = guard.require_auth().await.unwrap();
    assert_eq!(user.id, "user-1");
    assert!(navigator.routes().is_empty());
}

#[tokio::test]
async fn authenticated_user_on_login_goes_to_dashboard() {
    let server = MockServer::start().await;
    mount_user(&server, "good").await;

    let (guard, navigator) = build_guard(&server, SessionStore::with_session(session("good")));
    let redirect = guard.redirect_if_authenticated().await.unwrap();
    assert_eq!(redirect.to, Route::Dashboard);
    assert_eq!(navigator.routes(), vec![Route::Dashboard]);

    let (anon_guard, _) = build_guard(&server, SessionStore::in_memory());
    assert!(anon_guard.redirect_if_authenticated().await.is_none());
}

#[tokio::test]
async fn expired_session_is_refreshed_before_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(body_json(json!({"refresh_token": "refresh-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh",
            "refresh_token": "refresh-2",
            "expires_in": 3600,
            "user": {"id": "user-1", "email": "reader@example.com"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_user(&server, "fresh").await;

    let mut stale = session("stale");
    stale.expires_at = Some(chrono::Utc::now() - chrono::Duration::minutes(5));
    let sessions = SessionStore::with_session(stale);
    let (guard, _) = build_guard(&server, sessions.clone());

    let user = guard.current_user().await.unwrap();
    assert_eq!(user.id, "user-1");
    let stored = sessions.get().await.unwrap();
    assert_eq!(stored.access_token, "fresh");
    assert_eq!(stored.refresh_token.as_deref(), Some("refresh-2"));
}

#[tokio::test]
async fn password_sign_in_builds_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", "anon-key"))
        .and(body_json(json!({"email": "reader@example.com", "password": "hunter22"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "refresh_token": "r",
            "expires_at": 1_900_000_000,
            "user": {"id": "user-1", "email": "reader@example.com"}
        })))
        .mount(&server)
        .await;

    let session = identity(&server)
        .sign_in_with_password("reader@example.com", "hunter22")
        .await
        .unwrap();
    assert_eq!(session.access_token, "tok");
    assert_eq!(session.expires_at.unwrap().timestamp(), 1_900_000_000);
}

#[tokio::test]
async fn rejected_sign_in_surfaces_service_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    let err = identity(&server)
        .sign_in_with_password("reader@example.com", "wrong")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid login credentials");
}

#[tokio::test]
async fn sign_up_pending_confirmation_has_no_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "user-2", "email": "new@example.com"
        })))
        .mount(&server)
        .await;

    let session = identity(&server)
        .sign_up("new@example.com", "hunter22")
        .await
        .unwrap();
    assert!(session.is_none());
}

#[test]
fn oauth_url_carries_provider_and_redirect() {
    let client = IdentityClient::new(
        Url::parse("https://id.example.com").unwrap(),
        PublicKey::new("anon-key"),
    )
    .unwrap();
    let url = client
        .oauth_authorize_url(OAuthProvider::Google, "http://localhost:3000/auth/callback")
        .unwrap();
    assert_eq!(url.path(), "/auth/v1/authorize");
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    assert!(pairs.contains(&("provider".into(), "google".into())));
    assert!(pairs.contains(&(
        "redirect_to".into(),
        "http://localhost:3000/auth/callback".into()
    )));
    assert!(!format!("{client:?}").contains("anon-key"));
}

#[tokio::test]
async fn oauth_redirect_fragment_becomes_session() {
    let server = MockServer::start().await;
    mount_user(&server, "oauth-tok").await;

    let redirect = Url::parse(
        "http://localhost:3000/auth/callback#access_token=oauth-tok&refresh_token=r1&expires_in=3600&token_type=bearer",
    )
    .unwrap();
    let session = identity(&server).session_from_redirect(&redirect).await.unwrap();
    assert_eq!(session.access_token, "oauth-tok");
    assert_eq!(session.refresh_token.as_deref(), Some("r1"));
    assert_eq!(session.user.id, "user-1");
    assert!(session.expires_at.is_some());
}

#[tokio::test]
async fn oauth_redirect_with_error_is_rejected() {
    let server = MockServer::start().await;
    let redirect = Url::parse(
        "http://localhost:3000/auth/callback#error=access_denied&error_description=User+cancelled",
    )
    .unwrap();
    let err = identity(&server)
        .session_from_redirect(&redirect)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "User cancelled");
}

#[tokio::test]
async fn profile_row_gives_tier_and_subscription() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("user_id", "eq.user-1"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "p-1",
            "user_id": "user-1",
            "subscription_status": "active",
            "subscription_tier": "pro"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let profile = identity(&server)
        .profile("tok", "user-1")
        .await
        .unwrap()
        .expect("profile row");
    assert_eq!(profile.tier(), "pro");
    assert!(profile.has_active_subscription());
}

#[tokio::test]
async fn missing_profile_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let profile = identity(&server).profile("tok", "user-9").await.unwrap();
    assert!(profile.is_none());
}

#[test]
fn free_or_inactive_profiles_have_no_subscription() {
    let mut profile = Profile {
        user_id: "user-1".into(),
        subscription_status: Some("active".into()),
        subscription_tier: None,
    };
    assert_eq!(profile.tier(), "free");
    assert!(!profile.has_active_subscription());

    profile.subscription_tier = Some("pro".into());
    profile.subscription_status = Some("canceled".into());
    assert!(!profile.has_active_subscription());
}
