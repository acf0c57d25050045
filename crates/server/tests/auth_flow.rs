use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use server::routes::{self, auth::AppState};
use service::auth::cart::mock::MockCartProvisioner;
use service::auth::events::mock::RecordingEventPublisher;
use service::auth::repository::mock::MockAccountStore;
use service::auth::{AuthConfig, AuthService};

fn cors() -> tower_http::cors::CorsLayer { tower_http::cors::CorsLayer::very_permissive() }

struct TestApp {
    router: Router,
    events: Arc<RecordingEventPublisher>,
}

fn build_app() -> TestApp {
    let events = Arc::new(RecordingEventPublisher::default());
    let auth = AuthService::new(
        Arc::new(MockAccountStore::default()),
        Arc::new(MockCartProvisioner::default()),
        events.clone(),
        AuthConfig {
            jwt_secret: "test-secret".into(),
            access_token_ttl: Duration::from_secs(900),
            refresh_token_ttl: Duration::from_secs(3600),
        },
    );
    let router = routes::build_router(AppState { auth: Arc::new(auth) }, cors());
    TestApp { router, events }
}

async fn send(app: &Router, req: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
    let resp = app.clone().oneshot(req).await?;
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
    Ok((status, body))
}

fn post_json(uri: &str, body: Value) -> anyhow::Result<Request<Body>> {
    Ok(Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body)?))?)
}

fn get_profile(bearer: Option<&str>) -> anyhow::Result<Request<Body>> {
    let mut builder = Request::builder().method("GET").uri("/api/v1/users/profile");
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    Ok(builder.body(Body::empty())?)
}

fn registration(email: &str) -> Value {
    json!({"email": email, "password": "S3curePass!", "first_name": "Test", "last_name": "User", "phone": "555-0100"})
}

#[tokio::test]
async fn health_is_public() -> anyhow::Result<()> {
    let app = build_app();
    let req = Request::builder().uri("/health").body(Body::empty())?;
    let (status, body) = send(&app.router, req).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn register_login_refresh_logout_flow() -> anyhow::Result<()> {
    let app = build_app();

    let (status, body) = send(&app.router, post_json("/api/v1/auth/register", registration("flow@example.com"))?).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["email"], "flow@example.com");
    assert_eq!(body["data"]["user"]["role"], "customer");
    assert!(body["data"]["user"].get("password_hash").is_none());
    assert!(body.get("error").is_none());

    let (status, body) = send(
        &app.router,
        post_json("/api/v1/auth/login", json!({"email": "flow@example.com", "password": "S3curePass!"}))?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let access = body["data"]["access_token"].as_str().unwrap_or_default().to_string();
    let refresh = body["data"]["refresh_token"].as_str().unwrap_or_default().to_string();
    assert!(!access.is_empty() && !refresh.is_empty());

    let (status, body) = send(&app.router, get_profile(Some(&access))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "flow@example.com");

    let (status, body) = send(&app.router, post_json("/api/v1/auth/refresh", json!({"refresh_token": refresh}))?).await?;
    assert_eq!(status, StatusCode::OK);
    let rotated = body["data"]["refresh_token"].as_str().unwrap_or_default().to_string();
    assert_ne!(rotated, refresh);

    // consumed by the rotation above
    let (status, body) = send(&app.router, post_json("/api/v1/auth/refresh", json!({"refresh_token": refresh}))?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, body) = send(&app.router, post_json("/api/v1/auth/logout", json!({"refresh_token": rotated}))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body.get("data").is_none());

    let (status, _) = send(&app.router, post_json("/api/v1/auth/refresh", json!({"refresh_token": rotated}))?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // register, login, refresh
    assert_eq!(app.events.events().len(), 3);
    Ok(())
}

#[tokio::test]
async fn duplicate_registration_conflicts() -> anyhow::Result<()> {
    let app = build_app();
    let (status, _) = send(&app.router, post_json("/api/v1/auth/register", registration("dup@example.com"))?).await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = send(&app.router, post_json("/api/v1/auth/register", registration("dup@example.com"))?).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn short_password_rejected() -> anyhow::Result<()> {
    let app = build_app();
    let req = post_json(
        "/api/v1/auth/register",
        json!({"email": "a@b.com", "password": "short", "first_name": "A", "last_name": "B"}),
    )?;
    let (status, _) = send(&app.router, req).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn login_failures_look_identical() -> anyhow::Result<()> {
    let app = build_app();
    send(&app.router, post_json("/api/v1/auth/register", registration("who@example.com"))?).await?;

    let (s1, b1) = send(
        &app.router,
        post_json("/api/v1/auth/login", json!({"email": "who@example.com", "password": "wrong-pass"}))?,
    )
    .await?;
    let (s2, b2) = send(
        &app.router,
        post_json("/api/v1/auth/login", json!({"email": "nobody@example.com", "password": "S3curePass!"}))?,
    )
    .await?;
    assert_eq!(s1, StatusCode::UNAUTHORIZED);
    assert_eq!(s1, s2);
    assert_eq!(b1, b2);
    Ok(())
}

#[tokio::test]
async fn profile_requires_access_token() -> anyhow::Result<()> {
    let app = build_app();
    let (_, body) = send(&app.router, post_json("/api/v1/auth/register", registration("p@example.com"))?).await?;
    let refresh = body["data"]["refresh_token"].as_str().unwrap_or_default().to_string();

    let (status, body) = send(&app.router, get_profile(None)?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app.router, get_profile(Some("not-a-token"))?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app.router, get_profile(Some(&refresh))?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn publish_failure_is_a_server_error() -> anyhow::Result<()> {
    let app = build_app();
    app.events.set_failing(true);
    let (status, body) = send(&app.router, post_json("/api/v1/auth/register", registration("ev@example.com"))?).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body.get("data").is_none());
    Ok(())
}

#[tokio::test]
async fn openapi_document_is_served() -> anyhow::Result<()> {
    let app = build_app();
    let req = Request::builder().uri("/api-docs/openapi.json").body(Body::empty())?;
    let (status, body) = send(&app.router, req).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/v1/auth/login"].is_object());
    Ok(())
}

#[tokio::test]
async fn malformed_bodies_get_the_envelope() -> anyhow::Result<()> {
    let app = build_app();

    for uri in ["/api/v1/auth/register", "/api/v1/auth/login", "/api/v1/auth/refresh", "/api/v1/auth/logout"] {
        let (status, body) = send(&app.router, post_json(uri, json!({}))?).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} with empty object");
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Invalid request data");
        assert!(body["error"].is_string());
    }

    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("not json"))?;
    let (status, body) = send(&app.router, req).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid request data");

    // nothing was registered or published
    assert!(app.events.events().is_empty());
    Ok(())
}
