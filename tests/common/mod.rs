//! Shared fixtures for the HTTP integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use tower::ServiceExt;

use pocketbook::identity::{
    AuthGateway, CookiePolicy, CredentialCodec, CredentialScheme, ManualClock, MemorySessionStore, SessionStore,
    DEFAULT_COOKIE_NAME,
};
use pocketbook::questions::{QuestionBank, QuestionService};
use pocketbook::server::{build_router, AppState};
use pocketbook::users::{MemoryUserRepository, UserRepository};

pub const TEST_SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub router: Router,
    pub clock: Arc<ManualClock>,
    pub users: Arc<MemoryUserRepository>,
    pub sessions: Option<Arc<MemorySessionStore>>,
}

pub enum Scheme {
    Signed,
    Session,
}

pub fn test_app(scheme: Scheme) -> TestApp {
    test_app_with_questions(scheme, Arc::new(QuestionBank::new()))
}

/// Instant every fixture clock starts at.
pub fn test_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

pub fn test_app_with_questions(scheme: Scheme, questions: Arc<dyn QuestionService>) -> TestApp {
    let clock = Arc::new(ManualClock::new(test_start()));
    let (scheme, sessions) = match scheme {
        Scheme::Signed => {
            (CredentialScheme::Signed(Arc::new(CredentialCodec::new(Some(TEST_SECRET), clock.clone()))), None)
        }
        Scheme::Session => {
            let store = Arc::new(MemorySessionStore::new(clock.clone()));
            (
                CredentialScheme::Session { store: store.clone(), timeout: std::time::Duration::from_secs(1) },
                Some(store),
            )
        }
    };
    assemble(clock, scheme, sessions, questions)
}

/// Session-scheme app over an arbitrary store, with a short store timeout.
pub fn test_app_with_session_store(store: Arc<dyn SessionStore>) -> TestApp {
    let clock = Arc::new(ManualClock::new(test_start()));
    let scheme = CredentialScheme::Session { store, timeout: std::time::Duration::from_millis(50) };
    assemble(clock, scheme, None, Arc::new(QuestionBank::new()))
}

fn assemble(
    clock: Arc<ManualClock>,
    scheme: CredentialScheme,
    sessions: Option<Arc<MemorySessionStore>>,
    questions: Arc<dyn QuestionService>,
) -> TestApp {
    let users = Arc::new(MemoryUserRepository::new());
    let gateway = AuthGateway::new(scheme, CookiePolicy::new(DEFAULT_COOKIE_NAME), chrono::Duration::hours(24))
        .with_account_check(users.clone());
    let users_dyn: Arc<dyn UserRepository> = users.clone();
    let state = AppState { gateway: Arc::new(gateway), users: users_dyn, questions };
    TestApp { router: build_router(state), clock, users, sessions }
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn get_with_cookie(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
    }
    builder.body(Body::empty()).expect("request")
}

pub fn with_cookie(mut req: Request<Body>, cookie: &str) -> Request<Body> {
    req.headers_mut().insert(header::COOKIE, cookie.parse().expect("cookie header"));
    req
}

pub async fn read_json(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub async fn send(app: &TestApp, req: Request<Body>) -> Response<Body> {
    app.router.clone().oneshot(req).await.expect("response")
}

pub fn set_cookie(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("set-cookie header")
        .to_str()
        .expect("ascii set-cookie")
        .to_string()
}

/// `name=value` pair of a `Set-Cookie` header, ready to send back.
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap_or_default().trim().to_string()
}

pub async fn sign_up(app: &TestApp, username: &str, password: &str) -> String {
    let resp = send(
        app,
        json_request("POST", "/api/v1/auth/sign-up", serde_json::json!({"username": username, "password": password})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    cookie_pair(&set_cookie(&resp))
}

pub async fn sign_in(app: &TestApp, username: &str, password: &str) -> Response<Body> {
    send(
        app,
        json_request("POST", "/api/v1/auth/sign-in", serde_json::json!({"username": username, "password": password})),
    )
    .await
}
