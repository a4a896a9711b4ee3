use actix_web::{
    http::{header, StatusCode},
    test::TestRequest,
    web,
    web::ServiceConfig,
};
use gophermart_engine::{traits::LedgerError, LedgerApi};
use serde_json::json;

use super::{
    helpers::{call, seeded_user},
    mocks::{detached_scheduler_handle, MockLedger},
};
use crate::server::api_routes;

#[actix_web::test]
async fn register_returns_a_replayable_auth_header() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/api/user/register")
        .set_json(json!({"login": "u1", "password": "p1"}));
    let (status, headers, _) = call(req, register_ok).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Basic dTE6cDE=");
}

#[actix_web::test]
async fn register_rejects_a_taken_login() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/api/user/register")
        .set_json(json!({"login": "u1", "password": "p1"}));
    let (status, _, body) = call(req, register_taken).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("login already in use"), "unexpected body: {body}");
}

#[actix_web::test]
async fn register_rejects_malformed_json() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/api/user/register")
        .insert_header(header::ContentType::json())
        .set_payload("not json");
    let (status, _, _) = call(req, no_calls_expected).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn register_rejects_blank_credentials() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/api/user/register").set_json(json!({"login": "", "password": "p1"}));
    let (status, _, _) = call(req, no_calls_expected).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn login_succeeds_with_the_right_password() {
    let _ = env_logger::try_init().ok();
    let req =
        TestRequest::post().uri("/api/user/login").set_json(json!({"login": "u1", "password": "p1"}));
    let (status, headers, _) = call(req, known_user).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Basic dTE6cDE=");
}

#[actix_web::test]
async fn login_rejects_a_wrong_password() {
    let _ = env_logger::try_init().ok();
    let req =
        TestRequest::post().uri("/api/user/login").set_json(json!({"login": "u1", "password": "wrong"}));
    let (status, _, _) = call(req, known_user).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn login_rejects_an_unknown_login() {
    let _ = env_logger::try_init().ok();
    let req =
        TestRequest::post().uri("/api/user/login").set_json(json!({"login": "ghost", "password": "p1"}));
    let (status, _, _) = call(req, unknown_user).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn protected_routes_require_credentials() {
    let _ = env_logger::try_init().ok();
    let (status, _, _) = call(TestRequest::get().uri("/api/user/orders"), no_calls_expected).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

fn register_ok(cfg: &mut ServiceConfig) {
    let mut ledger = MockLedger::new();
    ledger.expect_create_user().withf(|login, _| login == "u1").returning(|_, _| Ok(1));
    configure_with(cfg, ledger);
}

fn register_taken(cfg: &mut ServiceConfig) {
    let mut ledger = MockLedger::new();
    ledger.expect_create_user().returning(|_, _| Err(LedgerError::LoginTaken));
    configure_with(cfg, ledger);
}

fn known_user(cfg: &mut ServiceConfig) {
    let mut ledger = MockLedger::new();
    ledger.expect_user_credentials().returning(|_| Ok(seeded_user().0));
    configure_with(cfg, ledger);
}

fn unknown_user(cfg: &mut ServiceConfig) {
    let mut ledger = MockLedger::new();
    ledger.expect_user_credentials().returning(|_| Err(LedgerError::NoSuchUser));
    configure_with(cfg, ledger);
}

fn no_calls_expected(cfg: &mut ServiceConfig) {
    configure_with(cfg, MockLedger::new());
}

pub(super) fn configure_with(cfg: &mut ServiceConfig, ledger: MockLedger) {
    cfg.app_data(web::Data::new(LedgerApi::new(ledger)))
        .app_data(web::Data::new(detached_scheduler_handle()))
        .configure(api_routes::<MockLedger>);
}
