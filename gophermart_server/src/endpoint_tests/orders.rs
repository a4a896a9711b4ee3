use actix_web::{
    http::{header, StatusCode},
    test::TestRequest,
    web::ServiceConfig,
};
use chrono::{TimeZone, Utc};
use gm_common::Points;
use gophermart_engine::{
    db_types::{Order, OrderNumber, OrderStatusType},
    traits::LedgerError,
};

use super::{
    auth::configure_with,
    helpers::{call, seeded_user},
    mocks::MockLedger,
};

const ORDERS_JSON: &str = r#"[{"number":"12345678903","status":"PROCESSED","accrual":42.0,"uploaded_at":"2024-02-29T13:30:00Z"},{"number":"49927398716","status":"NEW","uploaded_at":"2024-03-15T18:30:00Z"}]"#;

fn post_order(number: &str) -> TestRequest {
    TestRequest::post()
        .uri("/api/user/orders")
        .insert_header((header::AUTHORIZATION, seeded_user().1))
        .set_payload(number.to_string())
}

#[actix_web::test]
async fn fresh_orders_are_accepted() {
    let _ = env_logger::try_init().ok();
    let (status, _, body) = call(post_order("12345678903"), accepts_order).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(body.contains("new order accepted"), "unexpected body: {body}");
}

#[actix_web::test]
async fn reposting_your_own_order_is_ok() {
    let _ = env_logger::try_init().ok();
    let (status, _, body) = call(post_order("12345678903"), order_owned_by_caller).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("already uploaded by this user"), "unexpected body: {body}");
}

#[actix_web::test]
async fn posting_someone_elses_order_conflicts() {
    let _ = env_logger::try_init().ok();
    let (status, _, _) = call(post_order("12345678903"), order_owned_by_other).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn bad_checksums_are_unprocessable() {
    let _ = env_logger::try_init().ok();
    let (status, _, _) = call(post_order("12345678904"), authenticated_only).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn order_history_is_rendered_with_rewards() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get()
        .uri("/api/user/orders")
        .insert_header((header::AUTHORIZATION, seeded_user().1));
    let (status, _, body) = call(req, order_history).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ORDERS_JSON);
}

#[actix_web::test]
async fn empty_order_history_is_no_content() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get()
        .uri("/api/user/orders")
        .insert_header((header::AUTHORIZATION, seeded_user().1));
    let (status, _, body) = call(req, no_order_history).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
}

fn authenticated_ledger() -> MockLedger {
    let mut ledger = MockLedger::new();
    ledger.expect_user_credentials().returning(|_| Ok(seeded_user().0));
    ledger
}

fn authenticated_only(cfg: &mut ServiceConfig) {
    configure_with(cfg, authenticated_ledger());
}

fn accepts_order(cfg: &mut ServiceConfig) {
    let mut ledger = authenticated_ledger();
    ledger.expect_insert_order().withf(|number, user_id| number.as_str() == "12345678903" && *user_id == 1).returning(
        |number, user_id| {
            Ok(Order {
                id: 1,
                number: number.clone(),
                status: OrderStatusType::New,
                accrual: Points::default(),
                uploaded_at: Utc::now(),
                user_id,
            })
        },
    );
    configure_with(cfg, ledger);
}

fn order_owned_by_caller(cfg: &mut ServiceConfig) {
    let mut ledger = authenticated_ledger();
    ledger.expect_insert_order().returning(|_, _| Err(LedgerError::OrderOwnedBySameUser));
    configure_with(cfg, ledger);
}

fn order_owned_by_other(cfg: &mut ServiceConfig) {
    let mut ledger = authenticated_ledger();
    ledger.expect_insert_order().returning(|_, _| Err(LedgerError::OrderOwnedByDifferentUser));
    configure_with(cfg, ledger);
}

fn order_history(cfg: &mut ServiceConfig) {
    let mut ledger = authenticated_ledger();
    ledger.expect_orders_for_user().returning(|user_id| {
        Ok(vec![
            Order {
                id: 1,
                number: OrderNumber::from("12345678903"),
                status: OrderStatusType::Processed,
                accrual: Points::from_points(42),
                uploaded_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
                user_id,
            },
            Order {
                id: 2,
                number: OrderNumber::from("49927398716"),
                status: OrderStatusType::New,
                accrual: Points::default(),
                uploaded_at: Utc.with_ymd_and_hms(2024, 3, 15, 18, 30, 0).unwrap(),
                user_id,
            },
        ])
    });
    configure_with(cfg, ledger);
}

fn no_order_history(cfg: &mut ServiceConfig) {
    let mut ledger = authenticated_ledger();
    ledger.expect_orders_for_user().returning(|_| Err(LedgerError::NoOrders));
    configure_with(cfg, ledger);
}
