use actix_web::{
    http::{header, StatusCode},
    test::TestRequest,
    web::ServiceConfig,
};
use chrono::{TimeZone, Utc};
use gm_common::Points;
use gophermart_engine::{
    db_types::{Balance, OrderNumber, Withdrawal},
    traits::LedgerError,
};
use serde_json::json;

use super::{
    auth::configure_with,
    helpers::{call, seeded_user},
    mocks::MockLedger,
};

#[actix_web::test]
async fn balance_is_reported_with_fractions() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get()
        .uri("/api/user/balance")
        .insert_header((header::AUTHORIZATION, seeded_user().1));
    let (status, _, body) = call(req, with_balance).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"current":500.5,"withdrawn":42.0}"#);
}

#[actix_web::test]
async fn withdrawal_within_the_balance_succeeds() {
    let _ = env_logger::try_init().ok();
    let req = withdraw_request(json!({"order": "49927398716", "sum": 10}));
    let (status, _, body) = call(req, accepts_withdrawal).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("successful withdrawal"), "unexpected body: {body}");
}

#[actix_web::test]
async fn overdrafts_are_payment_required() {
    let _ = env_logger::try_init().ok();
    let req = withdraw_request(json!({"order": "49927398716", "sum": 100}));
    let (status, _, _) = call(req, refuses_withdrawal).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
}

#[actix_web::test]
async fn withdrawal_against_a_bad_checksum_is_unprocessable() {
    let _ = env_logger::try_init().ok();
    let req = withdraw_request(json!({"order": "49927398717", "sum": 10}));
    let (status, _, _) = call(req, authenticated_only).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn withdrawal_history_is_rendered() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get()
        .uri("/api/user/withdrawals")
        .insert_header((header::AUTHORIZATION, seeded_user().1));
    let (status, _, body) = call(req, withdrawal_history).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"[{"order":"79927398713","sum":10.0,"processed_at":"2024-03-16T11:20:00Z"}]"#);
}

#[actix_web::test]
async fn empty_withdrawal_history_is_no_content() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get()
        .uri("/api/user/withdrawals")
        .insert_header((header::AUTHORIZATION, seeded_user().1));
    let (status, _, body) = call(req, no_withdrawal_history).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
}

fn withdraw_request(body: serde_json::Value) -> TestRequest {
    TestRequest::post()
        .uri("/api/user/balance/withdraw")
        .insert_header((header::AUTHORIZATION, seeded_user().1))
        .set_json(body)
}

fn authenticated_ledger() -> MockLedger {
    let mut ledger = MockLedger::new();
    ledger.expect_user_credentials().returning(|_| Ok(seeded_user().0));
    ledger
}

fn authenticated_only(cfg: &mut ServiceConfig) {
    configure_with(cfg, authenticated_ledger());
}

fn with_balance(cfg: &mut ServiceConfig) {
    let mut ledger = authenticated_ledger();
    ledger.expect_balance_for_user().returning(|_| {
        Ok(Balance { current: Points::from_hundredths(50050), withdrawn: Points::from_points(42) })
    });
    configure_with(cfg, ledger);
}

fn accepts_withdrawal(cfg: &mut ServiceConfig) {
    let mut ledger = authenticated_ledger();
    ledger
        .expect_withdraw()
        .withf(|user_id, number, sum| {
            *user_id == 1 && number.as_str() == "49927398716" && *sum == Points::from_points(10)
        })
        .returning(|_, _, _| Ok(()));
    configure_with(cfg, ledger);
}

fn refuses_withdrawal(cfg: &mut ServiceConfig) {
    let mut ledger = authenticated_ledger();
    ledger.expect_withdraw().returning(|_, _, _| Err(LedgerError::InsufficientFunds));
    configure_with(cfg, ledger);
}

fn withdrawal_history(cfg: &mut ServiceConfig) {
    let mut ledger = authenticated_ledger();
    ledger.expect_withdrawals_for_user().returning(|user_id| {
        Ok(vec![Withdrawal {
            id: 1,
            order_number: OrderNumber::from("79927398713"),
            sum: Points::from_points(10),
            processed_at: Utc.with_ymd_and_hms(2024, 3, 16, 11, 20, 0).unwrap(),
            user_id,
        }])
    });
    configure_with(cfg, ledger);
}

fn no_withdrawal_history(cfg: &mut ServiceConfig) {
    let mut ledger = authenticated_ledger();
    ledger.expect_withdrawals_for_user().returning(|_| Err(LedgerError::NoWithdrawals));
    configure_with(cfg, ledger);
}
