//! Request handler definitions.
//!
//! Handlers are generic over the ledger backend so that the endpoint tests can run them against a mock. They are
//! registered by [`crate::server::api_routes`]; anything longer than a screen belongs in its own module.
use actix_web::{get, http::header, web, HttpResponse, Responder};
use gm_common::luhn;
use gophermart_engine::{
    db_types::{OrderNumber, OrderTicket},
    scheduler::SchedulerHandle,
    traits::{LedgerDatabase, LedgerError},
    LedgerApi,
};
use log::{debug, trace, warn};
use serde_json::json;

use crate::{
    auth::{authenticate, basic_auth_header, hash_password, BasicCredentials},
    data_objects::{Credentials, OrderResponse, WithdrawRequest, WithdrawalResponse},
    errors::ServerError,
};

// ----------------------------------------------   Health   ---------------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// ----------------------------------------------  Register   --------------------------------------------------------
pub async fn register<B: LedgerDatabase>(
    body: web::Json<Credentials>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let Credentials { login, password } = body.into_inner();
    if login.is_empty() || password.is_empty() {
        return Err(ServerError::InvalidRequestBody);
    }
    let password_hash = hash_password(&password)?;
    api.register_user(&login, &password_hash).await?;
    debug!("💻️ New user registered: {login}");
    Ok(HttpResponse::Ok()
        .insert_header((header::AUTHORIZATION, basic_auth_header(&login, &password)))
        .json(json!({ "message": "user successfully registered and authenticated", "status": 200 })))
}

// ----------------------------------------------   Login    ---------------------------------------------------------
pub async fn login<B: LedgerDatabase>(
    body: web::Json<Credentials>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let Credentials { login, password } = body.into_inner();
    let credentials = BasicCredentials { login: login.clone(), password: password.clone() };
    authenticate(api.as_ref(), &credentials).await?;
    debug!("💻️ User logged in: {login}");
    Ok(HttpResponse::Ok()
        .insert_header((header::AUTHORIZATION, basic_auth_header(&login, &password)))
        .json(json!({ "message": "user successfully logged in", "status": 200 })))
}

// ----------------------------------------------   Orders   ---------------------------------------------------------
/// Accepts an order number (the raw request body) for asynchronous accrual processing.
///
/// Re-posting a number the caller already owns is a 200; a number owned by someone else is a 409. A freshly
/// accepted order is handed to the scheduler exactly once, here.
pub async fn post_order<B: LedgerDatabase>(
    body: String,
    credentials: BasicCredentials,
    api: web::Data<LedgerApi<B>>,
    scheduler: web::Data<SchedulerHandle>,
) -> Result<HttpResponse, ServerError> {
    let user_id = authenticate(api.as_ref(), &credentials).await?;
    if !luhn::is_valid(&body) {
        return Err(ServerError::InvalidOrderNumber);
    }
    let number = OrderNumber::from(body);
    match api.submit_order(&number, user_id).await {
        Ok(_) => {
            scheduler.push(OrderTicket::new(number, user_id));
            Ok(HttpResponse::Accepted().json(json!({ "message": "new order accepted", "status": 202 })))
        },
        Err(LedgerError::OrderOwnedBySameUser) => {
            Ok(HttpResponse::Ok().json(json!({ "message": "order already uploaded by this user", "status": 200 })))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn get_orders<B: LedgerDatabase>(
    credentials: BasicCredentials,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = authenticate(api.as_ref(), &credentials).await?;
    match api.orders_for_user(user_id).await {
        Ok(orders) => {
            let orders: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();
            Ok(HttpResponse::Ok().json(orders))
        },
        Err(LedgerError::NoOrders) => Ok(HttpResponse::NoContent().finish()),
        Err(e) => Err(e.into()),
    }
}

// ----------------------------------------------   Balance   --------------------------------------------------------
pub async fn get_balance<B: LedgerDatabase>(
    credentials: BasicCredentials,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = authenticate(api.as_ref(), &credentials).await?;
    let balance = api.balance_for_user(user_id).await?;
    Ok(HttpResponse::Ok().json(balance))
}

pub async fn withdraw<B: LedgerDatabase>(
    body: web::Json<WithdrawRequest>,
    credentials: BasicCredentials,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = authenticate(api.as_ref(), &credentials).await?;
    let WithdrawRequest { order, sum } = body.into_inner();
    if !luhn::is_valid(&order) {
        return Err(ServerError::InvalidOrderNumber);
    }
    let number = OrderNumber::from(order);
    api.withdraw(user_id, &number, sum).await.map_err(|e| {
        warn!("💻️ Withdrawal of {sum} against {number} failed for user #{user_id}: {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(json!({ "message": "successful withdrawal", "status": 200 })))
}

pub async fn get_withdrawals<B: LedgerDatabase>(
    credentials: BasicCredentials,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = authenticate(api.as_ref(), &credentials).await?;
    match api.withdrawals_for_user(user_id).await {
        Ok(withdrawals) => {
            let withdrawals: Vec<WithdrawalResponse> =
                withdrawals.into_iter().map(WithdrawalResponse::from).collect();
            Ok(HttpResponse::Ok().json(withdrawals))
        },
        Err(LedgerError::NoWithdrawals) => Ok(HttpResponse::NoContent().finish()),
        Err(e) => Err(e.into()),
    }
}
