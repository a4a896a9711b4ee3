use actix_web::{
    http::{header::HeaderMap, StatusCode},
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use gophermart_engine::db_types::UserCredentials;

use crate::{
    auth::{basic_auth_header, hash_password},
    server::json_error_config,
};

/// Runs one request against an app configured by `configure` and returns (status, headers, body).
pub async fn call(req: TestRequest, configure: fn(&mut ServiceConfig)) -> (StatusCode, HeaderMap, String) {
    let app = App::new().app_data(json_error_config()).configure(configure);
    let service = test::init_service(app).await;
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let headers = res.headers().clone();
    let body = test::read_body(res).await;
    (status, headers, String::from_utf8_lossy(&body).into_owned())
}

/// The stored credentials for login `u1` / password `p1`, plus the header a client would present.
pub fn seeded_user() -> (UserCredentials, String) {
    let password_hash = hash_password("p1").expect("hashing failed");
    (UserCredentials { id: 1, login: "u1".to_string(), password: password_hash }, basic_auth_header("u1", "p1"))
}
