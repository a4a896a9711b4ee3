//! HTTP Basic authentication and password hashing.
//!
//! Parsing the `Authorization` header and checking the hash are deliberately separate steps: the
//! [`BasicCredentials`] extractor is pure header work, and [`authenticate`] is the ledger lookup plus argon2
//! verification that handlers call once they know which API they are serving.
use actix_web::{dev::Payload, http::header, FromRequest, HttpRequest};
use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use futures::future::{ready, Ready};
use gophermart_engine::{traits::LedgerDatabase, LedgerApi};
use log::debug;

use crate::errors::ServerError;

/// The login/password pair presented with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub login: String,
    pub password: String,
}

impl FromRequest for BasicCredentials {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(parse_basic_auth(req))
    }
}

fn parse_basic_auth(req: &HttpRequest) -> Result<BasicCredentials, ServerError> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ServerError::Unauthorized)?;
    let encoded = header.strip_prefix("Basic ").ok_or(ServerError::Unauthorized)?;
    let decoded = BASE64.decode(encoded.trim()).map_err(|_| ServerError::Unauthorized)?;
    let pair = String::from_utf8(decoded).map_err(|_| ServerError::Unauthorized)?;
    let (login, password) = pair.split_once(':').ok_or(ServerError::Unauthorized)?;
    Ok(BasicCredentials { login: login.to_string(), password: password.to_string() })
}

/// The `Authorization` header value a client can replay on subsequent requests.
pub fn basic_auth_header(login: &str, password: &str) -> String {
    format!("Basic {}", BASE64.encode(format!("{login}:{password}")))
}

pub fn hash_password(password: &str) -> Result<String, ServerError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt).map_err(|e| {
        debug!("🔑️ Password hashing failed: {e}");
        ServerError::PasswordHash
    })?;
    Ok(hash.to_string())
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

/// Resolves the credentials to a user id, or 401.
pub async fn authenticate<B: LedgerDatabase>(
    api: &LedgerApi<B>,
    credentials: &BasicCredentials,
) -> Result<i64, ServerError> {
    let user = api.user_credentials(&credentials.login).await.map_err(ServerError::from)?;
    if verify_password(&user.password, &credentials.password) {
        Ok(user.id)
    } else {
        debug!("🔑️ Password mismatch for {}", credentials.login);
        Err(ServerError::Unauthorized)
    }
}
