use gm_common::Points;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Balance, UserCredentials},
    sqlite::db::{is_check_violation, is_unique_violation},
    traits::LedgerError,
};

/// Inserts a new user row with a zero balance, returning the assigned id.
pub async fn insert_user(
    login: &str,
    password_hash: &str,
    conn: &mut SqliteConnection,
) -> Result<i64, LedgerError> {
    let id: i64 = sqlx::query_scalar("INSERT INTO users (login, password) VALUES ($1, $2) RETURNING id")
        .bind(login)
        .bind(password_hash)
        .fetch_one(conn)
        .await
        .map_err(|e| if is_unique_violation(&e) { LedgerError::LoginTaken } else { e.into() })?;
    debug!("🧑️ User {login} registered with id {id}");
    Ok(id)
}

pub async fn credentials_by_login(
    login: &str,
    conn: &mut SqliteConnection,
) -> Result<UserCredentials, LedgerError> {
    let user = sqlx::query_as("SELECT id, login, password FROM users WHERE login = $1")
        .bind(login)
        .fetch_optional(conn)
        .await?;
    user.ok_or(LedgerError::NoSuchUser)
}

pub async fn balance_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Balance, LedgerError> {
    let balance = sqlx::query_as("SELECT current, withdrawn FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    balance.ok_or(LedgerError::NoSuchUser)
}

/// Adds `amount` to the user's spendable balance.
pub async fn credit_balance(
    user_id: i64,
    amount: Points,
    conn: &mut SqliteConnection,
) -> Result<(), LedgerError> {
    sqlx::query("UPDATE users SET current = current + $1 WHERE id = $2")
        .bind(amount)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Moves `sum` from the spendable balance to the withdrawn total. The database rejects the update when it would
/// drive `current` negative; that rejection surfaces as [`LedgerError::InsufficientFunds`].
pub async fn debit_balance(user_id: i64, sum: Points, conn: &mut SqliteConnection) -> Result<(), LedgerError> {
    sqlx::query("UPDATE users SET current = current - $1, withdrawn = withdrawn + $1 WHERE id = $2")
        .bind(sum)
        .bind(user_id)
        .execute(conn)
        .await
        .map_err(|e| if is_check_violation(&e) { LedgerError::InsufficientFunds } else { LedgerError::from(e) })?;
    Ok(())
}
