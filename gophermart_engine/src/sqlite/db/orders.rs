use gm_common::Points;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Order, OrderNumber, OrderStatusType, OrderTicket},
    sqlite::db::is_unique_violation,
    traits::LedgerError,
};

/// Inserts the order in `NEW` status for the given user.
///
/// Order numbers are globally unique. When the number already exists, the current owner decides the outcome:
/// the same user gets [`LedgerError::OrderOwnedBySameUser`] (an idempotent re-upload), anyone else gets
/// [`LedgerError::OrderOwnedByDifferentUser`].
pub async fn insert_new_order(
    number: &OrderNumber,
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Order, LedgerError> {
    let inserted = sqlx::query_as("INSERT INTO orders (number, status, user_id) VALUES ($1, 'NEW', $2) RETURNING *")
        .bind(number.as_str())
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await;
    match inserted {
        Ok(order) => {
            debug!("📝️ Order {number} inserted for user #{user_id}");
            Ok(order)
        },
        Err(e) if is_unique_violation(&e) => {
            let existing = fetch_order_by_number(number, conn)
                .await?
                .ok_or_else(|| LedgerError::OrderNotFound(number.clone()))?;
            if existing.user_id == user_id {
                Err(LedgerError::OrderOwnedBySameUser)
            } else {
                Err(LedgerError::OrderOwnedByDifferentUser)
            }
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_order_by_number(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE number = $1").bind(number.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Returns the user's orders, oldest upload first.
pub async fn orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY uploaded_at ASC, id ASC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Writes the accrual verdict for an order that is still in flight.
///
/// Terminal rows are filtered out in the WHERE clause, so a status that has already settled can never be
/// overwritten. Returns the updated row, or `None` when the order was already terminal.
pub async fn settle_order(
    number: &OrderNumber,
    status: OrderStatusType,
    accrual: Points,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, LedgerError> {
    let updated: Option<Order> = sqlx::query_as(
        r#"
        UPDATE orders SET status = $1, accrual = $2
        WHERE number = $3 AND status IN ('NEW', 'PROCESSING')
        RETURNING *
        "#,
    )
    .bind(status)
    .bind(accrual)
    .bind(number.as_str())
    .fetch_optional(&mut *conn)
    .await?;
    if updated.is_none() {
        // Distinguish "already terminal" from "never uploaded".
        fetch_order_by_number(number, conn).await?.ok_or_else(|| LedgerError::OrderNotFound(number.clone()))?;
    }
    Ok(updated)
}

/// Every order that still needs a terminal verdict, oldest upload first.
pub async fn pending_orders(conn: &mut SqliteConnection) -> Result<Vec<OrderTicket>, sqlx::Error> {
    let tickets = sqlx::query_as(
        r#"
        SELECT number, user_id FROM orders
        WHERE status IN ('NEW', 'PROCESSING')
        ORDER BY uploaded_at ASC, id ASC
        "#,
    )
    .fetch_all(conn)
    .await?;
    Ok(tickets)
}
