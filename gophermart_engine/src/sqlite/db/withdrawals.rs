use gm_common::Points;
use sqlx::SqliteConnection;

use crate::{
    db_types::{OrderNumber, Withdrawal},
    traits::LedgerError,
};

/// Records a withdrawal row. The balance debit is a separate statement; run both inside one transaction.
pub async fn insert_withdrawal(
    user_id: i64,
    number: &OrderNumber,
    sum: Points,
    conn: &mut SqliteConnection,
) -> Result<(), LedgerError> {
    sqlx::query("INSERT INTO withdrawals (order_number, sum, user_id) VALUES ($1, $2, $3)")
        .bind(number.as_str())
        .bind(sum)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Returns the user's withdrawals, oldest first.
pub async fn withdrawals_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Withdrawal>, sqlx::Error> {
    let withdrawals =
        sqlx::query_as("SELECT * FROM withdrawals WHERE user_id = $1 ORDER BY processed_at ASC, id ASC")
            .bind(user_id)
            .fetch_all(conn)
            .await?;
    Ok(withdrawals)
}
