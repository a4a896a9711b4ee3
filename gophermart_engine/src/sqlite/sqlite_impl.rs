use std::fmt::Debug;

use async_trait::async_trait;
use gm_common::Points;
use log::{debug, info, trace};
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};

use super::db::{new_pool, orders, users, withdrawals};
use crate::{
    db_types::{Balance, Order, OrderNumber, OrderStatusType, OrderTicket, UserCredentials, Withdrawal},
    traits::{LedgerDatabase, LedgerError},
};

/// The production [`LedgerDatabase`] implementation, backed by SQLite.
#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Opens (creating if necessary) the database at `url` and brings the schema up to date.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, LedgerError> {
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?;
            info!("🗃️ Created new database at {url}");
        }
        let pool = new_pool(url, max_connections).await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| LedgerError::StorageFault(e.to_string()))?;
        debug!("🗃️ Database migrations are up to date");
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl LedgerDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn create_user(&self, login: &str, password_hash: &str) -> Result<i64, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        users::insert_user(login, password_hash, &mut conn).await
    }

    async fn user_credentials(&self, login: &str) -> Result<UserCredentials, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        users::credentials_by_login(login, &mut conn).await
    }

    async fn insert_order(&self, number: &OrderNumber, user_id: i64) -> Result<Order, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        orders::insert_new_order(number, user_id, &mut conn).await
    }

    async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::orders_for_user(user_id, &mut conn).await?;
        if orders.is_empty() {
            return Err(LedgerError::NoOrders);
        }
        Ok(orders)
    }

    async fn balance_for_user(&self, user_id: i64) -> Result<Balance, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        users::balance_for_user(user_id, &mut conn).await
    }

    async fn withdraw(&self, user_id: i64, number: &OrderNumber, sum: Points) -> Result<(), LedgerError> {
        if !sum.is_positive() {
            return Err(LedgerError::NonPositiveWithdrawal);
        }
        let mut tx = self.pool.begin().await?;
        users::debit_balance(user_id, sum, &mut tx).await?;
        withdrawals::insert_withdrawal(user_id, number, sum, &mut tx).await?;
        tx.commit().await?;
        debug!("💰️ User #{user_id} withdrew {sum} against order {number}");
        Ok(())
    }

    async fn withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let withdrawals = withdrawals::withdrawals_for_user(user_id, &mut conn).await?;
        if withdrawals.is_empty() {
            return Err(LedgerError::NoWithdrawals);
        }
        Ok(withdrawals)
    }

    async fn commit_accrual(
        &self,
        number: &OrderNumber,
        status: OrderStatusType,
        accrual: Points,
    ) -> Result<(), LedgerError> {
        let mut tx = self.pool.begin().await?;
        let settled = orders::settle_order(number, status, accrual, &mut tx).await?;
        match settled {
            Some(order) => {
                if accrual.is_positive() && status == OrderStatusType::Processed {
                    users::credit_balance(order.user_id, accrual, &mut tx).await?;
                }
                tx.commit().await?;
                debug!("🗃️ Order {number} settled as {status} with accrual {accrual}");
            },
            None => {
                // The order already carries a terminal verdict; leave it (and the balance) alone.
                trace!("🗃️ Order {number} was already settled; ignoring {status}/{accrual}");
            },
        }
        Ok(())
    }

    async fn pending_orders(&self) -> Result<Vec<OrderTicket>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let tickets = orders::pending_orders(&mut conn).await?;
        Ok(tickets)
    }
}
