use std::fmt::Debug;

use gm_common::Points;
use log::{debug, trace};

use crate::{
    db_types::{Balance, Order, OrderNumber, UserCredentials, Withdrawal},
    traits::{LedgerDatabase, LedgerError},
};

/// The public face of the ledger. A thin, clone-friendly wrapper around a [`LedgerDatabase`] backend that the
/// HTTP layer keeps in shared application state.
pub struct LedgerApi<B> {
    db: B,
}

impl<B> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi")
    }
}

impl<B> LedgerApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> LedgerApi<B>
where
    B: LedgerDatabase,
{
    pub async fn register_user(&self, login: &str, password_hash: &str) -> Result<i64, LedgerError> {
        let id = self.db.create_user(login, password_hash).await?;
        debug!("🧑️ Registered user {login} as #{id}");
        Ok(id)
    }

    pub async fn user_credentials(&self, login: &str) -> Result<UserCredentials, LedgerError> {
        self.db.user_credentials(login).await
    }

    pub async fn submit_order(&self, number: &OrderNumber, user_id: i64) -> Result<Order, LedgerError> {
        let order = self.db.insert_order(number, user_id).await?;
        debug!("📝️ Accepted order {number} from user #{user_id}");
        Ok(order)
    }

    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, LedgerError> {
        let orders = self.db.orders_for_user(user_id).await?;
        trace!("📝️ Fetched {} orders for user #{user_id}", orders.len());
        Ok(orders)
    }

    pub async fn balance_for_user(&self, user_id: i64) -> Result<Balance, LedgerError> {
        self.db.balance_for_user(user_id).await
    }

    pub async fn withdraw(&self, user_id: i64, number: &OrderNumber, sum: Points) -> Result<(), LedgerError> {
        self.db.withdraw(user_id, number, sum).await
    }

    pub async fn withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError> {
        let withdrawals = self.db.withdrawals_for_user(user_id).await?;
        trace!("💰️ Fetched {} withdrawals for user #{user_id}", withdrawals.len());
        Ok(withdrawals)
    }
}
