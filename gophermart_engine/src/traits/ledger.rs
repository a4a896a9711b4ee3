use async_trait::async_trait;
use gm_common::Points;
use thiserror::Error;

use crate::db_types::{Balance, Order, OrderNumber, OrderStatusType, OrderTicket, UserCredentials, Withdrawal};

/// The single writer of monetary and ownership state.
///
/// Every mutation that touches two rows (order + balance, withdrawal + balance) happens inside one database
/// transaction; a failed transaction rolls back completely and never leaves half-state behind. Reads are
/// non-transactional.
///
/// The non-negative balance rule is enforced by the database itself. Callers must not pre-check a balance before
/// withdrawing; they should attempt the debit and handle [`LedgerError::InsufficientFunds`].
#[async_trait]
pub trait LedgerDatabase: Clone + Send + Sync + 'static {
    /// The URL of the backing database.
    fn url(&self) -> &str;

    /// Registers a new user and returns their id. The password is stored as an opaque hash; hashing is the
    /// caller's responsibility.
    async fn create_user(&self, login: &str, password_hash: &str) -> Result<i64, LedgerError>;

    /// Fetches the id and password hash for the given login.
    async fn user_credentials(&self, login: &str) -> Result<UserCredentials, LedgerError>;

    /// Records a freshly uploaded order in `NEW` status, owned by `user_id`.
    ///
    /// Order numbers are globally unique. Re-uploading a number returns [`LedgerError::OrderOwnedBySameUser`] when
    /// the caller already owns it, and [`LedgerError::OrderOwnedByDifferentUser`] otherwise. Ownership never
    /// changes after the first insert.
    async fn insert_order(&self, number: &OrderNumber, user_id: i64) -> Result<Order, LedgerError>;

    /// All orders uploaded by the user, oldest first. Empty history is signalled as [`LedgerError::NoOrders`].
    async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, LedgerError>;

    /// The user's spendable and lifetime-withdrawn points.
    async fn balance_for_user(&self, user_id: i64) -> Result<Balance, LedgerError>;

    /// Spends `sum` points against the given order number, atomically debiting the balance, crediting the
    /// withdrawn total and recording the withdrawal row.
    ///
    /// The order number is not required to exist in the orders table. The operation is not idempotent: two calls
    /// with the same number record two withdrawals.
    async fn withdraw(&self, user_id: i64, number: &OrderNumber, sum: Points) -> Result<(), LedgerError>;

    /// All withdrawals recorded for the user, oldest first. Empty history is signalled as
    /// [`LedgerError::NoWithdrawals`].
    async fn withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError>;

    /// Commits the final verdict of the accrual service for an order: updates status and accrual and, when the
    /// accrual is positive, credits the owner's balance, all in one transaction.
    ///
    /// An order that is already terminal is left untouched; the call succeeds without re-crediting.
    async fn commit_accrual(
        &self,
        number: &OrderNumber,
        status: OrderStatusType,
        accrual: Points,
    ) -> Result<(), LedgerError>;

    /// Every order still awaiting a terminal verdict (`NEW` or `PROCESSING`), oldest first. This is the recovery
    /// feed: the scheduler drains it once at startup.
    async fn pending_orders(&self) -> Result<Vec<OrderTicket>, LedgerError>;
}

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("login already in use")]
    LoginTaken,
    #[error("incorrect user credentials")]
    NoSuchUser,
    #[error("order already uploaded by this user")]
    OrderOwnedBySameUser,
    #[error("order already uploaded by different user")]
    OrderOwnedByDifferentUser,
    #[error("no orders found")]
    NoOrders,
    #[error("no withdrawals found")]
    NoWithdrawals,
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error("withdrawal sum must be positive")]
    NonPositiveWithdrawal,
    #[error("order {0} is not in the ledger")]
    OrderNotFound(OrderNumber),
    #[error("storage fault: {0}")]
    StorageFault(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::StorageFault(e.to_string())
    }
}
