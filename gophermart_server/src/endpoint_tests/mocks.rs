use async_trait::async_trait;
use gm_common::Points;
use gophermart_engine::{
    accrual::{AccrualPoller, PollOutcome},
    db_types::{Balance, Order, OrderNumber, OrderStatusType, OrderTicket, UserCredentials, Withdrawal},
    scheduler::{AccrualScheduler, SchedulerHandle},
    traits::{LedgerDatabase, LedgerError},
};
use mockall::mock;

mock! {
    pub Ledger {}

    impl Clone for Ledger {
        fn clone(&self) -> Self;
    }

    #[async_trait]
    impl LedgerDatabase for Ledger {
        fn url(&self) -> &str;
        async fn create_user(&self, login: &str, password_hash: &str) -> Result<i64, LedgerError>;
        async fn user_credentials(&self, login: &str) -> Result<UserCredentials, LedgerError>;
        async fn insert_order(&self, number: &OrderNumber, user_id: i64) -> Result<Order, LedgerError>;
        async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, LedgerError>;
        async fn balance_for_user(&self, user_id: i64) -> Result<Balance, LedgerError>;
        async fn withdraw(&self, user_id: i64, number: &OrderNumber, sum: Points) -> Result<(), LedgerError>;
        async fn withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError>;
        async fn commit_accrual(
            &self,
            number: &OrderNumber,
            status: OrderStatusType,
            accrual: Points,
        ) -> Result<(), LedgerError>;
        async fn pending_orders(&self) -> Result<Vec<OrderTicket>, LedgerError>;
    }
}

mock! {
    pub Accrual {}

    #[async_trait]
    impl AccrualPoller for Accrual {
        async fn poll_order(&self, number: &OrderNumber) -> PollOutcome;
    }
}

/// A handle whose scheduler is not running; pushed tickets are dropped with a warning, which is all the
/// endpoint tests need.
pub fn detached_scheduler_handle() -> SchedulerHandle {
    AccrualScheduler::new(MockLedger::new(), MockAccrual::new()).handle()
}
