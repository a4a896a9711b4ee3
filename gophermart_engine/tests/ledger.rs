//! Integration tests for the SQLite ledger: every operation plus the monetary invariants.
use gm_common::Points;
use gophermart_engine::{
    db_types::{OrderNumber, OrderStatusType},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{LedgerDatabase, LedgerError},
    SqliteDatabase,
};

async fn new_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating test database")
}

#[tokio::test]
async fn registration_and_credentials() {
    let db = new_db().await;
    let id = db.create_user("gopher", "hash-1").await.unwrap();
    let creds = db.user_credentials("gopher").await.unwrap();
    assert_eq!(creds.id, id);
    assert_eq!(creds.login, "gopher");
    assert_eq!(creds.password, "hash-1");

    let err = db.create_user("gopher", "hash-2").await.unwrap_err();
    assert!(matches!(err, LedgerError::LoginTaken));
    let err = db.user_credentials("nobody").await.unwrap_err();
    assert!(matches!(err, LedgerError::NoSuchUser));
}

#[tokio::test]
async fn order_ownership_is_immutable() {
    let db = new_db().await;
    let alice = db.create_user("alice", "h").await.unwrap();
    let bob = db.create_user("bob", "h").await.unwrap();
    let number = OrderNumber::from("12345678903");

    let order = db.insert_order(&number, alice).await.unwrap();
    assert_eq!(order.status, OrderStatusType::New);
    assert_eq!(order.user_id, alice);

    let err = db.insert_order(&number, alice).await.unwrap_err();
    assert!(matches!(err, LedgerError::OrderOwnedBySameUser));
    let err = db.insert_order(&number, bob).await.unwrap_err();
    assert!(matches!(err, LedgerError::OrderOwnedByDifferentUser));

    // The conflict did not move the order.
    let orders = db.orders_for_user(alice).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].user_id, alice);
    assert!(matches!(db.orders_for_user(bob).await.unwrap_err(), LedgerError::NoOrders));
}

#[tokio::test]
async fn order_listing_is_oldest_first() {
    let db = new_db().await;
    let user = db.create_user("gopher", "h").await.unwrap();
    assert!(matches!(db.orders_for_user(user).await.unwrap_err(), LedgerError::NoOrders));

    for number in ["12345678903", "49927398716", "79927398713"] {
        db.insert_order(&OrderNumber::from(number), user).await.unwrap();
    }
    let orders = db.orders_for_user(user).await.unwrap();
    let numbers: Vec<&str> = orders.iter().map(|o| o.number.as_str()).collect();
    assert_eq!(numbers, vec!["12345678903", "49927398716", "79927398713"]);
}

#[tokio::test]
async fn processed_accrual_credits_the_owner() {
    let db = new_db().await;
    let user = db.create_user("gopher", "h").await.unwrap();
    let number = OrderNumber::from("12345678903");
    db.insert_order(&number, user).await.unwrap();

    db.commit_accrual(&number, OrderStatusType::Processed, Points::from_points(42)).await.unwrap();

    let orders = db.orders_for_user(user).await.unwrap();
    assert_eq!(orders[0].status, OrderStatusType::Processed);
    assert_eq!(orders[0].accrual, Points::from_points(42));
    let balance = db.balance_for_user(user).await.unwrap();
    assert_eq!(balance.current, Points::from_points(42));
    assert_eq!(balance.withdrawn, Points::default());
}

#[tokio::test]
async fn invalid_orders_earn_nothing() {
    let db = new_db().await;
    let user = db.create_user("gopher", "h").await.unwrap();
    let number = OrderNumber::from("12345678903");
    db.insert_order(&number, user).await.unwrap();

    db.commit_accrual(&number, OrderStatusType::Invalid, Points::default()).await.unwrap();

    let orders = db.orders_for_user(user).await.unwrap();
    assert_eq!(orders[0].status, OrderStatusType::Invalid);
    assert_eq!(db.balance_for_user(user).await.unwrap().current, Points::default());
}

#[tokio::test]
async fn terminal_verdicts_are_sticky() {
    let db = new_db().await;
    let user = db.create_user("gopher", "h").await.unwrap();
    let number = OrderNumber::from("12345678903");
    db.insert_order(&number, user).await.unwrap();
    db.commit_accrual(&number, OrderStatusType::Processed, Points::from_points(42)).await.unwrap();

    // A second verdict neither re-credits nor rewrites the status.
    db.commit_accrual(&number, OrderStatusType::Processed, Points::from_points(42)).await.unwrap();
    db.commit_accrual(&number, OrderStatusType::Invalid, Points::default()).await.unwrap();

    let orders = db.orders_for_user(user).await.unwrap();
    assert_eq!(orders[0].status, OrderStatusType::Processed);
    assert_eq!(db.balance_for_user(user).await.unwrap().current, Points::from_points(42));
}

#[tokio::test]
async fn accrual_for_unknown_order_is_an_error() {
    let db = new_db().await;
    let err = db
        .commit_accrual(&OrderNumber::from("12345678903"), OrderStatusType::Processed, Points::from_points(1))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::OrderNotFound(_)));
}

#[tokio::test]
async fn withdrawal_debits_and_records() {
    let db = new_db().await;
    let user = db.create_user("gopher", "h").await.unwrap();
    let number = OrderNumber::from("12345678903");
    db.insert_order(&number, user).await.unwrap();
    db.commit_accrual(&number, OrderStatusType::Processed, Points::from_points(42)).await.unwrap();

    db.withdraw(user, &OrderNumber::from("49927398716"), Points::from_points(10)).await.unwrap();

    let balance = db.balance_for_user(user).await.unwrap();
    assert_eq!(balance.current, Points::from_points(32));
    assert_eq!(balance.withdrawn, Points::from_points(10));
    let withdrawals = db.withdrawals_for_user(user).await.unwrap();
    assert_eq!(withdrawals.len(), 1);
    assert_eq!(withdrawals[0].order_number.as_str(), "49927398716");
    assert_eq!(withdrawals[0].sum, Points::from_points(10));
}

#[tokio::test]
async fn overdraft_rolls_back_completely() {
    let db = new_db().await;
    let user = db.create_user("gopher", "h").await.unwrap();
    let number = OrderNumber::from("12345678903");
    db.insert_order(&number, user).await.unwrap();
    db.commit_accrual(&number, OrderStatusType::Processed, Points::from_points(42)).await.unwrap();

    let err = db.withdraw(user, &OrderNumber::from("49927398716"), Points::from_points(100)).await.unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds));

    // Neither side of the double entry moved, and no withdrawal row exists.
    let balance = db.balance_for_user(user).await.unwrap();
    assert_eq!(balance.current, Points::from_points(42));
    assert_eq!(balance.withdrawn, Points::default());
    assert!(matches!(db.withdrawals_for_user(user).await.unwrap_err(), LedgerError::NoWithdrawals));
}

#[tokio::test]
async fn non_positive_withdrawals_are_rejected() {
    let db = new_db().await;
    let user = db.create_user("gopher", "h").await.unwrap();
    for sum in [Points::default(), Points::from_points(-5)] {
        let err = db.withdraw(user, &OrderNumber::from("49927398716"), sum).await.unwrap_err();
        assert!(matches!(err, LedgerError::NonPositiveWithdrawal));
    }
}

#[tokio::test]
async fn balances_obey_double_entry() {
    let db = new_db().await;
    let user = db.create_user("gopher", "h").await.unwrap();
    let first = OrderNumber::from("12345678903");
    let second = OrderNumber::from("49927398716");
    db.insert_order(&first, user).await.unwrap();
    db.insert_order(&second, user).await.unwrap();
    db.commit_accrual(&first, OrderStatusType::Processed, Points::try_from(729.98).unwrap()).await.unwrap();
    db.commit_accrual(&second, OrderStatusType::Processed, Points::from_points(20)).await.unwrap();
    db.withdraw(user, &OrderNumber::from("79927398713"), Points::from_points(100)).await.unwrap();
    db.withdraw(user, &OrderNumber::from("79927398713"), Points::try_from(0.5).unwrap()).await.unwrap();

    let balance = db.balance_for_user(user).await.unwrap();
    let credited: Points = db
        .orders_for_user(user)
        .await
        .unwrap()
        .iter()
        .filter(|o| o.status == OrderStatusType::Processed)
        .map(|o| o.accrual)
        .sum();
    let spent: Points = db.withdrawals_for_user(user).await.unwrap().iter().map(|w| w.sum).sum();
    assert_eq!(balance.current, credited - spent);
    assert_eq!(balance.withdrawn, spent);
}

#[tokio::test]
async fn pending_orders_feed_skips_settled_rows() {
    let db = new_db().await;
    let user = db.create_user("gopher", "h").await.unwrap();
    let settled = OrderNumber::from("12345678903");
    let waiting = OrderNumber::from("49927398716");
    db.insert_order(&settled, user).await.unwrap();
    db.insert_order(&waiting, user).await.unwrap();
    db.commit_accrual(&settled, OrderStatusType::Invalid, Points::default()).await.unwrap();

    let pending = db.pending_orders().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].number, waiting);
    assert_eq!(pending[0].user_id, user);
    assert_eq!(pending[0].attempts, 0);
}
