use chrono::{DateTime, Utc};
use gm_common::Points;
use gophermart_engine::db_types::{Order, OrderNumber, OrderStatusType, Withdrawal};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    pub number: OrderNumber,
    pub status: OrderStatusType,
    #[serde(skip_serializing_if = "Points::is_zero")]
    pub accrual: Points,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self { number: order.number, status: order.status, accrual: order.accrual, uploaded_at: order.uploaded_at }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawRequest {
    pub order: String,
    pub sum: Points,
}

#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalResponse {
    pub order: OrderNumber,
    pub sum: Points,
    pub processed_at: DateTime<Utc>,
}

impl From<Withdrawal> for WithdrawalResponse {
    fn from(withdrawal: Withdrawal) -> Self {
        Self { order: withdrawal.order_number, sum: withdrawal.sum, processed_at: withdrawal.processed_at }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn zero_accrual_is_omitted_from_order_json() {
        let uploaded_at = Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap();
        let waiting = OrderResponse {
            number: OrderNumber::from("12345678903"),
            status: OrderStatusType::New,
            accrual: Points::default(),
            uploaded_at,
        };
        assert_eq!(
            serde_json::to_string(&waiting).unwrap(),
            r#"{"number":"12345678903","status":"NEW","uploaded_at":"2024-02-29T13:30:00Z"}"#
        );

        let rewarded = OrderResponse { status: OrderStatusType::Processed, accrual: Points::from_points(42), ..waiting };
        assert_eq!(
            serde_json::to_string(&rewarded).unwrap(),
            r#"{"number":"12345678903","status":"PROCESSED","accrual":42.0,"uploaded_at":"2024-02-29T13:30:00Z"}"#
        );
    }

    #[test]
    fn withdraw_request_accepts_fractional_sums() {
        let request: WithdrawRequest = serde_json::from_str(r#"{"order":"49927398716","sum":10.5}"#).unwrap();
        assert_eq!(request.order, "49927398716");
        assert_eq!(request.sum, Points::from_hundredths(1050));
    }
}
