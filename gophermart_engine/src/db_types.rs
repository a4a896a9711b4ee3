use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use gm_common::Points;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------   OrderStatusType     -------------------------------------------------------
/// The lifecycle state of an uploaded order.
///
/// Transitions are monotonic: `New` → `Processing` → terminal, or `New` → terminal directly. `Invalid` and
/// `Processed` are terminal; an order in a terminal state is never polled again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatusType {
    /// The order has been uploaded and not yet handed to the accrual service.
    New,
    /// The accrual service is still computing the reward.
    Processing,
    /// The accrual service rejected the order. No points are awarded.
    Invalid,
    /// The accrual service finished; the reward (possibly zero) has been credited.
    Processed,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatusType::Invalid | OrderStatusType::Processed)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::New => write!(f, "NEW"),
            OrderStatusType::Processing => write!(f, "PROCESSING"),
            OrderStatusType::Invalid => write!(f, "INVALID"),
            OrderStatusType::Processed => write!(f, "PROCESSED"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct StatusConversionError(String);

impl FromStr for OrderStatusType {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "PROCESSING" => Ok(Self::Processing),
            "INVALID" => Ok(Self::Invalid),
            "PROCESSED" => Ok(Self::Processed),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

//--------------------------------------     OrderNumber       -------------------------------------------------------
/// A lightweight wrapper around the digit string identifying an order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(pub String);

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for OrderNumber {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct Order {
    pub id: i64,
    pub number: OrderNumber,
    pub status: OrderStatusType,
    pub accrual: Points,
    pub uploaded_at: DateTime<Utc>,
    pub user_id: i64,
}

//--------------------------------------     Withdrawal      ---------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct Withdrawal {
    pub id: i64,
    pub order_number: OrderNumber,
    pub sum: Points,
    pub processed_at: DateTime<Utc>,
    pub user_id: i64,
}

//--------------------------------------      Balance        ---------------------------------------------------------
/// A user's spendable and lifetime-spent points. `current` can never go negative; the storage layer enforces this.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Balance {
    pub current: Points,
    pub withdrawn: Points,
}

//--------------------------------------  UserCredentials    ---------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: i64,
    pub login: String,
    pub password: String,
}

//--------------------------------------    OrderTicket      ---------------------------------------------------------
/// A unit of scheduling work: one non-terminal order waiting for its next poll of the accrual service.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct OrderTicket {
    pub number: OrderNumber,
    pub user_id: i64,
    #[sqlx(default)]
    pub attempts: u32,
}

impl OrderTicket {
    pub fn new(number: OrderNumber, user_id: i64) -> Self {
        Self { number, user_id, attempts: 0 }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in
            [OrderStatusType::New, OrderStatusType::Processing, OrderStatusType::Invalid, OrderStatusType::Processed]
        {
            assert_eq!(status.to_string().parse::<OrderStatusType>().unwrap(), status);
        }
        assert!("PAID".parse::<OrderStatusType>().is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(OrderStatusType::Invalid.is_terminal());
        assert!(OrderStatusType::Processed.is_terminal());
        assert!(!OrderStatusType::New.is_terminal());
        assert!(!OrderStatusType::Processing.is_terminal());
    }

    #[test]
    fn status_serializes_to_wire_names() {
        assert_eq!(serde_json::to_string(&OrderStatusType::Processed).unwrap(), "\"PROCESSED\"");
        assert_eq!(serde_json::from_str::<OrderStatusType>("\"INVALID\"").unwrap(), OrderStatusType::Invalid);
    }
}
