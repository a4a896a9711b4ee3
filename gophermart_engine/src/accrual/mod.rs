//! The dialogue with the external accrual service.
//!
//! One poll of the service produces exactly one [`PollOutcome`]; transport and decoding failures are folded into
//! the outcome rather than surfaced as errors, because the scheduler treats every non-terminal outcome the same
//! way: log it, requeue the order and try again later.
mod client;

use std::time::Duration;

use async_trait::async_trait;
use gm_common::Points;

pub use client::AccrualHttpClient;

use crate::db_types::{OrderNumber, OrderStatusType};

/// The classified result of polling the accrual service for one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The verdict is in: `Processed` with a (possibly zero) reward, or `Invalid` with none. Commit it and stop
    /// polling this order.
    Terminal { status: OrderStatusType, accrual: Points },
    /// The service is still computing. Poll again later.
    InProgress,
    /// The service asked us to slow down; the new cadence applies to every in-flight order, not just this one.
    RateLimited(Duration),
    /// The service has never heard of this order. Polled again later in case registration is lagging.
    Unregistered,
    /// The service could not be reached or spoke gibberish.
    TransportFault(String),
}

/// A source of accrual verdicts. The production implementation is [`AccrualHttpClient`].
#[async_trait]
pub trait AccrualPoller: Send + Sync + 'static {
    async fn poll_order(&self, number: &OrderNumber) -> PollOutcome;
}
