use std::time::Duration;

use async_trait::async_trait;
use gm_common::Points;
use log::trace;
use reqwest::{header::RETRY_AFTER, Client, Response, StatusCode};
use serde::Deserialize;

use super::{AccrualPoller, PollOutcome};
use crate::db_types::{OrderNumber, OrderStatusType};

/// HTTP client for the external accrual service.
///
/// The wire contract is `GET {base}/api/orders/{number}`:
/// * 200 with a JSON body carrying the order's status and reward,
/// * 204 when the order is unknown to the service,
/// * 429 with a `Retry-After` header (seconds) when we poll too fast.
#[derive(Debug, Clone)]
pub struct AccrualHttpClient {
    base_url: String,
    client: Client,
}

/// Status vocabulary of the accrual service. `Registered` exists only on this wire; the ledger never stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
enum AccrualStatus {
    Registered,
    Processing,
    Invalid,
    Processed,
}

#[derive(Debug, Deserialize)]
struct AccrualReply {
    #[allow(dead_code)]
    order: String,
    status: AccrualStatus,
    #[serde(default)]
    accrual: Points,
}

impl AccrualHttpClient {
    pub fn new(base_url: &str) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_string(), client: Client::new() }
    }

    async fn classify(&self, response: Response) -> PollOutcome {
        match response.status() {
            StatusCode::NO_CONTENT => PollOutcome::Unregistered,
            StatusCode::TOO_MANY_REQUESTS => match retry_after(&response) {
                Some(delay) => PollOutcome::RateLimited(delay),
                None => PollOutcome::TransportFault("429 without a usable Retry-After header".to_string()),
            },
            StatusCode::OK => match response.json::<AccrualReply>().await {
                Ok(reply) => reply.into(),
                Err(e) => PollOutcome::TransportFault(format!("could not decode accrual response: {e}")),
            },
            status => PollOutcome::TransportFault(format!("unexpected response status {status}")),
        }
    }
}

impl From<AccrualReply> for PollOutcome {
    fn from(reply: AccrualReply) -> Self {
        match reply.status {
            AccrualStatus::Registered | AccrualStatus::Processing => PollOutcome::InProgress,
            AccrualStatus::Invalid => {
                PollOutcome::Terminal { status: OrderStatusType::Invalid, accrual: Points::default() }
            },
            AccrualStatus::Processed => {
                PollOutcome::Terminal { status: OrderStatusType::Processed, accrual: reply.accrual }
            },
        }
    }
}

#[async_trait]
impl AccrualPoller for AccrualHttpClient {
    async fn poll_order(&self, number: &OrderNumber) -> PollOutcome {
        let url = format!("{}/api/orders/{number}", self.base_url);
        trace!("📡️ Polling {url}");
        match self.client.get(&url).send().await {
            Ok(response) => self.classify(response).await,
            Err(e) => PollOutcome::TransportFault(e.to_string()),
        }
    }
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reply_with_reward_becomes_terminal() {
        let reply: AccrualReply =
            serde_json::from_str(r#"{"order":"12345678903","status":"PROCESSED","accrual":729.98}"#).unwrap();
        assert_eq!(
            PollOutcome::from(reply),
            PollOutcome::Terminal {
                status: OrderStatusType::Processed,
                accrual: Points::from_hundredths(72998)
            }
        );
    }

    #[test]
    fn invalid_reply_never_carries_a_reward() {
        let reply: AccrualReply =
            serde_json::from_str(r#"{"order":"12345678903","status":"INVALID","accrual":10}"#).unwrap();
        assert_eq!(
            PollOutcome::from(reply),
            PollOutcome::Terminal { status: OrderStatusType::Invalid, accrual: Points::default() }
        );
    }

    #[test]
    fn computing_replies_stay_in_progress() {
        for status in ["REGISTERED", "PROCESSING"] {
            let raw = format!(r#"{{"order":"12345678903","status":"{status}"}}"#);
            let reply: AccrualReply = serde_json::from_str(&raw).unwrap();
            assert_eq!(PollOutcome::from(reply), PollOutcome::InProgress);
        }
    }
}
