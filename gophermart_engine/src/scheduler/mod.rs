//! The accrual scheduling pipeline.
//!
//! A single dispatch loop feeds pending orders to the accrual service under a shared cadence gate:
//!
//! ```text
//! push(ticket) → queue → (pacer.acquire) → spawn poll → classify → commit | requeue
//! ```
//!
//! The queue is unbounded and FIFO. At most one copy of an order is ever in circulation: only a committed
//! terminal verdict removes an order, every other outcome re-enqueues the same ticket — and the requeue is done
//! by the finished poll task through its own sender, so the dispatch loop never blocks on its own queue.
mod pacer;

use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::{mpsc, watch};

pub use pacer::{PollPacer, DEFAULT_POLL_INTERVAL};

use crate::{
    accrual::{AccrualPoller, PollOutcome},
    db_types::OrderTicket,
    traits::{LedgerDatabase, LedgerError},
};

/// Drives every non-terminal order to a terminal status.
///
/// Construct one, keep a [`SchedulerHandle`] for the HTTP layer, and hand the scheduler itself to
/// [`AccrualScheduler::run`] on a spawned task. `run` first replays every pending order from the ledger, so no
/// order is lost across a restart.
pub struct AccrualScheduler<B, C> {
    db: B,
    poller: Arc<C>,
    pacer: Arc<PollPacer>,
    queue_tx: mpsc::UnboundedSender<OrderTicket>,
    queue_rx: mpsc::UnboundedReceiver<OrderTicket>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

/// A cloneable handle for pushing freshly accepted orders and stopping the scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    queue: mpsc::UnboundedSender<OrderTicket>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl SchedulerHandle {
    /// Enqueues an order for polling. Never blocks. Push an order exactly once, right after its first successful
    /// insert; retries are the scheduler's own business.
    pub fn push(&self, ticket: OrderTicket) {
        if let Err(e) = self.queue.send(ticket) {
            warn!("🔁️ Scheduler is not running; dropping order {}", e.0.number);
        }
    }

    /// Stops the dispatch loop. Idempotent; in-flight polls observe the cancellation on their next await.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }
}

impl<B, C> AccrualScheduler<B, C>
where
    B: LedgerDatabase,
    C: AccrualPoller,
{
    pub fn new(db: B, poller: C) -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            db,
            poller: Arc::new(poller),
            pacer: Arc::new(PollPacer::default()),
            queue_tx,
            queue_rx,
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        }
    }

    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle { queue: self.queue_tx.clone(), shutdown: Arc::clone(&self.shutdown_tx) }
    }

    /// The shared cadence gate. Exposed for observability and tests.
    pub fn pacer(&self) -> Arc<PollPacer> {
        Arc::clone(&self.pacer)
    }

    /// Replays every pending order from the ledger, then dispatches polls until stopped.
    pub async fn run(mut self) -> Result<(), LedgerError> {
        let pending = self.db.pending_orders().await?;
        info!("🔁️ Recovered {} pending orders from the ledger", pending.len());
        for ticket in pending {
            // Safe: we hold the receiver, so the channel cannot be closed yet.
            let _ = self.queue_tx.send(ticket);
        }

        loop {
            let ticket = tokio::select! {
                _ = self.shutdown_rx.changed() => break,
                ticket = self.queue_rx.recv() => match ticket {
                    Some(ticket) => ticket,
                    None => break,
                },
            };
            tokio::select! {
                _ = self.shutdown_rx.changed() => break,
                _ = self.pacer.acquire() => {},
            }
            self.spawn_poll(ticket);
        }
        info!("🔁️ Scheduler stopped");
        Ok(())
    }

    /// Launches one fire-and-forget poll. The dispatch loop does not wait for the result; classification and
    /// requeueing happen on the spawned task.
    fn spawn_poll(&self, ticket: OrderTicket) {
        let db = self.db.clone();
        let poller = Arc::clone(&self.poller);
        let pacer = Arc::clone(&self.pacer);
        let requeue = self.queue_tx.clone();
        tokio::spawn(async move {
            let outcome = poller.poll_order(&ticket.number).await;
            settle(db, pacer, requeue, ticket, outcome).await;
        });
    }
}

/// Classifies one poll outcome and decides the order's fate.
async fn settle<B: LedgerDatabase>(
    db: B,
    pacer: Arc<PollPacer>,
    requeue: mpsc::UnboundedSender<OrderTicket>,
    mut ticket: OrderTicket,
    outcome: PollOutcome,
) {
    ticket.attempts += 1;
    match outcome {
        PollOutcome::Terminal { status, accrual } => {
            pacer.reset();
            match db.commit_accrual(&ticket.number, status, accrual).await {
                Ok(()) => debug!("🔁️ Order {} reached {status} after {} polls", ticket.number, ticket.attempts),
                Err(e) => {
                    error!("🔁️ Order {}: could not commit accrual: {e}", ticket.number);
                    push_back(&requeue, ticket);
                },
            }
        },
        PollOutcome::InProgress => {
            pacer.reset();
            push_back(&requeue, ticket);
        },
        PollOutcome::RateLimited(delay) => {
            if pacer.interval() != delay {
                info!("🔁️ Accrual service is throttling us; widening the poll interval to {delay:?}");
                pacer.set_interval(delay);
            }
            push_back(&requeue, ticket);
        },
        PollOutcome::Unregistered => {
            debug!("🔁️ Order {} is not registered with the accrual service yet", ticket.number);
            push_back(&requeue, ticket);
        },
        PollOutcome::TransportFault(e) => {
            warn!("🔁️ Order {}: {e}", ticket.number);
            push_back(&requeue, ticket);
        },
    }
}

fn push_back(requeue: &mpsc::UnboundedSender<OrderTicket>, ticket: OrderTicket) {
    if let Err(e) = requeue.send(ticket) {
        debug!("🔁️ Scheduler is draining; order {} stays pending in the ledger", e.0.number);
    }
}
