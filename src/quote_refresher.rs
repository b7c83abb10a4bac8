//! # Debounced Quote Refresher
//!
//! Recomputes the cross-chain fee/amount estimate as user input changes,
//! calling the (opaque, slow, occasionally failing) bridge quote capability at
//! most once per quiescence period.
//!
//! State machine: `Idle -> Pending(timer) -> InFlight(request_id)`. Every
//! input change restarts the quiescence timer; when it elapses the refresher
//! issues a [`QuoteRequest`] with a fresh monotonically increasing
//! `request_id` and calls the fee estimate then the amount estimate,
//! sequentially. Only the response matching the latest issued id may update
//! the published quote; a slow early response can never overwrite a later
//! one's result. A fresh failure surfaces a single [`QuoteError`]
//! notification and returns to `Idle` with the prior quote left in place.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::types::U256;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::types::{QuoteRequest, QuoteResult};

/// Opaque bridge quote capability (external SDK / quote API). May throw.
#[async_trait]
pub trait QuoteEstimator: Send + Sync {
    async fn estimate_relayer_fee(
        &self,
        origin_domain: &str,
        destination_domain: &str,
    ) -> anyhow::Result<U256>;

    async fn estimate_amount_received(
        &self,
        request: &QuoteRequest,
    ) -> anyhow::Result<Option<U256>>;
}

/// A fee/amount estimate call failed for the latest issued request. The prior
/// published quote is retained; this is a one-shot user-facing notification.
#[derive(Debug, thiserror::Error)]
#[error("quote estimation failed: {source:#}")]
pub struct QuoteError {
    pub request_id: u64,
    #[source]
    pub source: anyhow::Error,
}

/// Watched input: the quote context plus the amount the user is typing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteInput {
    pub origin_domain: String,
    pub destination_domain: String,
    pub from_asset: ethers::types::Address,
    pub to_asset: ethers::types::Address,
    pub amount_in: U256,
}

/// Handle to a running refresher task.
pub struct QuoteRefresher {
    input_tx: mpsc::UnboundedSender<QuoteInput>,
    quote_rx: watch::Receiver<Option<QuoteResult>>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl QuoteRefresher {
    /// Spawn the refresher loop. Returns the handle plus the error
    /// notification stream (one entry per failed fresh request).
    pub fn spawn(
        estimator: Arc<dyn QuoteEstimator>,
        debounce: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<QuoteError>) {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (quote_tx, quote_rx) = watch::channel(None);
        let (error_tx, error_rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(refresh_loop(
            estimator, debounce, input_rx, quote_tx, error_tx, shutdown_rx,
        ));

        (
            Self {
                input_tx,
                quote_rx,
                shutdown,
                task,
            },
            error_rx,
        )
    }

    /// Feed an input change ((re)starts the quiescence timer).
    pub fn submit(&self, input: QuoteInput) {
        // A closed loop only happens after shutdown; inputs are then moot.
        let _ = self.input_tx.send(input);
    }

    /// Subscribe to the published quote. `None` until the first acceptance.
    pub fn quotes(&self) -> watch::Receiver<Option<QuoteResult>> {
        self.quote_rx.clone()
    }

    /// Latest accepted quote, if any.
    pub fn current_quote(&self) -> Option<QuoteResult> {
        self.quote_rx.borrow().clone()
    }

    /// Cancel any pending timer, mark in-flight requests stale, and stop.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

async fn refresh_loop(
    estimator: Arc<dyn QuoteEstimator>,
    debounce: Duration,
    mut input_rx: mpsc::UnboundedReceiver<QuoteInput>,
    quote_tx: watch::Sender<Option<QuoteResult>>,
    error_tx: mpsc::UnboundedSender<QuoteError>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut pending: Option<QuoteInput> = None;
    let mut deadline = Instant::now();
    let mut latest_issued: u64 = 0;
    let (result_tx, mut result_rx) =
        mpsc::unbounded_channel::<(u64, anyhow::Result<QuoteResult>)>();

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                debug!("🛑 [QuoteRefresher] Shutdown, dropping pending + in-flight work");
                break;
            }
            maybe_input = input_rx.recv() => {
                match maybe_input {
                    Some(input) => {
                        // Idle/Pending/InFlight -> Pending: restart quiescence timer.
                        pending = Some(input);
                        deadline = Instant::now() + debounce;
                    }
                    None => break,
                }
            }
            _ = tokio::time::sleep_until(deadline), if pending.is_some() => {
                // Pending -> InFlight with a fresh request id.
                let input = pending.take().expect("guarded by pending.is_some()");
                latest_issued += 1;
                let request = QuoteRequest {
                    origin_domain: input.origin_domain,
                    destination_domain: input.destination_domain,
                    from_asset: input.from_asset,
                    to_asset: input.to_asset,
                    amount_in: input.amount_in,
                    request_id: latest_issued,
                };
                debug!(request_id = request.request_id, "📊 [QuoteRefresher] Issuing quote request");

                let estimator = Arc::clone(&estimator);
                let result_tx = result_tx.clone();
                tokio::spawn(async move {
                    let outcome = run_estimates(estimator.as_ref(), &request).await;
                    let _ = result_tx.send((request.request_id, outcome));
                });
            }
            Some((request_id, outcome)) = result_rx.recv() => {
                if request_id != latest_issued {
                    // Superseded request: normal control flow, not an error.
                    debug!(request_id, latest_issued, "🔁 [QuoteRefresher] Discarding stale response");
                    continue;
                }
                match outcome {
                    Ok(result) => {
                        info!(request_id, "✅ [QuoteRefresher] Quote accepted");
                        quote_tx.send_replace(Some(result));
                    }
                    Err(source) => {
                        // Back to Idle; prior quote stays published.
                        warn!(request_id, "⚠️ [QuoteRefresher] Quote failed: {source:#}");
                        let _ = error_tx.send(QuoteError { request_id, source });
                    }
                }
            }
        }
    }
}

/// Fee estimate then amount estimate, sequentially, as one request.
async fn run_estimates(
    estimator: &dyn QuoteEstimator,
    request: &QuoteRequest,
) -> anyhow::Result<QuoteResult> {
    let relayer_fee = estimator
        .estimate_relayer_fee(&request.origin_domain, &request.destination_domain)
        .await?;
    let amount_out = estimator.estimate_amount_received(request).await?;
    Ok(QuoteResult {
        relayer_fee,
        amount_out,
    })
}
