//! # Greeting Sync Service
//!
//! Composition root for the greeting feed: plans the backfill windows, runs
//! the chunked synchronizer, publishes the result, then keeps the feed
//! current through the live tail watcher. Mirrors the dapp flow: history
//! first, live updates after, one shared most-recent-first list.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::chain_client::GreeterChainClient;
use crate::log_synchronizer::sync_logs;
use crate::range_planner::plan_block_ranges;
use crate::sync_feed::SyncFeed;
use crate::tail_watcher::{spawn_tail_watcher, TailWatcherHandle};
use crate::types::TraversalOrder;

#[derive(Debug, Clone)]
pub struct GreetingSyncConfig {
    /// How many blocks below the head the backfill starts from.
    pub blocks_lookback: u64,
    /// Provider-imposed maximum `eth_getLogs` span per call.
    pub max_blocks_per_call: u64,
    /// Greetings kept for display.
    pub max_retained: usize,
}

impl Default for GreetingSyncConfig {
    fn default() -> Self {
        Self {
            blocks_lookback: 100_000,
            max_blocks_per_call: 3_000,
            max_retained: 10,
        }
    }
}

pub struct GreetingSyncService {
    client: Arc<GreeterChainClient>,
    config: GreetingSyncConfig,
    feed: SyncFeed<String>,
}

impl GreetingSyncService {
    pub fn new(client: Arc<GreeterChainClient>, config: GreetingSyncConfig) -> Self {
        let feed = SyncFeed::new(config.max_retained);
        Self {
            client,
            config,
            feed,
        }
    }

    /// The published greeting list (most recent first).
    pub fn feed(&self) -> &SyncFeed<String> {
        &self.feed
    }

    /// Backfill the greeting history from logs and seed the feed.
    ///
    /// On a mid-plan fetch failure the partial result is still published (it
    /// is a valid most-recent-first prefix: newest windows are fetched first)
    /// and the error is propagated so the caller can decide to retry.
    pub async fn backfill(&self) -> Result<Vec<String>> {
        let head = self.client.get_chain_head().await?;
        let plan = match plan_block_ranges(
            head,
            self.config.blocks_lookback,
            self.config.max_blocks_per_call,
            None,
        ) {
            Ok(plan) => plan,
            Err(e) => {
                // Nothing to sync; keep the feed empty.
                warn!("⚠️ [GreetingSync] No backfill range: {e}");
                return Ok(Vec::new());
            }
        };

        info!(
            "📊 [GreetingSync] Backfilling {} window(s) below head {}",
            plan.len(),
            head
        );

        match sync_logs(
            &plan,
            self.client.as_ref(),
            GreeterChainClient::decode_greeting,
            self.config.max_retained,
            TraversalOrder::NewestFirst,
        )
        .await
        {
            Ok(greetings) => {
                self.feed.seed(greetings.clone());
                Ok(greetings)
            }
            Err(partial) => {
                warn!(
                    "⚠️ [GreetingSync] Backfill stopped at {}: publishing {} partial greeting(s)",
                    partial.failed_range,
                    partial.partial.len()
                );
                self.feed.seed(partial.partial.clone());
                Err(anyhow::Error::new(partial)).context("greeting backfill incomplete")
            }
        }
    }

    /// Subscribe to live `GreetingUpdated` events and keep the feed current.
    ///
    /// Uses `skip_initial_firing` because the log subscription replays
    /// already-known state once on creation; the backfill has that value.
    pub async fn start_tail_watcher(&self) -> Result<TailWatcherHandle> {
        let (signals, subscription_task) = self.client.subscribe_greeting_signals().await?;
        Ok(spawn_tail_watcher(
            signals,
            Arc::clone(&self.client),
            self.feed.clone(),
            true,
        )
        .with_bridge_task(subscription_task))
    }
}
