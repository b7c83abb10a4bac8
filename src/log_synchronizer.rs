//! # Chunked Event Log Synchronizer
//!
//! Replays a planned sequence of block ranges through an injected log-fetch
//! capability, one `eth_getLogs` call per window, and accumulates decoded
//! values in the caller's chosen traversal order.
//!
//! Fetches are strictly sequential. Public RPC endpoints rate-limit burst
//! `getLogs` calls, so the synchronizer never has more than one request in
//! flight; this is a backpressure policy, not a limitation.
//!
//! The synchronizer performs no retries. A failed window aborts the run with
//! [`PartialSyncError`] so the caller can retry from the failing range or
//! abandon with the partial result.

use async_trait::async_trait;
use ethers::types::Log;
use log::{debug, info};

use crate::types::{BlockRange, TraversalOrder};

/// Log-fetch capability for one block range (typically a filtered
/// `eth_getLogs` against a single contract address + topic0).
#[async_trait]
pub trait LogFetcher: Send + Sync {
    async fn fetch_logs(&self, range: BlockRange) -> anyhow::Result<Vec<Log>>;
}

/// One window's fetch failed after earlier windows succeeded.
///
/// `partial` holds everything decoded before the failure, in the requested
/// traversal order and untruncated. `failed_range` identifies where to resume.
#[derive(Debug, thiserror::Error)]
#[error("log sync failed at range {failed_range} with {} event(s) accumulated: {source}", partial.len())]
pub struct PartialSyncError<T: std::fmt::Debug> {
    pub partial: Vec<T>,
    pub failed_range: BlockRange,
    #[source]
    pub source: anyhow::Error,
}

/// Backfill decoded events across a planned set of windows.
///
/// * `plan` - oldest-to-newest windows from the planner.
/// * `fetcher` - injected log source; called exactly once per window, sequentially.
/// * `decode` - extracts a value from a raw log; `None` (non-matching event
///   signature) drops the log without error.
/// * `max_retained` - cap applied after the full plan completes; the oldest
///   entries are discarded, never the newest.
/// * `order` - `NewestFirst` walks windows (and each window's logs) newest to
///   oldest so index 0 of the result is the most recent event; `OldestFirst`
///   yields chronological order.
///
/// Re-running with an identical plan against an unchanged log source returns
/// an identical result (given a pure `decode`).
pub async fn sync_logs<T, F, D>(
    plan: &[BlockRange],
    fetcher: &F,
    decode: D,
    max_retained: usize,
    order: TraversalOrder,
) -> Result<Vec<T>, PartialSyncError<T>>
where
    T: std::fmt::Debug,
    F: LogFetcher + ?Sized,
    D: Fn(&Log) -> Option<T>,
{
    let mut accumulated: Vec<T> = Vec::new();

    let windows: Vec<BlockRange> = match order {
        TraversalOrder::OldestFirst => plan.to_vec(),
        TraversalOrder::NewestFirst => plan.iter().rev().copied().collect(),
    };

    for window in windows {
        let logs = match fetcher.fetch_logs(window).await {
            Ok(logs) => logs,
            Err(source) => {
                return Err(PartialSyncError {
                    partial: accumulated,
                    failed_range: window,
                    source,
                });
            }
        };

        debug!(
            "📊 [LogSync] Window {} returned {} raw log(s)",
            window,
            logs.len()
        );

        match order {
            TraversalOrder::OldestFirst => {
                accumulated.extend(logs.iter().filter_map(&decode));
            }
            TraversalOrder::NewestFirst => {
                accumulated.extend(logs.iter().rev().filter_map(&decode));
            }
        }
    }

    let decoded_total = accumulated.len();
    match order {
        // Newest entries live at the head; drop the tail.
        TraversalOrder::NewestFirst => accumulated.truncate(max_retained),
        // Newest entries live at the end; drop from the front.
        TraversalOrder::OldestFirst => {
            if accumulated.len() > max_retained {
                accumulated.drain(..accumulated.len() - max_retained);
            }
        }
    }

    info!(
        "✅ [LogSync] Backfill complete: {} window(s), {} decoded, {} retained",
        plan.len(),
        decoded_total,
        accumulated.len()
    );

    Ok(accumulated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory log source keyed by window start block.
    struct MapFetcher {
        logs_by_from: HashMap<u64, Vec<Log>>,
        calls: AtomicUsize,
        fail_at_from: Option<u64>,
    }

    impl MapFetcher {
        fn new(windows: Vec<(u64, Vec<&str>)>) -> Self {
            let logs_by_from = windows
                .into_iter()
                .map(|(from, greetings)| {
                    let logs = greetings.into_iter().map(text_log).collect();
                    (from, logs)
                })
                .collect();
            Self {
                logs_by_from,
                calls: AtomicUsize::new(0),
                fail_at_from: None,
            }
        }
    }

    /// Smuggle a decoded string through `Log.data` for tests.
    fn text_log(text: &str) -> Log {
        Log {
            data: text.as_bytes().to_vec().into(),
            ..Default::default()
        }
    }

    fn text_decode(log: &Log) -> Option<String> {
        String::from_utf8(log.data.to_vec()).ok()
    }

    #[async_trait]
    impl LogFetcher for MapFetcher {
        async fn fetch_logs(&self, range: BlockRange) -> anyhow::Result<Vec<Log>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_at_from == Some(range.from) {
                anyhow::bail!("provider timeout");
            }
            Ok(self.logs_by_from.get(&range.from).cloned().unwrap_or_default())
        }
    }

    #[tokio::test]
    async fn test_empty_source_yields_empty_result() {
        let plan = vec![BlockRange::new(0, 99), BlockRange::new(100, 199)];
        let fetcher = MapFetcher::new(vec![]);
        let result = sync_logs(&plan, &fetcher, text_decode, 10, TraversalOrder::NewestFirst)
            .await
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_newest_first_ordering() {
        // ["hi"] in [500,800], ["there"] in [801,1000].
        let plan = vec![BlockRange::new(500, 800), BlockRange::new(801, 1000)];
        let fetcher = MapFetcher::new(vec![(500, vec!["hi"]), (801, vec!["there"])]);
        let result = sync_logs(&plan, &fetcher, text_decode, 10, TraversalOrder::NewestFirst)
            .await
            .unwrap();
        assert_eq!(result, vec!["there".to_string(), "hi".to_string()]);
    }

    #[tokio::test]
    async fn test_oldest_first_ordering() {
        let plan = vec![BlockRange::new(500, 800), BlockRange::new(801, 1000)];
        let fetcher = MapFetcher::new(vec![(500, vec!["hi"]), (801, vec!["there"])]);
        let result = sync_logs(&plan, &fetcher, text_decode, 10, TraversalOrder::OldestFirst)
            .await
            .unwrap();
        assert_eq!(result, vec!["hi".to_string(), "there".to_string()]);
    }

    #[tokio::test]
    async fn test_non_matching_logs_dropped() {
        let plan = vec![BlockRange::new(0, 99)];
        let fetcher = MapFetcher::new(vec![(0, vec!["keep", "keep2"])]);
        // Decoder that rejects everything but "keep".
        let decode = |log: &Log| text_decode(log).filter(|s| s == "keep");
        let result = sync_logs(&plan, &fetcher, decode, 10, TraversalOrder::OldestFirst)
            .await
            .unwrap();
        assert_eq!(result, vec!["keep".to_string()]);
    }

    #[tokio::test]
    async fn test_truncation_keeps_newest() {
        let plan = vec![BlockRange::new(0, 99), BlockRange::new(100, 199)];
        let fetcher = MapFetcher::new(vec![(0, vec!["a", "b", "c"]), (100, vec!["d", "e"])]);

        let newest_first = sync_logs(&plan, &fetcher, text_decode, 3, TraversalOrder::NewestFirst)
            .await
            .unwrap();
        assert_eq!(newest_first, vec!["e", "d", "c"]);

        let oldest_first = sync_logs(&plan, &fetcher, text_decode, 3, TraversalOrder::OldestFirst)
            .await
            .unwrap();
        assert_eq!(oldest_first, vec!["c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_partial_failure_preserves_accumulated() {
        let plan = vec![
            BlockRange::new(0, 99),
            BlockRange::new(100, 199),
            BlockRange::new(200, 299),
            BlockRange::new(300, 399),
            BlockRange::new(400, 499),
        ];
        let mut fetcher = MapFetcher::new(vec![
            (0, vec!["w1"]),
            (100, vec!["w2"]),
            (300, vec!["w4"]),
            (400, vec!["w5"]),
        ]);
        fetcher.fail_at_from = Some(200);

        let err = sync_logs(&plan, &fetcher, text_decode, 10, TraversalOrder::OldestFirst)
            .await
            .unwrap_err();
        assert_eq!(err.partial, vec!["w1".to_string(), "w2".to_string()]);
        assert_eq!(err.failed_range, BlockRange::new(200, 299));
        // Windows after the failure were never fetched.
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_idempotent_reruns() {
        let plan = vec![BlockRange::new(0, 99), BlockRange::new(100, 199)];
        let fetcher = MapFetcher::new(vec![(0, vec!["x"]), (100, vec!["y", "z"])]);
        let first = sync_logs(&plan, &fetcher, text_decode, 10, TraversalOrder::NewestFirst)
            .await
            .unwrap();
        let second = sync_logs(&plan, &fetcher, text_decode, 10, TraversalOrder::NewestFirst)
            .await
            .unwrap();
        assert_eq!(first, second);
    }
}
