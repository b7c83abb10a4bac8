//! # Sync Feed
//!
//! Published most-recent-first event list shared between the backfill and the
//! live tail watcher. Built on a `tokio::sync::watch` channel so any number of
//! consumers (UI, CLI, tests) observe every accepted update.
//!
//! Writes are monotonic with respect to recency: the backfill seeds the list
//! once, and the tail watcher only prepends at the head. Head-prepend
//! de-duplicates against the current head entry, so a subscription firing
//! twice for one event (or replaying known state) never double-inserts.

use log::debug;
use std::sync::Arc;
use tokio::sync::watch;

/// Capped, most-recent-first list of decoded event values.
#[derive(Debug)]
pub struct SyncFeed<T> {
    tx: Arc<watch::Sender<Vec<T>>>,
    max_retained: usize,
}

impl<T> Clone for SyncFeed<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
            max_retained: self.max_retained,
        }
    }
}

impl<T> SyncFeed<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create an empty feed retaining at most `max_retained` entries.
    pub fn new(max_retained: usize) -> Self {
        let (tx, _) = watch::channel(Vec::new());
        Self {
            tx: Arc::new(tx),
            max_retained,
        }
    }

    /// Seed the feed with a backfill result (already most-recent-first).
    /// Truncates to the retention cap; replaces any previous contents.
    pub fn seed(&self, mut items: Vec<T>) {
        items.truncate(self.max_retained);
        self.tx.send_replace(items);
    }

    /// Prepend a fresh head value from the live tail.
    ///
    /// Returns `false` without publishing when `value` equals the current head
    /// (duplicate subscription fire or initial replay).
    pub fn push_head(&self, value: T) -> bool {
        self.tx.send_if_modified(|items| {
            if items.first() == Some(&value) {
                debug!("🔁 [SyncFeed] Head unchanged, skipping duplicate update");
                return false;
            }
            items.insert(0, value);
            items.truncate(self.max_retained);
            true
        })
    }

    /// Current contents, most recent first.
    pub fn snapshot(&self) -> Vec<T> {
        self.tx.borrow().clone()
    }

    /// Most recent entry, if any.
    pub fn head(&self) -> Option<T> {
        self.tx.borrow().first().cloned()
    }

    /// Subscribe to feed updates. The receiver sees the current value
    /// immediately and every accepted change thereafter.
    pub fn subscribe(&self) -> watch::Receiver<Vec<T>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_truncates_to_cap() {
        let feed: SyncFeed<String> = SyncFeed::new(2);
        feed.seed(vec!["c".into(), "b".into(), "a".into()]);
        assert_eq!(feed.snapshot(), vec!["c".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_push_head_dedupes() {
        let feed: SyncFeed<String> = SyncFeed::new(10);
        feed.seed(vec!["hello".into()]);

        assert!(feed.push_head("world".into()));
        // Same value again: subscription replay / double fire.
        assert!(!feed.push_head("world".into()));

        assert_eq!(feed.snapshot(), vec!["world".to_string(), "hello".to_string()]);
    }

    #[test]
    fn test_push_head_respects_cap() {
        let feed: SyncFeed<u32> = SyncFeed::new(3);
        for i in 0..5 {
            assert!(feed.push_head(i));
        }
        assert_eq!(feed.snapshot(), vec![4, 3, 2]);
    }

    #[tokio::test]
    async fn test_subscribers_observe_updates() {
        let feed: SyncFeed<String> = SyncFeed::new(10);
        let mut rx = feed.subscribe();

        feed.push_head("gm".into());
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), vec!["gm".to_string()]);

        // Duplicate push publishes nothing.
        feed.push_head("gm".into());
        assert!(!rx.has_changed().unwrap());
    }
}
