//! # xGreet SDK
//!
//! A Rust library for cross-chain greeting dapps built on a chain-abstraction
//! bridge: pay with an arbitrary token on an arbitrary chain, update a
//! greeting contract on the destination chain, and watch the greeting history
//! stay current.
//!
//! ## Overview
//!
//! The bridge itself (swap routing, relayer fees, cross-chain messaging) is an
//! external service consumed through narrow capability traits. What this SDK
//! implements is the engine around it:
//!
//! - **Backfill**: chunked `eth_getLogs` replay of the greeting history,
//!   windowed to respect provider span limits, strictly sequential.
//! - **Live tail**: a log subscription that re-reads contract state per event
//!   and merges it into the published list without reprocessing history.
//! - **Quote refresh**: a debounced fee/amount estimator with stale-response
//!   suppression keyed by monotonically increasing request ids.
//!
//! ## Architecture
//!
//! ### Sync Layer
//! `range_planner` (pure window math) feeds `log_synchronizer` (sequential
//! chunked fetch + decode), which seeds `sync_feed` (published
//! most-recent-first list); `tail_watcher` keeps the feed current.
//!
//! ### Quote Layer
//! `quote_refresher` debounces user input and drives a `QuoteEstimator`
//! capability; `bridge_quoter` is the HTTP implementation.
//!
//! ### Infrastructure
//! `chain_client` (ethers providers + contract bindings), `balance_api`
//! (balance-indexing HTTP client), `settings`, `utils`.

// Sync Layer
/// Pure block-range window planning
pub mod range_planner;
/// Chunked, sequential event log backfill
pub mod log_synchronizer;
/// Published most-recent-first event feed
pub mod sync_feed;
/// Live tail subscription consumer
pub mod tail_watcher;
/// Backfill + tail composition root
pub mod sync_service;

// Quote Layer
/// Debounced quote refresh state machine
pub mod quote_refresher;
/// HTTP quote service client
pub mod bridge_quoter;

// Infrastructure
/// ethers-backed chain capabilities
pub mod chain_client;
/// Smart contract ABIs (read-only surface)
pub mod contracts;
/// Balance-indexing API client
pub mod balance_api;
/// Common types
pub mod types;
/// Configuration management
pub mod settings;
/// Domain/chain lookup tables
pub mod utils;

// Re-exports for convenience
pub use chain_client::GreeterChainClient;
pub use quote_refresher::{QuoteEstimator, QuoteInput, QuoteRefresher};
pub use range_planner::plan_block_ranges;
pub use settings::Settings;
pub use sync_feed::SyncFeed;
pub use sync_service::{GreetingSyncConfig, GreetingSyncService};
pub use types::{BlockRange, QuoteRequest, QuoteResult, TraversalOrder};
