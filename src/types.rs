// Common types shared across the sync and quote layers

use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

/// Inclusive block range for a single `eth_getLogs` call.
/// Invariant: `from <= to` and `to - from <= max_span` for planner-produced ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRange {
    pub from: u64,
    pub to: u64,
}

impl BlockRange {
    pub fn new(from: u64, to: u64) -> Self {
        debug_assert!(from <= to, "BlockRange requires from <= to");
        Self { from, to }
    }

    /// Width of the range as `to - from` (an N-block call covers span + 1 blocks).
    pub fn span(&self) -> u64 {
        self.to - self.from
    }
}

impl std::fmt::Display for BlockRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.from, self.to)
    }
}

/// Direction in which backfill windows (and logs within each window) are consumed.
///
/// `NewestFirst` yields a most-recent-first result suitable for direct display;
/// `OldestFirst` yields chronological order. The truncation policy always drops the
/// oldest entries, whichever end they live at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalOrder {
    OldestFirst,
    NewestFirst,
}

/// One quote computation issued by the refresher.
///
/// `request_id` is monotonically increasing; only the response matching the latest
/// issued id may update published state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub origin_domain: String,
    pub destination_domain: String,
    pub from_asset: Address,
    pub to_asset: Address,
    pub amount_in: U256,
    pub request_id: u64,
}

/// Result of a fee + amount estimate round. Replaced wholesale on each accepted
/// response, never partially merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteResult {
    pub relayer_fee: U256,
    /// None when the quote service could not produce an amount for the pair.
    pub amount_out: Option<U256>,
}

/// Token balance row as surfaced by the balance-indexing API.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetBalance {
    pub symbol: String,
    pub chain_id: u64,
    pub contract_address: Address,
    pub decimals: u32,
    /// Raw on-chain balance.
    pub balance: U256,
    /// Balance scaled by decimals.
    pub token_balance: f64,
    /// USD value (token_balance * quote rate), 0.0 when the API has no rate.
    pub usd_value: f64,
    pub logo_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_range_span() {
        let range = BlockRange::new(500, 800);
        assert_eq!(range.span(), 300);
        assert_eq!(range.to_string(), "[500, 800]");
    }

    #[test]
    fn test_single_block_range() {
        let range = BlockRange::new(42, 42);
        assert_eq!(range.span(), 0);
    }
}
