//! # Block Range Planner
//!
//! Splits a lookback window below the chain head into consecutive `[from, to]`
//! ranges that respect a provider's maximum `eth_getLogs` span.
//!
//! Pure function, no I/O: the planner only does arithmetic so it can be unit
//! tested without a provider.

use crate::types::BlockRange;

/// Malformed bounds: the requested upper bound sits below the computed lower bound.
/// Fatal to the call; there is nothing to sync.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid block range: lower bound {lower} exceeds upper bound {upper}")]
pub struct InvalidRangeError {
    pub lower: u64,
    pub upper: u64,
}

/// Plan the `eth_getLogs` windows covering `[max(0, head - lookback), upper]`.
///
/// * `head_block` - current chain head.
/// * `lookback` - how many blocks below the head to start from.
/// * `max_span` - provider-imposed maximum `to - from` per call.
/// * `explicit_upper` - optional upper bound; clamped to `head_block`.
///
/// The produced ranges are contiguous, non-overlapping, cover the target range
/// exactly, and each satisfies `to - from <= max_span` (the last one may be
/// narrower). Window order is oldest to newest; callers pick their own traversal.
pub fn plan_block_ranges(
    head_block: u64,
    lookback: u64,
    max_span: u64,
    explicit_upper: Option<u64>,
) -> Result<Vec<BlockRange>, InvalidRangeError> {
    let lower = head_block.saturating_sub(lookback);
    let upper = explicit_upper.unwrap_or(head_block).min(head_block);

    if lower > upper {
        return Err(InvalidRangeError { lower, upper });
    }

    let mut windows = Vec::new();
    let mut from = lower;
    loop {
        let to = from.saturating_add(max_span).min(upper);
        windows.push(BlockRange::new(from, to));
        if to == upper {
            break;
        }
        from = to + 1;
    }

    Ok(windows)
}
