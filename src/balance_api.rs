//! # Balance Indexing API Client
//!
//! Covalent-style `balances_v2` client used to populate the token selection
//! list: every non-zero balance the owner holds on a chain, with USD values
//! for sorting. The indexing itself is an external service; this module only
//! fetches, filters and caches.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use dashmap::DashMap;
use ethers::types::{Address, U256};
use ethers::utils::format_units;
use log::{debug, info, warn};
use serde::Deserialize;
use url::Url;

use crate::types::AssetBalance;

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct BalancesEnvelope {
    data: Option<BalancesData>,
}

#[derive(Debug, Deserialize)]
struct BalancesData {
    chain_id: u64,
    items: Vec<BalanceItem>,
}

#[derive(Debug, Deserialize)]
struct BalanceItem {
    contract_ticker_symbol: Option<String>,
    contract_decimals: Option<u32>,
    contract_address: Option<String>,
    balance: Option<String>,
    quote_rate: Option<f64>,
    logo_url: Option<String>,
}

/// HTTP client for the balance-indexing API, with a per-(chain, owner)
/// response cache so modal re-opens do not refetch.
pub struct BalanceApiClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    cache: DashMap<(String, Address), (Instant, Vec<AssetBalance>)>,
    cache_ttl: Duration,
}

impl BalanceApiClient {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid balance API base url: {base_url}"))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            api_key: api_key.into(),
            cache: DashMap::new(),
            cache_ttl: DEFAULT_CACHE_TTL,
        })
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Non-zero token balances for `owner` on `chain_name` (API naming, e.g.
    /// `matic-mainnet`), sorted by USD value descending.
    pub async fn get_token_balances(
        &self,
        chain_name: &str,
        owner: Address,
    ) -> Result<Vec<AssetBalance>> {
        let key = (chain_name.to_string(), owner);
        if let Some(entry) = self.cache.get(&key) {
            let (fetched_at, balances) = entry.value();
            if fetched_at.elapsed() < self.cache_ttl {
                debug!("🔁 [BalanceApi] Cache hit for {owner:?} on {chain_name}");
                return Ok(balances.clone());
            }
        }

        let url = self
            .base_url
            .join(&format!("v1/{chain_name}/address/{owner:?}/balances_v2/"))
            .context("invalid balances_v2 path")?;

        let envelope: BalancesEnvelope = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .with_context(|| format!("balances_v2 request failed for {chain_name}"))?
            .error_for_status()
            .context("balances_v2 request rejected")?
            .json()
            .await
            .context("invalid balances_v2 response body")?;

        let data = envelope
            .data
            .context("balances_v2 response carried no data")?;

        let mut balances: Vec<AssetBalance> = data
            .items
            .into_iter()
            .filter_map(|item| to_asset_balance(item, data.chain_id))
            .filter(|asset| !asset.balance.is_zero())
            .collect();
        balances.sort_by(|a, b| {
            b.usd_value
                .partial_cmp(&a.usd_value)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        info!(
            "✅ [BalanceApi] {} non-zero balance(s) for {owner:?} on {chain_name}",
            balances.len()
        );
        self.cache.insert(key, (Instant::now(), balances.clone()));
        Ok(balances)
    }

    /// Highest-USD-value assets across several chains (the "top 5 you could
    /// pay with" list).
    pub async fn top_assets_by_value(
        &self,
        chain_names: &[&str],
        owner: Address,
        limit: usize,
    ) -> Result<Vec<AssetBalance>> {
        let mut all = Vec::new();
        for chain_name in chain_names {
            match self.get_token_balances(chain_name, owner).await {
                Ok(mut balances) => all.append(&mut balances),
                // One chain failing should not empty the whole list.
                Err(e) => warn!("⚠️ [BalanceApi] Skipping {chain_name}: {e:#}"),
            }
        }
        all.sort_by(|a, b| {
            b.usd_value
                .partial_cmp(&a.usd_value)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        all.truncate(limit);
        Ok(all)
    }
}

fn to_asset_balance(item: BalanceItem, chain_id: u64) -> Option<AssetBalance> {
    let symbol = item.contract_ticker_symbol?;
    let decimals = item.contract_decimals?;
    let contract_address = item.contract_address?.parse::<Address>().ok()?;
    let balance = U256::from_dec_str(item.balance.as_deref()?).ok()?;

    let token_balance = format_units(balance, decimals)
        .ok()?
        .parse::<f64>()
        .ok()?;
    let usd_value = item.quote_rate.map(|rate| token_balance * rate).unwrap_or(0.0);

    Some(AssetBalance {
        symbol,
        chain_id,
        contract_address,
        decimals,
        balance,
        token_balance,
        usd_value,
        logo_url: item.logo_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(symbol: &str, balance: &str, rate: Option<f64>) -> BalanceItem {
        BalanceItem {
            contract_ticker_symbol: Some(symbol.to_string()),
            contract_decimals: Some(6),
            contract_address: Some("0xFd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9".to_string()),
            balance: Some(balance.to_string()),
            quote_rate: rate,
            logo_url: None,
        }
    }

    #[test]
    fn test_to_asset_balance_scales_by_decimals() {
        let asset = to_asset_balance(item("USDT", "2500000", Some(1.0)), 42161).unwrap();
        assert_eq!(asset.symbol, "USDT");
        assert_eq!(asset.balance, U256::from(2_500_000u64));
        assert!((asset.token_balance - 2.5).abs() < 1e-9);
        assert!((asset.usd_value - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_missing_rate_yields_zero_usd_value() {
        let asset = to_asset_balance(item("XYZ", "1000000", None), 137).unwrap();
        assert_eq!(asset.usd_value, 0.0);
    }

    #[test]
    fn test_malformed_item_is_dropped() {
        let bad = BalanceItem {
            contract_ticker_symbol: Some("BAD".to_string()),
            contract_decimals: Some(18),
            contract_address: Some("not-an-address".to_string()),
            balance: Some("1".to_string()),
            quote_rate: None,
            logo_url: None,
        };
        assert!(to_asset_balance(bad, 1).is_none());
    }

    #[test]
    fn test_envelope_parsing() {
        let raw = r#"{
            "data": {
                "chain_id": 137,
                "items": [
                    {
                        "contract_ticker_symbol": "WETH",
                        "contract_decimals": 18,
                        "contract_address": "0x7ceB23fD6bC0adD59E62ac25578270cFf1b9f619",
                        "balance": "1000000000000000000",
                        "quote_rate": 1800.5,
                        "logo_url": null
                    }
                ]
            }
        }"#;
        let envelope: BalancesEnvelope = serde_json::from_str(raw).unwrap();
        let data = envelope.data.unwrap();
        assert_eq!(data.chain_id, 137);
        assert_eq!(data.items.len(), 1);
    }
}
