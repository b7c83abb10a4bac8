//! # Greeter Chain Client
//!
//! ethers-backed implementation of the capabilities the sync core consumes:
//! chain head, filtered `eth_getLogs` per block range, `GreetingUpdated`
//! decode, authoritative `greeting()` reads, a WebSocket log subscription
//! bridged into a signal channel, and direct token/native balance reads.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::contract::{parse_log, EthEvent};
use ethers::prelude::{Http, Middleware, Provider, Ws};
use ethers::types::{Address, Filter, Log, U256};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::contracts::{Erc20, Greeter, GreetingUpdatedFilter};
use crate::log_synchronizer::LogFetcher;
use crate::tail_watcher::CurrentValueReader;
use crate::types::BlockRange;

/// Native + token balance pair for one wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletBalances {
    pub native: U256,
    pub token: U256,
}

/// Read-only client for the destination-chain Greeter contract.
#[derive(Debug, Clone)]
pub struct GreeterChainClient {
    provider: Arc<Provider<Http>>,
    rpc_url: String,
    ws_url: Option<String>,
    contract_address: Address,
}

impl GreeterChainClient {
    pub fn new(rpc_url: &str, contract_address: Address) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .with_context(|| format!("invalid RPC url: {rpc_url}"))?;
        Ok(Self {
            provider: Arc::new(provider),
            rpc_url: rpc_url.to_string(),
            ws_url: None,
            contract_address,
        })
    }

    /// WebSocket endpoint for the live log subscription. Without one,
    /// `subscribe_greeting_signals` converts the HTTP url: http(s) -> ws(s).
    pub fn with_ws_url(mut self, ws_url: impl Into<String>) -> Self {
        self.ws_url = Some(ws_url.into());
        self
    }

    pub fn contract_address(&self) -> Address {
        self.contract_address
    }

    /// Current block number (`eth_blockNumber`).
    pub async fn get_chain_head(&self) -> Result<u64> {
        let head = self
            .provider
            .get_block_number()
            .await
            .context("failed to fetch chain head")?;
        Ok(head.as_u64())
    }

    fn greeting_filter(&self) -> Filter {
        Filter::new()
            .address(self.contract_address)
            .topic0(GreetingUpdatedFilter::signature())
    }

    /// Extract the greeting string from a raw log; `None` for logs that are
    /// not a `GreetingUpdated` event.
    pub fn decode_greeting(log: &Log) -> Option<String> {
        parse_log::<GreetingUpdatedFilter>(log.clone())
            .ok()
            .map(|event| event.greeting)
    }

    /// ERC-20 + native balance for `owner` through the same provider.
    pub async fn get_wallet_balances(&self, owner: Address, token: Address) -> Result<WalletBalances> {
        let erc20 = Erc20::new(token, self.provider.clone());
        let token_balance = erc20
            .balance_of(owner)
            .call()
            .await
            .with_context(|| format!("balanceOf({owner:?}) failed for token {token:?}"))?;
        let native = self
            .provider
            .get_balance(owner, None)
            .await
            .context("failed to fetch native balance")?;
        Ok(WalletBalances {
            native,
            token: token_balance,
        })
    }

    /// Subscribe to `GreetingUpdated` logs over WebSocket and bridge them
    /// into a signal channel (one `()` per matching log).
    ///
    /// The channel closes when the socket stream ends, which the tail watcher
    /// surfaces as `SubscriptionError::StreamClosed`. The returned task stops
    /// the moment the receiver is dropped; hand it to the watcher handle so
    /// teardown also releases the WebSocket connection.
    pub async fn subscribe_greeting_signals(&self) -> Result<(mpsc::Receiver<()>, JoinHandle<()>)> {
        let ws_url = match &self.ws_url {
            Some(url) => url.clone(),
            None => self.rpc_url.replacen("http", "ws", 1),
        };

        info!("🔌 [ChainClient] Connecting log subscription: {ws_url}");
        let ws_provider = Provider::<Ws>::connect(&ws_url)
            .await
            .with_context(|| format!("failed to connect WebSocket provider: {ws_url}"))?;

        let filter = self.greeting_filter();
        let (tx, rx) = mpsc::channel(64);

        let task = tokio::spawn(async move {
            let mut stream = match ws_provider.subscribe_logs(&filter).await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("⚠️ [ChainClient] subscribe_logs failed: {e}");
                    return;
                }
            };
            info!("✅ [ChainClient] Subscribed to GreetingUpdated logs");

            loop {
                tokio::select! {
                    // Exit immediately once the receiver goes away, even if no
                    // further log ever arrives on the stream.
                    _ = tx.closed() => {
                        debug!("🛑 [ChainClient] Signal receiver dropped, stopping subscription");
                        return;
                    }
                    maybe_log = stream.next() => {
                        match maybe_log {
                            Some(log) => {
                                debug!(
                                    "📡 [ChainClient] GreetingUpdated log at block {:?}",
                                    log.block_number
                                );
                                if tx.send(()).await.is_err() {
                                    return;
                                }
                            }
                            None => {
                                warn!("⚠️ [ChainClient] Log subscription stream ended");
                                return;
                            }
                        }
                    }
                }
            }
        });

        Ok((rx, task))
    }
}

#[async_trait]
impl LogFetcher for GreeterChainClient {
    async fn fetch_logs(&self, range: BlockRange) -> Result<Vec<Log>> {
        let filter = self
            .greeting_filter()
            .from_block(range.from)
            .to_block(range.to);
        let logs = self
            .provider
            .get_logs(&filter)
            .await
            .with_context(|| format!("eth_getLogs failed for range {range}"))?;
        debug!("📊 [ChainClient] {} log(s) in range {range}", logs.len());
        Ok(logs)
    }
}

#[async_trait]
impl CurrentValueReader<String> for GreeterChainClient {
    async fn read_current(&self) -> Result<String> {
        let greeter = Greeter::new(self.contract_address, self.provider.clone());
        let greeting = greeter
            .greeting()
            .call()
            .await
            .context("greeting() call failed")?;
        Ok(greeting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::abi::AbiEncode;
    use ethers::types::{Bytes, H256};

    fn greeting_log(greeting: &str) -> Log {
        Log {
            topics: vec![GreetingUpdatedFilter::signature()],
            data: Bytes::from(greeting.to_string().encode()),
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_greeting_roundtrip() {
        let log = greeting_log("hello from arbitrum");
        assert_eq!(
            GreeterChainClient::decode_greeting(&log),
            Some("hello from arbitrum".to_string())
        );
    }

    #[test]
    fn test_decode_rejects_foreign_event() {
        let log = Log {
            topics: vec![H256::zero()],
            ..Default::default()
        };
        assert_eq!(GreeterChainClient::decode_greeting(&log), None);
    }
}
