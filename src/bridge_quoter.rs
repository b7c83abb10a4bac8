//! # HTTP Bridge Quoter
//!
//! [`QuoteEstimator`](crate::quote_refresher::QuoteEstimator) implementation
//! against a Connext-style quote service (the dapp's `/api` proxy in front of
//! the chain-abstraction SDK). The bridge economics stay a black box; this
//! module only moves JSON.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::types::U256;
use log::debug;
use serde::Deserialize;
use url::Url;

use crate::quote_refresher::QuoteEstimator;
use crate::types::QuoteRequest;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct RelayerFeeResponse {
    #[serde(rename = "relayerFee")]
    relayer_fee: String,
}

#[derive(Debug, Deserialize)]
struct EstimateAmountResponse {
    /// Absent when the service cannot route the pair.
    #[serde(rename = "amountReceived")]
    amount_received: Option<String>,
}

/// Quote API client. One instance per service; reqwest pools connections.
#[derive(Debug, Clone)]
pub struct HttpBridgeQuoter {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpBridgeQuoter {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid quote API base url: {base_url}"))?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid quote API path: {path}"))
    }

    fn request(&self, url: Url) -> reqwest::RequestBuilder {
        let mut req = self.client.get(url);
        if let Some(key) = &self.api_key {
            req = req.header("x-api-key", key);
        }
        req
    }
}

#[async_trait]
impl QuoteEstimator for HttpBridgeQuoter {
    async fn estimate_relayer_fee(
        &self,
        origin_domain: &str,
        destination_domain: &str,
    ) -> Result<U256> {
        let url = self.endpoint("api/estimaterelayerfee")?;
        debug!(
            "📊 [BridgeQuoter] estimateRelayerFee {} -> {}",
            origin_domain, destination_domain
        );
        let response: RelayerFeeResponse = self
            .request(url)
            .query(&[
                ("originDomain", origin_domain),
                ("destinationDomain", destination_domain),
            ])
            .send()
            .await
            .context("relayer fee request failed")?
            .error_for_status()
            .context("relayer fee request rejected")?
            .json()
            .await
            .context("invalid relayer fee response body")?;

        U256::from_dec_str(&response.relayer_fee)
            .with_context(|| format!("non-numeric relayer fee: {}", response.relayer_fee))
    }

    async fn estimate_amount_received(&self, request: &QuoteRequest) -> Result<Option<U256>> {
        let url = self.endpoint("api/getestimateamount")?;
        let amount_in = request.amount_in.to_string();
        debug!(
            "📊 [BridgeQuoter] getEstimateAmount request_id={} amount_in={}",
            request.request_id, amount_in
        );
        let params = [
            ("originDomain", request.origin_domain.clone()),
            ("destinationDomain", request.destination_domain.clone()),
            ("amount", amount_in),
            ("fromAsset", format!("{:?}", request.from_asset)),
            ("toAsset", format!("{:?}", request.to_asset)),
        ];
        let response: EstimateAmountResponse = self
            .request(url)
            .query(&params)
            .send()
            .await
            .context("estimate amount request failed")?
            .error_for_status()
            .context("estimate amount request rejected")?
            .json()
            .await
            .context("invalid estimate amount response body")?;

        match response.amount_received {
            None => Ok(None),
            Some(raw) => {
                let amount = U256::from_dec_str(&raw)
                    .with_context(|| format!("non-numeric amount received: {raw}"))?;
                Ok(Some(amount))
            }
        }
    }
}
