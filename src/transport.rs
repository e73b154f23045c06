use alloy::primitives::{Address, Bytes};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Read-only access to the node the aggregator contract lives on.
#[async_trait]
pub trait AggregatorTransport: Send + Sync {
    /// Executes `eth_call` against `to` at the latest block and returns the raw
    /// return data.
    async fn eth_call(&self, to: Address, data: Bytes) -> AppResult<Bytes>;
}

/// `eth_call` over an alloy HTTP provider, bounded by a per-call timeout.
pub struct ProviderTransport {
    provider: DynProvider,
    timeout: Duration,
}

impl ProviderTransport {
    pub fn new(rpc_url: &str, timeout: Duration) -> AppResult<Self> {
        let http_url: reqwest::Url = rpc_url
            .parse()
            .map_err(|e| AppError::Unexpected(anyhow::anyhow!("Invalid RPC URL: {}", e)))?;

        let provider = ProviderBuilder::new().connect_http(http_url).erased();

        Ok(Self { provider, timeout })
    }
}

#[async_trait]
impl AggregatorTransport for ProviderTransport {
    async fn eth_call(&self, to: Address, data: Bytes) -> AppResult<Bytes> {
        let request = TransactionRequest::default().to(to).input(data.into());

        debug!("eth_call to {}", to);

        tokio::time::timeout(self.timeout, self.provider.call(request))
            .await
            .map_err(|_| AppError::Upstream("eth_call timed out".to_string()))?
            .map_err(|e| AppError::Upstream(format!("eth_call failed: {}", e)))
    }
}
