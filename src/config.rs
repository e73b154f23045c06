use alloy::primitives::Address;
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_AGGREGATOR: &str = "0xcA11bde05977b3631167028862bE2a173976CA11";
pub const DEFAULT_TARGET: &str = "0x87bAa1694381aE3eCaE2660d97fe60404080Eb64";
pub const DEFAULT_SELECTOR: &str = "0x7debb959";

const API_KEY_PLACEHOLDER: &str = "{api_key}";
const LEGACY_API_KEY_VAR: &str = "INFURA_KEY";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub rpc: RpcConfig,
    pub contracts: ContractsConfig,
    pub resolver: ResolverConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    pub url_template: String,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractsConfig {
    pub aggregator_address: String,
    pub target_address: String,
    pub allocation_selector: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    pub chunk_size: usize,
    pub default_decimals: u8,
    pub token_symbol: String,
}

/// Typed, validated view of the contract and batching settings the resolver
/// runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    pub aggregator: Address,
    pub target: Address,
    pub selector: [u8; 4],
    pub chunk_size: usize,
    pub default_decimals: u8,
    pub symbol: String,
    /// Upper bound on each remote call.
    pub timeout: Duration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            aggregator: DEFAULT_AGGREGATOR.parse().unwrap_or_default(),
            target: DEFAULT_TARGET.parse().unwrap_or_default(),
            selector: [0x7d, 0xeb, 0xb9, 0x59],
            chunk_size: 100,
            default_decimals: 18,
            symbol: "LINEA".to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        Self::from_file_source(config::File::with_name(path).required(false))
    }

    fn from_file_source<S>(file: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config_builder = config::Config::builder()
            .set_default("server.bind_address", "0.0.0.0:3000")?
            .set_default(
                "rpc.url_template",
                "https://linea-mainnet.g.alchemy.com/v2/{api_key}",
            )?
            .set_default("rpc.timeout_seconds", 15u64)?
            .set_default("contracts.aggregator_address", DEFAULT_AGGREGATOR)?
            .set_default("contracts.target_address", DEFAULT_TARGET)?
            .set_default("contracts.allocation_selector", DEFAULT_SELECTOR)?
            .set_default("resolver.chunk_size", 100u64)?
            .set_default("resolver.default_decimals", 18u64)?
            .set_default("resolver.token_symbol", "LINEA")?
            .add_source(file)
            // Environment variables with prefix "CHECKER_", e.g. CHECKER_RPC__API_KEY
            .add_source(
                config::Environment::with_prefix("CHECKER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config_builder.try_deserialize()?;
        Ok(config)
    }

    pub fn resolver_settings(&self) -> Result<ResolverSettings> {
        let aggregator = Address::from_str(&self.contracts.aggregator_address)
            .map_err(|e| anyhow!("Invalid aggregator address: {}", e))?;
        let target = Address::from_str(&self.contracts.target_address)
            .map_err(|e| anyhow!("Invalid target address: {}", e))?;
        let selector = parse_selector(&self.contracts.allocation_selector)?;

        if self.resolver.chunk_size == 0 {
            bail!("resolver.chunk_size must be greater than zero");
        }
        if self.rpc.timeout_seconds == 0 {
            bail!("rpc.timeout_seconds must be greater than zero");
        }

        Ok(ResolverSettings {
            aggregator,
            target,
            selector,
            chunk_size: self.resolver.chunk_size,
            default_decimals: self.resolver.default_decimals,
            symbol: self.resolver.token_symbol.clone(),
            timeout: Duration::from_secs(self.rpc.timeout_seconds),
        })
    }

    /// Node URL with the credential substituted. Falls back to the legacy
    /// `INFURA_KEY` variable when `rpc.api_key` is unset.
    pub fn rpc_url(&self) -> Result<String> {
        let api_key = self
            .rpc
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| std::env::var(LEGACY_API_KEY_VAR).ok().filter(|key| !key.is_empty()));

        render_rpc_url(&self.rpc.url_template, api_key.as_deref())
    }
}

fn render_rpc_url(template: &str, api_key: Option<&str>) -> Result<String> {
    if !template.contains(API_KEY_PLACEHOLDER) {
        return Ok(template.to_string());
    }

    let api_key = api_key.with_context(|| {
        format!(
            "RPC API key is not set (rpc.api_key, CHECKER_RPC__API_KEY or {})",
            LEGACY_API_KEY_VAR
        )
    })?;

    Ok(template.replace(API_KEY_PLACEHOLDER, api_key))
}

fn parse_selector(value: &str) -> Result<[u8; 4]> {
    let bytes = hex::decode(value.strip_prefix("0x").unwrap_or(value))
        .map_err(|e| anyhow!("Invalid selector hex '{}': {}", value, e))?;

    bytes
        .try_into()
        .map_err(|_| anyhow!("Selector '{}' must be exactly 4 bytes", value))
}
