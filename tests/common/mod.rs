#![allow(dead_code)]

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use linea_airdrop_checker::config::ResolverSettings;
use linea_airdrop_checker::multicall::IMulticall3;
use linea_airdrop_checker::transport::AggregatorTransport;
use linea_airdrop_checker::{AllocationResolver, AppError, AppResult};

#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    Amount(U256),
    Revert,
    Empty,
}

/// In-memory node answering `aggregate3` calls from a fixed allocation table
/// and recording every request it sees.
#[derive(Default)]
pub struct MockTransport {
    outcomes: HashMap<Address, Outcome>,
    failure: Option<String>,
    calls: Mutex<Vec<(Address, Vec<IMulticall3::Call3>)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_amount(mut self, address: Address, amount: u128) -> Self {
        self.outcomes.insert(address, Outcome::Amount(U256::from(amount)));
        self
    }

    pub fn with_outcome(mut self, address: Address, outcome: Outcome) -> Self {
        self.outcomes.insert(address, outcome);
        self
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<(Address, Vec<IMulticall3::Call3>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AggregatorTransport for MockTransport {
    async fn eth_call(&self, to: Address, data: Bytes) -> AppResult<Bytes> {
        let call = IMulticall3::aggregate3Call::abi_decode(&data)
            .map_err(|e| AppError::Upstream(format!("mock could not decode request: {}", e)))?;

        self.calls.lock().unwrap().push((to, call.calls.clone()));

        if let Some(message) = &self.failure {
            return Err(AppError::Upstream(message.clone()));
        }

        let results: Vec<IMulticall3::Result> = call
            .calls
            .iter()
            .map(|sub| {
                let account = Address::from_slice(&sub.callData[16..36]);
                match self.outcomes.get(&account).copied() {
                    Some(Outcome::Amount(amount)) => IMulticall3::Result {
                        success: true,
                        returnData: amount.abi_encode().into(),
                    },
                    Some(Outcome::Revert) => IMulticall3::Result {
                        success: false,
                        returnData: Bytes::new(),
                    },
                    Some(Outcome::Empty) => IMulticall3::Result {
                        success: true,
                        returnData: Bytes::new(),
                    },
                    None => IMulticall3::Result {
                        success: true,
                        returnData: U256::ZERO.abi_encode().into(),
                    },
                }
            })
            .collect();

        Ok(results.abi_encode().into())
    }
}

/// Deterministic distinct address derived from `index`.
pub fn wallet(index: u16) -> Address {
    let mut bytes = [0x11u8; 20];
    bytes[18..].copy_from_slice(&index.to_be_bytes());
    Address::from(bytes)
}

pub fn resolver_with(
    settings: ResolverSettings,
    transport: Arc<MockTransport>,
) -> AllocationResolver {
    AllocationResolver::new(Arc::new(settings), transport)
}

pub fn default_resolver(transport: Arc<MockTransport>) -> AllocationResolver {
    resolver_with(ResolverSettings::default(), transport)
}
