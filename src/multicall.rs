//! Multicall3 `aggregate3` bindings and the allocation lookup codec.

use alloy::{
    primitives::{Address, Bytes, U256},
    sol,
    sol_types::{SolCall, SolValue},
};
use serde::Serialize;

use crate::error::{AppError, AppResult};

sol! {
    // Multicall3 @ 0xcA11bde05977b3631167028862bE2a173976CA11
    interface IMulticall3 {
        struct Call3 {
            address target;
            bool allowFailure;
            bytes callData;
        }

        struct Result {
            bool success;
            bytes returnData;
        }

        function aggregate3(Call3[] calldata calls) external payable returns (Result[] memory returnData);
    }
}

/// Outcome of a single allocation lookup inside an aggregated call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStatus {
    Allocated,
    ZeroAllocation,
    CallFailed,
    EmptyReturn,
    MalformedReturn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    pub amount: U256,
    pub status: LookupStatus,
}

impl Lookup {
    fn unsuccessful(status: LookupStatus) -> Self {
        Self {
            amount: U256::ZERO,
            status,
        }
    }
}

/// `selector ++ abi.encode(account)` for the allocation view function.
pub fn allocation_calldata(selector: [u8; 4], account: Address) -> Bytes {
    let mut data = Vec::with_capacity(4 + 32);
    data.extend_from_slice(&selector);
    data.extend_from_slice(&account.abi_encode());
    data.into()
}

/// Builds `aggregate3` calldata querying `target` once per account, every
/// sub-call allowed to fail on its own.
pub fn encode_aggregate3(target: Address, selector: [u8; 4], accounts: &[Address]) -> Bytes {
    let calls = accounts
        .iter()
        .map(|account| IMulticall3::Call3 {
            target,
            allowFailure: true,
            callData: allocation_calldata(selector, *account),
        })
        .collect();

    IMulticall3::aggregate3Call { calls }.abi_encode().into()
}

/// Decodes an `aggregate3` response into one [`Lookup`] per requested account,
/// in request order.
pub fn decode_aggregate3(data: &[u8], expected: usize) -> AppResult<Vec<Lookup>> {
    let results = IMulticall3::aggregate3Call::abi_decode_returns(data)
        .map_err(|e| AppError::Upstream(format!("Failed to decode aggregate3 response: {}", e)))?;

    if results.len() != expected {
        return Err(AppError::Upstream(format!(
            "aggregate3 returned {} results for {} calls",
            results.len(),
            expected
        )));
    }

    Ok(results.iter().map(decode_lookup).collect())
}

fn decode_lookup(result: &IMulticall3::Result) -> Lookup {
    if !result.success {
        return Lookup::unsuccessful(LookupStatus::CallFailed);
    }
    if result.returnData.is_empty() {
        return Lookup::unsuccessful(LookupStatus::EmptyReturn);
    }

    match U256::abi_decode(&result.returnData) {
        Ok(amount) if amount.is_zero() => Lookup {
            amount,
            status: LookupStatus::ZeroAllocation,
        },
        Ok(amount) => Lookup {
            amount,
            status: LookupStatus::Allocated,
        },
        Err(e) => {
            tracing::warn!(
                "Undecodable allocation return data 0x{}: {}",
                hex::encode(&result.returnData),
                e
            );
            Lookup::unsuccessful(LookupStatus::MalformedReturn)
        }
    }
}
