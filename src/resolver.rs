//! Batched allocation lookups.
//!
//! A submission is validated and deduplicated up front, then the distinct
//! addresses are queried in fixed-size chunks, one `aggregate3` call per chunk,
//! strictly one chunk after another. Results are keyed by checksummed address
//! and the total only counts each distinct address once.

use alloy::primitives::{Address, U256};
use serde::{ser::SerializeMap, Serialize, Serializer};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::address::AddressSet;
use crate::config::ResolverSettings;
use crate::error::{AppError, AppResult};
use crate::multicall::{self, LookupStatus};
use crate::transport::AggregatorTransport;
use crate::units::format_units;

fn serialize_decimal<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRecord {
    #[serde(serialize_with = "serialize_decimal")]
    pub raw: U256,
    pub formatted: String,
    pub ok: bool,
    pub duplicates: usize,
    pub status: LookupStatus,
}

/// Per-wallet records in first-seen order, serialized as a JSON object keyed
/// by checksummed address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerWallet(Vec<(String, AllocationRecord)>);

impl PerWallet {
    pub fn get(&self, address: &str) -> Option<&AllocationRecord> {
        self.0
            .iter()
            .find(|(key, _)| key == address)
            .map(|(_, record)| record)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AllocationRecord)> {
        self.0.iter().map(|(key, record)| (key.as_str(), record))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, address: String, record: AllocationRecord) {
        self.0.push((address, record));
    }
}

impl Serialize for PerWallet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (address, record) in &self.0 {
            map.serialize_entry(address, record)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub decimals: u8,
    pub symbol: String,
    #[serde(serialize_with = "serialize_decimal")]
    pub total_raw: U256,
    pub total: String,
    pub per_wallet: PerWallet,
    pub unique_count: usize,
    pub submitted_count: usize,
}

pub struct AllocationResolver {
    settings: Arc<ResolverSettings>,
    transport: Arc<dyn AggregatorTransport>,
}

impl AllocationResolver {
    pub fn new(settings: Arc<ResolverSettings>, transport: Arc<dyn AggregatorTransport>) -> Self {
        Self {
            settings,
            transport,
        }
    }

    /// Resolves allocations for every distinct address in `addresses`.
    ///
    /// Input is fully validated before the first remote call; any failure,
    /// validation or upstream, discards everything gathered so far.
    pub async fn resolve<S: AsRef<str>>(
        &self,
        addresses: &[S],
        decimals: Option<u8>,
    ) -> AppResult<BatchResult> {
        if addresses.is_empty() {
            return Err(AppError::EmptyInput);
        }

        let decimals = decimals.unwrap_or(self.settings.default_decimals);
        let set = AddressSet::from_inputs(addresses)?;
        let chunk_count = set.unique_count().div_ceil(self.settings.chunk_size);

        let mut total = U256::ZERO;
        let mut per_wallet = PerWallet::default();

        for (index, chunk) in set.unique().chunks(self.settings.chunk_size).enumerate() {
            debug!("Querying chunk {}/{} with {} addresses", index + 1, chunk_count, chunk.len());

            let lookups = self.lookup_chunk(chunk).await.map_err(|e| {
                error!("Chunk {}/{} failed: {}", index + 1, chunk_count, e);
                e
            })?;

            for (address, lookup) in chunk.iter().zip(lookups) {
                // distinct holders only
                total = total.checked_add(lookup.amount).ok_or_else(|| {
                    AppError::Unexpected(anyhow::anyhow!("allocation total overflows uint256"))
                })?;
                per_wallet.push(
                    address.to_checksum(None),
                    AllocationRecord {
                        raw: lookup.amount,
                        formatted: format_units(lookup.amount, decimals),
                        ok: !lookup.amount.is_zero(),
                        duplicates: set.occurrences(address),
                        status: lookup.status,
                    },
                );
            }
        }

        info!(
            "Resolved {} submitted / {} unique addresses in {} chunks, total {}",
            addresses.len(),
            set.unique_count(),
            chunk_count,
            total
        );

        Ok(BatchResult {
            decimals,
            symbol: self.settings.symbol.clone(),
            total_raw: total,
            total: format_units(total, decimals),
            per_wallet,
            unique_count: set.unique_count(),
            submitted_count: set.submitted_count(),
        })
    }

    async fn lookup_chunk(&self, chunk: &[Address]) -> AppResult<Vec<multicall::Lookup>> {
        let calldata =
            multicall::encode_aggregate3(self.settings.target, self.settings.selector, chunk);

        let response = self
            .transport
            .eth_call(self.settings.aggregator, calldata)
            .await?;

        multicall::decode_aggregate3(&response, chunk.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(raw: u64) -> AllocationRecord {
        AllocationRecord {
            raw: U256::from(raw),
            formatted: format_units(U256::from(raw), 18),
            ok: raw > 0,
            duplicates: 1,
            status: if raw > 0 {
                LookupStatus::Allocated
            } else {
                LookupStatus::ZeroAllocation
            },
        }
    }

    #[test]
    fn test_per_wallet_keeps_insertion_order() {
        let mut per_wallet = PerWallet::default();
        per_wallet.push("0xB".to_string(), record(2));
        per_wallet.push("0xA".to_string(), record(1));

        let json = serde_json::to_string(&per_wallet).unwrap();
        assert!(json.find("0xB").unwrap() < json.find("0xA").unwrap());
        assert_eq!(per_wallet.get("0xA").unwrap().raw, U256::from(1u64));
        assert!(per_wallet.get("0xC").is_none());
    }

    #[test]
    fn test_batch_result_wire_format() {
        let mut per_wallet = PerWallet::default();
        per_wallet.push("0xA".to_string(), record(1_500_000_000_000_000_000));

        let result = BatchResult {
            decimals: 18,
            symbol: "LINEA".to_string(),
            total_raw: U256::from(1_500_000_000_000_000_000u128),
            total: "1.5".to_string(),
            per_wallet,
            unique_count: 1,
            submitted_count: 1,
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["decimals"], 18);
        assert_eq!(value["symbol"], "LINEA");
        assert_eq!(value["totalRaw"], "1500000000000000000");
        assert_eq!(value["total"], "1.5");
        assert_eq!(value["uniqueCount"], 1);
        assert_eq!(value["submittedCount"], 1);
        assert_eq!(value["perWallet"]["0xA"]["raw"], "1500000000000000000");
        assert_eq!(value["perWallet"]["0xA"]["formatted"], "1.5");
        assert_eq!(value["perWallet"]["0xA"]["ok"], true);
        assert_eq!(value["perWallet"]["0xA"]["duplicates"], 1);
        assert_eq!(value["perWallet"]["0xA"]["status"], "allocated");
    }
}
