//! LINEA airdrop allocation checker.
//!
//! Resolves per-wallet allocations from an on-chain allocation contract by
//! batching view calls through Multicall3 `aggregate3`, and serves the result
//! over HTTP.

pub mod address;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod multicall;
pub mod resolver;
pub mod transport;
pub mod units;

pub use error::{AppError, AppResult};
pub use resolver::{AllocationRecord, AllocationResolver, BatchResult};
