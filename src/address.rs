use alloy::primitives::Address;
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

/// Parses a raw wallet token into an [`Address`].
///
/// The token is trimmed and must be `0x` followed by 40 hex digits. Single-case
/// hex (all lower or all upper) is accepted as-is, mixed case has to carry a
/// valid EIP-55 checksum.
pub fn normalize_address(raw: &str) -> AppResult<Address> {
    let token = raw.trim();
    let invalid = || AppError::InvalidAddress(token.to_string());

    let body = token.strip_prefix("0x").ok_or_else(invalid)?;
    if body.len() != 40 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let address = Address::from_str(token).map_err(|_| invalid())?;

    let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && address.to_checksum(None) != token {
        return Err(invalid());
    }

    Ok(address)
}

/// Splits free-form address text the way the web form does: on whitespace,
/// commas and semicolons, dropping empty fragments.
pub fn split_address_text(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Distinct addresses of a submission in first-seen order, with the number of
/// times each one was submitted.
#[derive(Debug, Clone, Default)]
pub struct AddressSet {
    order: Vec<Address>,
    counts: HashMap<Address, usize>,
    submitted: usize,
}

impl AddressSet {
    /// Validates every token before anything is kept; the first malformed one
    /// rejects the whole submission.
    pub fn from_inputs<S: AsRef<str>>(inputs: &[S]) -> AppResult<Self> {
        let mut set = Self::default();

        for raw in inputs {
            let address = normalize_address(raw.as_ref())?;
            set.insert(address);
        }

        Ok(set)
    }

    fn insert(&mut self, address: Address) {
        self.submitted += 1;
        let count = self.counts.entry(address).or_insert(0);
        *count += 1;
        if *count == 1 {
            self.order.push(address);
        }
    }

    pub fn unique(&self) -> &[Address] {
        &self.order
    }

    pub fn occurrences(&self, address: &Address) -> usize {
        self.counts.get(address).copied().unwrap_or(0)
    }

    pub fn unique_count(&self) -> usize {
        self.order.len()
    }

    pub fn submitted_count(&self) -> usize {
        self.submitted
    }
}
