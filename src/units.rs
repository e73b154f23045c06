use alloy::primitives::{utils, U256};

/// Formats a raw integer amount as a decimal string scaled by `10^-decimals`.
///
/// Scaling is positional, nothing is rounded. Trailing fractional zeros are
/// trimmed and whole numbers are printed without a decimal point.
pub fn format_units(amount: U256, decimals: u8) -> String {
    let padded = match utils::format_units(amount, decimals) {
        Ok(formatted) => formatted,
        // alloy units stop at 77 decimals; past that every U256 is below one unit
        Err(_) => format!("0.{:0>width$}", amount.to_string(), width = decimals as usize),
    };

    trim_fraction(&padded).to_string()
}

fn trim_fraction(formatted: &str) -> &str {
    if !formatted.contains('.') {
        return formatted;
    }
    formatted.trim_end_matches('0').trim_end_matches('.')
}
