//! This module contains utility and helper functions for this crate.

use crate::Address;
use anyhow::{anyhow, ensure, Result};

pub mod ser;

/// Parse an [Address] from a string. Hexadecimal addresses must carry a `0x` prefix; any
/// other input is read as decimal. Underscores are accepted as digit separators; signs are not.
///
/// ### Takes
/// - `input`: The textual address.
///
/// ### Returns
/// - `Ok(address)` if the input is a valid 64 bit address.
/// - `Err(_)` otherwise.
pub fn parse_address(input: &str) -> Result<Address> {
    let trimmed = input.trim();
    let stripped = trimmed.replace('_', "");

    let (digits, radix) = match stripped.strip_prefix("0x").or_else(|| stripped.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (stripped.as_str(), 10),
    };
    ensure!(
        digits.chars().all(|c| c.is_digit(radix)),
        "Invalid address {trimmed:?}: unexpected character"
    );

    Address::from_str_radix(digits, radix).map_err(|e| anyhow!("Invalid address {trimmed:?}: {e}"))
}
