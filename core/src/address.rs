use std::str::FromStr;

use alloy_primitives::{hex, Address};
use anyhow::{anyhow, bail};

/// Parse user input as a 20-byte chain address.
/// Accepts an optional `0x` prefix. All-lowercase and all-uppercase hex are
/// taken as-is; mixed case must pass the EIP-55 checksum.
pub fn parse_address(input: &str) -> anyhow::Result<Address> {
    let input = input.trim();
    if input.is_empty() {
        bail!("Address cannot be empty.");
    }

    let digits = input.strip_prefix("0x").unwrap_or(input);
    if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("Invalid address '{input}'. Expected 0x followed by 40 hex characters.");
    }

    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
    let prefixed = format!("0x{digits}");
    if has_lower && has_upper {
        return Address::parse_checksummed(&prefixed, None)
            .map_err(|e| anyhow!("Invalid address checksum '{input}': {e}"));
    }

    Address::from_str(&prefixed).map_err(|e| anyhow!("Invalid address '{input}': {e}"))
}

/// True when `input` would be accepted by [`parse_address`].
#[must_use]
pub fn is_address(input: &str) -> bool {
    parse_address(input).is_ok()
}

/// Lowercase `0x`-prefixed hex, the form used in indexer paths and display.
#[must_use]
pub fn to_lower_hex(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}

/// Abbreviated form for prompts: `0x1234…abcd`.
#[must_use]
pub fn short_address(address: &Address) -> String {
    let full = to_lower_hex(address);
    format!("{}…{}", &full[..6], &full[full.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOWER: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";
    const CHECKSUMMED: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    #[test]
    fn parse_lowercase_address() {
        let addr = parse_address(LOWER).unwrap();
        assert_eq!(to_lower_hex(&addr), LOWER);
    }

    #[test]
    fn parse_checksummed_address() {
        let addr = parse_address(CHECKSUMMED).unwrap();
        assert_eq!(to_lower_hex(&addr), LOWER);
    }

    #[test]
    fn parse_without_prefix() {
        let addr = parse_address(&LOWER[2..]).unwrap();
        assert_eq!(to_lower_hex(&addr), LOWER);
    }

    #[test]
    fn reject_bad_checksum() {
        // Flip the case of one letter in a checksummed address.
        let bad = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeD";
        assert!(parse_address(bad).is_err());
    }

    #[test]
    fn all_uppercase_skips_checksum() {
        assert!(is_address("0x52908400098527886E0F7030069857D2E4169EE7"));
    }

    #[test]
    fn reject_garbage() {
        assert!(!is_address("not-an-address"));
        assert!(!is_address(""));
        assert!(!is_address("   "));
        assert!(!is_address("0x1234"));
        assert!(!is_address("0xZZ908400098527886e0f7030069857d2e4169ee7"));
    }

    #[test]
    fn trims_whitespace() {
        assert!(is_address(&format!("  {LOWER}\n")));
    }

    #[test]
    fn short_form() {
        let addr = parse_address(LOWER).unwrap();
        assert_eq!(short_address(&addr), "0x5aae…eaed");
    }
}
