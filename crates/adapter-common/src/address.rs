use tiny_keccak::{Hasher, Keccak};

use crate::error::Error;

/// Default EIP-681 prefix when an address carries none.
pub const DEFAULT_PREFIX: &str = "pay";

/// Address validation rule for a network family.
///
/// Chosen by network configuration, never by inspecting the address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressRule {
    /// Account names of a fixed length. The character set is not checked.
    FixedLength { length: usize },

    /// `0x`-prefixed 20-byte hex with optional EIP-55 checksum, optionally
    /// preceded by a `prefix-` part that is ignored for validation.
    ChecksummedHex,

    /// Base58 (bitcoin alphabet) decoding to a fixed byte length with a
    /// required leading character.
    Base58 { leading: char, decoded_len: usize },
}

impl AddressRule {
    /// Whether `address` satisfies this rule.
    pub fn is_valid(&self, address: &str) -> bool {
        match *self {
            // length in UTF-16 code units
            AddressRule::FixedLength { length } => address.encode_utf16().count() == length,
            AddressRule::ChecksummedHex => {
                let (_, payload) = split_prefix(address);
                is_valid_hex_address(payload)
            }
            AddressRule::Base58 {
                leading,
                decoded_len,
            } => {
                if !address.starts_with(leading) {
                    return false;
                }
                match bs58::decode(address).into_vec() {
                    Ok(bytes) => bytes.len() == decoded_len,
                    Err(_) => false,
                }
            }
        }
    }

    /// Like [`is_valid`](Self::is_valid), failing with `InvalidPublicAddress`.
    pub fn validate(&self, address: &str) -> Result<(), Error> {
        if self.is_valid(address) {
            Ok(())
        } else {
            Err(Error::InvalidPublicAddress(address.to_string()))
        }
    }
}

/// Split an EIP-681 style `prefix-payload` target.
///
/// Without a `-` the whole string is the payload and the prefix is `pay`.
pub fn split_prefix(address: &str) -> (&str, &str) {
    let mut parts = address.split('-');
    let first = parts.next().unwrap_or_default();
    match parts.next() {
        Some(payload) if !payload.is_empty() => (first, payload),
        _ => (DEFAULT_PREFIX, first),
    }
}

/// Validate a `0x`-prefixed hex address, enforcing EIP-55 when mixed case.
pub fn is_valid_hex_address(address: &str) -> bool {
    let Some(hex_part) = address.strip_prefix("0x") else {
        return false;
    };
    if hex_part.len() != 40 {
        return false;
    }
    let Ok(bytes) = hex::decode(hex_part) else {
        return false;
    };

    let has_lower = hex_part.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = hex_part.bytes().any(|b| b.is_ascii_uppercase());
    if !(has_lower && has_upper) {
        return true;
    }

    let mut addr = [0u8; 20];
    addr.copy_from_slice(&bytes);
    eip55_checksum(&addr) == address
}

/// EIP-55 mixed-case checksum encoding.
pub fn eip55_checksum(addr: &[u8; 20]) -> String {
    let hex_addr = hex::encode(addr);
    let mut hasher = Keccak::v256();
    hasher.update(hex_addr.as_bytes());
    let mut hash = [0u8; 32];
    hasher.finalize(&mut hash);

    let mut result = String::with_capacity(42);
    result.push_str("0x");
    for (i, c) in hex_addr.chars().enumerate() {
        let hash_nibble = if i % 2 == 0 {
            (hash[i / 2] >> 4) & 0x0f
        } else {
            hash[i / 2] & 0x0f
        };
        if hash_nibble >= 8 {
            result.push(c.to_ascii_uppercase());
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const FUN: &str = "0x89205A3A3b2A69De6Dbf7f01ED13B2108B2c43e7";
    const RIPPLE: AddressRule = AddressRule::Base58 {
        leading: 'r',
        decoded_len: 25,
    };

    #[test]
    fn test_eip55_checksum() {
        let addr_bytes = hex::decode("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&addr_bytes);
        assert_eq!(eip55_checksum(&addr), "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
    }

    #[test]
    fn test_hex_address() {
        assert!(is_valid_hex_address(FUN));
        assert!(is_valid_hex_address(&FUN.to_lowercase()));
        assert!(is_valid_hex_address("0x89205A3A3B2A69DE6DBF7F01ED13B2108B2C43E7"));
        // one letter flipped to lower case breaks the checksum
        assert!(!is_valid_hex_address("0x89205a3A3b2A69De6Dbf7f01ED13B2108B2c43e7"));
        assert!(!is_valid_hex_address("89205A3A3b2A69De6Dbf7f01ED13B2108B2c43e7"));
        assert!(!is_valid_hex_address("0x89205A3A3b2A69De6Dbf7f01ED13B2108B2c43"));
        assert!(!is_valid_hex_address("0xz9205A3A3b2A69De6Dbf7f01ED13B2108B2c43e7"));
    }

    #[test]
    fn test_split_prefix() {
        assert_eq!(split_prefix(FUN), ("pay", FUN));
        assert_eq!(split_prefix(&format!("token-{FUN}")), ("token", FUN));
        assert_eq!(split_prefix(&format!("token_info-{FUN}")), ("token_info", FUN));
        assert_eq!(split_prefix("abc-"), ("pay", "abc"));
    }

    #[test]
    fn test_checksummed_hex_rule_ignores_prefix() {
        let rule = AddressRule::ChecksummedHex;
        assert!(rule.is_valid(FUN));
        assert!(rule.is_valid(&format!("pay-{FUN}")));
        assert!(!rule.is_valid("pay-0x1234"));
        assert!(rule.validate("token-0x1234").is_err());
    }

    #[test]
    fn test_fixed_length_rule() {
        let rule = AddressRule::FixedLength { length: 12 };
        assert!(rule.is_valid("abcdefghijkl"));
        // character set is not checked
        assert!(rule.is_valid("ABC!@#$%^&*("));
        assert!(!rule.is_valid("abcdefghijk"));
        assert!(!rule.is_valid("abcdefghijklm"));
        assert!(!rule.is_valid(""));
        // astral characters take two code units
        assert!(rule.is_valid("abcdefghij\u{1F600}"));
        assert!(!rule.is_valid("abcdefghijk\u{1F600}"));
    }

    #[test]
    fn test_base58_rule() {
        assert!(RIPPLE.is_valid("rEb8TK3gBgk5auZkwc6sHnwrGVJH8DuaLh"));
        assert!(RIPPLE.is_valid("rPEPPER7kfTD9w2To4CQk6UCfuHM9c6GDY"));
        assert!(!RIPPLE.is_valid("rEXAMPLE1234"));
        // wrong leading character
        assert!(!RIPPLE.is_valid("Eb8TK3gBgk5auZkwc6sHnwrGVJH8DuaLhr"));
        // '0' and 'l' are outside the alphabet
        assert!(!RIPPLE.is_valid("r0b8TK3gBgk5auZkwc6sHnwrGVJH8DuaLh"));
        assert!(!RIPPLE.is_valid("rlb8TK3gBgk5auZkwc6sHnwrGVJH8DuaLh"));
        assert!(!RIPPLE.is_valid(""));
    }

    #[test]
    fn test_validation_is_deterministic() {
        for addr in ["rEb8TK3gBgk5auZkwc6sHnwrGVJH8DuaLh", "rEXAMPLE1234", FUN, ""] {
            for rule in [RIPPLE, AddressRule::ChecksummedHex, AddressRule::FixedLength { length: 12 }] {
                assert_eq!(rule.is_valid(addr), rule.is_valid(addr));
            }
        }
    }
}
