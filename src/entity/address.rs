use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::entity::WalletError;

/// Ethereum account or contract address, `0x` followed by 40 hex digits.
///
/// The original checksum casing is kept for display, comparison is
/// case-insensitive.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

lazy_static! {
    static ref ADDRESS_RE: Regex = Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("valid address regex");
}

impl Address {
    pub const ZERO: &'static str = "0x0000000000000000000000000000000000000000";

    pub fn new(value: &str) -> Result<Self, WalletError> {
        let value = value.trim();
        if ADDRESS_RE.is_match(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(WalletError::InvalidAddress(value.to_string()))
        }
    }

    pub fn zero() -> Self {
        Self(Self::ZERO.to_string())
    }

    pub fn value(&self) -> &str {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.eq_ignore_ascii_case(Self::ZERO)
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl std::hash::Hash for Address {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_ascii_lowercase().hash(state);
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Address {
    type Error = WalletError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_addresses() {
        assert!(Address::new("0x123").is_err());
        assert!(Address::new("57b2573E5FA7c7C9B5Fa82F3F03A75F53A0efdF5").is_err());
        assert!(Address::new("0xZZb2573E5FA7c7C9B5Fa82F3F03A75F53A0efdF5").is_err());
    }

    #[test]
    fn compares_case_insensitively() {
        let checksum = Address::new("0x57b2573E5FA7c7C9B5Fa82F3F03A75F53A0efdF5").unwrap();
        let lower = Address::new("0x57b2573e5fa7c7c9b5fa82f3f03a75f53a0efdf5").unwrap();
        assert_eq!(checksum, lower);
        assert_eq!(checksum.to_string(), "0x57b2573E5FA7c7C9B5Fa82F3F03A75F53A0efdF5");
    }

    #[test]
    fn zero_address_is_recognised() {
        assert!(Address::zero().is_zero());
        assert_eq!(Address::new(Address::ZERO).unwrap(), Address::zero());
    }
}
