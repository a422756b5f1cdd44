use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::Address;

/// Token identity; the token contract address, lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenID(String);

impl TokenID {
    pub fn new(id: &str) -> Self {
        Self(id.to_ascii_lowercase())
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl From<&Address> for TokenID {
    fn from(address: &Address) -> Self {
        Self::new(address.value())
    }
}

impl fmt::Display for TokenID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub code: String,
    pub name: String,
    pub decimals: u32,
    pub address: Address,
    pub logo_url: Option<String>,
}

impl Token {
    pub fn new(code: &str, name: &str, decimals: u32, address: Address) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            decimals,
            address,
            logo_url: None,
        }
    }

    /// The chain's native currency, addressed by the zero address.
    pub fn ether() -> Self {
        Self::new("ETH", "Ether", 18, Address::zero())
    }

    pub fn id(&self) -> TokenID {
        TokenID::from(&self.address)
    }

    pub fn is_ether(&self) -> bool {
        self.address.is_zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenListItemStatus {
    Whitelisted,
    Regular,
    Blacklisted,
}

impl fmt::Display for TokenListItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenListItemStatus::Whitelisted => write!(f, "WHITELISTED"),
            TokenListItemStatus::Regular => write!(f, "REGULAR"),
            TokenListItemStatus::Blacklisted => write!(f, "BLACKLISTED"),
        }
    }
}

impl std::str::FromStr for TokenListItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WHITELISTED" => Ok(Self::Whitelisted),
            "REGULAR" => Ok(Self::Regular),
            "BLACKLISTED" => Ok(Self::Blacklisted),
            other => Err(format!("Unknown token list item status: {}", other)),
        }
    }
}

/// Entry of the locally stored token list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenListItem {
    pub token: Token,
    pub status: TokenListItemStatus,
    pub can_pay_transaction_fee: bool,
    /// Display order among whitelisted items.
    pub sorting_id: Option<i32>,
    pub updated: DateTime<Utc>,
}

impl TokenListItem {
    pub fn new(token: Token, status: TokenListItemStatus, can_pay_transaction_fee: bool) -> Self {
        Self {
            token,
            status,
            can_pay_transaction_fee,
            sorting_id: None,
            updated: Utc::now(),
        }
    }

    pub fn id(&self) -> TokenID {
        self.token.id()
    }

    pub fn whitelist(&mut self, sorting_id: i32) {
        self.status = TokenListItemStatus::Whitelisted;
        self.sorting_id = Some(sorting_id);
        self.updated = Utc::now();
    }

    pub fn blacklist(&mut self) {
        self.status = TokenListItemStatus::Blacklisted;
        self.sorting_id = None;
        self.updated = Utc::now();
    }

    pub fn is_whitelisted(&self) -> bool {
        self.status == TokenListItemStatus::Whitelisted
    }
}
