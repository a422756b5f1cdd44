use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::{TokenID, WalletID};

/// Token amount in the token's smallest unit (wei for Ether).
pub type Amount = Decimal;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountID {
    pub token_id: TokenID,
    pub wallet_id: WalletID,
}

impl AccountID {
    pub fn new(token_id: TokenID, wallet_id: WalletID) -> Self {
        Self { token_id, wallet_id }
    }
}

impl fmt::Display for AccountID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.wallet_id, self.token_id)
    }
}

/// Balance of one token held by one wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountID,
    /// `None` until the first synchronisation.
    pub balance: Option<Amount>,
    pub minimum_transaction_amount: Option<Amount>,
}

impl Account {
    pub fn new(id: AccountID) -> Self {
        Self {
            id,
            balance: None,
            minimum_transaction_amount: None,
        }
    }

    pub fn update_balance(&mut self, balance: Amount) {
        self.balance = Some(balance);
    }

    pub fn update_minimum_transaction_amount(&mut self, amount: Amount) {
        self.minimum_transaction_amount = Some(amount);
    }
}
