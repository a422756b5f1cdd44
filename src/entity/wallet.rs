use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use crate::entity::{Address, Amount, Result, WalletError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WalletID(pub Uuid);

impl WalletID {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WalletID {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WalletID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletState {
    Draft,
    Deploying,
    Ready,
}

impl fmt::Display for WalletState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletState::Draft => write!(f, "DRAFT"),
            WalletState::Deploying => write!(f, "DEPLOYING"),
            WalletState::Ready => write!(f, "READY"),
        }
    }
}

impl std::str::FromStr for WalletState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(Self::Draft),
            "DEPLOYING" => Ok(Self::Deploying),
            "READY" => Ok(Self::Ready),
            other => Err(format!("Unknown wallet state: {}", other)),
        }
    }
}

/// Kind of co-signer authorised on the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OwnerType {
    PaperWallet,
    PaperWalletDerived,
    BrowserExtension,
    ThisDevice,
}

/// Multisig wallet aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletID,
    state: WalletState,
    address: Option<Address>,
    owners: HashMap<OwnerType, Address>,
    minimum_transaction_amount: Option<Amount>,
    fee_payment_token_address: Option<Address>,
}

impl Wallet {
    pub fn new_draft(id: WalletID) -> Self {
        Self {
            id,
            state: WalletState::Draft,
            address: None,
            owners: HashMap::new(),
            minimum_transaction_amount: None,
            fee_payment_token_address: None,
        }
    }

    pub fn state(&self) -> WalletState {
        self.state
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    pub fn owners(&self) -> &HashMap<OwnerType, Address> {
        &self.owners
    }

    pub fn owner(&self, owner_type: OwnerType) -> Option<&Address> {
        self.owners.get(&owner_type)
    }

    pub fn minimum_transaction_amount(&self) -> Option<Amount> {
        self.minimum_transaction_amount
    }

    pub fn fee_payment_token_address(&self) -> Option<&Address> {
        self.fee_payment_token_address.as_ref()
    }

    pub fn is_ready_to_use(&self) -> bool {
        self.state == WalletState::Ready
    }

    /// Adds an owner, replacing any owner of the same type.
    pub fn add_owner(&mut self, owner_type: OwnerType, address: Address) -> Result<()> {
        self.require(WalletState::Draft, "add owner")?;
        self.owners.insert(owner_type, address);
        Ok(())
    }

    pub fn remove_owner(&mut self, owner_type: OwnerType) -> Result<()> {
        self.require(WalletState::Draft, "remove owner")?;
        self.owners.remove(&owner_type);
        Ok(())
    }

    pub fn start_deployment(&mut self) -> Result<()> {
        self.require(WalletState::Draft, "start deployment")?;
        self.state = WalletState::Deploying;
        Ok(())
    }

    pub fn cancel_deployment(&mut self) -> Result<()> {
        self.require(WalletState::Deploying, "cancel deployment")?;
        self.state = WalletState::Draft;
        self.address = None;
        Ok(())
    }

    pub fn change_address(&mut self, address: Address) -> Result<()> {
        self.require(WalletState::Deploying, "change address")?;
        self.address = Some(address);
        Ok(())
    }

    pub fn finish_deployment(&mut self) -> Result<()> {
        self.require(WalletState::Deploying, "finish deployment")?;
        if self.address.is_none() {
            return Err(WalletError::WalletNotDeployed(self.id));
        }
        self.state = WalletState::Ready;
        Ok(())
    }

    pub fn update_minimum_transaction_amount(&mut self, amount: Amount) {
        self.minimum_transaction_amount = Some(amount);
    }

    pub fn change_fee_payment_token(&mut self, address: Address) {
        self.fee_payment_token_address = Some(address);
    }

    fn require(&self, expected: WalletState, action: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(WalletError::InvalidWalletStateTransition {
                from: self.state,
                action,
            })
        }
    }
}
