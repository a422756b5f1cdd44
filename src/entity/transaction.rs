use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::entity::{AccountID, Address, Amount, Result, WalletError, WalletID};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionID(pub Uuid);

impl TransactionID {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransactionID {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hash of the broadcast Ethereum transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionHash(pub String);

impl TransactionHash {
    pub fn new(value: &str) -> Self {
        Self(value.to_string())
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    Transfer,
    WalletRecovery,
    ReplaceRecoveryPhrase,
    ConnectBrowserExtension,
    DisconnectBrowserExtension,
}

/// Transaction status. Declaration order is the raw ordinal used as a sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TransactionStatus {
    Draft,
    Signing,
    Pending,
    Rejected,
    Failed,
    Success,
    Discarded,
}

impl TransactionStatus {
    pub fn raw_value(self) -> i16 {
        self as i16
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Draft => write!(f, "DRAFT"),
            TransactionStatus::Signing => write!(f, "SIGNING"),
            TransactionStatus::Pending => write!(f, "PENDING"),
            TransactionStatus::Rejected => write!(f, "REJECTED"),
            TransactionStatus::Failed => write!(f, "FAILED"),
            TransactionStatus::Success => write!(f, "SUCCESS"),
            TransactionStatus::Discarded => write!(f, "DISCARDED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletOperation {
    Call,
    DelegateCall,
    Create,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFeeEstimate {
    pub gas: u64,
    pub data_gas: u64,
    pub operational_gas: u64,
    pub gas_price: Amount,
}

impl TransactionFeeEstimate {
    /// Total fee in wei, `None` when it does not fit.
    pub fn total(&self) -> Option<Amount> {
        let gas = self
            .gas
            .checked_add(self.data_gas)?
            .checked_add(self.operational_gas)?;
        Amount::from(gas).checked_mul(self.gas_price)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub data: Vec<u8>,
    pub address: Address,
}

/// Multisig transaction proposal and its lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionID,
    pub transaction_type: TransactionType,
    pub wallet_id: WalletID,
    pub account_id: AccountID,
    status: TransactionStatus,
    sender: Option<Address>,
    recipient: Option<Address>,
    amount: Option<Amount>,
    fee: Option<Amount>,
    fee_estimate: Option<TransactionFeeEstimate>,
    nonce: Option<String>,
    data: Option<Vec<u8>>,
    operation: Option<WalletOperation>,
    hash: Option<Vec<u8>>,
    signatures: Vec<Signature>,
    transaction_hash: Option<TransactionHash>,
    created_date: Option<DateTime<Utc>>,
    updated_date: Option<DateTime<Utc>>,
    submitted_date: Option<DateTime<Utc>>,
    rejected_date: Option<DateTime<Utc>>,
    processed_date: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn new(
        id: TransactionID,
        transaction_type: TransactionType,
        wallet_id: WalletID,
        account_id: AccountID,
    ) -> Self {
        Self {
            id,
            transaction_type,
            wallet_id,
            account_id,
            status: TransactionStatus::Draft,
            sender: None,
            recipient: None,
            amount: None,
            fee: None,
            fee_estimate: None,
            nonce: None,
            data: None,
            operation: None,
            hash: None,
            signatures: Vec::new(),
            transaction_hash: None,
            created_date: None,
            updated_date: None,
            submitted_date: None,
            rejected_date: None,
            processed_date: None,
        }
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn sender(&self) -> Option<&Address> {
        self.sender.as_ref()
    }

    pub fn recipient(&self) -> Option<&Address> {
        self.recipient.as_ref()
    }

    pub fn amount(&self) -> Option<Amount> {
        self.amount
    }

    pub fn fee(&self) -> Option<Amount> {
        self.fee
    }

    pub fn fee_estimate(&self) -> Option<&TransactionFeeEstimate> {
        self.fee_estimate.as_ref()
    }

    pub fn nonce(&self) -> Option<&str> {
        self.nonce.as_deref()
    }

    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    pub fn operation(&self) -> Option<WalletOperation> {
        self.operation
    }

    pub fn hash(&self) -> Option<&[u8]> {
        self.hash.as_deref()
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    pub fn transaction_hash(&self) -> Option<&TransactionHash> {
        self.transaction_hash.as_ref()
    }

    pub fn created_date(&self) -> Option<DateTime<Utc>> {
        self.created_date
    }

    pub fn updated_date(&self) -> Option<DateTime<Utc>> {
        self.updated_date
    }

    pub fn submitted_date(&self) -> Option<DateTime<Utc>> {
        self.submitted_date
    }

    pub fn rejected_date(&self) -> Option<DateTime<Utc>> {
        self.rejected_date
    }

    pub fn processed_date(&self) -> Option<DateTime<Utc>> {
        self.processed_date
    }

    /// Present timestamps in ordering precedence:
    /// processed, submitted, rejected, updated, created.
    pub fn event_dates(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        [
            self.processed_date,
            self.submitted_date,
            self.rejected_date,
            self.updated_date,
            self.created_date,
        ]
        .into_iter()
        .flatten()
    }

    pub fn is_signed_by(&self, address: &Address) -> bool {
        self.signatures.iter().any(|s| &s.address == address)
    }

    // Content editing, draft only.

    pub fn change_sender(&mut self, sender: Address) -> Result<&mut Self> {
        self.require_editable()?;
        self.sender = Some(sender);
        Ok(self)
    }

    pub fn change_recipient(&mut self, recipient: Address) -> Result<&mut Self> {
        self.require_editable()?;
        self.recipient = Some(recipient);
        Ok(self)
    }

    pub fn change_amount(&mut self, amount: Amount) -> Result<&mut Self> {
        self.require_editable()?;
        self.amount = Some(amount);
        Ok(self)
    }

    pub fn change_fee(&mut self, fee: Amount) -> Result<&mut Self> {
        self.require_editable()?;
        self.fee = Some(fee);
        Ok(self)
    }

    pub fn change_fee_estimate(&mut self, estimate: TransactionFeeEstimate) -> Result<&mut Self> {
        self.require_editable()?;
        self.fee_estimate = Some(estimate);
        Ok(self)
    }

    pub fn change_nonce(&mut self, nonce: &str) -> Result<&mut Self> {
        self.require_editable()?;
        self.nonce = Some(nonce.to_string());
        Ok(self)
    }

    pub fn change_data(&mut self, data: Vec<u8>) -> Result<&mut Self> {
        self.require_editable()?;
        self.data = Some(data);
        Ok(self)
    }

    pub fn change_operation(&mut self, operation: WalletOperation) -> Result<&mut Self> {
        self.require_editable()?;
        self.operation = Some(operation);
        Ok(self)
    }

    pub fn change_hash(&mut self, hash: Vec<u8>) -> Result<&mut Self> {
        self.require_editable()?;
        self.hash = Some(hash);
        Ok(self)
    }

    // Signing, allowed in draft and signing.

    /// Adds a signature, replacing an earlier one from the same signer.
    pub fn add_signature(&mut self, signature: Signature) -> Result<&mut Self> {
        self.require_signable()?;
        self.signatures.retain(|s| s.address != signature.address);
        self.signatures.push(signature);
        Ok(self)
    }

    pub fn remove_signature(&mut self, address: &Address) -> Result<&mut Self> {
        self.require_signable()?;
        self.signatures.retain(|s| &s.address != address);
        Ok(self)
    }

    pub fn set_transaction_hash(&mut self, hash: TransactionHash) -> Result<&mut Self> {
        self.require_signable()?;
        self.transaction_hash = Some(hash);
        Ok(self)
    }

    // Status transitions.

    /// Moves draft to signing, or signing to pending once the hash is known.
    pub fn proceed(&mut self) -> Result<&mut Self> {
        match self.status {
            TransactionStatus::Draft => {
                self.status = TransactionStatus::Signing;
            }
            TransactionStatus::Signing if self.transaction_hash.is_some() => {
                let now = Utc::now();
                self.status = TransactionStatus::Pending;
                self.submitted_date = Some(now);
            }
            from => {
                return Err(WalletError::InvalidStateTransition {
                    from,
                    action: "proceed",
                })
            }
        }
        self.updated_date = Some(Utc::now());
        Ok(self)
    }

    pub fn discard(&mut self) -> Result<&mut Self> {
        self.transition(TransactionStatus::Draft, TransactionStatus::Discarded, "discard")?;
        Ok(self)
    }

    pub fn reject(&mut self) -> Result<&mut Self> {
        self.transition(TransactionStatus::Signing, TransactionStatus::Rejected, "reject")?;
        self.rejected_date = self.updated_date;
        Ok(self)
    }

    pub fn succeed(&mut self) -> Result<&mut Self> {
        self.require_processed("succeed")?;
        self.transition(TransactionStatus::Pending, TransactionStatus::Success, "succeed")?;
        Ok(self)
    }

    pub fn fail(&mut self) -> Result<&mut Self> {
        self.require_processed("fail")?;
        self.transition(TransactionStatus::Pending, TransactionStatus::Failed, "fail")?;
        Ok(self)
    }

    // Timestamps.

    pub fn timestamp_created(&mut self, at: DateTime<Utc>) -> &mut Self {
        self.created_date = Some(at);
        self
    }

    pub fn timestamp_updated(&mut self, at: DateTime<Utc>) -> &mut Self {
        self.updated_date = Some(at);
        self
    }

    pub fn timestamp_submitted(&mut self, at: DateTime<Utc>) -> &mut Self {
        self.submitted_date = Some(at);
        self
    }

    pub fn timestamp_rejected(&mut self, at: DateTime<Utc>) -> &mut Self {
        self.rejected_date = Some(at);
        self
    }

    pub fn timestamp_processed(&mut self, at: DateTime<Utc>) -> &mut Self {
        self.processed_date = Some(at);
        self
    }

    fn transition(
        &mut self,
        from: TransactionStatus,
        to: TransactionStatus,
        action: &'static str,
    ) -> Result<()> {
        if self.status != from {
            return Err(WalletError::InvalidStateTransition {
                from: self.status,
                action,
            });
        }
        self.status = to;
        self.updated_date = Some(Utc::now());
        Ok(())
    }

    fn require_processed(&self, action: &'static str) -> Result<()> {
        if self.processed_date.is_none() {
            return Err(WalletError::InvalidStateTransition {
                from: self.status,
                action,
            });
        }
        Ok(())
    }

    fn require_editable(&self) -> Result<()> {
        if self.status == TransactionStatus::Draft {
            Ok(())
        } else {
            Err(WalletError::TransactionNotEditable(self.status))
        }
    }

    fn require_signable(&self) -> Result<()> {
        match self.status {
            TransactionStatus::Draft | TransactionStatus::Signing => Ok(()),
            status => Err(WalletError::TransactionNotEditable(status)),
        }
    }
}
