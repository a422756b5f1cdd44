mod account;
mod address;
mod event;
mod portfolio;
mod receipt;
mod token;
mod transaction;
mod transaction_group;
mod wallet;
mod wallet_error;

pub use account::{Account, AccountID, Amount};
pub use address::Address;
pub use event::{DomainEvent, EventType};
pub use portfolio::Portfolio;
pub use receipt::{EthBlock, ReceiptStatus, TransactionReceipt};
pub use token::{Token, TokenID, TokenListItem, TokenListItemStatus};
pub use transaction::{
    Signature, Transaction, TransactionFeeEstimate, TransactionHash, TransactionID,
    TransactionStatus, TransactionType, WalletOperation,
};
pub use transaction_group::{date_for_grouping, distant_past, TransactionGroup, TransactionGroupType};
pub use wallet::{OwnerType, Wallet, WalletID, WalletState};
pub use wallet_error::{NodeError, Result, WalletError};
