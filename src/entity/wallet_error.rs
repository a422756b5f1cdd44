use crate::entity::{TransactionStatus, WalletID, WalletState};

/// Failure reported by the node service. Network failures are worth retrying,
/// client failures mean the request itself was malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeError {
    #[error("Node network error: {0}")]
    Network(String),

    #[error("Node client error: {0}")]
    Client(String),
}

#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("Invalid transaction state transition: cannot {action} from {from}")]
    InvalidStateTransition {
        from: TransactionStatus,
        action: &'static str,
    },

    #[error("Invalid wallet state transition: cannot {action} from {from}")]
    InvalidWalletStateTransition {
        from: WalletState,
        action: &'static str,
    },

    #[error("Transaction cannot be edited in status {0}")]
    TransactionNotEditable(TransactionStatus),

    /// Upstream data is corrupted; callers must not continue the operation.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error(transparent)]
    Node(#[from] NodeError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Token list error: {0}")]
    TokenList(String),

    #[error("No wallet is selected")]
    NoSelectedWallet,

    #[error("Wallet not found: {0}")]
    WalletNotFound(WalletID),

    #[error("Wallet {0} has no address yet")]
    WalletNotDeployed(WalletID),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WalletError {
    /// Invariant violations signal corrupted data and must never be retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, WalletError::InvariantViolation(_))
    }
}

pub type Result<T> = std::result::Result<T, WalletError>;
