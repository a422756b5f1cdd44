use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::TransactionHash;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptStatus {
    Success,
    Failed,
}

/// Node confirmation of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub hash: TransactionHash,
    pub status: ReceiptStatus,
    pub block_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthBlock {
    pub hash: String,
    pub timestamp: DateTime<Utc>,
}
