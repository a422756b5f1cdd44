pub mod demo;

use async_trait::async_trait;

use crate::entity::{Address, Amount, EthBlock, NodeError, TransactionHash, TransactionReceipt};

pub use demo::DemoEthereumNodeService;

/// Read-only queries against an Ethereum node. Implementations must be safe
/// to call concurrently.
#[async_trait]
pub trait EthereumNodeDomainService: Send + Sync {
    /// Native currency balance of the account, in wei.
    async fn eth_get_balance(&self, account: &Address) -> Result<Amount, NodeError>;

    /// ERC20 balance of `owner` held in the `token` contract.
    async fn eth_get_token_balance(&self, token: &Address, owner: &Address)
        -> Result<Amount, NodeError>;

    /// `None` while the transaction is not mined yet.
    async fn eth_get_transaction_receipt(
        &self,
        hash: &TransactionHash,
    ) -> Result<Option<TransactionReceipt>, NodeError>;

    async fn eth_get_block_by_hash(&self, hash: &str) -> Result<Option<EthBlock>, NodeError>;
}
