use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::entity::{
    Address, Amount, EthBlock, NodeError, ReceiptStatus, TransactionHash, TransactionReceipt,
};
use crate::ethereum::EthereumNodeDomainService;

/// Simulated node for running the daemon without network access.
///
/// Every query takes `latency`. `funded_account` reports a zero balance on the
/// first query and 100 wei from then on; receipts appear after a few polls.
pub struct DemoEthereumNodeService {
    latency: Duration,
    funded_account: Option<Address>,
    receipt_after_polls: u32,
    balance_counter: AtomicU32,
    receipt_counter: AtomicU32,
}

impl DemoEthereumNodeService {
    pub fn new(latency: Duration, funded_account: Option<Address>) -> Self {
        Self {
            latency,
            funded_account,
            receipt_after_polls: 3,
            balance_counter: AtomicU32::new(0),
            receipt_counter: AtomicU32::new(0),
        }
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl Default for DemoEthereumNodeService {
    fn default() -> Self {
        Self::new(Duration::from_secs(2), None)
    }
}

#[async_trait]
impl EthereumNodeDomainService for DemoEthereumNodeService {
    async fn eth_get_balance(&self, account: &Address) -> Result<Amount, NodeError> {
        self.simulate_latency().await;
        if self.funded_account.as_ref() == Some(account) {
            let funded = self.balance_counter.fetch_add(1, Ordering::SeqCst) > 0;
            Ok(if funded { Amount::from(100) } else { Amount::ZERO })
        } else {
            Ok(Amount::ZERO)
        }
    }

    async fn eth_get_token_balance(
        &self,
        _token: &Address,
        _owner: &Address,
    ) -> Result<Amount, NodeError> {
        self.simulate_latency().await;
        Ok(Amount::ZERO)
    }

    async fn eth_get_transaction_receipt(
        &self,
        hash: &TransactionHash,
    ) -> Result<Option<TransactionReceipt>, NodeError> {
        self.simulate_latency().await;
        let polls = self.receipt_counter.fetch_add(1, Ordering::SeqCst);
        if polls >= self.receipt_after_polls {
            debug!("Demo node mined {}", hash);
            Ok(Some(TransactionReceipt {
                hash: hash.clone(),
                status: ReceiptStatus::Success,
                block_hash: format!("0xdemo{}", polls),
            }))
        } else {
            Ok(None)
        }
    }

    async fn eth_get_block_by_hash(&self, hash: &str) -> Result<Option<EthBlock>, NodeError> {
        self.simulate_latency().await;
        Ok(Some(EthBlock {
            hash: hash.to_string(),
            timestamp: Utc::now(),
        }))
    }
}
