use chrono::{NaiveDate, Utc};
use futures::future::try_join_all;
use log::{debug, info};
use std::cmp::Ordering;
use std::sync::Arc;

use crate::entity::{
    date_for_grouping, distant_past, AccountID, DomainEvent, EthBlock, ReceiptStatus, Result,
    Token, Transaction, TransactionGroup, TransactionGroupType, TransactionID, TransactionReceipt,
    TransactionStatus, TransactionType, Wallet, WalletError,
};
use crate::ethereum::EthereumNodeDomainService;
use crate::event::EventPublisher;
use crate::repository::{self, PortfolioRepository, TransactionRepository, WalletRepository};

/// Creates, orders and confirms wallet transactions.
pub struct TransactionDomainService {
    transactions: Arc<dyn TransactionRepository>,
    wallets: Arc<dyn WalletRepository>,
    portfolios: Arc<dyn PortfolioRepository>,
    node: Arc<dyn EthereumNodeDomainService>,
    publisher: Arc<EventPublisher>,
}

impl TransactionDomainService {
    pub fn new(
        transactions: Arc<dyn TransactionRepository>,
        wallets: Arc<dyn WalletRepository>,
        portfolios: Arc<dyn PortfolioRepository>,
        node: Arc<dyn EthereumNodeDomainService>,
        publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            transactions,
            wallets,
            portfolios,
            node,
            publisher,
        }
    }

    /// Creates a draft Ether transfer from the selected wallet.
    pub async fn new_draft_transaction_in_selected_wallet(&self) -> Result<TransactionID> {
        let wallet = repository::selected_wallet(self.portfolios.as_ref(), self.wallets.as_ref())
            .await?
            .ok_or(WalletError::NoSelectedWallet)?;
        self.new_draft_transaction(&wallet).await
    }

    /// Creates and stores a draft Ether transfer sent from the wallet's address.
    pub async fn new_draft_transaction(&self, wallet: &Wallet) -> Result<TransactionID> {
        let sender = wallet
            .address()
            .cloned()
            .ok_or(WalletError::WalletNotDeployed(wallet.id))?;
        let mut transaction = Transaction::new(
            self.transactions.next_id(),
            TransactionType::Transfer,
            wallet.id,
            AccountID::new(Token::ether().id(), wallet.id),
        );
        transaction.change_sender(sender)?;
        transaction.timestamp_created(Utc::now());
        self.transactions.save(&transaction).await?;

        info!("Created draft transaction {} in wallet {}", transaction.id, wallet.id);
        Ok(transaction.id)
    }

    /// Removes the transaction if it is still a draft; otherwise does nothing.
    pub async fn remove_draft_transaction(&self, id: &TransactionID) -> Result<()> {
        match self.transactions.find(id).await? {
            Some(transaction) if transaction.status() == TransactionStatus::Draft => {
                self.transactions.remove(&transaction).await?;
                debug!("Removed draft transaction {}", id);
            }
            _ => debug!("Transaction {} is not a draft, keeping it", id),
        }
        Ok(())
    }

    /// Submitted transactions, most recent first.
    pub async fn all_transactions(&self) -> Result<Vec<Transaction>> {
        let mut transactions: Vec<_> = self
            .transactions
            .all()
            .await?
            .into_iter()
            .filter(|tx| is_listed(tx.status()))
            .collect();
        transactions.sort_by(display_order);
        Ok(transactions)
    }

    /// Pending transactions first, then today's, then everything older.
    pub async fn grouped_transactions(&self) -> Result<Vec<TransactionGroup>> {
        let today = date_for_grouping(Utc::now());
        group_transactions(self.all_transactions().await?, today)
    }

    /// Checks every pending transaction for a receipt and records the outcome.
    ///
    /// Publishes a single `TransactionStatusUpdated` after all saves when at
    /// least one transaction changed. Returns the number of updated transactions.
    pub async fn update_pending_transactions(&self) -> Result<usize> {
        let pending = self.with_status(&[TransactionStatus::Pending]).await?;
        let lookups = pending.iter().map(|tx| self.find_confirmation(tx, false));
        let confirmations = try_join_all(lookups).await?;

        let mut updated = 0;
        for (id, receipt, block) in confirmations.into_iter().flatten() {
            let Some(mut transaction) = self.transactions.find(&id).await? else {
                debug!("Transaction {} disappeared while waiting for its receipt", id);
                continue;
            };
            if transaction.status() != TransactionStatus::Pending {
                debug!("Transaction {} is no longer pending", id);
                continue;
            }
            transaction.timestamp_processed(block.timestamp);
            match receipt.status {
                ReceiptStatus::Success => transaction.succeed()?,
                ReceiptStatus::Failed => transaction.fail()?,
            };
            transaction.timestamp_updated(Utc::now());
            self.transactions.save(&transaction).await?;
            info!("Transaction {} is {}", id, transaction.status());
            updated += 1;
        }

        if updated > 0 {
            self.publisher.publish(DomainEvent::TransactionStatusUpdated);
        }
        Ok(updated)
    }

    /// Refreshes processed timestamps of finished transactions from their blocks.
    pub async fn update_timestamps_of_processed_transactions(&self) -> Result<usize> {
        let processed = self
            .with_status(&[TransactionStatus::Success, TransactionStatus::Failed])
            .await?;
        let lookups = processed.iter().map(|tx| self.find_confirmation(tx, true));
        let confirmations = try_join_all(lookups).await?;

        for (id, _, block) in confirmations.into_iter().flatten() {
            let Some(mut transaction) = self.transactions.find(&id).await? else {
                continue;
            };
            transaction
                .timestamp_processed(block.timestamp)
                .timestamp_updated(Utc::now());
            self.transactions.save(&transaction).await?;
        }

        if !processed.is_empty() {
            self.publisher.publish(DomainEvent::TransactionStatusUpdated);
        }
        Ok(processed.len())
    }

    async fn with_status(&self, statuses: &[TransactionStatus]) -> Result<Vec<Transaction>> {
        Ok(self
            .transactions
            .all()
            .await?
            .into_iter()
            .filter(|tx| statuses.contains(&tx.status()))
            .collect())
    }

    /// Looks up the receipt and block of a broadcast transaction.
    ///
    /// A missing hash or a receipt without block is an invariant violation, as
    /// is a missing receipt when `receipt_required` is set.
    async fn find_confirmation(
        &self,
        transaction: &Transaction,
        receipt_required: bool,
    ) -> Result<Option<(TransactionID, TransactionReceipt, EthBlock)>> {
        let hash = transaction.transaction_hash().ok_or_else(|| {
            WalletError::InvariantViolation(format!(
                "transaction {} ({}) has no blockchain hash",
                transaction.id,
                transaction.status()
            ))
        })?;

        let Some(receipt) = self.node.eth_get_transaction_receipt(hash).await? else {
            if receipt_required {
                return Err(WalletError::InvariantViolation(format!(
                    "processed transaction {} has no receipt",
                    transaction.id
                )));
            }
            return Ok(None);
        };

        let block = self
            .node
            .eth_get_block_by_hash(&receipt.block_hash)
            .await?
            .ok_or_else(|| {
                WalletError::InvariantViolation(format!(
                    "receipt of {} references unknown block {}",
                    hash, receipt.block_hash
                ))
            })?;

        Ok(Some((transaction.id, receipt, block)))
    }
}

fn is_listed(status: TransactionStatus) -> bool {
    !matches!(
        status,
        TransactionStatus::Draft
            | TransactionStatus::Signing
            | TransactionStatus::Discarded
            | TransactionStatus::Rejected
    )
}

/// Walks both transactions' present timestamps pairwise, most recent first.
///
/// A side that runs out of timestamps first sorts before the other. When both
/// run out together, status ordinal and then identity decide.
pub fn display_order(lhs: &Transaction, rhs: &Transaction) -> Ordering {
    let mut left = lhs.event_dates();
    let mut right = rhs.event_dates();
    loop {
        match (left.next(), right.next()) {
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l == r => continue,
            (Some(l), Some(r)) => return r.cmp(&l),
            (None, None) => {
                return lhs
                    .status()
                    .cmp(&rhs.status())
                    .then_with(|| lhs.id.cmp(&rhs.id))
            }
        }
    }
}

/// Splits ordered transactions into pending, today and past groups, dropping empty ones.
pub fn group_transactions(
    transactions: Vec<Transaction>,
    today: NaiveDate,
) -> Result<Vec<TransactionGroup>> {
    let mut pending = TransactionGroup::new(TransactionGroupType::Pending, None);
    let mut recent = TransactionGroup::new(TransactionGroupType::Processed, Some(today));
    let mut past = TransactionGroup::new(TransactionGroupType::Processed, Some(distant_past()));

    for transaction in transactions {
        if transaction.status() == TransactionStatus::Pending {
            pending.transactions.push(transaction);
            continue;
        }
        let date = transaction.event_dates().next().ok_or_else(|| {
            WalletError::InvariantViolation(format!(
                "transaction {} ({}) has no timestamp",
                transaction.id,
                transaction.status()
            ))
        })?;
        if date_for_grouping(date) >= today {
            recent.transactions.push(transaction);
        } else {
            past.transactions.push(transaction);
        }
    }

    Ok([pending, recent, past]
        .into_iter()
        .filter(|group| !group.transactions.is_empty())
        .collect())
}
