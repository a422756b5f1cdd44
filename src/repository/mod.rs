//! Storage contracts for the domain entities.
//!
//! Every operation works on a single entity; there are no multi-entity
//! transactions, so callers design each operation to be correct at single
//! `save` granularity and re-fetch before mutating.
use async_trait::async_trait;
use uuid::Uuid;

use crate::entity::{
    Account, AccountID, Portfolio, Result, TokenID, TokenListItem, Transaction, TransactionID,
    Wallet, WalletID,
};

pub mod in_memory;
pub mod postgres;

pub use in_memory::{
    InMemoryAccountRepository, InMemoryPortfolioRepository, InMemoryTokenListItemRepository,
    InMemoryTransactionRepository, InMemoryWalletRepository,
};
pub use postgres::{
    PgAccountRepository, PgPortfolioRepository, PgTokenListItemRepository,
    PgTransactionRepository, PgWalletRepository,
};

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn save(&self, transaction: &Transaction) -> Result<()>;
    async fn remove(&self, transaction: &Transaction) -> Result<()>;
    async fn find(&self, id: &TransactionID) -> Result<Option<Transaction>>;
    async fn all(&self) -> Result<Vec<Transaction>>;

    fn next_id(&self) -> TransactionID {
        TransactionID::new()
    }
}

#[async_trait]
pub trait WalletRepository: Send + Sync {
    async fn save(&self, wallet: &Wallet) -> Result<()>;
    async fn remove(&self, wallet: &Wallet) -> Result<()>;
    async fn find(&self, id: &WalletID) -> Result<Option<Wallet>>;
    async fn all(&self) -> Result<Vec<Wallet>>;

    fn next_id(&self) -> WalletID {
        WalletID::new()
    }
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn save(&self, account: &Account) -> Result<()>;
    async fn remove(&self, account: &Account) -> Result<()>;
    async fn find(&self, id: &AccountID) -> Result<Option<Account>>;
    async fn all(&self) -> Result<Vec<Account>>;

    async fn filter_by_wallet(&self, wallet_id: &WalletID) -> Result<Vec<Account>> {
        let accounts = self.all().await?;
        Ok(accounts
            .into_iter()
            .filter(|a| &a.id.wallet_id == wallet_id)
            .collect())
    }
}

#[async_trait]
pub trait TokenListItemRepository: Send + Sync {
    async fn save(&self, item: &TokenListItem) -> Result<()>;
    async fn remove(&self, item: &TokenListItem) -> Result<()>;
    async fn find(&self, id: &TokenID) -> Result<Option<TokenListItem>>;
    async fn all(&self) -> Result<Vec<TokenListItem>>;

    /// Whitelisted items in display order.
    async fn whitelisted(&self) -> Result<Vec<TokenListItem>> {
        let mut items: Vec<_> = self
            .all()
            .await?
            .into_iter()
            .filter(|item| item.is_whitelisted())
            .collect();
        items.sort_by_key(|item| (item.sorting_id.unwrap_or(i32::MAX), item.id()));
        Ok(items)
    }

    /// Items that can be used to pay transaction fees.
    async fn payment_tokens(&self) -> Result<Vec<TokenListItem>> {
        let mut items: Vec<_> = self
            .all()
            .await?
            .into_iter()
            .filter(|item| item.can_pay_transaction_fee)
            .collect();
        items.sort_by(|a, b| a.token.code.cmp(&b.token.code));
        Ok(items)
    }

    /// Sorting id placing a newly whitelisted item last.
    async fn next_sorting_id(&self) -> Result<i32> {
        let max = self
            .whitelisted()
            .await?
            .iter()
            .filter_map(|item| item.sorting_id)
            .max();
        Ok(max.map_or(0, |id| id + 1))
    }
}

/// Storage of the single portfolio on this device.
#[async_trait]
pub trait PortfolioRepository: Send + Sync {
    async fn save(&self, portfolio: &Portfolio) -> Result<()>;
    async fn remove(&self, portfolio: &Portfolio) -> Result<()>;
    async fn portfolio(&self) -> Result<Option<Portfolio>>;

    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Loads the wallet selected in the portfolio, if any.
pub async fn selected_wallet(
    portfolios: &dyn PortfolioRepository,
    wallets: &dyn WalletRepository,
) -> Result<Option<Wallet>> {
    let selected = match portfolios.portfolio().await? {
        Some(portfolio) => portfolio.selected_wallet(),
        None => None,
    };
    match selected {
        Some(id) => wallets.find(&id).await,
        None => Ok(None),
    }
}
