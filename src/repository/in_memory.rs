use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::entity::{
    Account, AccountID, Portfolio, Result, TokenID, TokenListItem, Transaction, TransactionID,
    Wallet, WalletID,
};
use crate::repository::{
    AccountRepository, PortfolioRepository, TokenListItemRepository, TransactionRepository,
    WalletRepository,
};

/// In-memory transaction storage, used in tests and by the demo daemon.
#[derive(Default)]
pub struct InMemoryTransactionRepository {
    items: RwLock<HashMap<TransactionID, Transaction>>,
}

impl InMemoryTransactionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
    async fn save(&self, transaction: &Transaction) -> Result<()> {
        self.items
            .write()
            .await
            .insert(transaction.id, transaction.clone());
        Ok(())
    }

    async fn remove(&self, transaction: &Transaction) -> Result<()> {
        self.items.write().await.remove(&transaction.id);
        Ok(())
    }

    async fn find(&self, id: &TransactionID) -> Result<Option<Transaction>> {
        Ok(self.items.read().await.get(id).cloned())
    }

    async fn all(&self) -> Result<Vec<Transaction>> {
        Ok(self.items.read().await.values().cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemoryWalletRepository {
    items: RwLock<HashMap<WalletID, Wallet>>,
}

impl InMemoryWalletRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WalletRepository for InMemoryWalletRepository {
    async fn save(&self, wallet: &Wallet) -> Result<()> {
        self.items.write().await.insert(wallet.id, wallet.clone());
        Ok(())
    }

    async fn remove(&self, wallet: &Wallet) -> Result<()> {
        self.items.write().await.remove(&wallet.id);
        Ok(())
    }

    async fn find(&self, id: &WalletID) -> Result<Option<Wallet>> {
        Ok(self.items.read().await.get(id).cloned())
    }

    async fn all(&self) -> Result<Vec<Wallet>> {
        Ok(self.items.read().await.values().cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemoryAccountRepository {
    items: RwLock<HashMap<AccountID, Account>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn save(&self, account: &Account) -> Result<()> {
        self.items
            .write()
            .await
            .insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn remove(&self, account: &Account) -> Result<()> {
        self.items.write().await.remove(&account.id);
        Ok(())
    }

    async fn find(&self, id: &AccountID) -> Result<Option<Account>> {
        Ok(self.items.read().await.get(id).cloned())
    }

    async fn all(&self) -> Result<Vec<Account>> {
        Ok(self.items.read().await.values().cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemoryTokenListItemRepository {
    items: RwLock<HashMap<TokenID, TokenListItem>>,
}

impl InMemoryTokenListItemRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenListItemRepository for InMemoryTokenListItemRepository {
    async fn save(&self, item: &TokenListItem) -> Result<()> {
        self.items.write().await.insert(item.id(), item.clone());
        Ok(())
    }

    async fn remove(&self, item: &TokenListItem) -> Result<()> {
        self.items.write().await.remove(&item.id());
        Ok(())
    }

    async fn find(&self, id: &TokenID) -> Result<Option<TokenListItem>> {
        Ok(self.items.read().await.get(id).cloned())
    }

    async fn all(&self) -> Result<Vec<TokenListItem>> {
        Ok(self.items.read().await.values().cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemoryPortfolioRepository {
    portfolio: RwLock<Option<Portfolio>>,
}

impl InMemoryPortfolioRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PortfolioRepository for InMemoryPortfolioRepository {
    async fn save(&self, portfolio: &Portfolio) -> Result<()> {
        *self.portfolio.write().await = Some(portfolio.clone());
        Ok(())
    }

    async fn remove(&self, portfolio: &Portfolio) -> Result<()> {
        let mut stored = self.portfolio.write().await;
        if stored.as_ref().map(|p| p.id) == Some(portfolio.id) {
            *stored = None;
        }
        Ok(())
    }

    async fn portfolio(&self) -> Result<Option<Portfolio>> {
        Ok(self.portfolio.read().await.clone())
    }
}
