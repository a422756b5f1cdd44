use async_trait::async_trait;
use log::debug;
use sqlx::types::Json;
use sqlx::{postgres::PgRow, PgPool, Row};
use std::sync::Arc;

use crate::entity::{
    Account, AccountID, Portfolio, Result, Token, TokenID, TokenListItem, Transaction,
    TransactionID, Wallet, WalletID,
};
use crate::repository::{
    AccountRepository, PortfolioRepository, TokenListItemRepository, TransactionRepository,
    WalletRepository,
};

/// Transactions are stored as a JSONB document next to the columns used for lookups.
pub struct PgTransactionRepository {
    pool: Arc<PgPool>,
}

impl PgTransactionRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PgTransactionRepository {
    async fn save(&self, transaction: &Transaction) -> Result<()> {
        sqlx::query(
            "INSERT INTO transactions (id, wallet_id, status, data) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (id) DO UPDATE SET wallet_id = $2, status = $3, data = $4",
        )
        .bind(transaction.id.0)
        .bind(transaction.wallet_id.0)
        .bind(transaction.status().raw_value())
        .bind(Json(transaction))
        .execute(&*self.pool)
        .await?;

        debug!("Saved transaction {} ({})", transaction.id, transaction.status());
        Ok(())
    }

    async fn remove(&self, transaction: &Transaction) -> Result<()> {
        sqlx::query("DELETE FROM transactions WHERE id = $1")
            .bind(transaction.id.0)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    async fn find(&self, id: &TransactionID) -> Result<Option<Transaction>> {
        let row = sqlx::query("SELECT data FROM transactions WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&*self.pool)
            .await?;

        row.map(|row| transaction_from_row(&row)).transpose()
    }

    async fn all(&self) -> Result<Vec<Transaction>> {
        let rows = sqlx::query("SELECT data FROM transactions")
            .fetch_all(&*self.pool)
            .await?;

        rows.iter().map(transaction_from_row).collect()
    }
}

fn transaction_from_row(row: &PgRow) -> Result<Transaction> {
    let Json(transaction): Json<Transaction> = row.try_get("data")?;
    Ok(transaction)
}

pub struct PgWalletRepository {
    pool: Arc<PgPool>,
}

impl PgWalletRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WalletRepository for PgWalletRepository {
    async fn save(&self, wallet: &Wallet) -> Result<()> {
        sqlx::query(
            "INSERT INTO wallets (id, state, address, data) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (id) DO UPDATE SET state = $2, address = $3, data = $4",
        )
        .bind(wallet.id.0)
        .bind(wallet.state().to_string())
        .bind(wallet.address().map(|a| a.value().to_string()))
        .bind(Json(wallet))
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, wallet: &Wallet) -> Result<()> {
        sqlx::query("DELETE FROM wallets WHERE id = $1")
            .bind(wallet.id.0)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    async fn find(&self, id: &WalletID) -> Result<Option<Wallet>> {
        let row = sqlx::query("SELECT data FROM wallets WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&*self.pool)
            .await?;

        row.map(|row| wallet_from_row(&row)).transpose()
    }

    async fn all(&self) -> Result<Vec<Wallet>> {
        let rows = sqlx::query("SELECT data FROM wallets")
            .fetch_all(&*self.pool)
            .await?;

        rows.iter().map(wallet_from_row).collect()
    }
}

fn wallet_from_row(row: &PgRow) -> Result<Wallet> {
    let Json(wallet): Json<Wallet> = row.try_get("data")?;
    Ok(wallet)
}

pub struct PgAccountRepository {
    pool: Arc<PgPool>,
}

impl PgAccountRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn save(&self, account: &Account) -> Result<()> {
        sqlx::query(
            "INSERT INTO accounts (token_id, wallet_id, balance, minimum_transaction_amount) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (token_id, wallet_id) DO UPDATE SET balance = $3, minimum_transaction_amount = $4",
        )
        .bind(account.id.token_id.value())
        .bind(account.id.wallet_id.0)
        .bind(account.balance)
        .bind(account.minimum_transaction_amount)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, account: &Account) -> Result<()> {
        sqlx::query("DELETE FROM accounts WHERE token_id = $1 AND wallet_id = $2")
            .bind(account.id.token_id.value())
            .bind(account.id.wallet_id.0)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    async fn find(&self, id: &AccountID) -> Result<Option<Account>> {
        let row = sqlx::query("SELECT * FROM accounts WHERE token_id = $1 AND wallet_id = $2")
            .bind(id.token_id.value())
            .bind(id.wallet_id.0)
            .fetch_optional(&*self.pool)
            .await?;

        row.map(|row| account_from_row(&row)).transpose()
    }

    async fn all(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query("SELECT * FROM accounts")
            .fetch_all(&*self.pool)
            .await?;

        rows.iter().map(account_from_row).collect()
    }

    async fn filter_by_wallet(&self, wallet_id: &WalletID) -> Result<Vec<Account>> {
        let rows = sqlx::query("SELECT * FROM accounts WHERE wallet_id = $1")
            .bind(wallet_id.0)
            .fetch_all(&*self.pool)
            .await?;

        rows.iter().map(account_from_row).collect()
    }
}

fn account_from_row(row: &PgRow) -> Result<Account> {
    let token_id: String = row.try_get("token_id")?;
    let wallet_id: uuid::Uuid = row.try_get("wallet_id")?;
    Ok(Account {
        id: AccountID::new(TokenID::new(&token_id), WalletID(wallet_id)),
        balance: row.try_get("balance")?,
        minimum_transaction_amount: row.try_get("minimum_transaction_amount")?,
    })
}

pub struct PgTokenListItemRepository {
    pool: Arc<PgPool>,
}

impl PgTokenListItemRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenListItemRepository for PgTokenListItemRepository {
    async fn save(&self, item: &TokenListItem) -> Result<()> {
        sqlx::query(
            "INSERT INTO token_list_items (id, status, can_pay_transaction_fee, sorting_id, token, updated) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (id) DO UPDATE SET status = $2, can_pay_transaction_fee = $3, \
             sorting_id = $4, token = $5, updated = $6",
        )
        .bind(item.id().value().to_string())
        .bind(item.status.to_string())
        .bind(item.can_pay_transaction_fee)
        .bind(item.sorting_id)
        .bind(Json(&item.token))
        .bind(item.updated)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, item: &TokenListItem) -> Result<()> {
        sqlx::query("DELETE FROM token_list_items WHERE id = $1")
            .bind(item.id().value().to_string())
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    async fn find(&self, id: &TokenID) -> Result<Option<TokenListItem>> {
        let row = sqlx::query("SELECT * FROM token_list_items WHERE id = $1")
            .bind(id.value())
            .fetch_optional(&*self.pool)
            .await?;

        row.map(|row| token_list_item_from_row(&row)).transpose()
    }

    async fn all(&self) -> Result<Vec<TokenListItem>> {
        let rows = sqlx::query("SELECT * FROM token_list_items")
            .fetch_all(&*self.pool)
            .await?;

        rows.iter().map(token_list_item_from_row).collect()
    }
}

fn token_list_item_from_row(row: &PgRow) -> Result<TokenListItem> {
    let status: String = row.try_get("status")?;
    let Json(token): Json<Token> = row.try_get("token")?;
    Ok(TokenListItem {
        token,
        status: status
            .parse()
            .map_err(|e: String| sqlx::Error::Decode(e.into()))?,
        can_pay_transaction_fee: row.try_get("can_pay_transaction_fee")?,
        sorting_id: row.try_get("sorting_id")?,
        updated: row.try_get("updated")?,
    })
}

pub struct PgPortfolioRepository {
    pool: Arc<PgPool>,
}

impl PgPortfolioRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PortfolioRepository for PgPortfolioRepository {
    async fn save(&self, portfolio: &Portfolio) -> Result<()> {
        let wallets: Vec<uuid::Uuid> = portfolio.wallets().iter().map(|w| w.0).collect();
        sqlx::query(
            "INSERT INTO portfolios (id, wallets, selected_wallet) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET wallets = $2, selected_wallet = $3",
        )
        .bind(portfolio.id)
        .bind(Json(wallets))
        .bind(portfolio.selected_wallet().map(|w| w.0))
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, portfolio: &Portfolio) -> Result<()> {
        sqlx::query("DELETE FROM portfolios WHERE id = $1")
            .bind(portfolio.id)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    async fn portfolio(&self) -> Result<Option<Portfolio>> {
        let row = sqlx::query("SELECT * FROM portfolios LIMIT 1")
            .fetch_optional(&*self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let Json(wallets): Json<Vec<uuid::Uuid>> = row.try_get("wallets")?;
        let selected: Option<uuid::Uuid> = row.try_get("selected_wallet")?;
        Ok(Some(Portfolio::restore(
            row.try_get("id")?,
            wallets.into_iter().map(WalletID).collect(),
            selected.map(WalletID),
        )))
    }
}
