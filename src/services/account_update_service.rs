use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;

use crate::entity::{Account, AccountID, Amount, DomainEvent, Result, Token, Wallet};
use crate::ethereum::EthereumNodeDomainService;
use crate::event::EventPublisher;
use crate::repository::{
    self, AccountRepository, PortfolioRepository, TokenListItemRepository, WalletRepository,
};

/// Refreshes account balances from the node.
#[async_trait]
pub trait AccountUpdateDomainService: Send + Sync {
    /// Updates every visible account of the selected wallet.
    async fn update_accounts_balances(&self) -> Result<()>;

    async fn update_account_balance(&self, id: &AccountID) -> Result<()>;
}

pub struct NodeAccountUpdateService {
    accounts: Arc<dyn AccountRepository>,
    wallets: Arc<dyn WalletRepository>,
    portfolios: Arc<dyn PortfolioRepository>,
    token_items: Arc<dyn TokenListItemRepository>,
    node: Arc<dyn EthereumNodeDomainService>,
    publisher: Arc<EventPublisher>,
}

impl NodeAccountUpdateService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        wallets: Arc<dyn WalletRepository>,
        portfolios: Arc<dyn PortfolioRepository>,
        token_items: Arc<dyn TokenListItemRepository>,
        node: Arc<dyn EthereumNodeDomainService>,
        publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            accounts,
            wallets,
            portfolios,
            token_items,
            node,
            publisher,
        }
    }

    async fn fetch_balance(&self, wallet: &Wallet, token: &Token) -> Result<Option<Amount>> {
        let Some(owner) = wallet.address() else {
            return Ok(None);
        };
        let balance = if token.is_ether() {
            self.node.eth_get_balance(owner).await?
        } else {
            self.node.eth_get_token_balance(&token.address, owner).await?
        };
        Ok(Some(balance))
    }

    async fn refresh(&self, wallet: &Wallet, token: &Token) -> Result<()> {
        let Some(balance) = self.fetch_balance(wallet, token).await? else {
            return Ok(());
        };
        let id = AccountID::new(token.id(), wallet.id);
        let mut account = self
            .accounts
            .find(&id)
            .await?
            .unwrap_or_else(|| Account::new(id));
        account.update_balance(balance);
        self.accounts.save(&account).await?;
        debug!("Balance of {} is {}", account.id, balance);
        Ok(())
    }

    async fn token_for(&self, id: &AccountID) -> Result<Option<Token>> {
        let ether = Token::ether();
        if id.token_id == ether.id() {
            return Ok(Some(ether));
        }
        Ok(self.token_items.find(&id.token_id).await?.map(|item| item.token))
    }
}

#[async_trait]
impl AccountUpdateDomainService for NodeAccountUpdateService {
    async fn update_accounts_balances(&self) -> Result<()> {
        let Some(wallet) =
            repository::selected_wallet(self.portfolios.as_ref(), self.wallets.as_ref()).await?
        else {
            debug!("No wallet selected, skipping balance update");
            return Ok(());
        };
        if wallet.address().is_none() {
            debug!("Wallet {} has no address yet, skipping balance update", wallet.id);
            return Ok(());
        }

        let mut tokens = vec![Token::ether()];
        tokens.extend(
            self.token_items
                .whitelisted()
                .await?
                .into_iter()
                .map(|item| item.token),
        );
        for token in &tokens {
            self.refresh(&wallet, token).await?;
        }

        info!("Updated {} account balance(s) of wallet {}", tokens.len(), wallet.id);
        self.publisher
            .publish(DomainEvent::AccountsBalancesUpdated { wallet_id: wallet.id });
        Ok(())
    }

    async fn update_account_balance(&self, id: &AccountID) -> Result<()> {
        let Some(wallet) = self.wallets.find(&id.wallet_id).await? else {
            return Ok(());
        };
        let Some(token) = self.token_for(id).await? else {
            debug!("Token of account {} is unknown", id);
            return Ok(());
        };
        self.refresh(&wallet, &token).await
    }
}
