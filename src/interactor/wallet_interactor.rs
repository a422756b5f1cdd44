use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;

use crate::entity::{
    Account, AccountID, Address, Amount, OwnerType, Portfolio, Result, Token, TokenID, TokenListItem,
    Wallet, WalletError, WalletID, WalletState,
};
use crate::repository::{
    self, AccountRepository, PortfolioRepository, TokenListItemRepository, WalletRepository,
};

/// A token together with the selected wallet's balance of it.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenData {
    pub token: Token,
    pub balance: Option<Amount>,
}

impl TokenData {
    pub fn new(token: Token, balance: Option<Amount>) -> Self {
        Self { token, balance }
    }

    pub fn address(&self) -> &Address {
        &self.token.address
    }
}

#[async_trait]
pub trait WalletInteractor: Send + Sync {
    async fn create_new_draft_wallet(&self) -> Result<WalletID>;
    async fn wallet_state(&self) -> Result<Option<WalletState>>;
    async fn add_owner(&self, address: &str, owner_type: OwnerType) -> Result<()>;
    async fn owner_address(&self, owner_type: OwnerType) -> Result<Option<String>>;
    async fn has_ready_to_use_wallet(&self) -> Result<bool>;
    async fn selected_wallet_address(&self) -> Result<Option<String>>;
    async fn minimum_deployment_amount(&self) -> Result<Option<Amount>>;
    async fn update_minimum_transaction_amount(&self, amount: Amount) -> Result<()>;
    async fn begin_deployment(&self) -> Result<()>;
    async fn assign_address(&self, address: &str) -> Result<()>;
    async fn finish_deployment(&self) -> Result<()>;
    async fn cancel_deployment(&self) -> Result<()>;
    async fn remove_draft_wallet(&self) -> Result<()>;
    async fn fee_payment_token(&self) -> Result<TokenData>;
    async fn change_payment_token(&self, token: &TokenData) -> Result<()>;
    async fn whitelist_token(&self, address: &str) -> Result<()>;
    async fn blacklist_token(&self, address: &str) -> Result<()>;
    async fn visible_tokens(&self, with_eth: bool) -> Result<Vec<TokenData>>;
}

pub struct WalletInteractorImpl {
    wallets: Arc<dyn WalletRepository>,
    portfolios: Arc<dyn PortfolioRepository>,
    accounts: Arc<dyn AccountRepository>,
    token_items: Arc<dyn TokenListItemRepository>,
}

impl WalletInteractorImpl {
    pub fn new(
        wallets: Arc<dyn WalletRepository>,
        portfolios: Arc<dyn PortfolioRepository>,
        accounts: Arc<dyn AccountRepository>,
        token_items: Arc<dyn TokenListItemRepository>,
    ) -> Self {
        Self {
            wallets,
            portfolios,
            accounts,
            token_items,
        }
    }

    async fn selected_wallet(&self) -> Result<Option<Wallet>> {
        repository::selected_wallet(self.portfolios.as_ref(), self.wallets.as_ref()).await
    }

    async fn require_selected_wallet(&self) -> Result<Wallet> {
        self.selected_wallet()
            .await?
            .ok_or(WalletError::NoSelectedWallet)
    }

    /// Applies `change` to the selected wallet and stores the result.
    async fn update_selected_wallet<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut Wallet) -> Result<()> + Send,
    {
        let mut wallet = self.require_selected_wallet().await?;
        change(&mut wallet)?;
        self.wallets.save(&wallet).await
    }

    async fn ensure_account(&self, token: &Token, wallet_id: WalletID) -> Result<()> {
        let id = AccountID::new(token.id(), wallet_id);
        if self.accounts.find(&id).await?.is_none() {
            self.accounts.save(&Account::new(id)).await?;
        }
        Ok(())
    }

    async fn token_data(&self, token: Token, wallet_id: WalletID) -> Result<TokenData> {
        let account = self
            .accounts
            .find(&AccountID::new(token.id(), wallet_id))
            .await?;
        Ok(TokenData::new(token, account.and_then(|a| a.balance)))
    }

    async fn find_item(&self, address: &str) -> Result<TokenListItem> {
        let address = Address::new(address)?;
        self.token_items
            .find(&TokenID::from(&address))
            .await?
            .ok_or_else(|| WalletError::InvalidAddress(format!("unknown token {}", address)))
    }
}

#[async_trait]
impl WalletInteractor for WalletInteractorImpl {
    /// Creates a draft wallet with an Ether account and selects it.
    async fn create_new_draft_wallet(&self) -> Result<WalletID> {
        let mut portfolio = match self.portfolios.portfolio().await? {
            Some(portfolio) => portfolio,
            None => Portfolio::new(self.portfolios.next_id()),
        };
        let wallet = Wallet::new_draft(self.wallets.next_id());
        self.wallets.save(&wallet).await?;
        self.ensure_account(&Token::ether(), wallet.id).await?;

        portfolio.add_wallet(wallet.id);
        portfolio.select_wallet(wallet.id);
        self.portfolios.save(&portfolio).await?;

        info!("Created draft wallet {}", wallet.id);
        Ok(wallet.id)
    }

    async fn wallet_state(&self) -> Result<Option<WalletState>> {
        Ok(self.selected_wallet().await?.map(|w| w.state()))
    }

    async fn add_owner(&self, address: &str, owner_type: OwnerType) -> Result<()> {
        let address = Address::new(address)?;
        self.update_selected_wallet(|wallet| wallet.add_owner(owner_type, address))
            .await
    }

    async fn owner_address(&self, owner_type: OwnerType) -> Result<Option<String>> {
        Ok(self
            .selected_wallet()
            .await?
            .and_then(|w| w.owner(owner_type).map(|a| a.value().to_string())))
    }

    async fn has_ready_to_use_wallet(&self) -> Result<bool> {
        Ok(self
            .selected_wallet()
            .await?
            .is_some_and(|w| w.is_ready_to_use()))
    }

    async fn selected_wallet_address(&self) -> Result<Option<String>> {
        Ok(self
            .selected_wallet()
            .await?
            .and_then(|w| w.address().map(|a| a.value().to_string())))
    }

    async fn minimum_deployment_amount(&self) -> Result<Option<Amount>> {
        Ok(self
            .selected_wallet()
            .await?
            .and_then(|w| w.minimum_transaction_amount()))
    }

    async fn update_minimum_transaction_amount(&self, amount: Amount) -> Result<()> {
        self.update_selected_wallet(|wallet| {
            wallet.update_minimum_transaction_amount(amount);
            Ok(())
        })
        .await
    }

    async fn begin_deployment(&self) -> Result<()> {
        self.update_selected_wallet(Wallet::start_deployment).await
    }

    async fn assign_address(&self, address: &str) -> Result<()> {
        let address = Address::new(address)?;
        self.update_selected_wallet(|wallet| wallet.change_address(address))
            .await
    }

    async fn finish_deployment(&self) -> Result<()> {
        self.update_selected_wallet(Wallet::finish_deployment).await?;
        info!("Wallet deployment finished");
        Ok(())
    }

    async fn cancel_deployment(&self) -> Result<()> {
        self.update_selected_wallet(Wallet::cancel_deployment).await
    }

    /// Removes the selected wallet with its accounts while it is still a draft.
    async fn remove_draft_wallet(&self) -> Result<()> {
        let Some(wallet) = self.selected_wallet().await? else {
            return Ok(());
        };
        if wallet.state() != WalletState::Draft {
            debug!("Wallet {} is {}, keeping it", wallet.id, wallet.state());
            return Ok(());
        }
        for account in self.accounts.filter_by_wallet(&wallet.id).await? {
            self.accounts.remove(&account).await?;
        }
        self.wallets.remove(&wallet).await?;
        if let Some(mut portfolio) = self.portfolios.portfolio().await? {
            portfolio.remove_wallet(wallet.id);
            self.portfolios.save(&portfolio).await?;
        }
        info!("Removed draft wallet {}", wallet.id);
        Ok(())
    }

    /// The wallet's fee token, or Ether when none is set or the token list lost it.
    async fn fee_payment_token(&self) -> Result<TokenData> {
        let wallet = self.require_selected_wallet().await?;
        let token = match wallet.fee_payment_token_address() {
            Some(address) if !address.is_zero() => {
                self.token_items
                    .find(&TokenID::from(address))
                    .await?
                    .map(|item| item.token)
                    .unwrap_or_else(Token::ether)
            }
            _ => Token::ether(),
        };
        self.token_data(token, wallet.id).await
    }

    /// Sets the fee token, whitelisting it when it is not Ether.
    async fn change_payment_token(&self, token: &TokenData) -> Result<()> {
        let mut wallet = self.require_selected_wallet().await?;
        if !token.token.is_ether() {
            if let Some(mut item) = self.token_items.find(&token.token.id()).await? {
                if !item.is_whitelisted() {
                    item.whitelist(self.token_items.next_sorting_id().await?);
                    self.token_items.save(&item).await?;
                }
            }
            self.ensure_account(&token.token, wallet.id).await?;
        }
        wallet.change_fee_payment_token(token.address().clone());
        self.wallets.save(&wallet).await
    }

    async fn whitelist_token(&self, address: &str) -> Result<()> {
        let mut item = self.find_item(address).await?;
        if item.is_whitelisted() {
            return Ok(());
        }
        item.whitelist(self.token_items.next_sorting_id().await?);
        self.token_items.save(&item).await?;
        if let Some(wallet) = self.selected_wallet().await? {
            self.ensure_account(&item.token, wallet.id).await?;
        }
        Ok(())
    }

    async fn blacklist_token(&self, address: &str) -> Result<()> {
        let mut item = self.find_item(address).await?;
        item.blacklist();
        self.token_items.save(&item).await
    }

    async fn visible_tokens(&self, with_eth: bool) -> Result<Vec<TokenData>> {
        let Some(wallet) = self.selected_wallet().await? else {
            return Ok(Vec::new());
        };
        let mut tokens = Vec::new();
        if with_eth {
            tokens.push(Token::ether());
        }
        tokens.extend(
            self.token_items
                .whitelisted()
                .await?
                .into_iter()
                .map(|item| item.token),
        );

        let mut visible = Vec::with_capacity(tokens.len());
        for token in tokens {
            visible.push(self.token_data(token, wallet.id).await?);
        }
        Ok(visible)
    }
}
