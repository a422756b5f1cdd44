use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::WalletID;

/// The set of wallets on this device and which of them is selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub id: Uuid,
    wallets: Vec<WalletID>,
    selected_wallet: Option<WalletID>,
}

impl Portfolio {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            wallets: Vec::new(),
            selected_wallet: None,
        }
    }

    pub fn restore(id: Uuid, wallets: Vec<WalletID>, selected_wallet: Option<WalletID>) -> Self {
        Self {
            id,
            wallets,
            selected_wallet,
        }
    }

    pub fn wallets(&self) -> &[WalletID] {
        &self.wallets
    }

    pub fn selected_wallet(&self) -> Option<WalletID> {
        self.selected_wallet
    }

    /// Adds a wallet; the first wallet added becomes the selected one.
    pub fn add_wallet(&mut self, wallet_id: WalletID) {
        if !self.wallets.contains(&wallet_id) {
            self.wallets.push(wallet_id);
        }
        if self.selected_wallet.is_none() {
            self.selected_wallet = Some(wallet_id);
        }
    }

    /// Selects a wallet already in the portfolio. Returns false for unknown wallets.
    pub fn select_wallet(&mut self, wallet_id: WalletID) -> bool {
        if self.wallets.contains(&wallet_id) {
            self.selected_wallet = Some(wallet_id);
            true
        } else {
            false
        }
    }

    /// Removes a wallet, moving the selection to the first remaining wallet.
    pub fn remove_wallet(&mut self, wallet_id: WalletID) {
        self.wallets.retain(|id| *id != wallet_id);
        if self.selected_wallet == Some(wallet_id) {
            self.selected_wallet = self.wallets.first().copied();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_wallet_is_selected() {
        let mut portfolio = Portfolio::new(Uuid::new_v4());
        let first = WalletID::new();
        let second = WalletID::new();
        portfolio.add_wallet(first);
        portfolio.add_wallet(second);
        assert_eq!(portfolio.selected_wallet(), Some(first));
        assert!(portfolio.select_wallet(second));
        assert_eq!(portfolio.selected_wallet(), Some(second));
    }

    #[test]
    fn removing_selected_wallet_moves_selection() {
        let mut portfolio = Portfolio::new(Uuid::new_v4());
        let first = WalletID::new();
        let second = WalletID::new();
        portfolio.add_wallet(first);
        portfolio.add_wallet(second);
        portfolio.remove_wallet(first);
        assert_eq!(portfolio.selected_wallet(), Some(second));
        portfolio.remove_wallet(second);
        assert_eq!(portfolio.selected_wallet(), None);
    }

    #[test]
    fn cannot_select_unknown_wallet() {
        let mut portfolio = Portfolio::new(Uuid::new_v4());
        assert!(!portfolio.select_wallet(WalletID::new()));
        assert_eq!(portfolio.selected_wallet(), None);
    }
}
