pub mod wallet_interactor;

pub use wallet_interactor::{TokenData, WalletInteractor, WalletInteractorImpl};
