use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::ethereum::EthereumNodeDomainService;
use crate::event::EventPublisher;
use crate::interactor::{WalletInteractor, WalletInteractorImpl};
use crate::repository::{
    AccountRepository, InMemoryAccountRepository, InMemoryPortfolioRepository,
    InMemoryTokenListItemRepository, InMemoryTransactionRepository, InMemoryWalletRepository,
    PgAccountRepository, PgPortfolioRepository, PgTokenListItemRepository,
    PgTransactionRepository, PgWalletRepository, PortfolioRepository, TokenListItemRepository,
    TransactionRepository, WalletRepository,
};
use crate::services::{
    AccountUpdateDomainService, HttpTokenListService, NodeAccountUpdateService,
    SynchronisationService, TokenListDomainService, TransactionDomainService, TransactionMonitor,
};

/// The storage backends a container is assembled from.
#[derive(Clone)]
pub struct Repositories {
    pub transactions: Arc<dyn TransactionRepository>,
    pub wallets: Arc<dyn WalletRepository>,
    pub accounts: Arc<dyn AccountRepository>,
    pub token_items: Arc<dyn TokenListItemRepository>,
    pub portfolios: Arc<dyn PortfolioRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            transactions: Arc::new(InMemoryTransactionRepository::new()),
            wallets: Arc::new(InMemoryWalletRepository::new()),
            accounts: Arc::new(InMemoryAccountRepository::new()),
            token_items: Arc::new(InMemoryTokenListItemRepository::new()),
            portfolios: Arc::new(InMemoryPortfolioRepository::new()),
        }
    }

    pub fn postgres(db_pool: Arc<PgPool>) -> Self {
        Self {
            transactions: Arc::new(PgTransactionRepository::new(db_pool.clone())),
            wallets: Arc::new(PgWalletRepository::new(db_pool.clone())),
            accounts: Arc::new(PgAccountRepository::new(db_pool.clone())),
            token_items: Arc::new(PgTokenListItemRepository::new(db_pool.clone())),
            portfolios: Arc::new(PgPortfolioRepository::new(db_pool)),
        }
    }
}

/// ServiceContainer wires repositories, the node and the event bus into services
pub struct ServiceContainer {
    repositories: Repositories,
    node: Arc<dyn EthereumNodeDomainService>,
    publisher: Arc<EventPublisher>,

    // Domain services
    transaction_service: Arc<TransactionDomainService>,
    account_update_service: Arc<dyn AccountUpdateDomainService>,
    synchronisation_service: Arc<SynchronisationService>,
    transaction_monitor: Arc<TransactionMonitor>,

    // Application services
    wallet_interactor: Arc<dyn WalletInteractor>,
}

impl ServiceContainer {
    pub fn new(
        repositories: Repositories,
        node: Arc<dyn EthereumNodeDomainService>,
        token_list: Arc<dyn TokenListDomainService>,
        config: &AppConfig,
    ) -> Self {
        let publisher = Arc::new(EventPublisher::new());

        let transaction_service = Arc::new(TransactionDomainService::new(
            repositories.transactions.clone(),
            repositories.wallets.clone(),
            repositories.portfolios.clone(),
            node.clone(),
            publisher.clone(),
        ));

        let account_update_service = Arc::new(NodeAccountUpdateService::new(
            repositories.accounts.clone(),
            repositories.wallets.clone(),
            repositories.portfolios.clone(),
            repositories.token_items.clone(),
            node.clone(),
            publisher.clone(),
        )) as Arc<dyn AccountUpdateDomainService>;

        let synchronisation_service = Arc::new(SynchronisationService::new(
            token_list,
            repositories.token_items.clone(),
            account_update_service.clone(),
            publisher.clone(),
            config.sync.clone(),
        ));

        let transaction_monitor = Arc::new(TransactionMonitor::new(
            transaction_service.clone(),
            config.pending_poll_interval,
        ));

        let wallet_interactor = Arc::new(WalletInteractorImpl::new(
            repositories.wallets.clone(),
            repositories.portfolios.clone(),
            repositories.accounts.clone(),
            repositories.token_items.clone(),
        )) as Arc<dyn WalletInteractor>;

        Self {
            repositories,
            node,
            publisher,
            transaction_service,
            account_update_service,
            synchronisation_service,
            transaction_monitor,
            wallet_interactor,
        }
    }

    /// Container backed by in-memory repositories and the HTTP token list.
    pub fn in_memory(config: &AppConfig, node: Arc<dyn EthereumNodeDomainService>) -> Self {
        let token_list = Arc::new(HttpTokenListService::new(&config.token_list_url));
        Self::new(Repositories::in_memory(), node, token_list, config)
    }

    /// Container backed by PostgreSQL repositories and the HTTP token list.
    pub fn postgres(
        db_pool: Arc<PgPool>,
        config: &AppConfig,
        node: Arc<dyn EthereumNodeDomainService>,
    ) -> Self {
        let token_list = Arc::new(HttpTokenListService::new(&config.token_list_url));
        Self::new(Repositories::postgres(db_pool), node, token_list, config)
    }

    // Accessor methods

    pub fn repositories(&self) -> &Repositories {
        &self.repositories
    }

    pub fn node(&self) -> Arc<dyn EthereumNodeDomainService> {
        self.node.clone()
    }

    pub fn publisher(&self) -> Arc<EventPublisher> {
        self.publisher.clone()
    }

    pub fn transaction_service(&self) -> Arc<TransactionDomainService> {
        self.transaction_service.clone()
    }

    pub fn account_update_service(&self) -> Arc<dyn AccountUpdateDomainService> {
        self.account_update_service.clone()
    }

    pub fn synchronisation_service(&self) -> Arc<SynchronisationService> {
        self.synchronisation_service.clone()
    }

    pub fn transaction_monitor(&self) -> Arc<TransactionMonitor> {
        self.transaction_monitor.clone()
    }

    pub fn wallet_interactor(&self) -> Arc<dyn WalletInteractor> {
        self.wallet_interactor.clone()
    }
}
