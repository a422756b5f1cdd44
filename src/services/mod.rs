pub mod account_update_service;
pub mod synchronisation_service;
pub mod token_list_service;
pub mod transaction_domain_service;
pub mod transaction_monitor;

pub use account_update_service::{AccountUpdateDomainService, NodeAccountUpdateService};
pub use synchronisation_service::{SyncOutcome, SyncState, SynchronisationService};
pub use token_list_service::{
    HttpTokenListService, MergeSummary, TokenListDomainService, TokenListMerger,
};
pub use transaction_domain_service::{display_order, group_transactions, TransactionDomainService};
pub use transaction_monitor::TransactionMonitor;
