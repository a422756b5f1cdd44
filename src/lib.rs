pub mod config;
pub mod di;
pub mod entity;
pub mod ethereum;
pub mod event;
pub mod interactor;
pub mod repository;
pub mod services;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export commonly used items
pub use config::{AppConfig, SyncConfig};
pub use di::*;
pub use entity::*;
pub use ethereum::{DemoEthereumNodeService, EthereumNodeDomainService};
pub use event::{EventPublisher, EventSubscriber};
pub use interactor::*;
pub use services::*;
