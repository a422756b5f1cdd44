//! Safe wallet daemon - Main executable
//!
//! Keeps the local token list and account balances in sync and tracks
//! pending multisig transactions until they are mined.
use anyhow::Context;
use dotenv::dotenv;
use log::{error, info};
use safe_wallet_core::{AppConfig, DemoEthereumNodeService, DomainEvent, EventType, ServiceContainer};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

/// Application entry point
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Initialize logging with default level of "info"
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    info!("Starting Safe wallet daemon v{}", safe_wallet_core::VERSION);

    let config = AppConfig::from_env();
    let node = Arc::new(DemoEthereumNodeService::new(Duration::from_millis(200), None));

    let services = match &config.database_url {
        Some(database_url) => {
            // Setup database connection pool
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await
                .context("Failed to create database connection pool")?;

            // Run database migrations
            info!("Running database migrations...");
            if let Err(e) = sqlx::migrate!("./migrations").run(&db_pool).await {
                error!("Failed to run migrations: {}", e);
                return Err(anyhow::Error::from(e));
            }
            info!("Migrations completed successfully");

            ServiceContainer::postgres(Arc::new(db_pool), &config, node)
        }
        None => {
            info!("DATABASE_URL is not set, using in-memory storage");
            ServiceContainer::in_memory(&config, node)
        }
    };

    let publisher = services.publisher();
    let event_logger = Arc::new(|event: &DomainEvent| info!("Domain event: {:?}", event));
    for event_type in [
        EventType::TransactionStatusUpdated,
        EventType::TokenListMerged,
        EventType::AccountsBalancesUpdated,
    ] {
        publisher.subscribe(&event_logger, event_type);
    }

    // Start background services
    let synchronisation = services.synchronisation_service();
    synchronisation.start().await;
    let monitor = services.transaction_monitor();
    monitor.start().await;

    info!("Daemon is running! Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Stopping background services...");
    monitor.stop().await;
    synchronisation.stop().await;
    publisher.close();

    Ok(())
}
