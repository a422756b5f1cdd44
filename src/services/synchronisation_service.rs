use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::select;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, Instant, MissedTickBehavior};

use crate::config::SyncConfig;
use crate::entity::{DomainEvent, Result};
use crate::event::EventPublisher;
use crate::repository::TokenListItemRepository;
use crate::services::account_update_service::AccountUpdateDomainService;
use crate::services::token_list_service::{MergeSummary, TokenListDomainService, TokenListMerger};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Syncing,
    /// Waiting before the next token list attempt.
    Retrying { attempt: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed,
    /// Another cycle was already running.
    Coalesced,
    /// `stop()` interrupted a retry wait.
    Cancelled,
}

struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Keeps the token list and account balances in sync with remote sources.
pub struct SynchronisationService {
    token_list: Arc<dyn TokenListDomainService>,
    merger: TokenListMerger,
    accounts: Arc<dyn AccountUpdateDomainService>,
    publisher: Arc<EventPublisher>,
    config: SyncConfig,
    in_flight: AtomicBool,
    state_tx: watch::Sender<SyncState>,
    /// Bumped by every `stop()`; waiters react to changes made after they subscribed.
    stop_tx: watch::Sender<u64>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SynchronisationService {
    pub fn new(
        token_list: Arc<dyn TokenListDomainService>,
        token_items: Arc<dyn TokenListItemRepository>,
        accounts: Arc<dyn AccountUpdateDomainService>,
        publisher: Arc<EventPublisher>,
        config: SyncConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(SyncState::Idle);
        let (stop_tx, _) = watch::channel(0u64);
        Self {
            token_list,
            merger: TokenListMerger::new(token_items),
            accounts,
            publisher,
            config,
            in_flight: AtomicBool::new(false),
            state_tx,
            stop_tx,
            worker: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SyncState {
        *self.state_tx.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SyncState> {
        self.state_tx.subscribe()
    }

    /// Runs one synchronisation cycle.
    ///
    /// Token list failures are retried with backoff until they succeed or the
    /// service is stopped. A call made while another cycle runs returns
    /// [`SyncOutcome::Coalesced`] without doing any work.
    pub async fn sync(&self) -> Result<SyncOutcome> {
        let Some(_in_flight) = InFlight::acquire(&self.in_flight) else {
            debug!("Synchronisation already in progress");
            return Ok(SyncOutcome::Coalesced);
        };

        self.state_tx.send_replace(SyncState::Syncing);
        let outcome = self.sync_token_list().await;
        if let Ok(SyncOutcome::Completed) = outcome {
            if let Err(e) = self.accounts.update_accounts_balances().await {
                error!("Failed to update account balances: {}", e);
            }
        }
        self.state_tx.send_replace(SyncState::Idle);
        outcome
    }

    async fn sync_token_list(&self) -> Result<SyncOutcome> {
        let mut stop_rx = self.stop_tx.subscribe();
        let mut failures = 0;
        loop {
            match self.fetch_and_merge().await {
                Ok(summary) => {
                    info!(
                        "Token list synchronised: {} added, {} updated, {} removed",
                        summary.added, summary.updated, summary.removed
                    );
                    self.publisher.publish(DomainEvent::TokenListMerged);
                    return Ok(SyncOutcome::Completed);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    failures += 1;
                    let delay = self.config.retry_delay(failures);
                    warn!(
                        "Token list synchronisation failed (attempt {}), retrying in {:?}: {}",
                        failures, delay, e
                    );
                    self.state_tx
                        .send_replace(SyncState::Retrying { attempt: failures });
                    select! {
                        _ = sleep(delay) => {}
                        _ = stop_rx.changed() => {
                            info!("Synchronisation retry cancelled");
                            return Ok(SyncOutcome::Cancelled);
                        }
                    }
                    self.state_tx.send_replace(SyncState::Syncing);
                }
            }
        }
    }

    async fn fetch_and_merge(&self) -> Result<MergeSummary> {
        let items = self.token_list.items().await?;
        self.merger.merge(items).await
    }

    /// Starts periodic synchronisation in a background task.
    pub async fn start(self: &Arc<Self>) {
        let mut worker = self.worker.lock().await;
        if worker.as_ref().is_some_and(|handle| !handle.is_finished()) {
            warn!("Synchronisation service is already running");
            return;
        }

        let mut stop_rx = self.stop_tx.subscribe();
        let service = Arc::clone(self);
        let period = self.config.sync_interval;

        *worker = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last_run = Instant::now();

            loop {
                select! {
                    biased;
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {
                        debug!("Running synchronisation (last run: {:.2?} ago)", last_run.elapsed());
                        match service.sync().await {
                            Ok(SyncOutcome::Cancelled) => break,
                            Ok(_) => {}
                            Err(e) => error!("Synchronisation failed: {}", e),
                        }
                        last_run = Instant::now();
                    }
                }
            }
            info!("Synchronisation loop finished");
        }));

        info!("Synchronisation service started");
    }

    /// Stops the periodic loop and cancels any pending retry.
    pub async fn stop(&self) {
        self.stop_tx
            .send_modify(|generation| *generation = generation.wrapping_add(1));
        if let Some(handle) = self.worker.lock().await.take() {
            if let Err(e) = handle.await {
                error!("Synchronisation task ended abnormally: {}", e);
            }
            info!("Synchronisation service stopped");
        }
    }
}
