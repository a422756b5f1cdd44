use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::select;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::services::transaction_domain_service::TransactionDomainService;

struct Worker {
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// Periodically checks pending transactions for receipts.
pub struct TransactionMonitor {
    transactions: Arc<TransactionDomainService>,
    poll_interval: Duration,
    worker: Mutex<Option<Worker>>,
}

impl TransactionMonitor {
    pub fn new(transactions: Arc<TransactionDomainService>, poll_interval: Duration) -> Self {
        Self {
            transactions,
            poll_interval,
            worker: Mutex::new(None),
        }
    }

    pub async fn is_running(&self) -> bool {
        self.worker
            .lock()
            .await
            .as_ref()
            .is_some_and(|worker| !worker.handle.is_finished())
    }

    pub async fn start(&self) {
        let mut worker = self.worker.lock().await;
        if worker.as_ref().is_some_and(|w| !w.handle.is_finished()) {
            warn!("Transaction monitor is already running");
            return;
        }

        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
        let transactions = self.transactions.clone();
        let period = self.poll_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                select! {
                    _ = ticker.tick() => {
                        match transactions.update_pending_transactions().await {
                            Ok(0) => debug!("No pending transaction was processed"),
                            Ok(count) => info!("{} pending transaction(s) processed", count),
                            Err(e) => error!("Error checking pending transactions: {}", e),
                        }
                    }
                    _ = stop_rx.recv() => {
                        info!("Stopping transaction monitor");
                        break;
                    }
                }
            }
        });

        *worker = Some(Worker { stop_tx, handle });
        info!("Transaction monitor started");
    }

    pub async fn stop(&self) {
        let Some(worker) = self.worker.lock().await.take() else {
            return;
        };
        // The task may already be gone; a closed channel is fine.
        let _ = worker.stop_tx.send(()).await;
        if let Err(e) = worker.handle.await {
            error!("Transaction monitor task ended abnormally: {}", e);
        }
    }
}
