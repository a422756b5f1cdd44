mod common;

use chrono::{Duration, Utc};
use std::sync::Arc;

use common::*;
use safe_wallet_core::repository::{InMemoryPortfolioRepository, InMemoryWalletRepository};
use safe_wallet_core::repository::TransactionRepository;
use safe_wallet_core::{
    date_for_grouping, distant_past, DomainEvent, EventPublisher, EventType, NodeError,
    ReceiptStatus, Transaction, TransactionDomainService, TransactionGroupType,
    TransactionMonitor, TransactionStatus, WalletError,
};

struct Fixture {
    repo: Arc<CountingTransactionRepository>,
    wallets: Arc<InMemoryWalletRepository>,
    portfolios: Arc<InMemoryPortfolioRepository>,
    node: Arc<MockEthereumNode>,
    recorder: Arc<Recorder>,
    service: Arc<TransactionDomainService>,
    _publisher: Arc<EventPublisher>,
}

fn fixture() -> Fixture {
    let repo = Arc::new(CountingTransactionRepository::new());
    let (wallets, portfolios) = in_memory_wallets();
    let node = Arc::new(MockEthereumNode::new());
    let publisher = Arc::new(EventPublisher::new());
    let recorder = Arc::new(Recorder::default());
    publisher.subscribe(&recorder, EventType::TransactionStatusUpdated);

    let service = Arc::new(TransactionDomainService::new(
        repo.clone(),
        wallets.clone(),
        portfolios.clone(),
        node.clone(),
        publisher.clone(),
    ));
    Fixture {
        repo,
        wallets,
        portfolios,
        node,
        recorder,
        service,
        _publisher: publisher,
    }
}

impl Fixture {
    async fn save(&self, transactions: &[Transaction]) {
        for tx in transactions {
            self.repo.save(tx).await.unwrap();
        }
        self.repo.reset();
    }

    async fn stored(&self, tx: &Transaction) -> Transaction {
        self.repo.find(&tx.id).await.unwrap().unwrap()
    }

    fn status_updates(&self) -> usize {
        self.recorder.count(&DomainEvent::TransactionStatusUpdated)
    }
}

#[tokio::test]
async fn removing_draft_removes_it() {
    let f = fixture();
    let tx = draft();
    f.save(&[tx.clone()]).await;

    f.service.remove_draft_transaction(&tx.id).await.unwrap();

    assert!(f.repo.find(&tx.id).await.unwrap().is_none());
}

#[tokio::test]
async fn non_draft_transaction_is_not_removed() {
    let f = fixture();
    let tx = discarded();
    f.save(&[tx.clone()]).await;

    f.service.remove_draft_transaction(&tx.id).await.unwrap();

    assert_eq!(f.stored(&tx).await, tx);
}

#[tokio::test]
async fn new_draft_requires_selected_wallet() {
    let f = fixture();
    assert!(matches!(
        f.service.new_draft_transaction_in_selected_wallet().await,
        Err(WalletError::NoSelectedWallet)
    ));

    let wallet = ready_wallet(f.wallets.as_ref(), f.portfolios.as_ref()).await;
    let id = f.service.new_draft_transaction_in_selected_wallet().await.unwrap();

    let tx = f.repo.find(&id).await.unwrap().unwrap();
    assert_eq!(tx.status(), TransactionStatus::Draft);
    assert_eq!(tx.wallet_id, wallet.id);
    assert_eq!(tx.sender(), wallet.address());
    assert!(tx.created_date().is_some());
}

#[tokio::test]
async fn same_timestamps_order_by_status_then_id() {
    let f = fixture();
    let date = Utc::now();
    let stored = vec![
        all_timestamps(pending(), date),
        all_timestamps(failure(), date),
        all_timestamps(pending(), date),
        all_timestamps(success(), date),
    ];
    f.save(&stored).await;

    let mut expected = stored.clone();
    expected.sort_by(|lhs, rhs| {
        lhs.status()
            .raw_value()
            .cmp(&rhs.status().raw_value())
            .then_with(|| lhs.id.cmp(&rhs.id))
    });

    let all = f.service.all_transactions().await.unwrap();
    assert_eq!(all, expected);
    assert_eq!(f.service.all_transactions().await.unwrap(), all);
}

#[tokio::test]
async fn unlisted_statuses_are_ignored() {
    let f = fixture();
    let mut rejected = signing();
    rejected.reject().unwrap();
    let stored = vec![pending(), draft(), discarded(), signing(), rejected];
    f.save(&stored).await;

    assert_eq!(f.service.all_transactions().await.unwrap(), vec![stored[0].clone()]);
}

#[tokio::test]
async fn single_timestamps_are_compared_directly() {
    let f = fixture();
    let mut stored = vec![
        without_timestamps(pending()),
        without_timestamps(failure()),
        without_timestamps(pending()),
        without_timestamps(success()),
    ];
    stored[0].timestamp_submitted(at(1));
    stored[1].timestamp_processed(at(2));
    stored[2].timestamp_submitted(at(4));
    stored[3].timestamp_processed(at(5));
    f.save(&stored).await;

    stored.reverse();
    assert_eq!(f.service.all_transactions().await.unwrap(), stored);
}

#[tokio::test]
async fn transactions_without_timestamps_come_first() {
    let f = fixture();
    let undated = without_timestamps(pending());
    let mut newer = without_timestamps(success());
    newer.timestamp_processed(at(1));
    let mut older = without_timestamps(success());
    older.timestamp_processed(at(0));

    f.save(&[newer.clone(), undated.clone(), older.clone()]).await;

    assert_eq!(
        f.service.all_transactions().await.unwrap(),
        vec![undated, newer, older]
    );
}

#[tokio::test]
async fn exhausted_side_sorts_before_the_side_with_more_timestamps() {
    let f = fixture();
    // Same processed date; only `b` also has a submitted date.
    let mut a = without_timestamps(success());
    a.timestamp_processed(at(10));
    let mut b = without_timestamps(success());
    b.timestamp_processed(at(10)).timestamp_submitted(at(20));
    f.save(&[b.clone(), a.clone()]).await;

    assert_eq!(f.service.all_transactions().await.unwrap(), vec![a, b]);
}

#[tokio::test]
async fn equal_dates_fall_through_to_next_date() {
    let f = fixture();
    let mut created_later = all_timestamps(success(), at(0));
    created_later.timestamp_created(at(1));
    let created_earlier = all_timestamps(success(), at(0));
    f.save(&[created_earlier.clone(), created_later.clone()]).await;

    assert_eq!(
        f.service.all_transactions().await.unwrap(),
        vec![created_later, created_earlier]
    );
}

#[tokio::test]
async fn groups_pending_today_and_past() {
    let f = fixture();
    let now = Utc::now();
    let pending_tx = pending();
    let mut today = success();
    today.timestamp_processed(now);
    let mut old = success();
    old.timestamp_processed(now - Duration::days(10));
    f.save(&[old.clone(), today.clone(), pending_tx.clone()]).await;

    let groups = f.service.grouped_transactions().await.unwrap();

    assert_eq!(groups.len(), 3);
    assert_eq!(groups[0].group_type, TransactionGroupType::Pending);
    assert_eq!(groups[0].date, None);
    assert_eq!(groups[0].transactions, vec![pending_tx]);
    assert_eq!(groups[1].group_type, TransactionGroupType::Processed);
    assert_eq!(groups[1].date, Some(date_for_grouping(now)));
    assert_eq!(groups[1].transactions, vec![today]);
    assert_eq!(groups[2].date, Some(distant_past()));
    assert_eq!(groups[2].transactions, vec![old]);
}

#[tokio::test]
async fn old_transactions_share_one_group() {
    let f = fixture();
    let stored: Vec<_> = (0..5)
        .map(|i| {
            let mut tx = without_timestamps(success());
            tx.timestamp_processed(at(10 - i));
            tx
        })
        .collect();
    f.save(&stored).await;

    let groups = f.service.grouped_transactions().await.unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].date, Some(distant_past()));
    assert_eq!(groups[0].transactions, stored);
}

#[tokio::test]
async fn processed_transaction_without_timestamp_breaks_grouping() {
    let f = fixture();
    f.save(&[without_timestamps(success())]).await;

    assert!(matches!(
        f.service.grouped_transactions().await,
        Err(WalletError::InvariantViolation(_))
    ));
}

#[tokio::test]
async fn updates_only_transactions_with_receipt() {
    let f = fixture();
    let mined = pending_with_hash("0x01");
    let waiting = pending_with_hash("0x02");
    f.save(&[mined.clone(), waiting.clone()]).await;
    let block_time = at(1_700_000_000);
    f.node.expect_receipt("0x01", ReceiptStatus::Success, block_time);

    let updated = f.service.update_pending_transactions().await.unwrap();

    assert_eq!(updated, 1);
    assert_eq!(f.repo.saves(), 1);
    assert_eq!(f.status_updates(), 1);
    assert_eq!(f.node.receipt_requests(), 2);

    let mined = f.stored(&mined).await;
    assert_eq!(mined.status(), TransactionStatus::Success);
    assert_eq!(mined.processed_date(), Some(block_time));
    assert!(mined.updated_date().unwrap() > block_time);
    assert_eq!(f.stored(&waiting).await, waiting);
}

#[tokio::test]
async fn failed_receipt_fails_transaction() {
    let f = fixture();
    let tx = pending_with_hash("0x03");
    f.save(&[tx.clone()]).await;
    f.node.expect_receipt("0x03", ReceiptStatus::Failed, Utc::now());

    f.service.update_pending_transactions().await.unwrap();

    let tx = f.stored(&tx).await;
    assert_eq!(tx.status(), TransactionStatus::Failed);
    assert!(tx.processed_date().is_some());
}

#[tokio::test]
async fn nothing_mined_publishes_nothing() {
    let f = fixture();
    f.save(&[pending(), pending()]).await;

    assert_eq!(f.service.update_pending_transactions().await.unwrap(), 0);
    assert_eq!(f.repo.saves(), 0);
    assert_eq!(f.status_updates(), 0);
}

#[tokio::test]
async fn pending_without_hash_is_invariant_violation() {
    let f = fixture();
    f.save(&[without_transaction_hash(pending())]).await;

    let result = f.service.update_pending_transactions().await;

    assert!(matches!(result, Err(ref e) if e.is_fatal()));
    assert_eq!(f.status_updates(), 0);
}

#[tokio::test]
async fn receipt_without_block_is_invariant_violation() {
    let f = fixture();
    f.save(&[pending_with_hash("0x04")]).await;
    f.node
        .expect_receipt_without_block("0x04", ReceiptStatus::Success, "0xmissing");

    assert!(matches!(
        f.service.update_pending_transactions().await,
        Err(WalletError::InvariantViolation(_))
    ));
    assert_eq!(f.repo.saves(), 0);
}

#[tokio::test]
async fn node_errors_propagate_unchanged() {
    let f = fixture();
    f.save(&[pending()]).await;
    f.node.fail_with(NodeError::Network("connection reset".into()));

    let result = f.service.update_pending_transactions().await;

    assert!(matches!(
        result,
        Err(WalletError::Node(NodeError::Network(ref message))) if message == "connection reset"
    ));
}

#[tokio::test]
async fn refreshes_processed_timestamps() {
    let f = fixture();
    let mut succeeded = without_timestamps(success());
    succeeded.timestamp_processed(at(0));
    let mut failed = without_timestamps(failure());
    failed.timestamp_processed(at(9));
    // Same hash scheme as the fixtures: each transaction carries its own.
    let succeeded_hash = succeeded.transaction_hash().unwrap().value().to_string();
    let failed_hash = failed.transaction_hash().unwrap().value().to_string();
    f.save(&[succeeded.clone(), failed.clone()]).await;
    let now = Utc::now();
    f.node.expect_receipt(&succeeded_hash, ReceiptStatus::Success, now);
    f.node.expect_receipt(&failed_hash, ReceiptStatus::Failed, now);

    let refreshed = f
        .service
        .update_timestamps_of_processed_transactions()
        .await
        .unwrap();

    assert_eq!(refreshed, 2);
    assert_eq!(f.stored(&succeeded).await.processed_date(), Some(now));
    assert_eq!(f.stored(&failed).await.processed_date(), Some(now));
    assert_eq!(f.status_updates(), 1);
}

#[tokio::test]
async fn pending_transactions_keep_their_processed_timestamp() {
    let f = fixture();
    let mut tx = pending();
    tx.timestamp_processed(at(42));
    f.save(&[tx.clone()]).await;

    let refreshed = f
        .service
        .update_timestamps_of_processed_transactions()
        .await
        .unwrap();

    assert_eq!(refreshed, 0);
    assert_eq!(f.stored(&tx).await.processed_date(), Some(at(42)));
    assert_eq!(f.status_updates(), 0);
}

#[tokio::test]
async fn processed_transaction_without_receipt_is_invariant_violation() {
    let f = fixture();
    f.save(&[success()]).await;

    assert!(matches!(
        f.service.update_timestamps_of_processed_transactions().await,
        Err(WalletError::InvariantViolation(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn monitor_confirms_pending_transactions_in_background() {
    let f = fixture();
    let tx = pending_with_hash("0x05");
    f.save(&[tx.clone()]).await;
    let monitor = TransactionMonitor::new(f.service.clone(), std::time::Duration::from_secs(15));

    monitor.start().await;
    assert!(monitor.is_running().await);
    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    assert_eq!(f.stored(&tx).await.status(), TransactionStatus::Pending);

    f.node.expect_receipt("0x05", ReceiptStatus::Success, Utc::now());
    tokio::time::sleep(std::time::Duration::from_secs(15)).await;
    assert_eq!(f.stored(&tx).await.status(), TransactionStatus::Success);
    assert_eq!(f.status_updates(), 1);

    monitor.stop().await;
    assert!(!monitor.is_running().await);
}
