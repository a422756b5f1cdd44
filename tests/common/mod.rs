#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use safe_wallet_core::repository::{
    InMemoryPortfolioRepository, InMemoryTransactionRepository, InMemoryWalletRepository,
    PortfolioRepository, TransactionRepository, WalletRepository,
};
use safe_wallet_core::{
    AccountID, AccountUpdateDomainService, Address, Amount, DomainEvent, EthBlock,
    EthereumNodeDomainService, EventSubscriber, NodeError, Portfolio, ReceiptStatus, Signature,
    Token, TokenListDomainService, TokenListItem, Transaction, TransactionHash, TransactionID,
    TransactionReceipt, TransactionType, Wallet, WalletError, WalletID,
};

pub const SENDER: &str = "0x8e6A5aDb2B88257A3DAc7A76A7B4EcaCdA090b66";
pub const RECIPIENT: &str = "0xf1511FAB6b7347899f51f9db027A32b39caE3910";
pub const SAFE: &str = "0x092CC1854399ADc38Dad4f846E369C40D0a40307";

pub fn address(value: &str) -> Address {
    Address::new(value).unwrap()
}

pub fn at(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0).unwrap()
}

// Transaction fixtures walking the real lifecycle.

pub fn draft() -> Transaction {
    let wallet_id = WalletID::new();
    let mut tx = Transaction::new(
        TransactionID::new(),
        TransactionType::Transfer,
        wallet_id,
        AccountID::new(Token::ether().id(), wallet_id),
    );
    tx.change_sender(address(SENDER))
        .unwrap()
        .change_recipient(address(RECIPIENT))
        .unwrap()
        .change_amount(Amount::from(1))
        .unwrap()
        .change_nonce("1")
        .unwrap();
    tx
}

pub fn signing() -> Transaction {
    signing_with_hash(&format!("0x{}", uuid::Uuid::new_v4().simple()))
}

pub fn signing_with_hash(hash: &str) -> Transaction {
    let mut tx = draft();
    tx.proceed()
        .unwrap()
        .add_signature(Signature {
            data: vec![1, 2, 3],
            address: address(SENDER),
        })
        .unwrap()
        .set_transaction_hash(TransactionHash::new(hash))
        .unwrap();
    tx
}

pub fn pending() -> Transaction {
    let mut tx = signing();
    tx.proceed().unwrap();
    tx
}

pub fn pending_with_hash(hash: &str) -> Transaction {
    let mut tx = signing_with_hash(hash);
    tx.proceed().unwrap();
    tx
}

pub fn success() -> Transaction {
    let mut tx = pending();
    tx.timestamp_processed(Utc::now()).succeed().unwrap();
    tx
}

pub fn failure() -> Transaction {
    let mut tx = pending();
    tx.timestamp_processed(Utc::now()).fail().unwrap();
    tx
}

pub fn discarded() -> Transaction {
    let mut tx = draft();
    tx.discard().unwrap();
    tx
}

/// Sets every timestamp to `date`.
pub fn all_timestamps(mut tx: Transaction, date: DateTime<Utc>) -> Transaction {
    tx.timestamp_processed(date)
        .timestamp_submitted(date)
        .timestamp_rejected(date)
        .timestamp_updated(date)
        .timestamp_created(date);
    tx
}

/// Clears the timestamps the lifecycle recorded, as stored by older clients.
pub fn without_timestamps(tx: Transaction) -> Transaction {
    clear_fields(
        tx,
        &[
            "created_date",
            "updated_date",
            "submitted_date",
            "rejected_date",
            "processed_date",
        ],
    )
}

pub fn without_transaction_hash(tx: Transaction) -> Transaction {
    clear_fields(tx, &["transaction_hash"])
}

fn clear_fields(tx: Transaction, fields: &[&str]) -> Transaction {
    let mut value = serde_json::to_value(&tx).unwrap();
    for field in fields {
        value[*field] = serde_json::Value::Null;
    }
    serde_json::from_value(value).unwrap()
}

/// A deployed wallet selected in a fresh portfolio.
pub async fn ready_wallet(
    wallets: &dyn WalletRepository,
    portfolios: &dyn PortfolioRepository,
) -> Wallet {
    let mut wallet = Wallet::new_draft(wallets.next_id());
    wallet.start_deployment().unwrap();
    wallet.change_address(address(SAFE)).unwrap();
    wallet.finish_deployment().unwrap();
    wallets.save(&wallet).await.unwrap();

    let mut portfolio = Portfolio::new(portfolios.next_id());
    portfolio.add_wallet(wallet.id);
    portfolios.save(&portfolio).await.unwrap();
    wallet
}

// Node

#[derive(Default)]
pub struct MockEthereumNode {
    receipts: Mutex<HashMap<String, TransactionReceipt>>,
    blocks: Mutex<HashMap<String, EthBlock>>,
    balances: Mutex<HashMap<String, Amount>>,
    failure: Mutex<Option<NodeError>>,
    receipt_requests: AtomicUsize,
}

impl MockEthereumNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mines `hash` into a block with the given timestamp.
    pub fn expect_receipt(&self, hash: &str, status: ReceiptStatus, timestamp: DateTime<Utc>) {
        let block_hash = format!("0xblock{}", hash);
        self.expect_receipt_without_block(hash, status, &block_hash);
        self.blocks.lock().unwrap().insert(
            block_hash.clone(),
            EthBlock {
                hash: block_hash,
                timestamp,
            },
        );
    }

    pub fn expect_receipt_without_block(&self, hash: &str, status: ReceiptStatus, block_hash: &str) {
        self.receipts.lock().unwrap().insert(
            hash.to_string(),
            TransactionReceipt {
                hash: TransactionHash::new(hash),
                status,
                block_hash: block_hash.to_string(),
            },
        );
    }

    /// Balance of `owner` in `token`; the zero address stands for Ether.
    pub fn set_balance(&self, token: &Address, owner: &Address, amount: Amount) {
        self.balances
            .lock()
            .unwrap()
            .insert(balance_key(token, owner), amount);
    }

    pub fn fail_with(&self, error: NodeError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    pub fn receipt_requests(&self) -> usize {
        self.receipt_requests.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<(), NodeError> {
        match self.failure.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn balance(&self, token: &Address, owner: &Address) -> Result<Amount, NodeError> {
        self.check_failure()?;
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(&balance_key(token, owner))
            .copied()
            .unwrap_or(Amount::ZERO))
    }
}

fn balance_key(token: &Address, owner: &Address) -> String {
    format!("{}:{}", token.value(), owner.value()).to_lowercase()
}

#[async_trait]
impl EthereumNodeDomainService for MockEthereumNode {
    async fn eth_get_balance(&self, account: &Address) -> Result<Amount, NodeError> {
        self.balance(&Address::zero(), account)
    }

    async fn eth_get_token_balance(
        &self,
        token: &Address,
        owner: &Address,
    ) -> Result<Amount, NodeError> {
        self.balance(token, owner)
    }

    async fn eth_get_transaction_receipt(
        &self,
        hash: &TransactionHash,
    ) -> Result<Option<TransactionReceipt>, NodeError> {
        self.receipt_requests.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self.receipts.lock().unwrap().get(hash.value()).cloned())
    }

    async fn eth_get_block_by_hash(&self, hash: &str) -> Result<Option<EthBlock>, NodeError> {
        self.check_failure()?;
        Ok(self.blocks.lock().unwrap().get(hash).cloned())
    }
}

// Token list

/// Token list that fails a configured number of times before answering.
pub struct MockTokenList {
    items: Vec<TokenListItem>,
    failures_left: Mutex<usize>,
    fatal: bool,
    latency: Duration,
    calls: AtomicUsize,
}

impl MockTokenList {
    pub fn new(items: Vec<TokenListItem>) -> Self {
        Self {
            items,
            failures_left: Mutex::new(0),
            fatal: false,
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(mut self, times: usize) -> Self {
        self.failures_left = Mutex::new(times);
        self
    }

    pub fn always_failing(self) -> Self {
        self.failing(usize::MAX)
    }

    pub fn corrupted(mut self) -> Self {
        self.fatal = true;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenListDomainService for MockTokenList {
    async fn items(&self) -> safe_wallet_core::Result<Vec<TokenListItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.fatal {
            return Err(WalletError::InvariantViolation("corrupted token list".into()));
        }
        {
            let mut failures_left = self.failures_left.lock().unwrap();
            if *failures_left > 0 {
                *failures_left -= 1;
                return Err(WalletError::TokenList("relay unavailable".into()));
            }
        }
        Ok(self.items.clone())
    }
}

// Account balances

#[derive(Default)]
pub struct MockAccountUpdate {
    calls: AtomicUsize,
    failing: bool,
}

impl MockAccountUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failing: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountUpdateDomainService for MockAccountUpdate {
    async fn update_accounts_balances(&self) -> safe_wallet_core::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(WalletError::Node(NodeError::Network("timeout".into())));
        }
        Ok(())
    }

    async fn update_account_balance(&self, _id: &AccountID) -> safe_wallet_core::Result<()> {
        Ok(())
    }
}

// Events

#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<DomainEvent>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: &DomainEvent) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| *e == event)
            .count()
    }
}

impl EventSubscriber for Recorder {
    fn notify(&self, event: &DomainEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// Repositories

/// Transaction repository that counts saves.
#[derive(Default)]
pub struct CountingTransactionRepository {
    inner: InMemoryTransactionRepository,
    saves: AtomicUsize,
}

impl CountingTransactionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.saves.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl TransactionRepository for CountingTransactionRepository {
    async fn save(&self, transaction: &Transaction) -> safe_wallet_core::Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(transaction).await
    }

    async fn remove(&self, transaction: &Transaction) -> safe_wallet_core::Result<()> {
        self.inner.remove(transaction).await
    }

    async fn find(&self, id: &TransactionID) -> safe_wallet_core::Result<Option<Transaction>> {
        self.inner.find(id).await
    }

    async fn all(&self) -> safe_wallet_core::Result<Vec<Transaction>> {
        self.inner.all().await
    }
}

pub fn in_memory_wallets() -> (Arc<InMemoryWalletRepository>, Arc<InMemoryPortfolioRepository>) {
    (
        Arc::new(InMemoryWalletRepository::new()),
        Arc::new(InMemoryPortfolioRepository::new()),
    )
}
