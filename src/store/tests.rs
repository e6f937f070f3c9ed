use super::{LedgerStore, SessionRegistry};

use std::io;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::time::sleep;

use crate::config::LedgerConfig;
use crate::models::{LedgerError, ProfileUpdate, TransactionQuery, TransactionType, TransferRequest};
use crate::storage::{MemoryStorage, RecordKey, Storage, StorageError};

#[derive(Default)]
struct FlakyStorage {
    inner: MemoryStorage,
    failing: AtomicBool
}

impl Storage for FlakyStorage {
    fn load(&self, key: RecordKey) -> Result<Option<String>, StorageError> {
        self.inner.load(key)
    }

    fn commit(&self, batch: &[(RecordKey, String)]) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Io(io::Error::other("disk full")));
        }

        self.inner.commit(batch)
    }
}

#[derive(Default)]
struct SlowStorage {
    inner: MemoryStorage,
    slow: AtomicBool
}

impl Storage for SlowStorage {
    fn load(&self, key: RecordKey) -> Result<Option<String>, StorageError> {
        self.inner.load(key)
    }

    fn commit(&self, batch: &[(RecordKey, String)]) -> Result<(), StorageError> {
        if self.slow.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(300));
        }

        self.inner.commit(batch)
    }
}

fn decimal(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

fn request(recipient: &str, amount: &str, description: &str) -> TransferRequest {
    TransferRequest {
        recipient: recipient.to_string(),
        amount: amount.to_string(),
        description: description.to_string()
    }
}

fn open_store(storage: Arc<MemoryStorage>) -> Result<LedgerStore<MemoryStorage>> {
    Ok(LedgerStore::open(storage, &LedgerConfig::default())?)
}

#[tokio::test]
async fn test_store_seeds_demo_accounts_on_first_open() -> Result<()> {
    let storage = Arc::new(MemoryStorage::new());
    let store = open_store(storage.clone())?;

    let accounts = store.accounts().await;

    assert_eq!(accounts.len(), 3);
    assert_eq!(accounts[0].balance, decimal("15750.50"));
    assert!(storage.load(RecordKey::Accounts)?.is_some());
    assert_eq!(storage.load(RecordKey::Transactions)?.as_deref(), Some("[]"));

    Ok(())
}

#[tokio::test]
async fn test_transfer_is_persisted_and_survives_reopen() -> Result<()> {
    let storage = Arc::new(MemoryStorage::new());
    let store = open_store(storage.clone())?;

    let receipt = store.transfer("1", &request("0987654321", "100.00", "Rent")).await?;

    assert_eq!(receipt.sender_balance(), decimal("15650.50"));
    assert_eq!(receipt.recipient_balance(), decimal("9020.75"));

    let reopened = open_store(storage)?;

    assert_eq!(reopened.account("1").await?.balance, decimal("15650.50"));
    assert_eq!(reopened.account("2").await?.balance, decimal("9020.75"));
    assert_eq!(reopened.transactions("1", &TransactionQuery::default()).await?, vec![receipt.debit]);
    assert_eq!(reopened.transactions("2", &TransactionQuery::default()).await?, vec![receipt.credit]);

    Ok(())
}

#[tokio::test]
async fn test_rejected_transfers_leave_storage_untouched() -> Result<()> {
    let storage = Arc::new(MemoryStorage::new());
    let store = open_store(storage.clone())?;
    let accounts_before = storage.load(RecordKey::Accounts)?;

    let limit = store.transfer("1", &request("0987654321", "10000.01", "Big")).await;
    let funds = store.transfer("3", &request("0987654321", "5000", "Short")).await;
    let recipient = store.transfer("1", &request("0000000000", "5", "Nobody")).await;
    let amount = store.transfer("1", &request("0987654321", "-5", "Negative")).await;

    assert!(matches!(limit, Err(LedgerError::TransferLimitExceeded { .. })));
    assert!(matches!(funds, Err(LedgerError::InsufficientFunds { .. })));
    assert!(matches!(recipient, Err(LedgerError::RecipientNotFound { .. })));
    assert!(matches!(amount, Err(LedgerError::Validation { .. })));

    assert_eq!(storage.load(RecordKey::Accounts)?, accounts_before);
    assert_eq!(storage.load(RecordKey::Transactions)?.as_deref(), Some("[]"));

    Ok(())
}

#[tokio::test]
async fn test_storage_failure_leaves_memory_unchanged() -> Result<()> {
    let storage = Arc::new(FlakyStorage::default());
    let store = LedgerStore::open(storage.clone(), &LedgerConfig::default())?;

    storage.failing.store(true, Ordering::SeqCst);

    let result = store.transfer("1", &request("0987654321", "100", "Rent")).await;

    assert!(matches!(result, Err(LedgerError::Persistence(_))));
    assert_eq!(store.account("1").await?.balance, decimal("15750.50"));
    assert_eq!(store.account("2").await?.balance, decimal("8920.75"));
    assert!(store.transactions("1", &TransactionQuery::default()).await?.is_empty());

    let update = ProfileUpdate { name: "Omar".to_string(), email: "omar@omsin.com".to_string(), ..Default::default() };
    assert!(matches!(store.update_profile("1", &update).await, Err(LedgerError::Persistence(_))));
    assert_eq!(store.account("1").await?.email, "demo@omsin.com");

    storage.failing.store(false, Ordering::SeqCst);
    store.transfer("1", &request("0987654321", "100", "Rent")).await?;

    assert_eq!(store.account("1").await?.balance, decimal("15650.50"));

    Ok(())
}

#[tokio::test]
async fn test_slow_commit_does_not_stall_the_runtime() -> Result<()> {
    let storage = Arc::new(SlowStorage::default());
    let store = Arc::new(LedgerStore::open(storage.clone(), &LedgerConfig::default())?);

    storage.slow.store(true, Ordering::SeqCst);

    let transfer = tokio::spawn({
        let store = store.clone();
        async move { store.transfer("1", &request("0987654321", "100", "Rent")).await }
    });

    let started = Instant::now();
    sleep(Duration::from_millis(10)).await;

    assert!(started.elapsed() < Duration::from_millis(200), "timer stalled for {:?}", started.elapsed());

    let receipt = transfer.await??;

    assert_eq!(receipt.sender_balance(), decimal("15650.50"));
    assert_eq!(store.account("2").await?.balance, decimal("9020.75"));

    Ok(())
}

#[tokio::test]
async fn test_session_account_is_a_live_read() -> Result<()> {
    let store = open_store(Arc::new(MemoryStorage::new()))?;

    let session = store.authenticate("demo@omsin.com", "demo123").await?;
    assert_eq!(store.session_account(&session).await?.balance, decimal("15750.50"));

    store.transfer("2", &request("1234567890", "49.50", "Coffee")).await?;
    assert_eq!(store.session_account(&session).await?.balance, decimal("15800.00"));

    let update = ProfileUpdate { name: "Omar Sima".to_string(), email: "omar@omsin.com".to_string(), ..Default::default() };
    store.update_profile("1", &update).await?;
    assert_eq!(store.session_account(&session).await?.email, "omar@omsin.com");

    store.logout(&session).await;
    assert!(matches!(store.session_account(&session).await, Err(LedgerError::SessionNotFound)));

    Ok(())
}

#[tokio::test]
async fn test_authentication_failures() -> Result<()> {
    let store = open_store(Arc::new(MemoryStorage::new()))?;

    assert!(matches!(store.authenticate("demo@omsin.com", "nope").await, Err(LedgerError::InvalidCredentials)));
    assert!(matches!(store.authenticate("nobody@omsin.com", "demo123").await, Err(LedgerError::InvalidCredentials)));
    assert!(matches!(store.authenticate("demo.omsin.com", "demo123").await, Err(LedgerError::Validation { .. })));

    Ok(())
}

#[tokio::test]
async fn test_sessions_expire_after_idle_timeout() -> Result<()> {
    let registry = SessionRegistry::new(16, Duration::from_millis(100));
    let session = registry.open(&"1".to_string()).await;

    assert_eq!(registry.resolve(&session).await.as_deref(), Some("1"));

    sleep(Duration::from_millis(300)).await;

    assert!(registry.resolve(&session).await.is_none());

    Ok(())
}

#[tokio::test]
async fn test_queries_require_an_existing_account() -> Result<()> {
    let store = open_store(Arc::new(MemoryStorage::new()))?;

    assert!(matches!(store.account("42").await, Err(LedgerError::AccountNotFound { .. })));
    assert!(matches!(store.totals("42").await, Err(LedgerError::AccountNotFound { .. })));
    assert!(matches!(store.recipients("42").await, Err(LedgerError::AccountNotFound { .. })));
    assert!(matches!(store.transactions("42", &TransactionQuery::default()).await, Err(LedgerError::AccountNotFound { .. })));

    let recipients = store.recipients("1").await?;
    assert_eq!(recipients.len(), 2);
    assert!(recipients.iter().all(|account| account.id != "1"));

    Ok(())
}

#[tokio::test]
async fn test_recent_transactions_are_newest_first_and_bounded() -> Result<()> {
    let store = open_store(Arc::new(MemoryStorage::new()))?;

    for index in 1..=7 {
        store.transfer("1", &request("0987654321", "1", &format!("Payment {index}"))).await?;
    }

    let recent = store.recent_transactions("1").await?;

    assert_eq!(recent.len(), 5);
    assert_eq!(recent[0].description, "Transfer to Fatou Kah: Payment 7");
    assert!(recent.iter().all(|transaction| transaction.transaction_type == TransactionType::Debit));

    let totals = store.totals("1").await?;
    assert_eq!(totals.debits, decimal("7"));
    assert_eq!(store.monthly_change("2", Utc::now()).await?, decimal("7"));

    Ok(())
}

#[tokio::test]
async fn test_concurrent_transfers_conserve_total_balance() -> Result<()> {
    let store = Arc::new(open_store(Arc::new(MemoryStorage::new()))?);
    let total_before: Decimal = store.accounts().await.iter().map(|account| account.balance).sum();

    let routes = [("1", "0987654321"), ("2", "0747954315"), ("3", "1234567890")];
    let mut handles = Vec::new();

    for round in 0..60 {
        let store = store.clone();
        let (sender, recipient) = routes[round % routes.len()];

        handles.push(tokio::spawn(async move {
            store.transfer(sender, &request(recipient, "123.45", "Race")).await.is_ok()
        }));
    }

    let mut settled = 0;

    for handle in handles {
        if handle.await? {
            settled += 1;
        }
    }

    let accounts = store.accounts().await;
    let total_after: Decimal = accounts.iter().map(|account| account.balance).sum();
    let transaction_count: usize = {
        let mut count = 0;
        for account in &accounts {
            count += store.transactions(&account.id, &TransactionQuery::default()).await?.len();
        }
        count
    };

    assert_eq!(total_before, total_after);
    assert_eq!(transaction_count, settled * 2);
    assert!(accounts.iter().all(|account| account.balance >= Decimal::ZERO));

    Ok(())
}

#[tokio::test]
async fn test_reset_restores_demo_state() -> Result<()> {
    let storage = Arc::new(MemoryStorage::new());
    let store = open_store(storage.clone())?;

    store.transfer("1", &request("0987654321", "100", "Rent")).await?;
    store.reset().await?;

    assert_eq!(store.account("1").await?.balance, decimal("15750.50"));
    assert!(store.transactions("1", &TransactionQuery::default()).await?.is_empty());
    assert_eq!(storage.load(RecordKey::Transactions)?.as_deref(), Some("[]"));

    Ok(())
}

#[tokio::test]
async fn test_open_reports_corrupt_records() -> Result<()> {
    let storage = Arc::new(MemoryStorage::new());
    storage.commit(&[(RecordKey::Accounts, "{\"not\":\"a list\"}".to_string())])?;

    let result = LedgerStore::open(storage, &LedgerConfig::default());

    assert!(matches!(result, Err(LedgerError::Persistence(_))));

    Ok(())
}

#[tokio::test]
async fn test_open_loads_existing_records_without_reseeding() -> Result<()> {
    let storage = Arc::new(MemoryStorage::new());
    storage.commit(&[(
        RecordKey::Accounts,
        r#"[{"id":"7","name":"Awa Jallow","email":"awa@omsin.com","password":"pw","accountNumber":"1111111111","balance":12.5,"accountType":"Savings"}]"#.to_string()
    )])?;

    let store = LedgerStore::open(storage, &LedgerConfig::default())?;
    let accounts = store.accounts().await;
    let account = accounts.first().ok_or_else(|| anyhow!("Account missing"))?;

    assert_eq!(accounts.len(), 1);
    assert_eq!(account.name, "Awa Jallow");
    assert_eq!(account.balance, decimal("12.5"));
    assert!(store.transactions("7", &TransactionQuery::default()).await?.is_empty());

    Ok(())
}
