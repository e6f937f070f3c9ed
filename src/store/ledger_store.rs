use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tokio::task::spawn_blocking;
use tracing::{debug, error, info, warn};

use crate::config::LedgerConfig;
use crate::models::{
    Account, Ledger, LedgerError, ProfileUpdate, Totals, Transaction, TransactionQuery, TransferReceipt, TransferRequest
};
use crate::storage::{RecordKey, Storage, StorageError};
use crate::store::{demo_accounts, SessionId, SessionRegistry};

/// The single owner of all banking state for a process.
///
/// Reads share the lock. Every mutation takes the write lock, works on a copy of the ledger,
/// commits the changed records through the storage backend, and only then swaps the copy
/// in. A failed validation or a failed commit leaves both memory and storage untouched.
pub struct LedgerStore<S: Storage> {
    storage: Arc<S>,
    ledger: RwLock<Ledger>,
    sessions: SessionRegistry,
    transfer_limit: Decimal,
    recent_limit: usize
}

impl<S: Storage> LedgerStore<S> {
    /// Loads both records from `storage`, seeding the demo accounts when none exist yet.
    pub fn open(storage: Arc<S>, config: &LedgerConfig) -> Result<Self, LedgerError> {
        let ledger = match storage.load(RecordKey::Accounts)? {
            Some(raw_accounts) => {
                let accounts: Vec<Account> = decode(&raw_accounts)?;
                let transactions: Vec<Transaction> = match storage.load(RecordKey::Transactions)? {
                    Some(raw_transactions) => decode(&raw_transactions)?,
                    None => Vec::new()
                };

                debug!("Loaded {} account(s) and {} transaction(s)", accounts.len(), transactions.len());

                Ledger::from_records(accounts, transactions)?
            },
            None => {
                let ledger = Ledger::from_records(demo_accounts(), Vec::new())?;
                let batch = encode(&ledger, &[RecordKey::Accounts, RecordKey::Transactions])?;
                storage.commit(&batch).map_err(persistence_failed)?;

                info!("Seeded {} demo account(s)", ledger.accounts().len());

                ledger
            }
        };

        Ok(Self {
            storage,
            ledger: RwLock::new(ledger),
            sessions: SessionRegistry::new(config.session_capacity, config.session_idle_timeout()),
            transfer_limit: config.transfer_limit,
            recent_limit: config.recent_limit
        })
    }

    /// Checks the credential pair and opens a session for the matching account.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<SessionId, LedgerError> {
        let account_id = {
            let ledger = self.ledger.read().await;

            match ledger.authenticate(email, password) {
                Ok(account) => account.id.clone(),
                Err(error) => {
                    warn!("Login rejected for [{}]: {error}", email.trim());
                    return Err(error);
                }
            }
        };

        let session = self.sessions.open(&account_id).await;
        info!("Account [{account_id}] signed in");

        Ok(session)
    }

    pub async fn logout(&self, session: &SessionId) {
        self.sessions.close(session).await;
    }

    /// The live account behind a session, re-read from the ledger on every call.
    pub async fn session_account(&self, session: &SessionId) -> Result<Account, LedgerError> {
        let account_id = self.sessions.resolve(session).await
            .ok_or(LedgerError::SessionNotFound)?;

        self.account(&account_id).await
    }

    pub async fn account(&self, account_id: &str) -> Result<Account, LedgerError> {
        self.ledger.read().await
            .account(account_id)
            .cloned()
            .ok_or_else(|| LedgerError::account_not_found(account_id))
    }

    pub async fn accounts(&self) -> Vec<Account> {
        self.ledger.read().await.accounts().to_vec()
    }

    /// Every other account, for recipient selection on the transfer form.
    pub async fn recipients(&self, account_id: &str) -> Result<Vec<Account>, LedgerError> {
        let ledger = self.ledger.read().await;
        require_account(&ledger, account_id)?;

        Ok(ledger.recipients(account_id))
    }

    pub async fn transactions(&self, account_id: &str, query: &TransactionQuery) -> Result<Vec<Transaction>, LedgerError> {
        let ledger = self.ledger.read().await;
        require_account(&ledger, account_id)?;

        let transactions = ledger.query(account_id, query);
        debug!("Query for account [{account_id}] matched {} transaction(s)", transactions.len());

        Ok(transactions)
    }

    /// Newest entries for the dashboard.
    pub async fn recent_transactions(&self, account_id: &str) -> Result<Vec<Transaction>, LedgerError> {
        let query = TransactionQuery {
            limit: Some(self.recent_limit),
            ..TransactionQuery::default()
        };

        self.transactions(account_id, &query).await
    }

    pub async fn totals(&self, account_id: &str) -> Result<Totals, LedgerError> {
        let ledger = self.ledger.read().await;
        require_account(&ledger, account_id)?;

        Ok(ledger.totals(account_id))
    }

    pub async fn monthly_change(&self, account_id: &str, now: DateTime<Utc>) -> Result<Decimal, LedgerError> {
        let ledger = self.ledger.read().await;
        require_account(&ledger, account_id)?;

        Ok(ledger.monthly_change(account_id, now))
    }

    /// Settles a transfer from `sender_id`. Both balances and both ledger entries are
    /// committed together or not at all.
    pub async fn transfer(&self, sender_id: &str, request: &TransferRequest) -> Result<TransferReceipt, LedgerError> {
        let mut ledger = self.ledger.write().await;
        let mut next = ledger.clone();

        let receipt = match next.transfer(sender_id, request, self.transfer_limit, Utc::now()) {
            Ok(receipt) => receipt,
            Err(error) => {
                warn!("Transfer from [{sender_id}] to [{}] rejected: {error}", request.recipient);
                return Err(error);
            }
        };

        self.commit(&next, &[RecordKey::Accounts, RecordKey::Transactions]).await?;
        *ledger = next;

        info!(
            "Transfer [{}] settled: {} from [{sender_id}] to [{}], balances now {} and {}",
            receipt.debit.id,
            receipt.amount(),
            receipt.credit.account_id,
            receipt.sender_balance(),
            receipt.recipient_balance()
        );

        Ok(receipt)
    }

    pub async fn update_profile(&self, account_id: &str, update: &ProfileUpdate) -> Result<Account, LedgerError> {
        let mut ledger = self.ledger.write().await;
        let mut next = ledger.clone();

        let account = match next.update_profile(account_id, update) {
            Ok(account) => account,
            Err(error) => {
                warn!("Profile update for [{account_id}] rejected: {error}");
                return Err(error);
            }
        };

        self.commit(&next, &[RecordKey::Accounts]).await?;
        *ledger = next;

        info!("Profile for account [{account_id}] updated");

        Ok(account)
    }

    /// Discards every transaction and restores the demo accounts.
    pub async fn reset(&self) -> Result<(), LedgerError> {
        let mut ledger = self.ledger.write().await;
        let next = Ledger::from_records(demo_accounts(), Vec::new())?;

        self.commit(&next, &[RecordKey::Accounts, RecordKey::Transactions]).await?;
        *ledger = next;

        info!("Ledger reset to demo data");

        Ok(())
    }

    //NOTE: Backends may block on file I/O, so the write runs on the blocking pool while the
    //      write guard is still held by the caller.
    async fn commit(&self, ledger: &Ledger, keys: &[RecordKey]) -> Result<(), LedgerError> {
        let batch = encode(ledger, keys)?;
        let storage = Arc::clone(&self.storage);

        spawn_blocking(move || storage.commit(&batch))
            .await
            .map_err(StorageError::from)?
            .map_err(persistence_failed)
    }
}

fn require_account(ledger: &Ledger, account_id: &str) -> Result<(), LedgerError> {
    ledger.account(account_id)
        .map(|_| ())
        .ok_or_else(|| LedgerError::account_not_found(account_id))
}

fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, LedgerError> {
    serde_json::from_str(raw).map_err(|error| LedgerError::Persistence(StorageError::from(error)))
}

fn encode(ledger: &Ledger, keys: &[RecordKey]) -> Result<Vec<(RecordKey, String)>, LedgerError> {
    let mut batch = Vec::with_capacity(keys.len());

    for key in keys {
        let encoded = match key {
            RecordKey::Accounts => serde_json::to_string(ledger.accounts()),
            RecordKey::Transactions => serde_json::to_string(ledger.transactions())
        };

        batch.push((*key, encoded.map_err(StorageError::from)?));
    }

    Ok(batch)
}

fn persistence_failed(error: StorageError) -> LedgerError {
    error!("Storage commit failed: {error}");
    LedgerError::Persistence(error)
}
