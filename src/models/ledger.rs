use std::collections::HashSet;

use chrono::{DateTime, Months, SubsecRound, TimeDelta, Utc};
use rust_decimal::Decimal;

use crate::models::errors::LedgerError;
use crate::models::{Account, ProfileUpdate, SortOrder, Transaction, TransactionType};
use crate::types::{parse_positive, AccountNumber, Amount};

/// The authoritative pair of collections: every account and every posted transaction.
///
/// All validation happens before any field is touched, so a rejected operation leaves the
/// ledger exactly as it was. The store relies on this together with copy-on-write to keep
/// the in-memory ledger and the persisted records in step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    accounts: Vec<Account>,
    transactions: Vec<Transaction>
}

/// A transfer as submitted from the transfer form. The amount stays raw text so that
/// malformed input is reported as a validation failure instead of a parse panic upstream.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub recipient: AccountNumber,
    pub amount: String,
    pub description: String
}

/// Both entries posted by a successful transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReceipt {
    pub debit: Transaction,
    pub credit: Transaction,
    pub recipient_name: String
}

impl TransferReceipt {
    pub fn amount(&self) -> Amount {
        self.debit.amount
    }

    pub fn sender_balance(&self) -> Decimal {
        self.debit.balance
    }

    pub fn recipient_balance(&self) -> Decimal {
        self.credit.balance
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
    pub transaction_type: Option<TransactionType>,
    /// Case-insensitive substring match against the description.
    pub search: Option<String>,
    pub order: SortOrder,
    pub limit: Option<usize>
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub credits: Decimal,
    pub debits: Decimal
}

impl Totals {
    pub fn net(&self) -> Decimal {
        self.credits - self.debits
    }
}

impl Ledger {
    /// Builds a ledger from loaded records, rejecting duplicate ids, account numbers or emails.
    pub fn from_records(accounts: Vec<Account>, transactions: Vec<Transaction>) -> Result<Self, LedgerError> {
        let mut ids = HashSet::new();
        let mut numbers = HashSet::new();
        let mut emails = HashSet::new();

        for account in &accounts {
            if !ids.insert(account.id.as_str()) {
                return Err(LedgerError::validation("accounts", format!("Duplicate account id [{}]", account.id)));
            }

            if !numbers.insert(account.account_number.as_str()) {
                return Err(LedgerError::validation("accounts", format!("Duplicate account number [{}]", account.account_number)));
            }

            if !emails.insert(account.email.to_lowercase()) {
                return Err(LedgerError::validation("accounts", format!("Duplicate email [{}]", account.email)));
            }
        }

        Ok(Self { accounts, transactions })
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn account(&self, account_id: &str) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id == account_id)
    }

    /// Every account except `account_id`, in stored order.
    pub fn recipients(&self, account_id: &str) -> Vec<Account> {
        self.accounts.iter()
            .filter(|account| account.id != account_id)
            .cloned()
            .collect()
    }

    pub fn authenticate(&self, email: &str, password: &str) -> Result<&Account, LedgerError> {
        let email = email.trim();

        if email.is_empty() || password.is_empty() {
            return Err(LedgerError::validation("credentials", "Please fill in all fields"));
        }

        if !email.contains('@') {
            return Err(LedgerError::validation("email", "Please enter a valid email address"));
        }

        self.accounts.iter()
            .find(|account| account.matches_credentials(email, password))
            .ok_or(LedgerError::InvalidCredentials)
    }

    pub fn query(&self, account_id: &str, query: &TransactionQuery) -> Vec<Transaction> {
        let search = query.search.as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase);

        let mut matches: Vec<Transaction> = self.owned_by(account_id)
            .filter(|transaction| query.transaction_type.is_none_or(|kind| transaction.transaction_type == kind))
            .filter(|transaction| {
                search.as_deref().is_none_or(|term| transaction.description.to_lowercase().contains(term))
            })
            .cloned()
            .collect();

        match query.order {
            SortOrder::NewestFirst => matches.sort_by(|a, b| b.date.cmp(&a.date)),
            SortOrder::OldestFirst => matches.sort_by(|a, b| a.date.cmp(&b.date))
        }

        if let Some(limit) = query.limit {
            matches.truncate(limit);
        }

        matches
    }

    pub fn totals(&self, account_id: &str) -> Totals {
        self.owned_by(account_id).fold(Totals::default(), |mut totals, transaction| {
            match transaction.transaction_type {
                TransactionType::Credit => totals.credits += transaction.amount.value(),
                TransactionType::Debit => totals.debits += transaction.amount.value()
            }
            totals
        })
    }

    /// Net flow (credits minus debits) over the calendar month leading up to `now`.
    pub fn monthly_change(&self, account_id: &str, now: DateTime<Utc>) -> Decimal {
        let since = now.checked_sub_months(Months::new(1)).unwrap_or(DateTime::<Utc>::MIN_UTC);

        self.owned_by(account_id)
            .filter(|transaction| transaction.date >= since)
            .map(Transaction::signed_amount)
            .sum()
    }

    /// Validates and settles a transfer from `sender_id` to the account named in `request`.
    ///
    /// Checks run in a fixed order: description, amount format and sign, transfer ceiling,
    /// sender and recipient resolution, available funds, then the two-decimal rule. The first
    /// failure is returned and nothing is modified. On success both balances move and a debit/credit pair sharing one
    /// posting timestamp is appended.
    pub fn transfer(
        &mut self,
        sender_id: &str,
        request: &TransferRequest,
        limit: Decimal,
        now: DateTime<Utc>
    ) -> Result<TransferReceipt, LedgerError> {
        let description = request.description.trim();

        if description.is_empty() {
            return Err(LedgerError::validation("description", "Please enter a description"));
        }

        let requested = parse_positive(&request.amount).map_err(LedgerError::invalid_amount)?;

        if requested > limit {
            return Err(LedgerError::transfer_limit_exceeded(requested, limit));
        }

        let sender_index = self.index_of(sender_id)
            .ok_or_else(|| LedgerError::account_not_found(sender_id))?;

        let recipient_number = request.recipient.trim();
        let recipient_index = self.accounts.iter()
            .position(|account| account.account_number == recipient_number)
            .ok_or_else(|| LedgerError::recipient_not_found(recipient_number))?;

        if sender_index == recipient_index {
            return Err(LedgerError::validation("recipient", "Cannot transfer to your own account"));
        }

        let sender = &self.accounts[sender_index];
        let recipient = &self.accounts[recipient_index];

        if requested > sender.balance {
            return Err(LedgerError::insufficient_funds(&sender.id, requested, sender.balance));
        }

        let amount = Amount::new(requested).map_err(LedgerError::invalid_amount)?;

        let out_of_range = || LedgerError::validation("amount", "Amount is out of range");
        let sender_balance = sender.balance.checked_sub(amount.value()).ok_or_else(out_of_range)?;
        let recipient_balance = recipient.balance.checked_add(amount.value()).ok_or_else(out_of_range)?;

        let posted_at = self.next_posting_time(now);

        let debit = Transaction::post(
            &sender.id,
            TransactionType::Debit,
            amount,
            format!("Transfer to {}: {}", recipient.name, description),
            posted_at,
            sender_balance
        );

        let credit = Transaction::post(
            &recipient.id,
            TransactionType::Credit,
            amount,
            format!("Transfer from {}: {}", sender.name, description),
            posted_at,
            recipient_balance
        );

        let recipient_name = recipient.name.clone();

        self.accounts[sender_index].balance = sender_balance;
        self.accounts[recipient_index].balance = recipient_balance;
        self.transactions.push(debit.clone());
        self.transactions.push(credit.clone());

        Ok(TransferReceipt { debit, credit, recipient_name })
    }

    pub fn update_profile(&mut self, account_id: &str, update: &ProfileUpdate) -> Result<Account, LedgerError> {
        let name = update.name.trim();
        let email = update.email.trim();

        if name.is_empty() || email.is_empty() {
            return Err(LedgerError::validation("profile", "Name and email are required"));
        }

        if !email.contains('@') {
            return Err(LedgerError::validation("email", "Please enter a valid email address"));
        }

        let index = self.index_of(account_id)
            .ok_or_else(|| LedgerError::account_not_found(account_id))?;

        let taken = self.accounts.iter()
            .any(|account| account.id != account_id && account.email.eq_ignore_ascii_case(email));

        if taken {
            return Err(LedgerError::validation("email", "Email address is already in use"));
        }

        let account = &mut self.accounts[index];
        account.apply_profile(update);

        Ok(account.clone())
    }

    fn owned_by<'a>(&'a self, account_id: &'a str) -> impl Iterator<Item = &'a Transaction> + 'a {
        self.transactions.iter().filter(move |transaction| transaction.account_id == account_id)
    }

    fn index_of(&self, account_id: &str) -> Option<usize> {
        self.accounts.iter().position(|account| account.id == account_id)
    }

    //NOTE: Transaction ids embed the posting millisecond, so every transfer gets a strictly later
    //      millisecond than anything already posted.
    fn next_posting_time(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let now = now.trunc_subsecs(3);

        match self.transactions.iter().map(|transaction| transaction.date).max() {
            Some(latest) if now <= latest => latest + TimeDelta::milliseconds(1),
            _ => now
        }
    }
}
