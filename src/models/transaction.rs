use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::TransactionType;
use crate::types::{AccountId, Amount, TransactionId};

/// A single posted ledger entry, as stored in the `transactions` record.
///
/// Entries are append-only. `balance` is the owning account's balance immediately after
/// this entry posted and is never recomputed, so history stays stable as balances move on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// `{account_id}_{unix_millis}_{credit|debit}`
    pub id: TransactionId,
    /// The account this entry belongs to.
    pub account_id: AccountId,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: Amount,
    pub description: String,
    pub date: DateTime<Utc>,
    /// Snapshot of the owning account's balance after posting.
    pub balance: Decimal
}

impl Transaction {
    pub fn post(
        account_id: &AccountId,
        transaction_type: TransactionType,
        amount: Amount,
        description: String,
        date: DateTime<Utc>,
        balance: Decimal
    ) -> Self {
        Self {
            id: format!("{}_{}_{}", account_id, date.timestamp_millis(), transaction_type),
            account_id: account_id.clone(),
            transaction_type,
            amount,
            description,
            date,
            balance
        }
    }

    /// Positive for credits, negative for debits.
    pub fn signed_amount(&self) -> Decimal {
        match self.transaction_type {
            TransactionType::Credit => self.amount.value(),
            TransactionType::Debit => -self.amount.value()
        }
    }
}
