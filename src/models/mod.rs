mod account;
mod errors;
mod ledger;
mod transaction;

use std::fmt;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

pub use account::{Account, ProfileUpdate};
pub use errors::LedgerError;
pub use ledger::{Ledger, Totals, TransactionQuery, TransferReceipt, TransferRequest};
pub use transaction::Transaction;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Credit,
    Debit
}

impl Display for TransactionType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Credit => formatter.pad("credit"),
            TransactionType::Debit => formatter.pad("debit")
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst
}
