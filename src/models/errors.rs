use rust_decimal::Decimal;
use thiserror::Error;

use crate::storage::StorageError;
use crate::types::{AccountId, AccountNumber, AmountError};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Validation failed for [{field}]: {reason}")]
    Validation {
        field: &'static str,
        reason: String
    },
    #[error("Insufficient funds in account [{account_id}]: requested [{requested}], available [{available}]")]
    InsufficientFunds {
        account_id: AccountId,
        requested: Decimal,
        available: Decimal
    },
    #[error("Transfer of [{requested}] exceeds the per-transfer limit of [{limit}]")]
    TransferLimitExceeded {
        requested: Decimal,
        limit: Decimal
    },
    #[error("Recipient account [{account_number}] was not found")]
    RecipientNotFound {
        account_number: AccountNumber
    },
    #[error("Account [{account_id}] was not found")]
    AccountNotFound {
        account_id: AccountId
    },
    #[error("Session is unknown or has expired")]
    SessionNotFound,
    #[error("Persistence failure: {0}")]
    Persistence(#[from] StorageError)
}

impl LedgerError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation { field, reason: reason.into() }
    }

    pub fn invalid_amount(error: AmountError) -> Self {
        Self::validation("amount", error.to_string())
    }

    pub fn insufficient_funds(account_id: &AccountId, requested: Decimal, available: Decimal) -> Self {
        Self::InsufficientFunds { account_id: account_id.clone(), requested, available }
    }

    pub fn transfer_limit_exceeded(requested: Decimal, limit: Decimal) -> Self {
        Self::TransferLimitExceeded { requested, limit }
    }

    pub fn recipient_not_found(account_number: &str) -> Self {
        Self::RecipientNotFound { account_number: account_number.to_string() }
    }

    pub fn account_not_found(account_id: &str) -> Self {
        Self::AccountNotFound { account_id: account_id.to_string() }
    }

    /// Message suitable for showing to the person at the keyboard.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCredentials => "Invalid email or password".to_string(),
            Self::Validation { reason, .. } => reason.clone(),
            Self::InsufficientFunds { .. } => "Insufficient funds".to_string(),
            Self::TransferLimitExceeded { limit, .. } => {
                format!("Transfer limit exceeded. Maximum transfer amount is {}", crate::types::format_currency(*limit))
            },
            Self::RecipientNotFound { .. } => "Recipient account not found".to_string(),
            Self::AccountNotFound { .. } => "Account not found".to_string(),
            Self::SessionNotFound => "Your session has expired. Please sign in again".to_string(),
            Self::Persistence(_) => "Operation failed. Please try again.".to_string()
        }
    }
}
