use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{AccountId, AccountNumber};

/// A single customer account as stored in the `accounts` record.
///
/// Identity fields (`id`, `account_number`) never change after seeding. Contact fields
/// change through profile updates and `balance` changes only through settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Unique identifier for the account holder.
    pub id: AccountId,
    pub name: String,
    pub email: String,
    /// Plaintext demo credential. Persisted, never displayed.
    password: String,
    /// Unique routing identifier used to address transfers.
    pub account_number: AccountNumber,
    pub balance: Decimal,
    /// Informational label such as "Savings" or "Checking".
    pub account_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>
}

impl Account {
    pub fn new(
        id: &str,
        name: &str,
        email: &str,
        password: &str,
        account_number: &str,
        balance: Decimal,
        account_type: &str
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            account_number: account_number.to_string(),
            balance,
            account_type: account_type.to_string(),
            phone: None,
            address: None
        }
    }

    pub fn matches_credentials(&self, email: &str, password: &str) -> bool {
        self.email == email && self.password == password
    }

    /// Applies a validated profile edit. Only contact fields are touched.
    pub fn apply_profile(&mut self, update: &ProfileUpdate) {
        self.name = update.name.trim().to_string();
        self.email = update.email.trim().to_string();
        self.phone = non_blank(update.phone.as_deref());
        self.address = non_blank(update.address.as_deref());
    }
}

/// Editable contact fields submitted from the profile form.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|value| !value.is_empty()).map(str::to_string)
}
