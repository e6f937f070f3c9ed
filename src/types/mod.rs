mod amount;
mod errors;

pub use amount::{format_currency, parse_positive, Amount};
pub use errors::AmountError;

pub type AccountId = String;
pub type AccountNumber = String;
pub type TransactionId = String;
