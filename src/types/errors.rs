use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount error: Value is an empty string")]
    Empty,
    #[error("Amount error: '{0}' is not a valid number")]
    InvalidFormat(String),
    #[error("Amount error: Value must be greater than zero")]
    NotPositive,
    #[error("Amount error: Value has more than {0} decimal places")]
    TooPrecise(u32)
}
