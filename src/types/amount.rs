use crate::types::errors::AmountError;
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Number of fraction digits in the currency's minor unit (cents).
pub const MINOR_UNIT_PLACES: u32 = 2;

/// A strictly positive amount of money with at most two fraction digits.
///
/// This is the only way user input reaches the ledger: every transfer amount is parsed
/// into an `Amount` first, so settlement code never sees zero, negative or sub-cent values.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive);
        }

        if value.normalize().scale() > MINOR_UNIT_PLACES {
            return Err(AmountError::TooPrecise(MINOR_UNIT_PLACES));
        }

        let mut value = value;
        value.rescale(MINOR_UNIT_PLACES);

        Ok(Amount(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl Display for Amount {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Amount::new(parse_positive(value)?)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Serialize::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Amount::new(value).map_err(de::Error::custom)
    }
}

/// Parses user input into a strictly positive decimal without applying the two-decimal rule,
/// so callers can check ceilings and balances before rejecting sub-cent precision.
pub fn parse_positive(value: &str) -> Result<Decimal, AmountError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(AmountError::Empty);
    }

    //NOTE: Decimal rejects "NaN" and "inf" outright, which covers the finite-number requirement
    let parsed = Decimal::from_str(value)
        .map_err(|_| AmountError::InvalidFormat(value.to_string()))?;

    if parsed <= Decimal::ZERO {
        return Err(AmountError::NotPositive);
    }

    Ok(parsed)
}

/// Formats a balance as US dollars with thousands separators, e.g. `$15,750.50`.
pub fn format_currency(value: Decimal) -> String {
    let mut rounded = value.round_dp(MINOR_UNIT_PLACES);
    rounded.rescale(MINOR_UNIT_PLACES);

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let digits = rounded.abs().to_string();
    let (integer, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);

    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}${grouped}.{fraction}")
}
