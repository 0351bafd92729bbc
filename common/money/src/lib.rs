use std::str::FromStr;

use bigdecimal::{BigDecimal, ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("amount '{0}' is not a decimal number")]
    Unparseable(String),
    #[error("amount '{0}' must be greater than zero")]
    NotPositive(String),
    #[error("amount '{0}' does not fit in minor units")]
    Overflow(String),
}

/// Normalize a monetary value to 2 decimal places. Extra digits are truncated.
pub fn normalize_scale(value: &BigDecimal) -> BigDecimal {
    value.with_scale(2)
}

/// A price held at 2 decimal places. Accepts JSON numbers or numeric strings
/// on input and renders as a JSON number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMoney(BigDecimal);

impl NormalizedMoney {
    pub fn new(raw: BigDecimal) -> Self {
        Self(normalize_scale(&raw))
    }

    pub fn inner(&self) -> &BigDecimal {
        &self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > BigDecimal::from(0)
    }

    /// Amount in cents, as payment providers expect it.
    pub fn to_minor_units(&self) -> Result<i64, MoneyError> {
        if !self.is_positive() {
            return Err(MoneyError::NotPositive(self.0.to_string()));
        }
        (&self.0 * BigDecimal::from(100))
            .with_scale(0)
            .to_i64()
            .ok_or_else(|| MoneyError::Overflow(self.0.to_string()))
    }
}

impl From<BigDecimal> for NormalizedMoney {
    fn from(value: BigDecimal) -> Self {
        Self::new(value)
    }
}

impl FromStr for NormalizedMoney {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BigDecimal::from_str(s.trim())
            .map(Self::new)
            .map_err(|_| MoneyError::Unparseable(s.to_string()))
    }
}

impl Serialize for NormalizedMoney {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.0.to_f64() {
            Some(value) => serializer.serialize_f64(value),
            None => serializer.serialize_str(&self.0.to_string()),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(serde_json::Number),
    Text(String),
}

impl<'de> Deserialize<'de> for NormalizedMoney {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = match RawAmount::deserialize(deserializer)? {
            RawAmount::Number(n) => n.to_string(),
            RawAmount::Text(s) => s,
        };
        text.parse().map_err(serde::de::Error::custom)
    }
}
