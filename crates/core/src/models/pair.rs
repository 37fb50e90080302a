use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// An ordered currency pair, e.g. BTC → USD.
///
/// Serialized (and used as a cache key) in the `"FROM_TO"` shape.
/// Codes are normalized to uppercase at construction; equality is by
/// code pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    from: String,
    to: String,
}

impl CurrencyPair {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.trim().to_uppercase(),
            to: to.trim().to_uppercase(),
        }
    }

    pub fn from_code(&self) -> &str {
        &self.from
    }

    pub fn to_code(&self) -> &str {
        &self.to
    }

    /// The cache/store key for this pair: `"FROM_TO"`.
    pub fn key(&self) -> String {
        format!("{}_{}", self.from, self.to)
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.from, self.to)
    }
}

impl FromStr for CurrencyPair {
    type Err = CoreError;

    /// Parse a `"FROM_TO"` key back into a pair.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('_') {
            Some((from, to)) if !from.is_empty() && !to.is_empty() => {
                Ok(Self::new(from, to))
            }
            _ => Err(CoreError::Validation(format!(
                "Invalid currency pair key '{s}': expected FROM_TO"
            ))),
        }
    }
}
