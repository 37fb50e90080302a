use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// A currency known to the system.
///
/// Closed set of variants: either government-issued money or a crypto
/// asset. Every component (trade engine, resolver, CLI) consults the
/// same [`CurrencyRegistry`] rather than keeping its own list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Currency {
    Fiat {
        code: String,
        name: String,
        issuing_country: String,
    },
    Crypto {
        code: String,
        name: String,
        algorithm: String,
        market_cap: f64,
    },
}

impl Currency {
    pub fn code(&self) -> &str {
        match self {
            Currency::Fiat { code, .. } | Currency::Crypto { code, .. } => code,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Currency::Fiat { name, .. } | Currency::Crypto { name, .. } => name,
        }
    }

    pub fn is_crypto(&self) -> bool {
        matches!(self, Currency::Crypto { .. })
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Fiat {
                code,
                name,
                issuing_country,
            } => write!(f, "[FIAT] {code} — {name} (issued by {issuing_country})"),
            Currency::Crypto {
                code,
                name,
                algorithm,
                market_cap,
            } => write!(
                f,
                "[CRYPTO] {code} — {name} (algo: {algorithm}, mcap: {market_cap:.2e})"
            ),
        }
    }
}

/// Registry of all currencies the application understands.
///
/// Built once at startup and shared by reference; lookups for unknown
/// codes fail with `CurrencyNotFound`.
#[derive(Debug, Clone)]
pub struct CurrencyRegistry {
    by_code: HashMap<String, Currency>,
}

impl CurrencyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            by_code: HashMap::new(),
        }
    }

    /// Create a registry with the full default currency set.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register(Currency::Fiat {
            code: "USD".into(),
            name: "US Dollar".into(),
            issuing_country: "United States".into(),
        });
        registry.register(Currency::Fiat {
            code: "EUR".into(),
            name: "Euro".into(),
            issuing_country: "Eurozone".into(),
        });
        registry.register(Currency::Fiat {
            code: "RUB".into(),
            name: "Russian Ruble".into(),
            issuing_country: "Russia".into(),
        });
        registry.register(Currency::Fiat {
            code: "GBP".into(),
            name: "Pound Sterling".into(),
            issuing_country: "United Kingdom".into(),
        });
        registry.register(Currency::Crypto {
            code: "BTC".into(),
            name: "Bitcoin".into(),
            algorithm: "SHA-256".into(),
            market_cap: 1.12e12,
        });
        registry.register(Currency::Crypto {
            code: "ETH".into(),
            name: "Ethereum".into(),
            algorithm: "Ethash".into(),
            market_cap: 4.45e11,
        });
        registry.register(Currency::Crypto {
            code: "SOL".into(),
            name: "Solana".into(),
            algorithm: "Proof of History".into(),
            market_cap: 8.1e10,
        });

        registry
    }

    /// Register a currency, replacing any previous entry for the same code.
    pub fn register(&mut self, currency: Currency) {
        self.by_code
            .insert(currency.code().to_uppercase(), currency);
    }

    /// Look up a currency by code (case-insensitive).
    pub fn get(&self, code: &str) -> Result<&Currency, CoreError> {
        let normalized = code.trim().to_uppercase();
        self.by_code
            .get(&normalized)
            .ok_or(CoreError::CurrencyNotFound(normalized))
    }

    /// `true` if the code is a known currency.
    pub fn contains(&self, code: &str) -> bool {
        self.by_code.contains_key(&code.trim().to_uppercase())
    }

    /// All registered codes, sorted for deterministic display.
    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.by_code.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }
}

impl Default for CurrencyRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
