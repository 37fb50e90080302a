use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::models::pair::CurrencyPair;

/// A single exchange-rate observation for one currency pair.
///
/// Produced by a rate adapter or reconstructed from the cache; immutable
/// once created. The rate is always a finite positive number; the
/// constructor rejects anything else so no invalid quote can circulate.
#[derive(Debug, Clone, PartialEq)]
pub struct RateQuote {
    pub pair: CurrencyPair,
    pub rate: f64,
    pub observed_at: DateTime<Utc>,
    pub source: String,
}

impl RateQuote {
    pub fn new(
        pair: CurrencyPair,
        rate: f64,
        observed_at: DateTime<Utc>,
        source: impl Into<String>,
    ) -> Result<Self, CoreError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(CoreError::Validation(format!(
                "Rate for {pair} must be a finite positive number, got {rate}"
            )));
        }
        Ok(Self {
            pair,
            rate,
            observed_at,
            source: source.into(),
        })
    }

    /// Age of this quote relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.observed_at)
    }

    /// `true` if the quote is no older than `max_age` at `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: chrono::Duration) -> bool {
        self.age(now) <= max_age
    }
}

/// One entry of the serialized rates cache (`rates.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRate {
    pub rate: f64,
    pub updated_at: DateTime<Utc>,
    pub source: String,
}

impl From<&RateQuote> for StoredRate {
    fn from(quote: &RateQuote) -> Self {
        Self {
            rate: quote.rate,
            updated_at: quote.observed_at,
            source: quote.source.clone(),
        }
    }
}

/// The serialized rates cache document: latest known rate per pair plus
/// the timestamp of the last successful refresh.
///
/// Unknown fields are tolerated on read so older files keep loading.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatesDocument {
    #[serde(default)]
    pub pairs: HashMap<String, StoredRate>,
    #[serde(default)]
    pub last_refresh: Option<DateTime<Utc>>,
}

impl RatesDocument {
    /// Reconstruct a full quote for `pair`, if the document has one.
    pub fn quote(&self, pair: &CurrencyPair) -> Option<RateQuote> {
        self.pairs.get(&pair.key()).map(|stored| RateQuote {
            pair: pair.clone(),
            rate: stored.rate,
            observed_at: stored.updated_at,
            source: stored.source.clone(),
        })
    }
}

/// Append-only record of one `(pair, fetch event)` in the history log.
/// Never mutated or deleted; the id is derived from the pair key and the
/// observation timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateHistoryRecord {
    pub id: String,
    pub from_currency: String,
    pub to_currency: String,
    pub rate: f64,
    pub timestamp: DateTime<Utc>,
    pub source: String,
}

impl From<&RateQuote> for RateHistoryRecord {
    fn from(quote: &RateQuote) -> Self {
        Self {
            id: format!("{}_{}", quote.pair.key(), quote.observed_at.to_rfc3339()),
            from_currency: quote.pair.from_code().to_string(),
            to_currency: quote.pair.to_code().to_string(),
            rate: quote.rate,
            timestamp: quote.observed_at,
            source: quote.source.clone(),
        }
    }
}
