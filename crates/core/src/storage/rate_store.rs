use std::path::PathBuf;

use chrono::Utc;
use tracing::debug;

use crate::errors::CoreError;
use crate::models::pair::CurrencyPair;
use crate::models::rate::{RateHistoryRecord, RateQuote, RatesDocument, StoredRate};

use super::json;

/// Durable store for exchange rates: the latest-quote cache
/// (`rates.json`) plus the append-only fetch history
/// (`exchange_history.json`).
///
/// Both files are replaced atomically on write; a partial write never
/// corrupts the previously committed state. History records are only
/// ever appended; retention is an external concern.
#[derive(Debug, Clone)]
pub struct RateStore {
    rates_path: PathBuf,
    history_path: PathBuf,
}

impl RateStore {
    pub fn new(rates_path: impl Into<PathBuf>, history_path: impl Into<PathBuf>) -> Self {
        Self {
            rates_path: rates_path.into(),
            history_path: history_path.into(),
        }
    }

    /// The whole cache document (for `show-rates`).
    pub fn load_document(&self) -> Result<RatesDocument, CoreError> {
        json::load_or_default(&self.rates_path)
    }

    /// The full fetch history, oldest first.
    pub fn load_history(&self) -> Result<Vec<RateHistoryRecord>, CoreError> {
        json::load_or_default(&self.history_path)
    }

    /// Latest cached quote for `pair`, if any.
    pub fn get(&self, pair: &CurrencyPair) -> Result<Option<RateQuote>, CoreError> {
        Ok(self.load_document()?.quote(pair))
    }

    /// Commit one quote: replace the cache entry for its pair and
    /// append one history record.
    pub fn put(&self, quote: &RateQuote) -> Result<(), CoreError> {
        self.put_batch(std::slice::from_ref(quote))
    }

    /// Commit a batch of quotes. Each pair's cache entry is replaced
    /// and gains exactly one history record; entries for pairs not in
    /// the batch are left untouched. An empty batch is a no-op.
    pub fn put_batch(&self, quotes: &[RateQuote]) -> Result<(), CoreError> {
        if quotes.is_empty() {
            return Ok(());
        }

        let mut history = self.load_history()?;
        for quote in quotes {
            history.push(RateHistoryRecord::from(quote));
        }
        json::save_atomic(&self.history_path, &history)?;

        let mut document = self.load_document()?;
        for quote in quotes {
            document
                .pairs
                .insert(quote.pair.key(), StoredRate::from(quote));
        }
        document.last_refresh = Some(Utc::now());
        json::save_atomic(&self.rates_path, &document)?;

        debug!(count = quotes.len(), "Committed rate batch");
        Ok(())
    }
}
