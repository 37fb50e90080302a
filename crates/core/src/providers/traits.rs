use std::collections::HashMap;

use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::pair::CurrencyPair;
use crate::models::rate::RateQuote;

/// Trait abstraction for all upstream rate sources.
///
/// Each external API (CoinGecko, ExchangeRate-API) implements this
/// trait. If an API stops working or changes, we replace only that one
/// implementation; the rest of the codebase is untouched.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Human-readable name of this source (for logs, errors, and the
    /// `source` field of every quote it produces).
    fn name(&self) -> &str;

    /// Whether this source can quote the given pair at all.
    fn covers(&self, pair: &CurrencyPair) -> bool;

    /// Fetch the current quotes for every pair this source covers,
    /// keyed by pair key (`"FROM_TO"`).
    ///
    /// Fails atomically: either a fully validated batch or an error,
    /// never a partially-populated result.
    async fn fetch_rates(&self) -> Result<HashMap<String, RateQuote>, CoreError>;
}
