use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, warn};

use crate::errors::CoreError;
use crate::models::pair::CurrencyPair;
use crate::models::rate::RateQuote;
use crate::providers::ProviderRegistry;
use crate::storage::rate_store::RateStore;

/// Resolves a usable exchange rate for a currency pair.
///
/// Strategy:
/// - **Fresh cache hit** (age ≤ max_age): return the cached quote
///   unchanged, zero network calls.
/// - **Absent or stale**: one refresh pass over the sources that cover
///   the pair, in registration order. The first batch containing the
///   pair wins; the quote is committed to the store (cache + history)
///   before being returned.
/// - Nothing yields the pair → `RateUnavailable`.
pub struct RateService {
    store: RateStore,
    providers: Arc<ProviderRegistry>,
    default_max_age: Duration,
}

impl RateService {
    pub fn new(store: RateStore, providers: Arc<ProviderRegistry>, default_max_age: Duration) -> Self {
        Self {
            store,
            providers,
            default_max_age,
        }
    }

    /// The freshness window used by [`resolve`](Self::resolve).
    pub fn default_max_age(&self) -> Duration {
        self.default_max_age
    }

    /// Resolve with the configured default freshness window.
    pub async fn resolve(&self, pair: &CurrencyPair) -> Result<RateQuote, CoreError> {
        self.resolve_with_max_age(pair, self.default_max_age).await
    }

    /// Resolve with an explicit freshness window.
    pub async fn resolve_with_max_age(
        &self,
        pair: &CurrencyPair,
        max_age: Duration,
    ) -> Result<RateQuote, CoreError> {
        // Same-currency pairs always quote at 1.0.
        if pair.from_code() == pair.to_code() {
            return RateQuote::new(pair.clone(), 1.0, Utc::now(), "Identity");
        }

        if let Some(cached) = self.store.get(pair)? {
            let now = Utc::now();
            if cached.is_fresh(now, max_age) {
                debug!(pair = %pair, "Rate cache hit");
                return Ok(cached);
            }
            debug!(
                pair = %pair,
                age_secs = cached.age(now).num_seconds(),
                max_age_secs = max_age.num_seconds(),
                "Cached rate is stale"
            );
        } else {
            debug!(pair = %pair, "Rate cache miss");
        }

        self.refresh(pair).await
    }

    /// One refresh attempt for exactly this pair. Source errors are
    /// logged and the next covering source is tried.
    async fn refresh(&self, pair: &CurrencyPair) -> Result<RateQuote, CoreError> {
        for provider in self.providers.providers_for(pair) {
            match provider.fetch_rates().await {
                Ok(batch) => {
                    if let Some(quote) = batch.get(&pair.key()) {
                        self.store.put(quote)?;
                        debug!(
                            pair = %pair,
                            rate = quote.rate,
                            source = provider.name(),
                            "Rate refreshed"
                        );
                        return Ok(quote.clone());
                    }
                }
                Err(e) => {
                    warn!(
                        provider = provider.name(),
                        pair = %pair,
                        error = %e,
                        "Rate source failed during refresh"
                    );
                }
            }
        }
        Err(CoreError::RateUnavailable(pair.clone()))
    }
}
