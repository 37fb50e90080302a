use crate::config::Config;
use crate::models::pair::CurrencyPair;

use super::coingecko::CoinGeckoProvider;
use super::exchangerate::ExchangeRateApiProvider;
use super::traits::RateProvider;

/// Ordered registry of all configured rate sources.
///
/// Built once at startup. Order matters: during a batch update, later
/// sources overwrite earlier ones for the same pair, and the resolver
/// asks sources in registration order.
pub struct ProviderRegistry {
    providers: Vec<Box<dyn RateProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Create a registry with the default sources. The ExchangeRate-API
    /// adapter is registered even without a key; its fetch fails and is
    /// counted like any other adapter failure.
    pub fn new_with_defaults(config: &Config) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(CoinGeckoProvider::new(config)));
        registry.register(Box::new(ExchangeRateApiProvider::new(config)));
        registry
    }

    /// Register a rate source.
    pub fn register(&mut self, provider: Box<dyn RateProvider>) {
        self.providers.push(provider);
    }

    /// All sources, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn RateProvider> {
        self.providers.iter().map(|p| p.as_ref())
    }

    /// The sources able to quote `pair`, in registration order.
    pub fn providers_for(&self, pair: &CurrencyPair) -> Vec<&dyn RateProvider> {
        self.providers
            .iter()
            .filter(|p| p.covers(pair))
            .map(|p| p.as_ref())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
