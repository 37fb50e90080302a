// ═══════════════════════════════════════════════════════════════════
// Service & Integration Tests — RateService, UpdateService,
// TradeService, UserService, PortfolioService, TradeHub facade
// ═══════════════════════════════════════════════════════════════════

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tempfile::TempDir;

use currex_core::config::Config;
use currex_core::errors::CoreError;
use currex_core::models::pair::CurrencyPair;
use currex_core::models::rate::RateQuote;
use currex_core::providers::{ProviderRegistry, RateProvider};
use currex_core::services::rate_service::RateService;
use currex_core::services::update_service::{UpdateSchedule, UpdateService};
use currex_core::storage::rate_store::RateStore;
use currex_core::TradeHub;

// ═══════════════════════════════════════════════════════════════════
// Mock Provider
// ═══════════════════════════════════════════════════════════════════

struct MockRateProvider {
    name: &'static str,
    rates: HashMap<String, f64>,
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl MockRateProvider {
    /// A provider answering with the given `(pair_key, rate)` quotes.
    fn new(name: &'static str, rates: &[(&str, f64)]) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = Self {
            name,
            rates: rates.iter().map(|(k, v)| ((*k).to_string(), *v)).collect(),
            calls: calls.clone(),
            fail: false,
        };
        (provider, calls)
    }

    /// A provider that covers the given pairs but errors on every fetch.
    fn failing(name: &'static str, pairs: &[&str]) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = Self {
            name,
            rates: pairs.iter().map(|k| ((*k).to_string(), 1.0)).collect(),
            calls: calls.clone(),
            fail: true,
        };
        (provider, calls)
    }
}

#[async_trait]
impl RateProvider for MockRateProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn covers(&self, pair: &CurrencyPair) -> bool {
        self.rates.contains_key(&pair.key())
    }

    async fn fetch_rates(&self) -> Result<HashMap<String, RateQuote>, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CoreError::Api {
                provider: self.name.to_string(),
                message: "simulated outage".into(),
            });
        }
        let now = Utc::now();
        Ok(self
            .rates
            .iter()
            .map(|(key, rate)| {
                let pair: CurrencyPair = key.parse().unwrap();
                (
                    key.clone(),
                    RateQuote::new(pair, *rate, now, self.name).unwrap(),
                )
            })
            .collect())
    }
}

// ═══════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════

fn registry(providers: Vec<Box<dyn RateProvider>>) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    for provider in providers {
        registry.register(provider);
    }
    registry
}

fn rate_store(dir: &TempDir) -> RateStore {
    RateStore::new(
        dir.path().join("rates.json"),
        dir.path().join("exchange_history.json"),
    )
}

fn rate_service(
    dir: &TempDir,
    providers: Vec<Box<dyn RateProvider>>,
    max_age_seconds: i64,
) -> RateService {
    RateService::new(
        rate_store(dir),
        Arc::new(registry(providers)),
        Duration::seconds(max_age_seconds),
    )
}

fn hub(dir: &TempDir, providers: Vec<Box<dyn RateProvider>>) -> TradeHub {
    TradeHub::with_providers(Config::with_data_dir(dir.path()), registry(providers))
}

fn seeded_quote(key: &str, rate: f64, age_seconds: i64) -> RateQuote {
    RateQuote::new(
        key.parse().unwrap(),
        rate,
        Utc::now() - Duration::seconds(age_seconds),
        "Seed",
    )
    .unwrap()
}

// ═══════════════════════════════════════════════════════════════════
// RateService — freshness & refresh laws
// ═══════════════════════════════════════════════════════════════════

mod rate_resolution {
    use super::*;

    #[tokio::test]
    async fn fresh_cache_hit_makes_zero_adapter_calls() {
        let dir = TempDir::new().unwrap();
        let seeded = seeded_quote("BTC_USD", 59_337.21, 100);
        rate_store(&dir).put(&seeded).unwrap();

        let (provider, calls) = MockRateProvider::new("Mock", &[("BTC_USD", 999.0)]);
        let service = rate_service(&dir, vec![Box::new(provider)], 600);

        let resolved = service
            .resolve(&CurrencyPair::new("BTC", "USD"))
            .await
            .unwrap();

        // Returned unchanged, no network
        assert_eq!(resolved.rate, seeded.rate);
        assert_eq!(resolved.observed_at, seeded.observed_at);
        assert_eq!(resolved.source, "Seed");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stale_entry_triggers_exactly_one_refresh() {
        let dir = TempDir::new().unwrap();
        let store = rate_store(&dir);
        store.put(&seeded_quote("BTC_USD", 100.0, 700)).unwrap();

        let (provider, calls) = MockRateProvider::new("Mock", &[("BTC_USD", 999.0)]);
        let service = rate_service(&dir, vec![Box::new(provider)], 600);

        let resolved = service
            .resolve(&CurrencyPair::new("BTC", "USD"))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolved.rate, 999.0);
        // Entry age resets to ~0
        assert!(resolved.age(Utc::now()).num_seconds() < 5);
        // History gains exactly one new record
        assert_eq!(store.load_history().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_entry_triggers_exactly_one_refresh() {
        let dir = TempDir::new().unwrap();
        let (provider, calls) = MockRateProvider::new("Mock", &[("ETH_USD", 3720.0)]);
        let service = rate_service(&dir, vec![Box::new(provider)], 600);

        let resolved = service
            .resolve(&CurrencyPair::new("ETH", "USD"))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolved.rate, 3720.0);
        assert_eq!(rate_store(&dir).load_history().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn refreshed_quote_is_committed_to_the_cache() {
        let dir = TempDir::new().unwrap();
        let (provider, calls) = MockRateProvider::new("Mock", &[("BTC_USD", 42.0)]);
        let service = rate_service(&dir, vec![Box::new(provider)], 600);
        let pair = CurrencyPair::new("BTC", "USD");

        service.resolve(&pair).await.unwrap();
        // Second resolve is served from cache
        service.resolve(&pair).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn explicit_max_age_overrides_the_default() {
        let dir = TempDir::new().unwrap();
        rate_store(&dir)
            .put(&seeded_quote("BTC_USD", 100.0, 700))
            .unwrap();

        let (provider, calls) = MockRateProvider::new("Mock", &[("BTC_USD", 999.0)]);
        let service = rate_service(&dir, vec![Box::new(provider)], 600);

        // A wider window makes the 700s-old entry acceptable
        let resolved = service
            .resolve_with_max_age(&CurrencyPair::new("BTC", "USD"), Duration::seconds(800))
            .await
            .unwrap();

        assert_eq!(resolved.rate, 100.0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn no_covering_source_fails_with_rate_unavailable() {
        let dir = TempDir::new().unwrap();
        let (provider, calls) = MockRateProvider::new("Mock", &[("BTC_USD", 1.0)]);
        let service = rate_service(&dir, vec![Box::new(provider)], 600);

        match service.resolve(&CurrencyPair::new("SOL", "USD")).await {
            Err(CoreError::RateUnavailable(pair)) => assert_eq!(pair.key(), "SOL_USD"),
            other => panic!("expected RateUnavailable, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failing_source_falls_through_to_the_next_one() {
        let dir = TempDir::new().unwrap();
        let (broken, broken_calls) = MockRateProvider::failing("Broken", &["BTC_USD"]);
        let (healthy, healthy_calls) = MockRateProvider::new("Healthy", &[("BTC_USD", 7.0)]);
        let service = rate_service(&dir, vec![Box::new(broken), Box::new(healthy)], 600);

        let resolved = service
            .resolve(&CurrencyPair::new("BTC", "USD"))
            .await
            .unwrap();

        assert_eq!(resolved.rate, 7.0);
        assert_eq!(resolved.source, "Healthy");
        assert_eq!(broken_calls.load(Ordering::SeqCst), 1);
        assert_eq!(healthy_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn all_sources_failing_is_rate_unavailable() {
        let dir = TempDir::new().unwrap();
        let (broken, _) = MockRateProvider::failing("Broken", &["BTC_USD"]);
        let service = rate_service(&dir, vec![Box::new(broken)], 600);

        assert!(matches!(
            service.resolve(&CurrencyPair::new("BTC", "USD")).await,
            Err(CoreError::RateUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn same_currency_pair_resolves_to_identity() {
        let dir = TempDir::new().unwrap();
        let (provider, calls) = MockRateProvider::new("Mock", &[]);
        let service = rate_service(&dir, vec![Box::new(provider)], 600);

        let resolved = service
            .resolve(&CurrencyPair::new("USD", "USD"))
            .await
            .unwrap();
        assert_eq!(resolved.rate, 1.0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}

// ═══════════════════════════════════════════════════════════════════
// UpdateService — partial-failure law
// ═══════════════════════════════════════════════════════════════════

mod updates {
    use super::*;

    fn update_service(dir: &TempDir, providers: Vec<Box<dyn RateProvider>>) -> UpdateService {
        UpdateService::new(Arc::new(registry(providers)), rate_store(dir))
    }

    #[tokio::test]
    async fn one_failing_source_does_not_abort_the_others() {
        let dir = TempDir::new().unwrap();
        let (healthy, _) =
            MockRateProvider::new("Healthy", &[("BTC_USD", 60_000.0), ("ETH_USD", 3_720.0)]);
        let (broken, broken_calls) = MockRateProvider::failing("Broken", &["EUR_USD"]);

        let service = update_service(&dir, vec![Box::new(healthy), Box::new(broken)]);
        let report = service.run_update().await.unwrap();

        assert_eq!(report.updated, 2);
        assert_eq!(report.failed_adapters, 1);
        assert_eq!(broken_calls.load(Ordering::SeqCst), 1);

        // Committed batch is the union of successes only
        let doc = rate_store(&dir).load_document().unwrap();
        assert_eq!(doc.pairs.len(), 2);
        assert!(doc.pairs.contains_key("BTC_USD"));
        assert!(doc.pairs.contains_key("ETH_USD"));
        assert!(!doc.pairs.contains_key("EUR_USD"));
    }

    #[tokio::test]
    async fn zero_successes_leaves_the_cache_untouched() {
        let dir = TempDir::new().unwrap();
        let store = rate_store(&dir);
        store.put(&seeded_quote("BTC_USD", 123.0, 50)).unwrap();
        let before = store.load_document().unwrap();

        let (a, _) = MockRateProvider::failing("A", &["BTC_USD"]);
        let (b, _) = MockRateProvider::failing("B", &["EUR_USD"]);
        let service = update_service(&dir, vec![Box::new(a), Box::new(b)]);

        // A warning, not an error
        let report = service.run_update().await.unwrap();
        assert_eq!(report.updated, 0);
        assert_eq!(report.failed_adapters, 2);

        let after = store.load_document().unwrap();
        assert_eq!(after.pairs["BTC_USD"], before.pairs["BTC_USD"]);
        assert_eq!(after.last_refresh, before.last_refresh);
        assert_eq!(store.load_history().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn later_sources_overwrite_earlier_ones_for_the_same_pair() {
        let dir = TempDir::new().unwrap();
        let (first, _) = MockRateProvider::new("First", &[("BTC_USD", 100.0)]);
        let (second, _) = MockRateProvider::new("Second", &[("BTC_USD", 200.0)]);

        let service = update_service(&dir, vec![Box::new(first), Box::new(second)]);
        let report = service.run_update().await.unwrap();

        assert_eq!(report.updated, 1);
        let doc = rate_store(&dir).load_document().unwrap();
        assert_eq!(doc.pairs["BTC_USD"].rate, 200.0);
        assert_eq!(doc.pairs["BTC_USD"].source, "Second");
    }

    #[tokio::test]
    async fn update_merges_into_existing_cache_without_dropping_pairs() {
        let dir = TempDir::new().unwrap();
        let store = rate_store(&dir);
        store.put(&seeded_quote("RUB_USD", 0.0102, 50)).unwrap();

        let (provider, _) = MockRateProvider::new("Mock", &[("BTC_USD", 60_000.0)]);
        update_service(&dir, vec![Box::new(provider)])
            .run_update()
            .await
            .unwrap();

        let doc = store.load_document().unwrap();
        assert!(doc.pairs.contains_key("RUB_USD"));
        assert!(doc.pairs.contains_key("BTC_USD"));
    }

    #[tokio::test]
    async fn one_time_schedule_runs_a_single_cycle() {
        let dir = TempDir::new().unwrap();
        let (provider, calls) = MockRateProvider::new("Mock", &[("BTC_USD", 1.0)]);
        let service = update_service(&dir, vec![Box::new(provider)]);

        service.run(UpdateSchedule::OneTime).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

// ═══════════════════════════════════════════════════════════════════
// TradeHub — trades
// ═══════════════════════════════════════════════════════════════════

mod trades {
    use super::*;

    #[tokio::test]
    async fn buy_then_oversell_fails_with_exact_funds_error() {
        let dir = TempDir::new().unwrap();
        let (provider, _) = MockRateProvider::new("Mock", &[("BTC_USD", 59_337.21)]);
        let hub = hub(&dir, vec![Box::new(provider)]);
        let user = hub.register("alice", "1234").unwrap();

        let receipt = hub.buy(user.user_id(), "BTC", 0.5).await.unwrap();
        assert_eq!(receipt.new_balance, 0.5);
        assert_eq!(receipt.rate, Some(59_337.21));
        assert!((receipt.estimated_value.unwrap() - 29_668.605).abs() < 1e-6);

        match hub.sell(user.user_id(), "BTC", 0.6).await {
            Err(CoreError::InsufficientFunds {
                available,
                required,
                code,
            }) => {
                assert_eq!(available, 0.5);
                assert_eq!(required, 0.6);
                assert_eq!(code, "BTC");
            }
            other => panic!("expected InsufficientFunds, got {other:?}"),
        }

        // Balance remains exactly as it was, on disk too
        let portfolio = hub.portfolio(user.user_id()).unwrap().unwrap();
        assert_eq!(portfolio.wallet("BTC").unwrap().balance(), 0.5);
    }

    #[tokio::test]
    async fn sell_of_never_bought_currency_fails_without_state_change() {
        let dir = TempDir::new().unwrap();
        let (provider, _) = MockRateProvider::new("Mock", &[("BTC_USD", 1.0)]);
        let hub = hub(&dir, vec![Box::new(provider)]);
        let user = hub.register("alice", "1234").unwrap();
        hub.buy(user.user_id(), "BTC", 1.0).await.unwrap();

        match hub.sell(user.user_id(), "EUR", 1.0).await {
            Err(CoreError::WalletNotFound(code)) => assert_eq!(code, "EUR"),
            other => panic!("expected WalletNotFound, got {other:?}"),
        }

        let portfolio = hub.portfolio(user.user_id()).unwrap().unwrap();
        assert_eq!(portfolio.wallets().len(), 1);
        assert_eq!(portfolio.wallet("BTC").unwrap().balance(), 1.0);
    }

    #[tokio::test]
    async fn sell_without_a_portfolio_fails_with_portfolio_not_found() {
        let dir = TempDir::new().unwrap();
        let hub = hub(&dir, vec![]);

        assert!(matches!(
            hub.sell(99, "BTC", 1.0).await,
            Err(CoreError::PortfolioNotFound(99))
        ));
    }

    #[tokio::test]
    async fn invalid_amounts_are_rejected_before_anything_else() {
        let dir = TempDir::new().unwrap();
        let hub = hub(&dir, vec![]);

        assert!(matches!(
            hub.buy(1, "BTC", 0.0).await,
            Err(CoreError::InvalidAmount)
        ));
        assert!(matches!(
            hub.buy(1, "BTC", -2.0).await,
            Err(CoreError::InvalidAmount)
        ));
        assert!(matches!(
            hub.sell(1, "BTC", f64::NAN).await,
            Err(CoreError::InvalidAmount)
        ));
        // Nothing was persisted
        assert!(hub.portfolio(1).unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_currency_is_rejected() {
        let dir = TempDir::new().unwrap();
        let hub = hub(&dir, vec![]);

        match hub.buy(1, "DOGE", 1.0).await {
            Err(CoreError::CurrencyNotFound(code)) => assert_eq!(code, "DOGE"),
            other => panic!("expected CurrencyNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_rate_never_blocks_a_trade() {
        let dir = TempDir::new().unwrap();
        // No sources at all → every advisory estimate fails
        let hub = hub(&dir, vec![]);
        let user = hub.register("alice", "1234").unwrap();

        let receipt = hub.buy(user.user_id(), "BTC", 0.25).await.unwrap();
        assert_eq!(receipt.rate, None);
        assert_eq!(receipt.estimated_value, None);
        assert_eq!(receipt.new_balance, 0.25);

        let receipt = hub.sell(user.user_id(), "BTC", 0.25).await.unwrap();
        assert_eq!(receipt.estimated_value, None);
        assert_eq!(receipt.new_balance, 0.0);
    }

    #[tokio::test]
    async fn trades_persist_across_hub_instances() {
        let dir = TempDir::new().unwrap();
        let user_id;
        {
            let hub = hub(&dir, vec![]);
            let user = hub.register("alice", "1234").unwrap();
            user_id = user.user_id();
            hub.buy(user_id, "ETH", 2.0).await.unwrap();
        }

        let reopened = hub(&dir, vec![]);
        let portfolio = reopened.portfolio(user_id).unwrap().unwrap();
        assert_eq!(portfolio.wallet("ETH").unwrap().balance(), 2.0);
    }

    #[tokio::test]
    async fn currency_codes_are_normalized() {
        let dir = TempDir::new().unwrap();
        let hub = hub(&dir, vec![]);
        let user = hub.register("alice", "1234").unwrap();

        let receipt = hub.buy(user.user_id(), "btc", 1.0).await.unwrap();
        assert_eq!(receipt.currency_code, "BTC");

        let portfolio = hub.portfolio(user.user_id()).unwrap().unwrap();
        assert!(portfolio.wallet("BTC").is_some());
    }

    #[tokio::test]
    async fn repeated_buys_accumulate_in_one_wallet() {
        let dir = TempDir::new().unwrap();
        let hub = hub(&dir, vec![]);
        let user = hub.register("alice", "1234").unwrap();

        hub.buy(user.user_id(), "BTC", 0.5).await.unwrap();
        let receipt = hub.buy(user.user_id(), "BTC", 0.25).await.unwrap();
        assert!((receipt.new_balance - 0.75).abs() < 1e-12);
    }
}

// ═══════════════════════════════════════════════════════════════════
// TradeHub — accounts
// ═══════════════════════════════════════════════════════════════════

mod accounts {
    use super::*;

    #[test]
    fn register_creates_user_and_empty_portfolio() {
        let dir = TempDir::new().unwrap();
        let hub = hub(&dir, vec![]);

        let user = hub.register("alice", "1234").unwrap();
        assert_eq!(user.user_id(), 1);

        let portfolio = hub.portfolio(user.user_id()).unwrap().unwrap();
        assert!(portfolio.is_empty());
    }

    #[test]
    fn user_ids_are_sequential() {
        let dir = TempDir::new().unwrap();
        let hub = hub(&dir, vec![]);

        assert_eq!(hub.register("alice", "1234").unwrap().user_id(), 1);
        assert_eq!(hub.register("bob", "1234").unwrap().user_id(), 2);
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let dir = TempDir::new().unwrap();
        let hub = hub(&dir, vec![]);
        hub.register("alice", "1234").unwrap();

        match hub.register("alice", "5678") {
            Err(CoreError::UserExists(name)) => assert_eq!(name, "alice"),
            other => panic!("expected UserExists, got {other:?}"),
        }
    }

    #[test]
    fn login_checks_credentials() {
        let dir = TempDir::new().unwrap();
        let hub = hub(&dir, vec![]);
        hub.register("alice", "1234").unwrap();

        assert_eq!(hub.login("alice", "1234").unwrap().username(), "alice");
        assert!(matches!(
            hub.login("alice", "wrong"),
            Err(CoreError::InvalidCredentials)
        ));
        assert!(matches!(
            hub.login("carol", "1234"),
            Err(CoreError::UserNotFound(_))
        ));
    }

    #[test]
    fn short_password_is_rejected_at_registration() {
        let dir = TempDir::new().unwrap();
        let hub = hub(&dir, vec![]);
        assert!(matches!(
            hub.register("alice", "123"),
            Err(CoreError::Validation(_))
        ));
        // Nothing persisted
        assert!(hub.login("alice", "123").is_err());
    }
}

// ═══════════════════════════════════════════════════════════════════
// TradeHub — rates & valuation
// ═══════════════════════════════════════════════════════════════════

mod rates_and_valuation {
    use super::*;

    #[tokio::test]
    async fn get_rate_validates_both_codes() {
        let dir = TempDir::new().unwrap();
        let hub = hub(&dir, vec![]);

        assert!(matches!(
            hub.get_rate("XXX", "USD").await,
            Err(CoreError::CurrencyNotFound(_))
        ));
        assert!(matches!(
            hub.get_rate("USD", "YYY").await,
            Err(CoreError::CurrencyNotFound(_))
        ));
    }

    #[tokio::test]
    async fn get_rate_reports_unavailable_pairs() {
        let dir = TempDir::new().unwrap();
        let hub = hub(&dir, vec![]);

        assert!(matches!(
            hub.get_rate("BTC", "USD").await,
            Err(CoreError::RateUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn get_rate_uses_sources_on_cache_miss() {
        let dir = TempDir::new().unwrap();
        let (provider, _) = MockRateProvider::new("Mock", &[("BTC_USD", 60_000.0)]);
        let hub = hub(&dir, vec![Box::new(provider)]);

        let quote = hub.get_rate("btc", "usd").await.unwrap();
        assert_eq!(quote.rate, 60_000.0);
        assert_eq!(quote.pair.key(), "BTC_USD");
    }

    #[tokio::test]
    async fn valuation_values_wallets_through_the_reference_currency() {
        let dir = TempDir::new().unwrap();
        let (provider, _) =
            MockRateProvider::new("Mock", &[("BTC_USD", 60_000.0), ("EUR_USD", 1.1)]);
        let hub = hub(&dir, vec![Box::new(provider)]);
        let user = hub.register("alice", "1234").unwrap();
        hub.buy(user.user_id(), "BTC", 0.5).await.unwrap();
        hub.buy(user.user_id(), "EUR", 100.0).await.unwrap();

        let valuation = hub.portfolio_valuation(user.user_id(), "USD").await.unwrap();
        assert_eq!(valuation.base_currency, "USD");
        assert_eq!(valuation.positions.len(), 2);
        // Sorted by code: BTC, EUR
        assert_eq!(valuation.positions[0].currency_code, "BTC");
        assert!((valuation.positions[0].value_in_base.unwrap() - 30_000.0).abs() < 1e-6);
        assert!((valuation.positions[1].value_in_base.unwrap() - 110.0).abs() < 1e-6);
        assert!((valuation.total_value - 30_110.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn valuation_in_a_non_reference_base() {
        let dir = TempDir::new().unwrap();
        let (provider, _) =
            MockRateProvider::new("Mock", &[("BTC_USD", 60_000.0), ("EUR_USD", 1.1)]);
        let hub = hub(&dir, vec![Box::new(provider)]);
        let user = hub.register("alice", "1234").unwrap();
        hub.buy(user.user_id(), "BTC", 0.5).await.unwrap();

        let valuation = hub.portfolio_valuation(user.user_id(), "EUR").await.unwrap();
        let expected = 0.5 * 60_000.0 / 1.1;
        assert!((valuation.total_value - expected).abs() < 1e-6);
    }

    #[tokio::test]
    async fn wallets_without_a_rate_are_listed_but_not_totalled() {
        let dir = TempDir::new().unwrap();
        let (provider, _) = MockRateProvider::new("Mock", &[("BTC_USD", 60_000.0)]);
        let hub = hub(&dir, vec![Box::new(provider)]);
        let user = hub.register("alice", "1234").unwrap();
        hub.buy(user.user_id(), "BTC", 0.5).await.unwrap();
        hub.buy(user.user_id(), "RUB", 1000.0).await.unwrap();

        let valuation = hub.portfolio_valuation(user.user_id(), "USD").await.unwrap();
        assert_eq!(valuation.positions.len(), 2);
        let rub = valuation
            .positions
            .iter()
            .find(|p| p.currency_code == "RUB")
            .unwrap();
        assert_eq!(rub.value_in_base, None);
        assert_eq!(rub.balance, 1000.0);
        assert!((valuation.total_value - 30_000.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn valuation_rejects_unknown_base_currency() {
        let dir = TempDir::new().unwrap();
        let hub = hub(&dir, vec![]);
        let user = hub.register("alice", "1234").unwrap();

        assert!(matches!(
            hub.portfolio_valuation(user.user_id(), "XYZ").await,
            Err(CoreError::CurrencyNotFound(_))
        ));
    }

    #[tokio::test]
    async fn valuation_of_unknown_user_fails_with_portfolio_not_found() {
        let dir = TempDir::new().unwrap();
        let hub = hub(&dir, vec![]);
        assert!(matches!(
            hub.portfolio_valuation(99, "USD").await,
            Err(CoreError::PortfolioNotFound(99))
        ));
    }

    #[tokio::test]
    async fn cached_rates_reflect_the_last_update() {
        let dir = TempDir::new().unwrap();
        let (provider, _) =
            MockRateProvider::new("Mock", &[("BTC_USD", 60_000.0), ("ETH_USD", 3_720.0)]);
        let hub = hub(&dir, vec![Box::new(provider)]);

        assert!(hub.cached_rates().unwrap().pairs.is_empty());
        let report = hub.update_rates().await.unwrap();
        assert_eq!(report.updated, 2);

        let doc = hub.cached_rates().unwrap();
        assert_eq!(doc.pairs.len(), 2);
        assert!(doc.last_refresh.is_some());
    }
}
