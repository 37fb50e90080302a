pub mod config;
pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use std::sync::Arc;

use config::Config;
use errors::CoreError;
use models::currency::CurrencyRegistry;
use models::pair::CurrencyPair;
use models::portfolio::Portfolio;
use models::rate::{RateQuote, RatesDocument};
use models::user::User;
use providers::ProviderRegistry;
use services::portfolio_service::{PortfolioService, PortfolioValuation};
use services::rate_service::RateService;
use services::trade_service::{TradeReceipt, TradeService};
use services::update_service::{UpdateReport, UpdateSchedule, UpdateService};
use services::user_service::UserService;
use storage::portfolio_store::PortfolioStore;
use storage::rate_store::RateStore;
use storage::user_store::UserStore;

/// Main entry point for the Currex core library.
///
/// Wires the currency registry, rate sources, stores, and services
/// together from one [`Config`]; the CLI talks only to this type.
#[must_use]
pub struct TradeHub {
    config: Config,
    currencies: Arc<CurrencyRegistry>,
    rate_store: RateStore,
    rates: Arc<RateService>,
    users: UserService,
    trades: TradeService,
    portfolios: PortfolioService,
    updater: UpdateService,
}

impl TradeHub {
    /// Build a hub with the default rate sources.
    pub fn new(config: Config) -> Self {
        let providers = ProviderRegistry::new_with_defaults(&config);
        Self::with_providers(config, providers)
    }

    /// Build a hub with an explicit source registry (used by tests and
    /// custom deployments).
    pub fn with_providers(config: Config, providers: ProviderRegistry) -> Self {
        let currencies = Arc::new(CurrencyRegistry::with_defaults());
        let providers = Arc::new(providers);

        let user_store = UserStore::new(config.users_file());
        let portfolio_store = PortfolioStore::new(config.portfolios_file());
        let rate_store = RateStore::new(config.rates_file(), config.history_file());

        let rates = Arc::new(RateService::new(
            rate_store.clone(),
            providers.clone(),
            config.rates_max_age,
        ));
        let users = UserService::new(user_store, portfolio_store.clone());
        let trades = TradeService::new(
            currencies.clone(),
            portfolio_store.clone(),
            rates.clone(),
            config.base_currency.clone(),
        );
        let portfolios = PortfolioService::new(
            currencies.clone(),
            portfolio_store,
            rates.clone(),
            config.base_currency.clone(),
        );
        let updater = UpdateService::new(providers, rate_store.clone());

        Self {
            config,
            currencies,
            rate_store,
            rates,
            users,
            trades,
            portfolios,
            updater,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn currencies(&self) -> &CurrencyRegistry {
        &self.currencies
    }

    // ── Accounts ────────────────────────────────────────────────────

    /// Register a new account with an empty portfolio.
    pub fn register(&self, username: &str, password: &str) -> Result<User, CoreError> {
        self.users.register(username, password)
    }

    /// Authenticate an existing account.
    pub fn login(&self, username: &str, password: &str) -> Result<User, CoreError> {
        self.users.login(username, password)
    }

    // ── Trades ──────────────────────────────────────────────────────

    /// Buy `amount` of `currency_code` for the user.
    pub async fn buy(
        &self,
        user_id: u64,
        currency_code: &str,
        amount: f64,
    ) -> Result<TradeReceipt, CoreError> {
        self.trades.buy(user_id, currency_code, amount).await
    }

    /// Sell `amount` of `currency_code` from the user's wallet.
    pub async fn sell(
        &self,
        user_id: u64,
        currency_code: &str,
        amount: f64,
    ) -> Result<TradeReceipt, CoreError> {
        self.trades.sell(user_id, currency_code, amount).await
    }

    // ── Rates ───────────────────────────────────────────────────────

    /// Resolve the `from → to` rate: cached while fresh, refreshed from
    /// the configured sources otherwise. Both codes must be known
    /// currencies.
    pub async fn get_rate(&self, from: &str, to: &str) -> Result<RateQuote, CoreError> {
        let from = self.currencies.get(from)?.code().to_string();
        let to = self.currencies.get(to)?.code().to_string();
        self.rates.resolve(&CurrencyPair::new(&from, &to)).await
    }

    /// The raw cached rates document (for `show-rates`).
    pub fn cached_rates(&self) -> Result<RatesDocument, CoreError> {
        self.rate_store.load_document()
    }

    /// Run one update cycle over all configured sources.
    pub async fn update_rates(&self) -> Result<UpdateReport, CoreError> {
        self.updater.run_update().await
    }

    /// Run the updater on a schedule (`OneTime` or `Every(interval)`).
    pub async fn run_scheduler(&self, schedule: UpdateSchedule) -> Result<(), CoreError> {
        self.updater.run(schedule).await
    }

    // ── Portfolios ──────────────────────────────────────────────────

    /// One user's portfolio, if any.
    pub fn portfolio(&self, user_id: u64) -> Result<Option<Portfolio>, CoreError> {
        self.portfolios.portfolio(user_id)
    }

    /// The user's portfolio valued in `base` currency (best-effort per
    /// wallet).
    pub async fn portfolio_valuation(
        &self,
        user_id: u64,
        base: &str,
    ) -> Result<PortfolioValuation, CoreError> {
        self.portfolios.valuation(user_id, base).await
    }
}
