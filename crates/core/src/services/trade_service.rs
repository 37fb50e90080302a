use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::errors::CoreError;
use crate::models::currency::CurrencyRegistry;
use crate::models::pair::CurrencyPair;
use crate::models::portfolio::Portfolio;
use crate::models::rate::RateQuote;
use crate::services::rate_service::RateService;
use crate::storage::portfolio_store::PortfolioStore;

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "BUY"),
            TradeSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Outcome of a settled trade.
///
/// `rate` and `estimated_value` are advisory: they are `None` whenever
/// the reference-currency rate could not be resolved, which never
/// prevents the trade itself.
#[derive(Debug, Clone)]
pub struct TradeReceipt {
    pub side: TradeSide,
    pub user_id: u64,
    pub currency_code: String,
    pub amount: f64,
    pub rate: Option<f64>,
    pub estimated_value: Option<f64>,
    pub new_balance: f64,
    pub executed_at: DateTime<Utc>,
}

/// Orchestrates buy/sell operations.
///
/// Every trade walks the same sequence (validate, resolve the advisory
/// rate, apply the ledger mutation in memory, persist atomically) and
/// any failed step leaves all prior state untouched.
pub struct TradeService {
    currencies: Arc<CurrencyRegistry>,
    portfolios: PortfolioStore,
    rates: Arc<RateService>,
    base_currency: String,
}

impl TradeService {
    pub fn new(
        currencies: Arc<CurrencyRegistry>,
        portfolios: PortfolioStore,
        rates: Arc<RateService>,
        base_currency: impl Into<String>,
    ) -> Self {
        Self {
            currencies,
            portfolios,
            rates,
            base_currency: base_currency.into(),
        }
    }

    /// Buy `amount` of `currency_code` for `user_id`. The funding side
    /// is abstracted away; buying never requires existing funds.
    pub async fn buy(
        &self,
        user_id: u64,
        currency_code: &str,
        amount: f64,
    ) -> Result<TradeReceipt, CoreError> {
        self.execute(TradeSide::Buy, user_id, currency_code, amount)
            .await
    }

    /// Sell `amount` of `currency_code` from the user's wallet.
    pub async fn sell(
        &self,
        user_id: u64,
        currency_code: &str,
        amount: f64,
    ) -> Result<TradeReceipt, CoreError> {
        self.execute(TradeSide::Sell, user_id, currency_code, amount)
            .await
    }

    /// Run one trade, logging the outcome either way. Errors are
    /// surfaced verbatim, never retried.
    async fn execute(
        &self,
        side: TradeSide,
        user_id: u64,
        currency_code: &str,
        amount: f64,
    ) -> Result<TradeReceipt, CoreError> {
        info!(
            side = %side,
            user_id,
            currency = currency_code,
            amount,
            "Trade requested"
        );

        let result = self.settle(side, user_id, currency_code, amount).await;
        match &result {
            Ok(receipt) => {
                let rate = receipt
                    .rate
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "N/A".into());
                info!(
                    side = %side,
                    user_id,
                    currency = %receipt.currency_code,
                    amount,
                    rate = %rate,
                    new_balance = receipt.new_balance,
                    outcome = "ok",
                    "Trade settled"
                );
            }
            Err(e) => {
                error!(
                    side = %side,
                    user_id,
                    currency = currency_code,
                    amount,
                    rate = "N/A",
                    outcome = "error",
                    error = %e,
                    "Trade failed"
                );
            }
        }
        result
    }

    async fn settle(
        &self,
        side: TradeSide,
        user_id: u64,
        currency_code: &str,
        amount: f64,
    ) -> Result<TradeReceipt, CoreError> {
        // Validated
        if !amount.is_finite() || amount <= 0.0 {
            return Err(CoreError::InvalidAmount);
        }
        let code = self.currencies.get(currency_code)?.code().to_string();

        // RateResolved: advisory only, never blocks the trade
        let advisory = self.advisory_quote(&code).await;

        // LedgerApplied: on an owned copy, disk is untouched until persist
        let mut portfolio = match side {
            TradeSide::Buy => self
                .portfolios
                .load(user_id)?
                .unwrap_or_else(|| Portfolio::new(user_id)),
            TradeSide::Sell => self
                .portfolios
                .load(user_id)?
                .ok_or(CoreError::PortfolioNotFound(user_id))?,
        };
        match side {
            TradeSide::Buy => portfolio.deposit(&code, amount)?,
            TradeSide::Sell => portfolio.withdraw(&code, amount)?,
        }

        // Persisted
        self.portfolios.upsert(&portfolio)?;

        let new_balance = portfolio
            .wallet(&code)
            .map(|w| w.balance())
            .unwrap_or_default();
        let rate = advisory.map(|q| q.rate);

        Ok(TradeReceipt {
            side,
            user_id,
            currency_code: code,
            amount,
            rate,
            estimated_value: rate.map(|r| amount * r),
            new_balance,
            executed_at: Utc::now(),
        })
    }

    /// Best-effort quote of `code` against the reference currency.
    async fn advisory_quote(&self, code: &str) -> Option<RateQuote> {
        let pair = CurrencyPair::new(code, &self.base_currency);
        match self.rates.resolve(&pair).await {
            Ok(quote) => Some(quote),
            Err(e) => {
                warn!(pair = %pair, error = %e, "Value estimation unavailable");
                None
            }
        }
    }
}
