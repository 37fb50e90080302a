use std::sync::Arc;

use tracing::warn;

use crate::errors::CoreError;
use crate::models::currency::CurrencyRegistry;
use crate::models::pair::CurrencyPair;
use crate::models::portfolio::Portfolio;
use crate::services::rate_service::RateService;
use crate::storage::portfolio_store::PortfolioStore;

/// One wallet's line in a portfolio valuation.
#[derive(Debug, Clone)]
pub struct PortfolioPosition {
    pub currency_code: String,
    pub balance: f64,
    /// `None` when no rate could be resolved for this wallet — the
    /// position is listed anyway and excluded from the total.
    pub value_in_base: Option<f64>,
}

/// A portfolio valued in a chosen base currency.
#[derive(Debug, Clone)]
pub struct PortfolioValuation {
    pub user_id: u64,
    pub base_currency: String,
    pub positions: Vec<PortfolioPosition>,
    pub total_value: f64,
}

/// Read-side portfolio operations: lookups and valuation.
pub struct PortfolioService {
    currencies: Arc<CurrencyRegistry>,
    portfolios: PortfolioStore,
    rates: Arc<RateService>,
    reference_currency: String,
}

impl PortfolioService {
    pub fn new(
        currencies: Arc<CurrencyRegistry>,
        portfolios: PortfolioStore,
        rates: Arc<RateService>,
        reference_currency: impl Into<String>,
    ) -> Self {
        Self {
            currencies,
            portfolios,
            rates,
            reference_currency: reference_currency.into(),
        }
    }

    /// One user's portfolio, if any.
    pub fn portfolio(&self, user_id: u64) -> Result<Option<Portfolio>, CoreError> {
        self.portfolios.load(user_id)
    }

    /// Value every wallet in `base` currency, best-effort per wallet.
    ///
    /// Wallet values go through the reference currency:
    /// `balance * rate(code → ref) / rate(base → ref)`. A wallet whose
    /// rate is unavailable is listed without a value; the whole view
    /// never fails because one rate is missing.
    pub async fn valuation(
        &self,
        user_id: u64,
        base: &str,
    ) -> Result<PortfolioValuation, CoreError> {
        let base = self.currencies.get(base)?.code().to_string();
        let portfolio = self
            .portfolios
            .load(user_id)?
            .ok_or(CoreError::PortfolioNotFound(user_id))?;

        let base_rate = self.reference_rate(&base).await;

        let mut positions = Vec::with_capacity(portfolio.wallets().len());
        let mut total_value = 0.0;

        for (code, wallet) in portfolio.wallets() {
            let value_in_base = match (self.reference_rate(code).await, base_rate) {
                (Some(code_ref), Some(base_ref)) if base_ref > 0.0 => {
                    Some(wallet.balance() * code_ref / base_ref)
                }
                _ => None,
            };
            if let Some(value) = value_in_base {
                total_value += value;
            }
            positions.push(PortfolioPosition {
                currency_code: code.clone(),
                balance: wallet.balance(),
                value_in_base,
            });
        }

        positions.sort_by(|a, b| a.currency_code.cmp(&b.currency_code));

        Ok(PortfolioValuation {
            user_id,
            base_currency: base,
            positions,
            total_value,
        })
    }

    /// Best-effort `code → reference currency` rate.
    async fn reference_rate(&self, code: &str) -> Option<f64> {
        let pair = CurrencyPair::new(code, &self.reference_currency);
        match self.rates.resolve(&pair).await {
            Ok(quote) => Some(quote.rate),
            Err(e) => {
                warn!(pair = %pair, error = %e, "No rate for valuation");
                None
            }
        }
    }
}
