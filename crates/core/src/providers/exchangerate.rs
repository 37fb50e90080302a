use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::errors::CoreError;
use crate::models::pair::CurrencyPair;
use crate::models::rate::RateQuote;

use super::traits::RateProvider;

const SOURCE: &str = "ExchangeRate-API";

/// ExchangeRate-API adapter for fiat quotes.
///
/// Requires an API key (the key travels in the URL path, so request
/// errors are reported without the URL). Quotes the configured fiat
/// codes against the base currency.
pub struct ExchangeRateApiProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    base_currency: String,
    fiat_currencies: Vec<String>,
}

impl ExchangeRateApiProvider {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: config.exchangerate_url.clone(),
            api_key: config.exchangerate_api_key.clone(),
            base_currency: config.base_currency.clone(),
            fiat_currencies: config.fiat_currencies.clone(),
        }
    }
}

#[derive(Deserialize)]
struct LatestResponse {
    #[serde(default)]
    result: String,
    #[serde(default, alias = "conversion_rates")]
    rates: HashMap<String, f64>,
}

#[async_trait]
impl RateProvider for ExchangeRateApiProvider {
    fn name(&self) -> &str {
        SOURCE
    }

    fn covers(&self, pair: &CurrencyPair) -> bool {
        pair.to_code() == self.base_currency
            && self.fiat_currencies.iter().any(|c| c == pair.from_code())
    }

    async fn fetch_rates(&self) -> Result<HashMap<String, RateQuote>, CoreError> {
        let key = self.api_key.as_deref().ok_or_else(|| CoreError::Api {
            provider: SOURCE.into(),
            message: format!("Missing {} credential", Config::EXCHANGERATE_KEY_ENV),
        })?;

        let url = format!("{}/{}/latest/{}", self.base_url, key, self.base_currency);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CoreError::Network(e.without_url().to_string()))?
            .error_for_status()
            .map_err(|e| CoreError::Network(e.without_url().to_string()))?;

        let payload: LatestResponse = response.json().await.map_err(|e| CoreError::Api {
            provider: SOURCE.into(),
            message: format!("Failed to parse response: {e}"),
        })?;

        if payload.result != "success" {
            return Err(CoreError::Api {
                provider: SOURCE.into(),
                message: format!("Unexpected API result '{}'", payload.result),
            });
        }

        let now = Utc::now();
        let mut result = HashMap::new();
        for code in &self.fiat_currencies {
            let Some(value) = payload.rates.get(code) else {
                continue;
            };
            let pair = CurrencyPair::new(code, &self.base_currency);
            let quote =
                RateQuote::new(pair.clone(), *value, now, SOURCE).map_err(|_| CoreError::Api {
                    provider: SOURCE.into(),
                    message: format!("Invalid rate {value} for {pair}"),
                })?;
            result.insert(pair.key(), quote);
        }
        Ok(result)
    }
}
