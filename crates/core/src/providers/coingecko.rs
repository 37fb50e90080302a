use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;

use crate::config::Config;
use crate::errors::CoreError;
use crate::models::pair::CurrencyPair;
use crate::models::rate::RateQuote;

use super::traits::RateProvider;

const SOURCE: &str = "CoinGecko";

/// CoinGecko `/simple/price` adapter for crypto quotes.
///
/// - **Free**: no API key required.
/// - **Coverage**: the crypto codes from the configuration, quoted
///   against the base currency (USD by default).
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
    vs_currency: String,
    id_map: Vec<(String, String)>,
}

impl CoinGeckoProvider {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: config.coingecko_url.clone(),
            vs_currency: config.base_currency.clone(),
            id_map: config.crypto_id_map.clone(),
        }
    }
}

#[async_trait]
impl RateProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        SOURCE
    }

    fn covers(&self, pair: &CurrencyPair) -> bool {
        pair.to_code() == self.vs_currency
            && self.id_map.iter().any(|(code, _)| code == pair.from_code())
    }

    async fn fetch_rates(&self) -> Result<HashMap<String, RateQuote>, CoreError> {
        let ids: Vec<&str> = self.id_map.iter().map(|(_, id)| id.as_str()).collect();
        let vs = self.vs_currency.to_lowercase();
        let url = format!(
            "{}?ids={}&vs_currencies={}",
            self.base_url,
            ids.join(","),
            vs
        );

        let payload: HashMap<String, HashMap<String, f64>> = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: SOURCE.into(),
                message: format!("Failed to parse response: {e}"),
            })?;

        let now = Utc::now();
        let mut result = HashMap::new();
        for (code, coin_id) in &self.id_map {
            let Some(value) = payload.get(coin_id).and_then(|prices| prices.get(&vs)) else {
                continue;
            };
            let pair = CurrencyPair::new(code, &self.vs_currency);
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
