use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for the whole application.
///
/// Constructed once at process start (usually via [`Config::from_env`])
/// and passed into each component's constructor; there is no global
/// settings object.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding all JSON stores.
    pub data_dir: PathBuf,

    /// Maximum age before a cached rate is considered stale.
    pub rates_max_age: chrono::Duration,

    /// Timeout applied to every outbound adapter request.
    pub request_timeout: Duration,

    /// Reference currency for quotes and trade value estimates.
    pub base_currency: String,

    /// Fiat codes the ExchangeRate-API adapter covers.
    pub fiat_currencies: Vec<String>,

    /// Crypto codes the CoinGecko adapter covers, with their API ids.
    pub crypto_id_map: Vec<(String, String)>,

    pub coingecko_url: String,
    pub exchangerate_url: String,

    /// ExchangeRate-API key; the fiat adapter fails without one.
    pub exchangerate_api_key: Option<String>,
}

impl Config {
    /// Environment variable naming the data directory.
    pub const DATA_DIR_ENV: &'static str = "CURREX_DATA_DIR";
    /// Environment variable overriding the rates TTL, in seconds.
    pub const RATES_TTL_ENV: &'static str = "CURREX_RATES_TTL";
    /// Environment variable holding the ExchangeRate-API key.
    pub const EXCHANGERATE_KEY_ENV: &'static str = "EXCHANGERATE_API_KEY";

    /// Build a configuration from environment variables, falling back
    /// to defaults: `./data` as the data directory and a 600-second
    /// rate freshness window.
    pub fn from_env() -> Self {
        let data_dir = std::env::var(Self::DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        let mut config = Self::with_data_dir(data_dir);
        if let Some(ttl) = std::env::var(Self::RATES_TTL_ENV)
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
        {
            config.rates_max_age = chrono::Duration::seconds(ttl);
        }
        config.exchangerate_api_key = std::env::var(Self::EXCHANGERATE_KEY_ENV).ok();
        config
    }

    /// Default configuration rooted at `data_dir`. API key comes from
    /// the environment only in [`Config::from_env`].
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            rates_max_age: chrono::Duration::seconds(600),
            request_timeout: Duration::from_secs(10),
            base_currency: "USD".to_string(),
            fiat_currencies: vec!["EUR".into(), "GBP".into(), "RUB".into()],
            crypto_id_map: vec![
                ("BTC".into(), "bitcoin".into()),
                ("ETH".into(), "ethereum".into()),
                ("SOL".into(), "solana".into()),
            ],
            coingecko_url: "https://api.coingecko.com/api/v3/simple/price".to_string(),
            exchangerate_url: "https://v6.exchangerate-api.com/v6".to_string(),
            exchangerate_api_key: None,
        }
    }

    pub fn users_file(&self) -> PathBuf {
        self.data_dir.join("users.json")
    }

    pub fn portfolios_file(&self) -> PathBuf {
        self.data_dir.join("portfolios.json")
    }

    pub fn rates_file(&self) -> PathBuf {
        self.data_dir.join("rates.json")
    }

    pub fn history_file(&self) -> PathBuf {
        self.data_dir.join("exchange_history.json")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::with_data_dir("data")
    }
}
