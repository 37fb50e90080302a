use thiserror::Error;

use crate::models::pair::CurrencyPair;

/// Unified error type for the entire currex-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Trade / Ledger ──────────────────────────────────────────────
    #[error("'amount' must be a positive number")]
    InvalidAmount,

    #[error("Unknown currency '{0}'")]
    CurrencyNotFound(String),

    #[error("Insufficient funds: {available:.4} {code} available, {required:.4} {code} required")]
    InsufficientFunds {
        available: f64,
        required: f64,
        code: String,
    },

    #[error("No wallet for currency '{0}'")]
    WalletNotFound(String),

    #[error("Portfolio for user_id={0} not found")]
    PortfolioNotFound(u64),

    // ── Rates ───────────────────────────────────────────────────────
    #[error("Rate {0} is unavailable")]
    RateUnavailable(CurrencyPair),

    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    // ── Accounts ────────────────────────────────────────────────────
    #[error("Username '{0}' is already taken")]
    UserExists(String),

    #[error("User '{0}' not found")]
    UserNotFound(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Validation failed: {0}")]
    Validation(String),

    // ── Storage ─────────────────────────────────────────────────────
    #[error("Storage error: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Persistence(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Sanitize error message: strip query parameters from URLs to prevent
        // API key leakage. reqwest errors often contain full URLs with secrets.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
