use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// A single-currency balance inside a portfolio.
///
/// The balance is private and can only move through [`deposit`] and
/// [`withdraw`], both of which validate before mutating; the
/// `balance >= 0` invariant holds after every operation.
///
/// [`deposit`]: Wallet::deposit
/// [`withdraw`]: Wallet::withdraw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    currency_code: String,
    balance: f64,
}

impl Wallet {
    /// Create a wallet. The code must be non-empty and the starting
    /// balance non-negative and finite.
    pub fn new(currency_code: &str, balance: f64) -> Result<Self, CoreError> {
        let code = currency_code.trim().to_uppercase();
        if code.is_empty() {
            return Err(CoreError::Validation(
                "Currency code must be a non-empty string".into(),
            ));
        }
        if !balance.is_finite() || balance < 0.0 {
            return Err(CoreError::Validation(format!(
                "Initial balance must be a number >= 0, got {balance}"
            )));
        }
        Ok(Self {
            currency_code: code,
            balance,
        })
    }

    /// A zero-balance wallet for `code`.
    pub fn empty(currency_code: &str) -> Self {
        Self {
            currency_code: currency_code.trim().to_uppercase(),
            balance: 0.0,
        }
    }

    pub fn currency_code(&self) -> &str {
        &self.currency_code
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// Add `amount` to the balance. Fails with `InvalidAmount` for
    /// zero, negative, or non-finite amounts; the balance is untouched
    /// on failure.
    pub fn deposit(&mut self, amount: f64) -> Result<(), CoreError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(CoreError::InvalidAmount);
        }
        self.balance += amount;
        Ok(())
    }

    /// Remove `amount` from the balance. Fails with `InvalidAmount` for
    /// non-positive amounts and `InsufficientFunds` when the balance
    /// cannot cover the withdrawal; the balance is untouched on failure.
    pub fn withdraw(&mut self, amount: f64) -> Result<(), CoreError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(CoreError::InvalidAmount);
        }
        if amount > self.balance {
            return Err(CoreError::InsufficientFunds {
                available: self.balance,
                required: amount,
                code: self.currency_code.clone(),
            });
        }
        self.balance -= amount;
        Ok(())
    }
}
