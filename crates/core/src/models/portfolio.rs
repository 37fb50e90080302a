use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::models::wallet::Wallet;

/// All wallets belonging to one user, keyed by currency code.
///
/// One portfolio per user, created empty at registration. Wallets are
/// created lazily on the first deposit for a new currency code. The
/// portfolio exclusively owns its wallets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    user_id: u64,
    wallets: HashMap<String, Wallet>,
}

impl Portfolio {
    pub fn new(user_id: u64) -> Self {
        Self {
            user_id,
            wallets: HashMap::new(),
        }
    }

    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    pub fn wallets(&self) -> &HashMap<String, Wallet> {
        &self.wallets
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }

    /// Get the wallet for `code`, if one exists.
    pub fn wallet(&self, code: &str) -> Option<&Wallet> {
        self.wallets.get(&code.trim().to_uppercase())
    }

    /// Idempotent: create a zero-balance wallet for `code` if absent,
    /// and return a mutable handle to it.
    pub fn ensure_wallet(&mut self, code: &str) -> &mut Wallet {
        let normalized = code.trim().to_uppercase();
        self.wallets
            .entry(normalized.clone())
            .or_insert_with(|| Wallet::empty(&normalized))
    }

    /// Deposit `amount` into the wallet for `code`, creating the wallet
    /// on first use. Nothing changes on failure.
    pub fn deposit(&mut self, code: &str, amount: f64) -> Result<(), CoreError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(CoreError::InvalidAmount);
        }
        self.ensure_wallet(code).deposit(amount)
    }

    /// Withdraw `amount` from the wallet for `code`. Fails with
    /// `WalletNotFound` if no such wallet exists; nothing changes on
    /// failure.
    pub fn withdraw(&mut self, code: &str, amount: f64) -> Result<(), CoreError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(CoreError::InvalidAmount);
        }
        let normalized = code.trim().to_uppercase();
        let wallet = self
            .wallets
            .get_mut(&normalized)
            .ok_or(CoreError::WalletNotFound(normalized))?;
        wallet.withdraw(amount)
    }
}
