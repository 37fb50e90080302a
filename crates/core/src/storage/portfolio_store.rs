use std::path::PathBuf;

use crate::errors::CoreError;
use crate::models::portfolio::Portfolio;

use super::json;

/// Durable store for user portfolios (`portfolios.json`).
#[derive(Debug, Clone)]
pub struct PortfolioStore {
    path: PathBuf,
}

impl PortfolioStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load_all(&self) -> Result<Vec<Portfolio>, CoreError> {
        json::load_or_default(&self.path)
    }

    pub fn save_all(&self, portfolios: &[Portfolio]) -> Result<(), CoreError> {
        json::save_atomic(&self.path, &portfolios)
    }

    /// Load one user's portfolio, if any.
    pub fn load(&self, user_id: u64) -> Result<Option<Portfolio>, CoreError> {
        let portfolios = self.load_all()?;
        Ok(portfolios.into_iter().find(|p| p.user_id() == user_id))
    }

    /// Insert or replace one user's portfolio and commit the whole
    /// sequence atomically.
    pub fn upsert(&self, portfolio: &Portfolio) -> Result<(), CoreError> {
        let mut portfolios = self.load_all()?;
        match portfolios
            .iter_mut()
            .find(|p| p.user_id() == portfolio.user_id())
        {
            Some(existing) => *existing = portfolio.clone(),
            None => portfolios.push(portfolio.clone()),
        }
        self.save_all(&portfolios)
    }
}
