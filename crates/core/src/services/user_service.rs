use tracing::{info, warn};

use crate::errors::CoreError;
use crate::models::portfolio::Portfolio;
use crate::models::user::User;
use crate::storage::portfolio_store::PortfolioStore;
use crate::storage::user_store::UserStore;

/// Account registration and login.
///
/// Registration creates the user record and an empty portfolio; user
/// ids are sequential (`max + 1` over the existing store).
pub struct UserService {
    users: UserStore,
    portfolios: PortfolioStore,
}

impl UserService {
    pub fn new(users: UserStore, portfolios: PortfolioStore) -> Self {
        Self { users, portfolios }
    }

    /// Register a new account. Fails with `UserExists` for a taken
    /// username and `Validation` for an empty username or a password
    /// shorter than 4 characters.
    pub fn register(&self, username: &str, password: &str) -> Result<User, CoreError> {
        let username = username.trim();
        let mut users = self.users.load_all()?;

        if users.iter().any(|u| u.username() == username) {
            return Err(CoreError::UserExists(username.to_string()));
        }

        let next_id = users.iter().map(User::user_id).max().unwrap_or(0) + 1;
        let user = User::new(next_id, username, password)?;

        users.push(user.clone());
        self.users.save_all(&users)?;

        // Every account starts with an empty portfolio.
        let mut portfolios = self.portfolios.load_all()?;
        if !portfolios.iter().any(|p| p.user_id() == next_id) {
            portfolios.push(Portfolio::new(next_id));
            self.portfolios.save_all(&portfolios)?;
        }

        info!(user_id = next_id, username, "User registered");
        Ok(user)
    }

    /// Authenticate a user. Fails with `UserNotFound` for an unknown
    /// username and `InvalidCredentials` for a wrong password.
    pub fn login(&self, username: &str, password: &str) -> Result<User, CoreError> {
        let username = username.trim();
        let user = self
            .users
            .find_by_username(username)?
            .ok_or_else(|| CoreError::UserNotFound(username.to_string()))?;

        if !user.verify_password(password) {
            warn!(username, "Login rejected: wrong password");
            return Err(CoreError::InvalidCredentials);
        }

        info!(user_id = user.user_id(), username, "User logged in");
        Ok(user)
    }
}
