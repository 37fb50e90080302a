use std::path::PathBuf;

use crate::errors::CoreError;
use crate::models::user::User;

use super::json;

/// Durable store for registered users (`users.json`).
///
/// The file holds an ordered sequence of user records; writes replace
/// the whole sequence atomically.
#[derive(Debug, Clone)]
pub struct UserStore {
    path: PathBuf,
}

impl UserStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load_all(&self) -> Result<Vec<User>, CoreError> {
        json::load_or_default(&self.path)
    }

    pub fn save_all(&self, users: &[User]) -> Result<(), CoreError> {
        json::save_atomic(&self.path, &users)
    }

    pub fn find_by_username(&self, username: &str) -> Result<Option<User>, CoreError> {
        let users = self.load_all()?;
        Ok(users.into_iter().find(|u| u.username() == username))
    }
}
