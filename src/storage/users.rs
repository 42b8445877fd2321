//! User records.

use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

use super::{load_json, save_json};
use crate::types::User;

/// Durable user storage keyed by id.
pub trait UserRepository: Send + Sync {
    fn get(&self, id: &str) -> Result<Option<User>>;
    fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    fn insert(&self, user: User) -> Result<()>;
    fn update(&self, user: &User) -> Result<()>;
    fn list(&self) -> Result<Vec<User>>;
    fn count(&self) -> Result<usize>;
}

/// JSON-file-backed user store. The whole set lives in memory and is
/// rewritten after each mutation.
pub struct JsonUserStore {
    path: PathBuf,
    records: Mutex<Vec<User>>,
}

impl JsonUserStore {
    /// Open the store at `path`, loading existing records or starting
    /// fresh.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records: Vec<User> = load_json(&path)?.unwrap_or_default();
        info!(path = %path.display(), users = records.len(), "User store opened");
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    fn persist(&self, records: &[User]) -> Result<()> {
        save_json(&records, &self.path)
    }
}

impl UserRepository for JsonUserStore {
    fn get(&self, id: &str) -> Result<Option<User>> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().find(|u| u.id == id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().find(|u| u.email == email).cloned())
    }

    fn insert(&self, user: User) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        if records.iter().any(|u| u.id == user.id) {
            return Err(anyhow!("duplicate user id: {}", user.id));
        }
        records.push(user);
        self.persist(&records)
    }

    fn update(&self, user: &User) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        let slot = records
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| anyhow!("no such user: {}", user.id))?;
        *slot = user.clone();
        self.persist(&records)
    }

    fn list(&self) -> Result<Vec<User>> {
        Ok(self.records.lock().unwrap().clone())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.records.lock().unwrap().len())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
