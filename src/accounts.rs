//! In-memory demo accounts backing the login and registration pages.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Account present on every fresh start.
pub const DEMO_EMAIL: &str = "demo@example.com";
pub const DEMO_PASSWORD: &str = "password123";

/// Outcome of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Created,
    AlreadyRegistered,
}

/// Email to password map. Lives only as long as the process.
#[derive(Debug)]
pub struct AccountStore {
    users: RwLock<HashMap<String, String>>,
}

impl AccountStore {
    /// Creates a store with no accounts.
    pub fn empty() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a store seeded with the demo account.
    pub fn with_demo_user() -> Self {
        let store = Self::empty();
        store.register(DEMO_EMAIL, DEMO_PASSWORD);
        store
    }

    pub fn register(&self, email: &str, password: &str) -> Registration {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        if users.contains_key(email) {
            return Registration::AlreadyRegistered;
        }
        users.insert(email.to_string(), password.to_string());
        tracing::info!(email, "Account registered");
        Registration::Created
    }

    /// True when `email` exists and `password` matches.
    pub fn verify(&self, email: &str, password: &str) -> bool {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(email)
            .is_some_and(|stored| stored == password)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.users.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::with_demo_user()
    }
}
