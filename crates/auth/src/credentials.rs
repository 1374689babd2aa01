//! Credential verification.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::Identity;

/// Password accepted for every demo account.
pub const DEMO_PASSWORD: &str = "password123";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The backing store could not be reached.
    #[error("credential backend unavailable: {0}")]
    Unavailable(String),
}

/// Verifies an email/password pair and yields the matching identity.
///
/// `Ok(None)` is the normal "wrong email or password" outcome; implementations
/// must not reveal which of the two was wrong. `Err` is reserved for the
/// backend itself failing.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn verify(&self, email: &str, password: &str) -> Result<Option<Identity>, CredentialError>;
}

/// Fixed account list with one shared password.
///
/// Stands in for the real backend: verification sleeps for `latency` to keep
/// callers honest about the suspension point.
#[derive(Debug, Clone)]
pub struct MockCredentialStore {
    accounts: Vec<Identity>,
    password: String,
    latency: Duration,
}

impl MockCredentialStore {
    pub fn new(accounts: Vec<Identity>, password: impl Into<String>) -> Self {
        Self {
            accounts,
            password: password.into(),
            latency: Duration::ZERO,
        }
    }

    /// The four demo accounts, one per role.
    pub fn demo() -> Self {
        Self::new(demo_accounts(), DEMO_PASSWORD)
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn accounts(&self) -> &[Identity] {
        &self.accounts
    }
}

#[async_trait]
impl CredentialStore for MockCredentialStore {
    async fn verify(&self, email: &str, password: &str) -> Result<Option<Identity>, CredentialError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let found = self.accounts.iter().find(|a| a.email.as_str() == email);
        match found {
            Some(account) if password == self.password => Ok(Some(account.clone())),
            _ => Ok(None),
        }
    }
}

// (id, email, name, role, department, phone)
const DEMO_ACCOUNTS: [(&str, &str, &str, &str, &str, &str); 4] = [
    ("1", "admin@construcard.ru", "Alexander Petrov", "admin", "Administration", "+7 (999) 123-45-67"),
    ("2", "engineer@construcard.ru", "Elena Sidorova", "engineer", "Geodesy", "+7 (999) 234-56-78"),
    ("3", "supervisor@construcard.ru", "Mikhail Ivanov", "supervisor", "Construction works", "+7 (999) 345-67-89"),
    ("4", "supplier@construcard.ru", "Olga Kozlova", "supplier", "Procurement", "+7 (999) 456-78-90"),
];

/// The fixed demo table. Every row is a literal, so a row that fails
/// validation is a programming error and panics here rather than vanishing.
pub fn demo_accounts() -> Vec<Identity> {
    DEMO_ACCOUNTS
        .iter()
        .map(|&(id, email, name, role, department, phone)| {
            Identity::from_parts(id, email, name, role)
                .unwrap_or_else(|err| panic!("invalid demo account {email}: {err}"))
                .with_department(department)
                .with_phone(phone)
        })
        .collect()
}
