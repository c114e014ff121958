//! Secrets vault collaborator interface
//!
//! Sensitive values (API keys, signing material) live in a secrets vault
//! distinct from the bulk object store. The library only ever fetches a
//! secret string by name; writes are external and out of band.

use super::secret::{secret_string, SecretString};
use crate::domain::{Result, StrataError};
use std::collections::HashMap;
use std::sync::Mutex;

/// Secrets vault seam
///
/// Network and timeout failures propagate unchanged apart from the secret id
/// attached for diagnosability. An unknown secret id is an error here, not a
/// `None`, because a declared secret reference is always expected to exist.
pub trait SecretsVault: Send + Sync {
    /// Fetch a secret string by its vault name
    fn get_secret_value(&self, secret_id: &str) -> Result<SecretString>;
}

/// In-memory vault for tests and local tooling
#[derive(Default)]
pub struct InMemoryVault {
    secrets: HashMap<String, String>,
    fetched: Mutex<Vec<String>>,
}

impl InMemoryVault {
    /// Create an empty vault
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a secret value
    pub fn with_secret(mut self, secret_id: &str, value: &str) -> Self {
        self.secrets.insert(secret_id.to_string(), value.to_string());
        self
    }

    /// Secret ids fetched so far, in call order
    pub fn fetched_ids(&self) -> Vec<String> {
        self.fetched.lock().expect("fetch log poisoned").clone()
    }
}

impl SecretsVault for InMemoryVault {
    fn get_secret_value(&self, secret_id: &str) -> Result<SecretString> {
        self.fetched
            .lock()
            .expect("fetch log poisoned")
            .push(secret_id.to_string());

        self.secrets
            .get(secret_id)
            .map(|value| secret_string(value.clone()))
            .ok_or_else(|| StrataError::SecretsVault(format!("no such secret: {secret_id}")))
    }
}
