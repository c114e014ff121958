//! Remote source facade
//!
//! Thin composed wrapper over the object store and secrets vault seams. The
//! reader and builder only ever see two operations: read a blob by logical
//! path, and fetch a secret by name. Logical paths carry a `%{env}`
//! placeholder resolved against the active environment name before lookup.

use super::object_store::{FetchedObject, ObjectStore};
use super::secret::SecretString;
use super::secrets::SecretsVault;
use crate::domain::{Result, StrataError};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Placeholder interpolated with the environment name in logical paths
pub const ENV_PLACEHOLDER: &str = "%{env}";

/// Derive the deterministic bucket name for a purpose
///
/// The layout contract is `<purpose>.<account_id>-<region>`. Callers must
/// derive account and region from the environment probe, never hardcode them.
///
/// # Example
///
/// ```
/// use strata::remote::bucket_name;
///
/// assert_eq!(
///     bucket_name("app-secrets", "12345", "us-east-1"),
///     "app-secrets.12345-us-east-1"
/// );
/// ```
pub fn bucket_name(purpose: &str, account_id: &str, region: &str) -> String {
    format!("{purpose}.{account_id}-{region}")
}

/// Facade combining blob reads and secret fetches for one environment
pub struct RemoteSource {
    bucket: String,
    env: String,
    store: Arc<dyn ObjectStore>,
    vault: Option<Arc<dyn SecretsVault>>,
}

impl RemoteSource {
    /// Create a facade bound to one bucket and environment
    pub fn new(bucket: impl Into<String>, env: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            bucket: bucket.into(),
            env: env.into(),
            store,
            vault: None,
        }
    }

    /// Attach a secrets vault for `fetch_secret`
    pub fn with_vault(mut self, vault: Arc<dyn SecretsVault>) -> Self {
        self.vault = Some(vault);
        self
    }

    /// The bucket this facade reads from
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Resolve a logical path template into the concrete object key
    ///
    /// Interpolates `%{env}` and normalizes away a single leading separator.
    pub fn resolve_key(&self, path_template: &str) -> String {
        let interpolated = path_template.replace(ENV_PLACEHOLDER, &self.env);
        interpolated
            .strip_prefix('/')
            .map(str::to_string)
            .unwrap_or(interpolated)
    }

    /// Read a blob by logical path, or `None` if it does not exist
    pub fn read_blob(&self, path_template: &str) -> Result<Option<FetchedObject>> {
        let key = self.resolve_key(path_template);
        info!(bucket = %self.bucket, key = %key, "reading remote object");
        self.store.get_object(&self.bucket, &key)
    }

    /// Fetch a blob by logical path and write it to a local file
    ///
    /// Parent directories are created as needed. A missing remote blob is
    /// `Ok(false)`; nothing is written in that case.
    pub fn download_blob(&self, path_template: &str, local_path: &Path) -> Result<bool> {
        let key = self.resolve_key(path_template);
        info!(
            bucket = %self.bucket,
            key = %key,
            local_path = %local_path.display(),
            "downloading remote object"
        );

        match self.store.get_object(&self.bucket, &key)? {
            Some(object) => {
                if let Some(parent) = local_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(local_path, &object.body)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Fetch a secret string by vault name
    pub fn fetch_secret(&self, name: &str) -> Result<SecretString> {
        let vault = self.vault.as_ref().ok_or_else(|| {
            StrataError::SecretsVault(format!(
                "no secrets vault attached while fetching {name}"
            ))
        })?;
        info!(secret_id = %name, "fetching secret");
        vault.get_secret_value(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::object_store::InMemoryObjectStore;
    use crate::remote::secrets::InMemoryVault;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    fn source_with(store: InMemoryObjectStore) -> RemoteSource {
        RemoteSource::new("app-secrets.12345-us-east-1", "staging", Arc::new(store))
    }

    #[test]
    fn test_resolve_key_interpolates_env_and_strips_leading_slash() {
        let source = source_with(InMemoryObjectStore::new());
        assert_eq!(
            source.resolve_key("/%{env}/idp/v1/application.yml"),
            "staging/idp/v1/application.yml"
        );
    }

    #[test]
    fn test_resolve_key_without_leading_slash() {
        let source = source_with(InMemoryObjectStore::new());
        assert_eq!(source.resolve_key("%{env}/file"), "staging/file");
    }

    #[test]
    fn test_read_blob_found() {
        let store = InMemoryObjectStore::new();
        store.insert(
            "app-secrets.12345-us-east-1",
            "staging/idp/v1/application.yml",
            b"a: 1".to_vec(),
        );
        let source = source_with(store);

        let blob = source
            .read_blob("/%{env}/idp/v1/application.yml")
            .unwrap()
            .unwrap();
        assert_eq!(blob.body, b"a: 1");
    }

    #[test]
    fn test_read_blob_not_found_is_none() {
        let source = source_with(InMemoryObjectStore::new());
        assert!(source.read_blob("/%{env}/missing").unwrap().is_none());
    }

    #[test]
    fn test_download_blob_writes_file() {
        let store = InMemoryObjectStore::new();
        store.insert(
            "app-secrets.12345-us-east-1",
            "staging/cert.pem",
            b"PEM".to_vec(),
        );
        let source = source_with(store);

        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested/cert.pem");
        assert!(source.download_blob("/%{env}/cert.pem", &target).unwrap());
        assert_eq!(fs::read(&target).unwrap(), b"PEM");
    }

    #[test]
    fn test_download_missing_blob_writes_nothing() {
        let source = source_with(InMemoryObjectStore::new());
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("cert.pem");
        assert!(!source.download_blob("/%{env}/cert.pem", &target).unwrap());
        assert!(!target.exists());
    }

    #[test]
    fn test_fetch_secret_through_vault() {
        let vault = InMemoryVault::new().with_secret("prod/key", "abc");
        let source =
            source_with(InMemoryObjectStore::new()).with_vault(Arc::new(vault));
        let secret = source.fetch_secret("prod/key").unwrap();
        assert_eq!(secret.expose_secret().as_ref(), "abc");
    }

    #[test]
    fn test_fetch_secret_without_vault_is_error() {
        let source = source_with(InMemoryObjectStore::new());
        let err = source.fetch_secret("prod/key").unwrap_err();
        assert!(matches!(err, StrataError::SecretsVault(_)));
    }

    #[test]
    fn test_bucket_name_derivation() {
        assert_eq!(
            bucket_name("app-secrets", "12345", "us-east-1"),
            "app-secrets.12345-us-east-1"
        );
    }
}
