//! End-to-end configuration loading
//!
//! Convenience wiring for application bootstrap: probe the environment,
//! read and merge the configuration layers, then run the caller's key
//! declarations through a [`ConfigBuilder`]. All the logic lives in the
//! components; this is only the glue.

use crate::builder::{ConfigBuilder, SecretResolution, TypedConfig};
use crate::domain::{Result, StrataError};
use crate::probe::EnvironmentProbe;
use crate::reader::ConfigReader;
use crate::remote::{ObjectStore, SecretsVault};
use std::path::PathBuf;
use std::sync::Arc;

/// One-shot loader assembling reader and builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use strata::builder::{KeySpec, ValueType};
/// use strata::loader::ConfigLoader;
/// use strata::probe::EnvironmentProbe;
///
/// # fn example() -> strata::domain::Result<()> {
/// let probe = Arc::new(EnvironmentProbe::from_env());
/// let config = ConfigLoader::new("/srv/app", probe).load("production", |builder| {
///     builder.add("database_host", KeySpec::new(ValueType::String))?;
///     builder.add("pool_size", KeySpec::new(ValueType::Integer).allow_nil())?;
///     Ok(())
/// })?;
///
/// println!("host = {:?}", config.get("database_host"));
/// # Ok(())
/// # }
/// ```
pub struct ConfigLoader {
    app_root: PathBuf,
    probe: Arc<EnvironmentProbe>,
    object_store: Option<Arc<dyn ObjectStore>>,
    vault: Option<Arc<dyn SecretsVault>>,
    write_copy_to: Option<PathBuf>,
}

impl ConfigLoader {
    /// Loader for the application rooted at `app_root`
    pub fn new(app_root: impl Into<PathBuf>, probe: Arc<EnvironmentProbe>) -> Self {
        Self {
            app_root: app_root.into(),
            probe,
            object_store: None,
            vault: None,
            write_copy_to: None,
        }
    }

    /// Attach the object store client for remote layers
    pub fn with_object_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.object_store = Some(store);
        self
    }

    /// Attach the secrets vault client for secret-reference declarations
    pub fn with_vault(mut self, vault: Arc<dyn SecretsVault>) -> Self {
        self.vault = Some(vault);
        self
    }

    /// Write a pre-profile snapshot of the merged configuration here
    /// (skipped when a file already exists at the path)
    pub fn write_copy_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.write_copy_to = Some(path.into());
        self
    }

    /// Resolve the configuration for `profile` and build the typed result
    pub fn load(
        self,
        profile: &str,
        declare: impl FnOnce(&mut ConfigBuilder) -> Result<()>,
    ) -> Result<TypedConfig> {
        let mut reader = ConfigReader::new(self.app_root, Arc::clone(&self.probe));
        if let Some(store) = self.object_store {
            reader = reader.with_object_store(store);
        }

        let raw = reader.read_configuration(profile, self.write_copy_to.as_deref())?;

        let resolution = if self.probe.in_datacenter() {
            let vault = self.vault.ok_or_else(|| {
                StrataError::Configuration(
                    "a secrets vault client is required in the datacenter".to_string(),
                )
            })?;
            SecretResolution::Datacenter(vault)
        } else {
            SecretResolution::LocalFixture
        };

        ConfigBuilder::build(raw, resolution, declare)
    }
}
