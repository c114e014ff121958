//! Host environment detection
//!
//! A process resolves its configuration differently depending on where it
//! runs: a managed datacenter host carries a marker directory with well-known
//! info files and reaches the object store and metadata service, while a
//! developer workstation has none of that and falls back to local files.
//! [`EnvironmentProbe`] answers those questions once and caches the answers
//! for the life of the process.

use crate::domain::{Result, StrataError};
use crate::remote::metadata::{Imds, InstanceIdentity, MetadataService};
use crate::remote::source;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Marker directory present on every managed host, relative to the
/// filesystem root
pub const CONFIG_DIR: &str = "etc/strata";

const DOMAIN_FILE: &str = "info/domain";
const ENV_FILE: &str = "info/env";
const ROLE_FILE: &str = "info/role";

/// Explicit override values, each taking precedence over file-based detection
///
/// Normally captured from process environment variables via
/// [`ProbeOverrides::from_env`]; tests construct them directly to avoid
/// mutating global process state.
#[derive(Debug, Clone, Default)]
pub struct ProbeOverrides {
    /// `STRATA_DOMAIN`
    pub domain: Option<String>,
    /// `STRATA_ENV`
    pub environment: Option<String>,
    /// `STRATA_HOST_ROLE`
    pub instance_role: Option<String>,
    /// `STRATA_AWS_REGION`
    pub aws_region: Option<String>,
    /// `STRATA_AWS_ACCOUNT_ID`
    pub aws_account_id: Option<String>,
    /// `STRATA_DATACENTER`: forces datacenter detection when `"true"`
    pub datacenter: bool,
    /// `STRATA_SKIP_REMOTE_CONFIG`: keeps the reader on local files even in
    /// the datacenter when `"true"`
    pub skip_remote_config: bool,
    /// `STRATA_HOST_CONFIG`: raw pre-supplied host-config JSON blob
    pub host_config: Option<String>,
}

impl ProbeOverrides {
    /// Capture overrides from the process environment
    pub fn from_env() -> Self {
        Self {
            domain: std::env::var("STRATA_DOMAIN").ok(),
            environment: std::env::var("STRATA_ENV").ok(),
            instance_role: std::env::var("STRATA_HOST_ROLE").ok(),
            aws_region: std::env::var("STRATA_AWS_REGION").ok(),
            aws_account_id: std::env::var("STRATA_AWS_ACCOUNT_ID").ok(),
            datacenter: std::env::var("STRATA_DATACENTER").as_deref() == Ok("true"),
            skip_remote_config: std::env::var("STRATA_SKIP_REMOTE_CONFIG").as_deref()
                == Ok("true"),
            host_config: std::env::var("STRATA_HOST_CONFIG").ok(),
        }
    }
}

#[derive(Default)]
struct ProbeCache {
    in_datacenter: Option<bool>,
    domain: Option<Option<String>>,
    environment: Option<Option<String>>,
    instance_role: Option<Option<String>>,
    identity: Option<InstanceIdentity>,
    host_config: Option<serde_json::Value>,
}

/// Process-wide host identity, resolved lazily and cached per field
///
/// Construct one probe early in bootstrap and pass it to whatever needs it.
/// Each accessor computes once under a mutex and serves the cached immutable
/// value afterwards, so first access is safe from any thread.
///
/// # Example
///
/// ```no_run
/// use strata::probe::EnvironmentProbe;
///
/// # fn example() -> strata::domain::Result<()> {
/// let probe = EnvironmentProbe::from_env();
/// if probe.in_datacenter() {
///     let bucket = probe.bucket_name("app-secrets")?;
///     println!("reading overrides from {bucket}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct EnvironmentProbe {
    root: PathBuf,
    overrides: ProbeOverrides,
    metadata: Box<dyn MetadataService>,
    cache: Mutex<ProbeCache>,
}

impl EnvironmentProbe {
    /// Probe with overrides captured from the process environment, the real
    /// filesystem root, and the link-local metadata service
    pub fn from_env() -> Self {
        Self::with_overrides(ProbeOverrides::from_env())
    }

    /// Probe with explicit overrides
    pub fn with_overrides(overrides: ProbeOverrides) -> Self {
        Self {
            root: PathBuf::from("/"),
            overrides,
            metadata: Box::new(Imds::new()),
            cache: Mutex::new(ProbeCache::default()),
        }
    }

    /// Rebase the well-known paths under a different filesystem root
    /// (test affordance; production hosts always use `/`)
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Substitute the metadata service collaborator
    pub fn with_metadata_service(mut self, metadata: Box<dyn MetadataService>) -> Self {
        self.metadata = metadata;
        self
    }

    fn marker_dir(&self) -> PathBuf {
        self.root.join(CONFIG_DIR)
    }

    fn marker_dir_exists(&self) -> bool {
        self.marker_dir().is_dir()
    }

    /// Whether this host runs inside the managed datacenter
    ///
    /// True when the override flag is set or the marker directory exists.
    /// Memoized.
    pub fn in_datacenter(&self) -> bool {
        let mut cache = self.lock_cache();
        if let Some(answer) = cache.in_datacenter {
            return answer;
        }
        let answer = self.overrides.datacenter || self.marker_dir_exists();
        cache.in_datacenter = Some(answer);
        answer
    }

    /// Whether the reader should ignore remote sources even in the datacenter
    pub fn skip_remote_config(&self) -> bool {
        self.overrides.skip_remote_config
    }

    /// Run `f` with the probe iff the host is in the datacenter
    pub fn run_if_in_datacenter<T>(&self, f: impl FnOnce(&Self) -> T) -> Option<T> {
        if self.in_datacenter() {
            Some(f(self))
        } else {
            None
        }
    }

    /// The deployment domain, e.g. `example.com`
    pub fn domain(&self) -> Result<Option<String>> {
        self.well_known_value(
            DOMAIN_FILE,
            |o| o.domain.clone(),
            |c| &mut c.domain,
        )
    }

    /// The environment name, e.g. `staging`
    pub fn environment_name(&self) -> Result<Option<String>> {
        self.well_known_value(
            ENV_FILE,
            |o| o.environment.clone(),
            |c| &mut c.environment,
        )
    }

    /// The functional role of this host, e.g. `idp` or `worker`
    pub fn instance_role(&self) -> Result<Option<String>> {
        self.well_known_value(
            ROLE_FILE,
            |o| o.instance_role.clone(),
            |c| &mut c.instance_role,
        )
    }

    /// Cloud region, from the override or the metadata service
    pub fn aws_region(&self) -> Result<String> {
        if let Some(region) = &self.overrides.aws_region {
            return Ok(region.clone());
        }
        Ok(self.identity()?.region)
    }

    /// Cloud account id, from the override or the metadata service
    pub fn aws_account_id(&self) -> Result<String> {
        if let Some(account_id) = &self.overrides.aws_account_id {
            return Ok(account_id.clone());
        }
        Ok(self.identity()?.account_id)
    }

    /// Derive the bucket name for a purpose from this host's account/region
    ///
    /// See [`crate::remote::bucket_name`] for the layout contract.
    pub fn bucket_name(&self, purpose: &str) -> Result<String> {
        Ok(source::bucket_name(
            purpose,
            &self.aws_account_id()?,
            &self.aws_region()?,
        ))
    }

    /// Per-environment host configuration document, parsed from JSON
    ///
    /// Read from the `STRATA_HOST_CONFIG` override or from
    /// `<root>/etc/strata/hosts/<env>.json`. A missing document is an empty
    /// object locally and a [`StrataError::MissingConfig`] in the datacenter.
    pub fn host_config(&self) -> Result<serde_json::Value> {
        if let Some(cached) = self.lock_cache().host_config.clone() {
            return Ok(cached);
        }

        let contents = match &self.overrides.host_config {
            Some(blob) => Some(blob.clone()),
            None => {
                let path = match self.environment_name()? {
                    Some(env) => self.marker_dir().join("hosts").join(format!("{env}.json")),
                    None => return Ok(serde_json::json!({})),
                };
                match std::fs::read_to_string(&path) {
                    Ok(contents) => Some(contents),
                    Err(err) if err.kind() == ErrorKind::NotFound => {
                        if self.in_datacenter() {
                            return Err(StrataError::MissingConfig(path.display().to_string()));
                        }
                        None
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        };

        let parsed = match contents {
            Some(contents) => serde_json::from_str(&contents)?,
            None => serde_json::json!({}),
        };
        self.lock_cache().host_config = Some(parsed.clone());
        Ok(parsed)
    }

    /// Clear all memoized fields
    ///
    /// Reserved for test isolation (repeated runs within one process); never
    /// a production reconfiguration mechanism.
    pub fn reset(&self) {
        *self.lock_cache() = ProbeCache::default();
    }

    fn identity(&self) -> Result<InstanceIdentity> {
        let mut cache = self.lock_cache();
        if let Some(identity) = &cache.identity {
            return Ok(identity.clone());
        }
        let identity = self.metadata.identity_document()?;
        cache.identity = Some(identity.clone());
        Ok(identity)
    }

    fn well_known_value(
        &self,
        file: &str,
        overridden: impl Fn(&ProbeOverrides) -> Option<String>,
        slot: impl Fn(&mut ProbeCache) -> &mut Option<Option<String>>,
    ) -> Result<Option<String>> {
        {
            let mut cache = self.lock_cache();
            if let Some(cached) = slot(&mut cache) {
                return Ok(cached.clone());
            }
        }

        if let Some(value) = overridden(&self.overrides) {
            *slot(&mut self.lock_cache()) = Some(Some(value.clone()));
            return Ok(Some(value));
        }

        let path = self.marker_dir().join(file);
        let value = match std::fs::read_to_string(&path) {
            Ok(contents) => Some(contents.trim_end_matches('\n').to_string()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                // A managed host always carries its info files; a local
                // workstation without the marker directory is silent.
                if self.marker_dir_exists() {
                    return Err(StrataError::MissingConfig(path.display().to_string()));
                }
                None
            }
            Err(err) => return Err(err.into()),
        };

        *slot(&mut self.lock_cache()) = Some(value.clone());
        Ok(value)
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, ProbeCache> {
        self.cache.lock().expect("probe cache lock poisoned")
    }
}
