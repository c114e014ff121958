//! Three-layer configuration resolution
//!
//! The reader loads the shipped default document, the app override, and the
//! optional role override, deep-merges them in precedence order, and selects
//! the sub-tree for the active runtime profile. Whether the override layers
//! come from local disk or the remote object store follows the environment
//! probe.

use super::layer::{ConfigurationVersions, LayerProvenance, RawConfigLayer};
use super::merge::deep_merge;
use crate::domain::{Result, StrataError};
use crate::probe::EnvironmentProbe;
use crate::remote::{ObjectStore, RemoteSource};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Reserved profile names always removed from the top level of the result
pub const RESERVED_PROFILES: [&str; 3] = ["development", "production", "test"];

/// Bucket purpose holding the per-environment override documents
const APP_SECRETS_PURPOSE: &str = "app-secrets";

const DEFAULT_CONFIG_FILE: &str = "application.yml.default";
const LOCAL_OVERRIDE_FILE: &str = "application.yml";

/// Remap an instance role to its path component in the remote store
///
/// This mapping encodes the external storage-layout contract: worker and
/// migration hosts read the idp namespace, app hosts read dashboard, every
/// other role uses its own name.
pub fn role_path_component(role: &str) -> &str {
    match role {
        "worker" | "migration" => "idp",
        "app" => "dashboard",
        other => other,
    }
}

/// Role-override document filename, for roles that have one
pub fn role_configuration_filename(role: &str) -> Option<&'static str> {
    match role {
        "idp" => Some("web.yml"),
        "worker" => Some("worker.yml"),
        _ => None,
    }
}

struct MergedConfiguration {
    content: Value,
    default: LayerProvenance,
    app_override: LayerProvenance,
}

/// Resolves the layered configuration for one application root
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use strata::probe::EnvironmentProbe;
/// use strata::reader::ConfigReader;
///
/// # fn example() -> strata::domain::Result<()> {
/// let probe = Arc::new(EnvironmentProbe::from_env());
/// let mut reader = ConfigReader::new("/srv/app", probe);
/// let configuration = reader.read_configuration("production", None)?;
/// # Ok(())
/// # }
/// ```
pub struct ConfigReader {
    app_root: PathBuf,
    probe: Arc<EnvironmentProbe>,
    object_store: Option<Arc<dyn ObjectStore>>,
    merged: Option<MergedConfiguration>,
}

impl ConfigReader {
    /// Reader for the application rooted at `app_root`
    pub fn new(app_root: impl Into<PathBuf>, probe: Arc<EnvironmentProbe>) -> Self {
        Self {
            app_root: app_root.into(),
            probe,
            object_store: None,
            merged: None,
        }
    }

    /// Attach the object store client used for remote layers
    ///
    /// Required when the probe reports a datacenter host and the
    /// skip-remote-config override is unset.
    pub fn with_object_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.object_store = Some(store);
        self
    }

    /// Resolve the configuration for the requested runtime profile
    ///
    /// Loads and merges the three layers, optionally writes a pre-profile
    /// snapshot to `write_copy_to` (skipped when a file already exists
    /// there), removes the reserved profile sub-trees from the top level,
    /// and merges the requested profile's sub-tree on top.
    ///
    /// # Errors
    ///
    /// A missing default document and malformed YAML in any layer are fatal.
    /// Missing override layers are not: they degrade to empty layers.
    pub fn read_configuration(
        &mut self,
        profile: &str,
        write_copy_to: Option<&Path>,
    ) -> Result<BTreeMap<String, Value>> {
        self.ensure_merged()?;
        let merged = self.merged.as_ref().expect("merged configuration just ensured");

        if let Some(copy_path) = write_copy_to {
            if !copy_path.exists() {
                write_snapshot(copy_path, &merged.content)?;
            }
        }

        select_profile(&merged.content, profile)
    }

    /// Provenance of the default and app-override layers
    ///
    /// Reflects the source actually used: file mtime for local files, object
    /// version and last-modified for remote blobs.
    pub fn configuration_version(&mut self) -> Result<ConfigurationVersions> {
        self.ensure_merged()?;
        let merged = self.merged.as_ref().expect("merged configuration just ensured");
        Ok(ConfigurationVersions {
            default: merged.default.clone(),
            app_override: merged.app_override.clone(),
        })
    }

    fn ensure_merged(&mut self) -> Result<()> {
        if self.merged.is_some() {
            return Ok(());
        }

        let default = self.default_layer()?;
        let app_override = self.app_override_layer()?;
        let role_override = self.role_override_layer()?;

        let content = deep_merge(
            &deep_merge(default.content(), app_override.content()),
            role_override.content(),
        );

        self.merged = Some(MergedConfiguration {
            content,
            default: default.provenance(),
            app_override: app_override.provenance(),
        });
        Ok(())
    }

    // The default layer is mandatory; its absence is unrecoverable.
    fn default_layer(&self) -> Result<RawConfigLayer> {
        let path = self.app_root.join("config").join(DEFAULT_CONFIG_FILE);
        RawConfigLayer::from_local_file(&path).map_err(|err| match err {
            StrataError::Io(_) => StrataError::Configuration(format!(
                "default configuration missing or unreadable: {}",
                path.display()
            )),
            other => other,
        })
    }

    fn app_override_layer(&self) -> Result<RawConfigLayer> {
        if self.use_remote_source() {
            let template = format!(
                "/%{{env}}/{}/v1/application.yml",
                self.remote_path_component()?
            );
            self.remote_layer(&template)
        } else {
            self.local_layer(LOCAL_OVERRIDE_FILE)
        }
    }

    fn role_override_layer(&self) -> Result<RawConfigLayer> {
        let Some(role) = self.probe.instance_role()? else {
            return Ok(RawConfigLayer::empty());
        };
        let Some(filename) = role_configuration_filename(&role) else {
            return Ok(RawConfigLayer::empty());
        };

        if self.use_remote_source() {
            let template = format!(
                "/%{{env}}/{}/v1/{filename}",
                self.remote_path_component()?
            );
            self.remote_layer(&template)
        } else {
            self.local_layer(filename)
        }
    }

    fn use_remote_source(&self) -> bool {
        self.probe.in_datacenter() && !self.probe.skip_remote_config()
    }

    // A remote not-found degrades to an empty layer; there is no further
    // fallback to local files while in the datacenter.
    fn remote_layer(&self, path_template: &str) -> Result<RawConfigLayer> {
        let source = self.remote_source()?;
        match source.read_blob(path_template)? {
            Some(object) => {
                let text = String::from_utf8(object.body).map_err(|err| {
                    StrataError::Configuration(format!(
                        "remote configuration is not valid UTF-8: {err}"
                    ))
                })?;
                RawConfigLayer::from_yaml(&text, object.version_id, object.last_modified)
            }
            None => {
                debug!(path_template, "remote configuration absent, using empty layer");
                Ok(RawConfigLayer::empty())
            }
        }
    }

    fn local_layer(&self, filename: &str) -> Result<RawConfigLayer> {
        let path = self.app_root.join("config").join(filename);
        if path.exists() {
            RawConfigLayer::from_local_file(&path)
        } else {
            debug!(path = %path.display(), "local override absent, using empty layer");
            Ok(RawConfigLayer::empty())
        }
    }

    fn remote_source(&self) -> Result<RemoteSource> {
        let store = self.object_store.clone().ok_or_else(|| {
            StrataError::Configuration(
                "an object store client is required to resolve remote configuration".to_string(),
            )
        })?;
        let env = self.probe.environment_name()?.ok_or_else(|| {
            StrataError::Configuration(
                "environment name unavailable while resolving remote configuration".to_string(),
            )
        })?;
        let bucket = self.probe.bucket_name(APP_SECRETS_PURPOSE)?;
        Ok(RemoteSource::new(bucket, env, store))
    }

    fn remote_path_component(&self) -> Result<String> {
        let role = self.probe.instance_role()?.ok_or_else(|| {
            StrataError::Configuration(
                "instance role unavailable while resolving remote configuration".to_string(),
            )
        })?;
        Ok(role_path_component(&role).to_string())
    }
}

/// Remove reserved profile sub-trees and merge the requested profile on top
fn select_profile(merged: &Value, profile: &str) -> Result<BTreeMap<String, Value>> {
    let Value::Mapping(mapping) = merged else {
        return Err(StrataError::Configuration(
            "merged configuration is not a mapping".to_string(),
        ));
    };

    let mut result = BTreeMap::new();
    for (key, value) in mapping {
        let Value::String(key) = key else {
            return Err(StrataError::Configuration(
                "configuration keys must be strings".to_string(),
            ));
        };
        if RESERVED_PROFILES.contains(&key.as_str()) {
            continue;
        }
        result.insert(key.clone(), value.clone());
    }

    if let Some(profile_tree) = mapping.get(profile) {
        let Value::Mapping(profile_map) = profile_tree else {
            return Err(StrataError::Configuration(format!(
                "profile sub-tree {profile} is not a mapping"
            )));
        };
        for (key, value) in profile_map {
            let Value::String(key) = key else {
                return Err(StrataError::Configuration(
                    "configuration keys must be strings".to_string(),
                ));
            };
            result.insert(key.clone(), value.clone());
        }
    }

    Ok(result)
}

// Snapshots are diagnostic dumps: owner+group read/write, no world access.
fn write_snapshot(path: &Path, content: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_yaml::to_string(content)?)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o640))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeOverrides;
    use test_case::test_case;

    #[test_case("idp", "idp")]
    #[test_case("worker", "idp")]
    #[test_case("migration", "idp")]
    #[test_case("app", "dashboard")]
    #[test_case("pivcac", "pivcac")]
    #[test_case("anything-else", "anything-else")]
    fn test_role_path_component(role: &str, expected: &str) {
        assert_eq!(role_path_component(role), expected);
    }

    #[test_case("idp", Some("web.yml"))]
    #[test_case("worker", Some("worker.yml"))]
    #[test_case("migration", None)]
    #[test_case("pivcac", None)]
    fn test_role_configuration_filename(role: &str, expected: Option<&'static str>) {
        assert_eq!(role_configuration_filename(role), expected);
    }

    #[test]
    fn test_select_profile_removes_reserved_keys() {
        let merged: Value =
            serde_yaml::from_str("base: x\ndevelopment:\n  a: 1\nproduction:\n  a: 2\ntest:\n  a: 3")
                .unwrap();
        let result = select_profile(&merged, "development").unwrap();

        assert_eq!(result["base"], Value::from("x"));
        assert_eq!(result["a"], Value::from(1));
        assert!(!result.contains_key("development"));
        assert!(!result.contains_key("production"));
        assert!(!result.contains_key("test"));
    }

    #[test]
    fn test_select_profile_values_win_over_top_level() {
        let merged: Value =
            serde_yaml::from_str("timeout: 5\nproduction:\n  timeout: 30").unwrap();
        let result = select_profile(&merged, "production").unwrap();
        assert_eq!(result["timeout"], Value::from(30));
    }

    #[test]
    fn test_select_profile_missing_profile_keeps_top_level() {
        let merged: Value = serde_yaml::from_str("base: x").unwrap();
        let result = select_profile(&merged, "production").unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result["base"], Value::from("x"));
    }

    #[test]
    fn test_select_profile_scalar_subtree_is_fatal() {
        let merged: Value = serde_yaml::from_str("production: oops").unwrap();
        assert!(matches!(
            select_profile(&merged, "production").unwrap_err(),
            StrataError::Configuration(_)
        ));
    }

    #[test]
    fn test_missing_default_layer_is_fatal() {
        let dir = tempfile::TempDir::new().unwrap();
        let probe = Arc::new(
            EnvironmentProbe::with_overrides(ProbeOverrides::default()).with_root(dir.path()),
        );
        let mut reader = ConfigReader::new(dir.path(), probe);

        let err = reader.read_configuration("development", None).unwrap_err();
        assert!(matches!(err, StrataError::Configuration(_)));
        assert!(err.to_string().contains("application.yml.default"));
    }
}
